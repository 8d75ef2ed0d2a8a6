use super::{ExpansionSnapshot, PageController};
use crate::dom::NodeId;
use crate::error::Result;
use crate::event::MouseButton;
use crate::fetch::PageFetcher;
use crate::scheduler::Task;
use crate::uri::decode_uri_component;

struct MediaNodes {
    file: NodeId,
    thumb: NodeId,
    encoded: String,
}

impl<F: PageFetcher> PageController<F> {
    /// Toggles a post's media between thumbnail and full size. Returns whether
    /// the click's default action is still allowed: `false` once the toggle
    /// was handled, `true` for other buttons or posts without expandable media.
    pub fn expand_file(&mut self, post_id: &str, button: Option<MouseButton>) -> bool {
        if !matches!(button, None | Some(MouseButton::Primary)) {
            return true;
        }
        match self.toggle_expansion(post_id) {
            Ok(handled) => !handled,
            Err(err) => {
                self.trace
                    .console(format!("Failed to expand file {post_id}: {err}"));
                true
            }
        }
    }

    pub fn is_expanded(&self, post_id: &str) -> bool {
        self.dom
            .by_id(&format!("thumbfile{post_id}"))
            .and_then(|thumb| self.dom.attr(thumb, "expanded"))
            .is_some_and(|value| value == "true")
    }

    fn media_nodes(&self, post_id: &str) -> Result<Option<MediaNodes>> {
        let file = self.dom.by_id(&format!("file{post_id}"));
        let thumb = self.dom.by_id(&format!("thumbfile{post_id}"));
        let expand = self.dom.by_id(&format!("expand{post_id}"));
        let (Some(file), Some(thumb), Some(expand)) = (file, thumb, expand) else {
            return Ok(None);
        };
        let encoded = self.dom.inner_html(expand)?;
        if encoded.is_empty() {
            return Ok(None);
        }
        Ok(Some(MediaNodes {
            file,
            thumb,
            encoded,
        }))
    }

    fn toggle_expansion(&mut self, post_id: &str) -> Result<bool> {
        let Some(media) = self.media_nodes(post_id)? else {
            return Ok(false);
        };
        if self.dom.attr(media.thumb, "expanded").as_deref() == Some("true") {
            self.collapse(post_id, &media)?;
            return Ok(true);
        }

        let markup = match decode_uri_component(&media.encoded) {
            Ok(markup) => markup,
            Err(err) => {
                self.trace
                    .console(format!("Failed to decode file {post_id}: {err}"));
                return Ok(false);
            }
        };

        let mut snapshot = ExpansionSnapshot {
            thumb_expanded: self.dom.attr(media.thumb, "expanded"),
            thumb_style: self.dom.attr(media.thumb, "style"),
            file_style: self.dom.attr(media.file, "style"),
            file_children: self.dom.children(media.file).to_vec(),
            reveal_timer: None,
        };

        self.dom.set_attr(media.thumb, "expanded", "true")?;
        self.dom.style_set(media.file, "display", "none")?;
        self.dom.set_inner_html(media.file, &markup)?;

        let delay = self.config.reveal_delay_ms;
        let task = Task::RevealExpanded {
            post_id: post_id.to_string(),
        };
        snapshot.reveal_timer = Some(self.schedule(task, delay));
        self.expansions.insert(post_id.to_string(), snapshot);
        Ok(true)
    }

    fn collapse(&mut self, post_id: &str, media: &MediaNodes) -> Result<()> {
        let Some(snapshot) = self.expansions.remove(post_id) else {
            // Expanded before we saw it; fall back to a plain thumbnail.
            self.dom.style_set(media.file, "display", "none")?;
            self.dom.set_text_content(media.file, "")?;
            self.dom.style_set(media.thumb, "display", "block")?;
            return self.dom.set_attr(media.thumb, "expanded", "false");
        };

        self.cancel(snapshot.reveal_timer);
        restore_attr(self, media.thumb, "expanded", snapshot.thumb_expanded.as_deref())?;
        restore_attr(self, media.thumb, "style", snapshot.thumb_style.as_deref())?;
        restore_attr(self, media.file, "style", snapshot.file_style.as_deref())?;
        self.dom.set_text_content(media.file, "")?;
        for child in snapshot.file_children {
            self.dom.append_child(media.file, child)?;
        }
        Ok(())
    }

    /// Second half of an expand: swap the thumbnail for the full file.
    pub(super) fn reveal_expanded(&mut self, post_id: &str, timer_id: i64) -> Result<()> {
        let Some(snapshot) = self.expansions.get_mut(post_id) else {
            return Ok(());
        };
        if snapshot.reveal_timer != Some(timer_id) {
            return Ok(());
        }
        snapshot.reveal_timer = None;

        let Some(media) = self.media_nodes(post_id)? else {
            return Ok(());
        };
        self.dom.style_set(media.thumb, "display", "none")?;
        self.dom.style_set(media.file, "display", "block")
    }
}

fn restore_attr<F: PageFetcher>(
    page: &mut PageController<F>,
    node: NodeId,
    name: &str,
    value: Option<&str>,
) -> Result<()> {
    match value {
        Some(value) => page.dom.set_attr(node, name, value),
        None => page.dom.remove_attr(node, name),
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Result;
    use crate::event::{MouseButton, PageEvent};
    use crate::PageController;

    const URL: &str = "https://example.org/b/res/1.html";

    fn media_page() -> Result<PageController> {
        PageController::from_html(
            r#"<body><div class="reply" id="reply5">
              <a href="/src/5.png"><img id="thumbfile5" src="/thumb/5.png"></a>
              <div id="file5"></div>
              <div id="expand5" style="display: none;">%3Cimg%20src%3D%22%2Fsrc%2F5.png%22%3E</div>
            </div></body>"#,
            URL,
        )
    }

    #[test]
    fn expand_hides_then_reveals_after_the_delay() -> Result<()> {
        let mut page = media_page()?;
        let allowed = page.dispatch(PageEvent::ExpandClick {
            post_id: "5".into(),
            button: Some(MouseButton::Primary),
        })?;
        assert!(!allowed);
        assert!(page.is_expanded("5"));

        let file = page.element_by_id("file5")?;
        assert_eq!(page.dom().style_get(file, "display")?, "none");
        assert_eq!(page.dom().inner_html(file)?, "<img src=\"/src/5.png\">");

        page.advance_time(99)?;
        assert_eq!(page.dom().style_get(file, "display")?, "none");
        page.advance_time(1)?;
        assert_eq!(page.dom().style_get(file, "display")?, "block");
        Ok(())
    }

    #[test]
    fn collapse_restores_the_initial_markup() -> Result<()> {
        let mut page = media_page()?;
        let before = page.dump_dom();

        assert!(!page.expand_file("5", None));
        page.advance_time(100)?;
        assert!(!page.expand_file("5", None));

        assert_eq!(page.dump_dom(), before);
        assert!(!page.is_expanded("5"));
        Ok(())
    }

    #[test]
    fn collapse_before_reveal_cancels_it() -> Result<()> {
        let mut page = media_page()?;
        let before = page.dump_dom();
        page.expand_file("5", None);
        page.expand_file("5", None);
        assert!(page.pending_timers().is_empty());

        page.advance_time(500)?;
        assert_eq!(page.dump_dom(), before);
        Ok(())
    }

    #[test]
    fn other_buttons_and_missing_media_keep_the_default() -> Result<()> {
        let mut page = media_page()?;
        assert!(page.expand_file("5", Some(MouseButton::Middle)));
        assert!(!page.is_expanded("5"));
        assert!(page.expand_file("404", None));
        Ok(())
    }

    #[test]
    fn malformed_fragment_is_logged_and_ignored() -> Result<()> {
        let mut page = PageController::from_html(
            r#"<div id="file6"></div><img id="thumbfile6"><div id="expand6">%E0%A4%A</div>"#,
            URL,
        )?;
        assert!(page.expand_file("6", None));
        assert!(!page.is_expanded("6"));
        let console = page.take_console_logs();
        assert_eq!(console.len(), 1);
        assert!(console[0].starts_with("Failed to decode file 6"));
        Ok(())
    }
}
