use super::PageController;
use crate::dom::NodeId;
use crate::error::Result;
use crate::fetch::PageFetcher;

const POST_NUMBER_LABEL: &str = "No.";
const POST_CLASSES: [&str; 2] = ["reply", "op"];
const PREVIEW_CLASS: &str = "post-preview";

impl<F: PageFetcher> PageController<F> {
    /// Scans the anchors under `root` for links to posts.
    ///
    /// A `No.` link tags its post with `postid`. A `>>123` link gets a hover
    /// preview when previews are enabled. Returns how many anchors were
    /// tagged or bound.
    pub fn bind_post_attributes(&mut self, root: NodeId) -> Result<usize> {
        let mut bound = 0;
        for anchor in self.dom.elements_by_tag_from(root, "a") {
            let Some(href) = self.dom.attr(anchor, "href") else {
                continue;
            };
            let Some(post_id) = self.patterns.post_href.capture(&href, 1)? else {
                continue;
            };

            let label = self.dom.text_content(anchor);
            let label = label.trim();
            if label == POST_NUMBER_LABEL {
                let Some(post) = self
                    .dom
                    .closest_with_class(anchor, &POST_CLASSES)
                    .or_else(|| self.dom.parent(anchor))
                else {
                    continue;
                };
                if !self.dom.is_element(post) {
                    continue;
                }
                self.dom.set_attr(post, "postid", &post_id)?;
                bound += 1;
            } else if self.config.hover_previews && self.patterns.quote_label.is_match(label)? {
                self.quote_links.insert(anchor, post_id);
                bound += 1;
            }
        }
        Ok(bound)
    }

    /// Opens the preview for a bound quote link. Returns whether a preview was
    /// shown. A preview is built once per link and reattached on later hovers.
    pub(super) fn show_preview(&mut self, anchor: NodeId) -> Result<bool> {
        let Some(post_id) = self.quote_links.get(&anchor).cloned() else {
            return Ok(false);
        };
        let host = self.dom.first_by_tag("body").unwrap_or(self.dom.root());
        let style = format!(
            "position: absolute; left: {}px; top: {}px; z-index: 100;",
            self.pointer.x, self.pointer.y
        );

        if let Some(&cached) = self.previews.get(&anchor) {
            if self.dom.is_connected(cached) {
                return Ok(false);
            }
            self.dom.set_attr(cached, "style", &style)?;
            self.dom.append_child(host, cached)?;
            return Ok(true);
        }

        let Some(post) = self.find_post(&post_id) else {
            return Ok(false);
        };
        let preview = self.dom.create_detached_element("div");
        self.dom.class_add(preview, PREVIEW_CLASS)?;
        self.dom.set_attr(preview, "data-preview-for", &post_id)?;
        self.dom.set_attr(preview, "style", &style)?;
        for child in self.dom.children(post).to_vec() {
            self.dom.copy_subtree(child, preview, true)?;
        }
        self.dom.append_child(host, preview)?;
        self.previews.insert(anchor, preview);
        Ok(true)
    }

    pub(super) fn hide_preview(&mut self, anchor: NodeId) -> Result<()> {
        if let Some(&preview) = self.previews.get(&anchor) {
            self.dom.remove_node(preview)?;
        }
        Ok(())
    }

    fn find_post(&self, post_id: &str) -> Option<NodeId> {
        self.dom
            .first_by_attr("postid", post_id)
            .or_else(|| self.dom.by_id(&format!("post{post_id}")))
            .or_else(|| self.dom.by_id(&format!("reply{post_id}")))
    }
}
