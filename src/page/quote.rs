use super::PageController;
use crate::error::Result;
use crate::fetch::PageFetcher;
use crate::trace::TraceCategory;

const MESSAGE_FIELD_ID: &str = "message";

impl<F: PageFetcher> PageController<F> {
    /// Appends `>>post_id` and a newline to the reply field and focuses it.
    /// Always returns `false` so the link's navigation is suppressed.
    pub fn quote_post(&mut self, post_id: &str) -> bool {
        let Some(message) = self.dom.by_id(MESSAGE_FIELD_ID) else {
            return false;
        };
        let appended = self
            .dom
            .value(message)
            .map(|current| format!("{current}>>{post_id}\n"))
            .and_then(|next| self.dom.set_value(message, &next));
        match appended {
            Ok(()) => self.active_element = Some(message),
            Err(err) => self
                .trace
                .console(format!("Failed to quote post {post_id}: {err}")),
        }
        false
    }

    pub(super) fn on_load(&mut self) -> Result<()> {
        if let Some(post_id) = self.location.quote_target(&self.patterns)? {
            self.quote_post(&post_id);
        }

        let root = self.dom.root();
        self.bind_post_attributes(root)?;

        if self.config.auto_refresh_delay_secs.is_none() {
            return Ok(());
        }
        let Some(thread_id) = self.location.thread_id(&self.patterns)? else {
            return Ok(());
        };
        if self.poll_timer.is_some_and(|id| self.scheduler.is_pending(id)) {
            return Ok(());
        }
        self.trace.line(
            TraceCategory::Poll,
            format!("[poll] start thread={thread_id}"),
        );
        self.schedule_refresh();
        Ok(())
    }
}
