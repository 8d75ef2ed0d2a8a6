use super::PageController;
use crate::fetch::PageFetcher;
use crate::scheduler::Task;

impl<F: PageFetcher> PageController<F> {
    /// One blink tick. Toggles the title between the original and
    /// `(N new)` and schedules the next tick while blinking is on and unseen
    /// replies remain.
    pub fn update_title(&mut self) {
        let original = match &self.focus.original_title {
            Some(title) => title.clone(),
            None => {
                let title = self.dom.title();
                self.focus.original_title = Some(title.clone());
                title
            }
        };

        if !self.focus.blinking || self.focus.new_replies_count == 0 {
            self.stop_blinking();
            self.write_title(&original);
            return;
        }

        let current = self.dom.title();
        if current == original {
            let indicator = format!("({} new)", self.focus.new_replies_count);
            self.write_title(&indicator);
            self.focus.last_indicator = Some(indicator);
        } else if self.focus.last_indicator.as_deref() == Some(current.as_str()) {
            self.write_title(&original);
        } else {
            // Someone else rewrote the title; leave theirs alone.
            self.stop_blinking();
            return;
        }

        self.schedule_blink();
    }

    pub(super) fn start_blinking(&mut self) {
        if self.focus.blinking {
            return;
        }
        self.focus.blinking = true;
        self.update_title();
    }

    fn stop_blinking(&mut self) {
        self.focus.blinking = false;
        self.focus.last_indicator = None;
        let pending = self.focus.blink_timer.take();
        self.cancel(pending);
    }

    fn schedule_blink(&mut self) {
        let previous = self.focus.blink_timer.take();
        self.cancel(previous);
        let interval = self.config.blink_interval_ms;
        self.focus.blink_timer = Some(self.schedule(Task::BlinkTitle, interval));
    }

    fn write_title(&mut self, title: &str) {
        if let Err(err) = self.dom.set_title(title) {
            self.trace.console(format!("Failed to set title: {err}"));
        }
    }

    pub(super) fn on_focus(&mut self) {
        self.focus.new_replies_count = 0;
        self.focus.have_focus = true;
        self.stop_blinking();
        if let Some(original) = self.focus.original_title.clone() {
            self.write_title(&original);
        }
    }

    pub(super) fn on_blur(&mut self) {
        self.focus.new_replies_count = 0;
        self.focus.have_focus = false;
    }
}
