use std::collections::HashMap;

use crate::config::PageConfig;
use crate::dom::{Dom, NodeId};
use crate::error::{Error, Result};
use crate::event::PageEvent;
use crate::fetch::{MockFetcher, PageFetcher};
use crate::html::parse_html;
use crate::location::PageLocation;
use crate::pattern::PagePatterns;
use crate::scheduler::{PendingTimer, ScheduledTask, Scheduler, Task};
use crate::trace::{TraceCategory, TraceState};

mod binder;
mod blinker;
mod expander;
mod poller;
mod quote;

const SNIPPET_CHARS: usize = 200;

#[derive(Debug, Default)]
struct FocusState {
    have_focus: bool,
    original_title: Option<String>,
    new_replies_count: usize,
    blinking: bool,
    blink_timer: Option<i64>,
    last_indicator: Option<String>,
}

#[derive(Debug, Default, Clone, Copy)]
struct PointerState {
    x: i64,
    y: i64,
}

/// What a post's media looked like before it was expanded.
#[derive(Debug, Clone)]
struct ExpansionSnapshot {
    thumb_expanded: Option<String>,
    thumb_style: Option<String>,
    file_style: Option<String>,
    file_children: Vec<NodeId>,
    reveal_timer: Option<i64>,
}

/// Owns one thread page: its document, a virtual clock and the fetcher used to
/// poll for replies.
///
/// Nothing happens until the host dispatches [`PageEvent::Load`]. Time only
/// moves through [`advance_time`](Self::advance_time) and friends, so every
/// poll, blink tick and reveal is deterministic.
pub struct PageController<F: PageFetcher = MockFetcher> {
    dom: Dom,
    location: PageLocation,
    config: PageConfig,
    patterns: PagePatterns,
    fetcher: F,
    scheduler: Scheduler,
    trace: TraceState,
    focus: FocusState,
    pointer: PointerState,
    quote_links: HashMap<NodeId, String>,
    previews: HashMap<NodeId, NodeId>,
    expansions: HashMap<String, ExpansionSnapshot>,
    active_element: Option<NodeId>,
    poll_timer: Option<i64>,
}

impl PageController<MockFetcher> {
    /// Builds a controller with an empty [`MockFetcher`], reading the host
    /// globals from the page's inline scripts.
    pub fn from_html(html: &str, href: &str) -> Result<Self> {
        Self::with_fetcher(html, href, MockFetcher::new())
    }
}

impl<F: PageFetcher> PageController<F> {
    pub fn with_fetcher(html: &str, href: &str, fetcher: F) -> Result<Self> {
        let dom = parse_html(html)?;
        let config = PageConfig::from_document(&dom)?;
        Self::build(dom, href, config, fetcher)
    }

    pub fn with_config(html: &str, href: &str, config: PageConfig, fetcher: F) -> Result<Self> {
        let dom = parse_html(html)?;
        Self::build(dom, href, config, fetcher)
    }

    fn build(dom: Dom, href: &str, config: PageConfig, fetcher: F) -> Result<Self> {
        config.validate()?;
        let location = PageLocation::parse(href)?;
        let mut scheduler = Scheduler::default();
        scheduler.set_timer_step_limit(config.timer_step_limit)?;
        let focus = FocusState {
            blinking: config.blink_title,
            ..FocusState::default()
        };

        Ok(Self {
            dom,
            location,
            config,
            patterns: PagePatterns::compile()?,
            fetcher,
            scheduler,
            trace: TraceState::default(),
            focus,
            pointer: PointerState::default(),
            quote_links: HashMap::new(),
            previews: HashMap::new(),
            expansions: HashMap::new(),
            active_element: None,
            poll_timer: None,
        })
    }

    /// Delivers one browser event. Returns whether the event's default action
    /// is still allowed; only expand and quote clicks ever suppress it.
    ///
    /// Handler failures go to the console log. An `Err` means the event itself
    /// was unusable, such as a pointer event aimed at a text node.
    pub fn dispatch(&mut self, event: PageEvent) -> Result<bool> {
        self.trace
            .line(TraceCategory::Event, format!("[event] {}", event.name()));

        match event {
            PageEvent::Load => {
                if let Err(err) = self.on_load() {
                    self.trace.console(format!("load handler failed: {err}"));
                }
                Ok(true)
            }
            PageEvent::Focus => {
                self.on_focus();
                Ok(true)
            }
            PageEvent::Blur => {
                self.on_blur();
                Ok(true)
            }
            PageEvent::PointerMove { x, y } => {
                self.pointer = PointerState { x, y };
                Ok(true)
            }
            PageEvent::PointerEnter(node) => {
                self.require_element(node)?;
                if let Err(err) = self.show_preview(node) {
                    self.trace.console(format!("preview failed: {err}"));
                }
                Ok(true)
            }
            PageEvent::PointerLeave(node) => {
                self.require_element(node)?;
                if let Err(err) = self.hide_preview(node) {
                    self.trace.console(format!("preview removal failed: {err}"));
                }
                Ok(true)
            }
            PageEvent::ExpandClick { post_id, button } => Ok(self.expand_file(&post_id, button)),
            PageEvent::QuoteClick { post_id } => Ok(self.quote_post(&post_id)),
        }
    }

    fn require_element(&self, node: NodeId) -> Result<()> {
        if self.dom.is_element(node) {
            Ok(())
        } else {
            Err(Error::Dom(format!("event target {node:?} is not an element")))
        }
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub fn location(&self) -> &PageLocation {
        &self.location
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn fetcher_mut(&mut self) -> &mut F {
        &mut self.fetcher
    }

    pub fn title(&self) -> String {
        self.dom.title()
    }

    pub fn have_focus(&self) -> bool {
        self.focus.have_focus
    }

    pub fn new_replies_count(&self) -> usize {
        self.focus.new_replies_count
    }

    pub fn is_blinking(&self) -> bool {
        self.focus.blinking
    }

    /// The title cached by the first blink tick, if one has run.
    pub fn original_title(&self) -> Option<&str> {
        self.focus.original_title.as_deref()
    }

    pub fn active_element(&self) -> Option<NodeId> {
        self.active_element
    }

    pub fn open_preview_count(&self) -> usize {
        self.previews
            .values()
            .filter(|preview| self.dom.is_connected(**preview))
            .count()
    }

    /// Ids of the live `.reply` elements in document order.
    pub fn reply_ids(&self) -> Vec<String> {
        self.dom
            .elements_by_class("reply")
            .into_iter()
            .filter_map(|node| self.dom.attr(node, "id"))
            .filter(|id| !id.is_empty())
            .collect()
    }

    pub fn now_ms(&self) -> i64 {
        self.scheduler.now_ms()
    }

    pub fn set_timer_step_limit(&mut self, max_steps: usize) -> Result<()> {
        self.scheduler.set_timer_step_limit(max_steps)
    }

    pub fn pending_timers(&self) -> Vec<PendingTimer> {
        self.scheduler.pending_timers()
    }

    pub fn clear_timer(&mut self, timer_id: i64) -> bool {
        let existed = self.scheduler.clear_timeout(timer_id) > 0;
        if self.poll_timer == Some(timer_id) {
            self.poll_timer = None;
        }
        if self.focus.blink_timer == Some(timer_id) {
            self.focus.blink_timer = None;
        }
        self.trace.line(
            TraceCategory::Timer,
            format!("[timer] clear id={timer_id} existed={existed}"),
        );
        existed
    }

    /// Moves the clock forward by `delta_ms`. Each due timer runs with the
    /// clock at its own due time, so timers rescheduled inside the window run
    /// too.
    pub fn advance_time(&mut self, delta_ms: i64) -> Result<()> {
        if delta_ms < 0 {
            return Err(Error::Timer(
                "advance_time requires non-negative milliseconds".into(),
            ));
        }
        let from = self.scheduler.now_ms();
        let target = from.saturating_add(delta_ms);
        let ran = self.run_timer_queue(Some(target), true)?;
        self.scheduler.set_now(target);
        self.trace.line(
            TraceCategory::Timer,
            format!(
                "[timer] advance delta_ms={delta_ms} from={from} to={} ran_due={ran}",
                self.scheduler.now_ms()
            ),
        );
        Ok(())
    }

    pub fn advance_time_to(&mut self, target_ms: i64) -> Result<()> {
        let from = self.scheduler.now_ms();
        if target_ms < from {
            return Err(Error::Timer(format!(
                "advance_time_to requires target >= now_ms (target={target_ms}, now_ms={from})"
            )));
        }
        let ran = self.run_timer_queue(Some(target_ms), true)?;
        self.scheduler.set_now(target_ms);
        self.trace.line(
            TraceCategory::Timer,
            format!("[timer] advance_to from={from} to={target_ms} ran_due={ran}"),
        );
        Ok(())
    }

    /// Runs timers until the queue is empty. With polling enabled the queue
    /// never drains, so this ends in the step-limit error.
    pub fn flush(&mut self) -> Result<()> {
        let from = self.scheduler.now_ms();
        let ran = self.run_timer_queue(None, true)?;
        self.trace.line(
            TraceCategory::Timer,
            format!(
                "[timer] flush from={from} to={} ran={ran}",
                self.scheduler.now_ms()
            ),
        );
        Ok(())
    }

    pub fn run_next_timer(&mut self) -> Result<bool> {
        let Some(task) = self.scheduler.pop_next(None, true) else {
            self.trace
                .line(TraceCategory::Timer, "[timer] run_next none".into());
            return Ok(false);
        };
        self.execute_timer_task(task)?;
        Ok(true)
    }

    pub fn run_next_due_timer(&mut self) -> Result<bool> {
        let now = self.scheduler.now_ms();
        let Some(task) = self.scheduler.pop_next(Some(now), false) else {
            self.trace
                .line(TraceCategory::Timer, "[timer] run_next_due none".into());
            return Ok(false);
        };
        self.execute_timer_task(task)?;
        Ok(true)
    }

    pub fn run_due_timers(&mut self) -> Result<usize> {
        let now = self.scheduler.now_ms();
        let ran = self.run_timer_queue(Some(now), false)?;
        self.trace.line(
            TraceCategory::Timer,
            format!("[timer] run_due now_ms={now} ran={ran}"),
        );
        Ok(ran)
    }

    fn run_timer_queue(&mut self, due_limit: Option<i64>, advance_clock: bool) -> Result<usize> {
        let limit = self.scheduler.timer_step_limit();
        let mut steps = 0usize;
        while self.scheduler.has_task(due_limit) {
            steps += 1;
            if steps > limit {
                return Err(self.scheduler.step_limit_error(steps, due_limit));
            }
            let Some(task) = self.scheduler.pop_next(due_limit, advance_clock) else {
                break;
            };
            self.execute_timer_task(task)?;
        }
        Ok(steps)
    }

    fn execute_timer_task(&mut self, scheduled: ScheduledTask) -> Result<()> {
        self.trace.line(
            TraceCategory::Timer,
            format!(
                "[timer] run id={} due_at={} task={:?}",
                scheduled.id, scheduled.due_at, scheduled.task
            ),
        );

        match scheduled.task {
            Task::RefreshReplies => {
                if self.poll_timer == Some(scheduled.id) {
                    self.poll_timer = None;
                }
                self.refresh_replies();
            }
            Task::BlinkTitle => {
                if self.focus.blink_timer == Some(scheduled.id) {
                    self.focus.blink_timer = None;
                }
                self.update_title();
            }
            Task::RevealExpanded { post_id } => {
                if let Err(err) = self.reveal_expanded(&post_id, scheduled.id) {
                    self.trace
                        .console(format!("Failed to reveal file {post_id}: {err}"));
                }
            }
        }
        Ok(())
    }

    fn schedule(&mut self, task: Task, delay_ms: i64) -> i64 {
        let scheduled = self.scheduler.schedule_timeout(task, delay_ms);
        self.trace.line(
            TraceCategory::Timer,
            format!(
                "[timer] schedule id={} due_at={} task={:?}",
                scheduled.id, scheduled.due_at, scheduled.task
            ),
        );
        scheduled.id
    }

    fn cancel(&mut self, timer_id: Option<i64>) {
        if let Some(timer_id) = timer_id {
            self.scheduler.clear_timeout(timer_id);
        }
    }

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace.enabled = enabled;
    }

    pub fn set_trace_events(&mut self, enabled: bool) {
        self.trace.events = enabled;
    }

    pub fn set_trace_timers(&mut self, enabled: bool) {
        self.trace.timers = enabled;
    }

    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace.to_stderr = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        self.trace.set_log_limit(max_entries)
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        self.trace.take_logs()
    }

    /// Lines the page would have written with `console.log`.
    pub fn take_console_logs(&mut self) -> Vec<String> {
        self.trace.take_console()
    }

    pub fn element_by_id(&self, id: &str) -> Result<NodeId> {
        self.dom
            .by_id(id)
            .ok_or_else(|| Error::ElementNotFound(id.to_string()))
    }

    pub fn text_of(&self, id: &str) -> Result<String> {
        let node = self.element_by_id(id)?;
        Ok(self.dom.text_content(node))
    }

    pub fn value_of(&self, id: &str) -> Result<String> {
        let node = self.element_by_id(id)?;
        self.dom.value(node)
    }

    pub fn dump_dom(&self) -> String {
        self.dom.dump_node(self.dom.root())
    }

    pub fn assert_text(&self, id: &str, expected: &str) -> Result<()> {
        let target = self.element_by_id(id)?;
        let actual = self.dom.text_content(target);
        if actual != expected {
            return Err(Error::AssertionFailed {
                id: id.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_value(&self, id: &str, expected: &str) -> Result<()> {
        let target = self.element_by_id(id)?;
        let actual = self.dom.value(target)?;
        if actual != expected {
            return Err(Error::AssertionFailed {
                id: id.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_exists(&self, id: &str) -> Result<()> {
        let _ = self.element_by_id(id)?;
        Ok(())
    }

    fn node_snippet(&self, node_id: NodeId) -> String {
        truncate_chars(&self.dom.dump_node(node_id), SNIPPET_CHARS)
    }
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    let mut chars = value.chars();
    let truncated: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{truncated}...")
    } else {
        truncated
    }
}
