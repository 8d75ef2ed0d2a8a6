use std::collections::VecDeque;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TraceCategory {
    Event,
    Timer,
    Poll,
}

/// Bounded trace buffer plus the console log. Trace lines are only kept while
/// tracing is enabled; console lines are always kept.
#[derive(Debug)]
pub(crate) struct TraceState {
    pub(crate) enabled: bool,
    pub(crate) events: bool,
    pub(crate) timers: bool,
    pub(crate) logs: VecDeque<String>,
    pub(crate) log_limit: usize,
    pub(crate) to_stderr: bool,
    pub(crate) console: Vec<String>,
}

impl Default for TraceState {
    fn default() -> Self {
        Self {
            enabled: false,
            events: true,
            timers: true,
            logs: VecDeque::new(),
            log_limit: 10_000,
            to_stderr: false,
            console: Vec::new(),
        }
    }
}

impl TraceState {
    pub(crate) fn set_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::InvalidSetting(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.log_limit = max_entries;
        while self.logs.len() > self.log_limit {
            self.logs.pop_front();
        }
        Ok(())
    }

    pub(crate) fn line(&mut self, category: TraceCategory, line: String) {
        let wanted = match category {
            TraceCategory::Event => self.events,
            TraceCategory::Timer => self.timers,
            TraceCategory::Poll => true,
        };
        if !self.enabled || !wanted {
            return;
        }

        tracing::debug!(target: "thread_page::trace", "{line}");
        if self.to_stderr {
            eprintln!("{line}");
        }
        if self.logs.len() >= self.log_limit {
            self.logs.pop_front();
        }
        self.logs.push_back(line);
    }

    pub(crate) fn console(&mut self, line: String) {
        tracing::warn!(target: "thread_page::console", "{line}");
        self.console.push(line);
    }

    pub(crate) fn take_logs(&mut self) -> Vec<String> {
        self.logs.drain(..).collect()
    }

    pub(crate) fn take_console(&mut self) -> Vec<String> {
        std::mem::take(&mut self.console)
    }
}
