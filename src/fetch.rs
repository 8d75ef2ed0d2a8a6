use std::collections::{HashMap, VecDeque};

use crate::error::{Error, Result};

/// Source of page bodies for the reply poller. A plain GET of `url` that
/// yields the response text.
pub trait PageFetcher {
    fn fetch(&mut self, url: &str) -> Result<String>;
}

impl<F> PageFetcher for F
where
    F: FnMut(&str) -> Result<String>,
{
    fn fetch(&mut self, url: &str) -> Result<String> {
        self(url)
    }
}

/// Canned responses keyed by URL. One-shot responses queued with
/// [`MockFetcher::enqueue_response`] or [`MockFetcher::enqueue_failure`] are
/// served first; the standing response from [`MockFetcher::set_response`]
/// answers everything else.
#[derive(Debug, Default)]
pub struct MockFetcher {
    responses: HashMap<String, String>,
    queued: HashMap<String, VecDeque<std::result::Result<String, String>>>,
    calls: Vec<String>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_response(&mut self, url: &str, body: &str) {
        self.responses.insert(url.to_string(), body.to_string());
    }

    pub fn enqueue_response(&mut self, url: &str, body: &str) {
        self.queued
            .entry(url.to_string())
            .or_default()
            .push_back(Ok(body.to_string()));
    }

    pub fn enqueue_failure(&mut self, url: &str, reason: &str) {
        self.queued
            .entry(url.to_string())
            .or_default()
            .push_back(Err(reason.to_string()));
    }

    pub fn clear(&mut self) {
        self.responses.clear();
        self.queued.clear();
    }

    pub fn take_calls(&mut self) -> Vec<String> {
        std::mem::take(&mut self.calls)
    }
}

impl PageFetcher for MockFetcher {
    fn fetch(&mut self, url: &str) -> Result<String> {
        self.calls.push(url.to_string());

        if let Some(next) = self.queued.get_mut(url).and_then(VecDeque::pop_front) {
            return next.map_err(|reason| Error::Fetch {
                url: url.to_string(),
                reason,
            });
        }

        self.responses.get(url).cloned().ok_or_else(|| Error::Fetch {
            url: url.to_string(),
            reason: "no mock response registered".into(),
        })
    }
}
