use std::collections::BTreeMap;

use super::PageController;
use crate::dom::{Dom, NodeId};
use crate::error::Result;
use crate::fetch::PageFetcher;
use crate::html::parse_html;
use crate::scheduler::Task;
use crate::trace::TraceCategory;

/// The replies' tables sit four levels below their container:
/// container > table > tbody > tr > td.reply
const REPLY_CONTAINER_DEPTH: usize = 4;
const DOUBLEDASH: &str = "\u{A8}";

impl<F: PageFetcher> PageController<F> {
    /// Runs one poll cycle: refetch the page, append replies the live document
    /// does not have yet, then schedule the next cycle. Returns how many
    /// replies were appended. Failures are logged and count as zero.
    pub fn refresh_replies(&mut self) -> usize {
        let appended = match self.merge_new_replies() {
            Ok(appended) => appended,
            Err(err) => {
                self.trace
                    .console(format!("Failed to refresh thread: {err}"));
                0
            }
        };
        self.schedule_refresh();
        appended
    }

    pub(super) fn schedule_refresh(&mut self) {
        let Some(delay_ms) = self.config.refresh_delay_ms() else {
            return;
        };
        let previous = self.poll_timer.take();
        self.cancel(previous);
        self.poll_timer = Some(self.schedule(Task::RefreshReplies, delay_ms));
    }

    fn merge_new_replies(&mut self) -> Result<usize> {
        let url = self.location.request_url();
        self.trace
            .line(TraceCategory::Poll, format!("[poll] fetch url={url}"));
        let body = self.fetcher.fetch(&url)?;

        let Some(container) = self.reply_container() else {
            self.trace
                .line(TraceCategory::Poll, "[poll] no reply container".into());
            return Ok(0);
        };

        let fetched = parse_html(&body)?;
        let mut tables = Vec::new();
        for reply in fetched.elements_by_class("reply") {
            let Some(id) = fetched.attr(reply, "id").filter(|id| !id.is_empty()) else {
                continue;
            };
            if self.dom.by_id(&id).is_some() {
                continue;
            }
            tables.push(self.append_reply(container, &fetched, reply)?);
            self.trace
                .line(TraceCategory::Poll, format!("[poll] appended id={id}"));
        }

        if tables.is_empty() {
            return Ok(0);
        }
        for table in &tables {
            self.bind_post_attributes(*table)?;
        }
        if !self.focus.have_focus {
            self.focus.new_replies_count += tables.len();
            self.start_blinking();
        }
        Ok(tables.len())
    }

    /// Parent of the last reply's table, or the original post's parent when
    /// the thread has no replies yet.
    fn reply_container(&self) -> Option<NodeId> {
        if let Some(last_reply) = self.dom.elements_by_class("reply").last() {
            return self.dom.ancestor(*last_reply, REPLY_CONTAINER_DEPTH);
        }
        let op = self.dom.elements_by_class("op").into_iter().next()?;
        self.dom.ancestor(op, 1)
    }

    fn append_reply(&mut self, container: NodeId, fetched: &Dom, reply: NodeId) -> Result<NodeId> {
        let table = self.dom.create_element(container, "table", BTreeMap::new());
        let tbody = self.dom.create_element(table, "tbody", BTreeMap::new());
        let row = self.dom.create_element(tbody, "tr", BTreeMap::new());

        let mut marker_attrs = BTreeMap::new();
        marker_attrs.insert("class".to_string(), "doubledash".to_string());
        let marker = self.dom.create_element(row, "td", marker_attrs);
        self.dom.create_text(marker, DOUBLEDASH);

        self.dom.import_subtree(fetched, reply, row, false)?;
        Ok(table)
    }
}
