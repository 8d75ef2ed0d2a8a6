use crate::error::{Error, Result};

/// Work the controller can schedule on its virtual clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    RefreshReplies,
    BlinkTitle,
    RevealExpanded { post_id: String },
}

#[derive(Debug, Clone)]
pub(crate) struct ScheduledTask {
    pub(crate) id: i64,
    pub(crate) due_at: i64,
    pub(crate) order: i64,
    pub(crate) task: Task,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTimer {
    pub id: i64,
    pub due_at: i64,
    pub order: i64,
    pub task: Task,
}

/// Timer queue over a virtual millisecond clock. Ties on `due_at` run in
/// scheduling order.
#[derive(Debug)]
pub(crate) struct Scheduler {
    task_queue: Vec<ScheduledTask>,
    now_ms: i64,
    timer_step_limit: usize,
    next_timer_id: i64,
    next_task_order: i64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            task_queue: Vec::new(),
            now_ms: 0,
            timer_step_limit: 10_000,
            next_timer_id: 1,
            next_task_order: 0,
        }
    }
}

impl Scheduler {
    pub(crate) fn now_ms(&self) -> i64 {
        self.now_ms
    }

    pub(crate) fn timer_step_limit(&self) -> usize {
        self.timer_step_limit
    }

    pub(crate) fn set_timer_step_limit(&mut self, max_steps: usize) -> Result<()> {
        if max_steps == 0 {
            return Err(Error::Timer(
                "set_timer_step_limit requires at least 1 step".into(),
            ));
        }
        self.timer_step_limit = max_steps;
        Ok(())
    }

    pub(crate) fn schedule_timeout(&mut self, task: Task, delay_ms: i64) -> ScheduledTask {
        let delay_ms = delay_ms.max(0);
        let due_at = self.now_ms.saturating_add(delay_ms);
        let id = self.next_timer_id;
        self.next_timer_id += 1;
        let order = self.next_task_order;
        self.next_task_order += 1;
        let scheduled = ScheduledTask {
            id,
            due_at,
            order,
            task,
        };
        self.task_queue.push(scheduled.clone());
        scheduled
    }

    /// Returns how many queued tasks were removed.
    pub(crate) fn clear_timeout(&mut self, id: i64) -> usize {
        let before = self.task_queue.len();
        self.task_queue.retain(|task| task.id != id);
        before.saturating_sub(self.task_queue.len())
    }

    pub(crate) fn is_pending(&self, id: i64) -> bool {
        self.task_queue.iter().any(|task| task.id == id)
    }

    pub(crate) fn pending_timers(&self) -> Vec<PendingTimer> {
        let mut timers = self
            .task_queue
            .iter()
            .map(|task| PendingTimer {
                id: task.id,
                due_at: task.due_at,
                order: task.order,
                task: task.task.clone(),
            })
            .collect::<Vec<_>>();
        timers.sort_by_key(|timer| (timer.due_at, timer.order));
        timers
    }

    pub(crate) fn set_now(&mut self, now_ms: i64) {
        self.now_ms = now_ms;
    }

    /// Removes the next task due at or before `due_limit` (any task when
    /// `None`). With `advance_clock` the clock jumps forward to its due time.
    pub(crate) fn pop_next(
        &mut self,
        due_limit: Option<i64>,
        advance_clock: bool,
    ) -> Option<ScheduledTask> {
        let idx = self.next_task_index(due_limit)?;
        let task = self.task_queue.remove(idx);
        if advance_clock && task.due_at > self.now_ms {
            self.now_ms = task.due_at;
        }
        Some(task)
    }

    pub(crate) fn has_task(&self, due_limit: Option<i64>) -> bool {
        self.next_task_index(due_limit).is_some()
    }

    fn next_task_index(&self, due_limit: Option<i64>) -> Option<usize> {
        self.task_queue
            .iter()
            .enumerate()
            .filter(|(_, task)| due_limit.is_none_or(|limit| task.due_at <= limit))
            .min_by_key(|(_, task)| (task.due_at, task.order))
            .map(|(idx, _)| idx)
    }

    pub(crate) fn step_limit_error(&self, steps: usize, due_limit: Option<i64>) -> Error {
        let due_limit_desc = due_limit
            .map(|value| value.to_string())
            .unwrap_or_else(|| "none".into());

        let next_task_desc = self
            .next_task_index(due_limit)
            .and_then(|idx| self.task_queue.get(idx))
            .map(|task| {
                format!(
                    "id={},due_at={},order={},task={:?}",
                    task.id, task.due_at, task.order, task.task
                )
            })
            .unwrap_or_else(|| "none".into());

        Error::Timer(format!(
            "timer queue exceeded max task steps (possible self-rescheduling poll): limit={}, steps={steps}, now_ms={}, due_limit={}, pending_tasks={}, next_task={}",
            self.timer_step_limit,
            self.now_ms,
            due_limit_desc,
            self.task_queue.len(),
            next_task_desc
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_next_orders_by_due_time_then_schedule_order() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule_timeout(Task::RefreshReplies, 10);
        scheduler.schedule_timeout(Task::BlinkTitle, 5);
        scheduler.schedule_timeout(
            Task::RevealExpanded {
                post_id: "3".into(),
            },
            5,
        );

        let first = scheduler.pop_next(None, true).map(|task| task.task);
        assert_eq!(first, Some(Task::BlinkTitle));
        assert_eq!(scheduler.now_ms(), 5);

        let second = scheduler.pop_next(None, true).map(|task| task.task);
        assert_eq!(
            second,
            Some(Task::RevealExpanded {
                post_id: "3".into()
            })
        );

        assert!(scheduler.pop_next(Some(9), false).is_none());
        let third = scheduler.pop_next(Some(10), false).map(|task| task.task);
        assert_eq!(third, Some(Task::RefreshReplies));
    }

    #[test]
    fn clear_timeout_removes_only_the_matching_task() {
        let mut scheduler = Scheduler::default();
        let keep = scheduler.schedule_timeout(Task::RefreshReplies, 1000);
        let drop = scheduler.schedule_timeout(Task::BlinkTitle, 2000);

        assert_eq!(scheduler.clear_timeout(drop.id), 1);
        assert_eq!(scheduler.clear_timeout(drop.id), 0);
        assert!(scheduler.is_pending(keep.id));
        assert_eq!(scheduler.pending_timers().len(), 1);
    }

    #[test]
    fn negative_delay_is_clamped_to_now() {
        let mut scheduler = Scheduler::default();
        scheduler.set_now(50);
        let task = scheduler.schedule_timeout(Task::BlinkTitle, -20);
        assert_eq!(task.due_at, 50);
    }

    #[test]
    fn zero_step_limit_is_rejected() {
        let mut scheduler = Scheduler::default();
        let err = scheduler
            .set_timer_step_limit(0)
            .expect_err("zero steps should fail");
        assert_eq!(
            err,
            Error::Timer("set_timer_step_limit requires at least 1 step".into())
        );
    }
}
