//! Pending and completed reminder collections.
//!
//! Pure state with no I/O. The engine wraps a `ReminderBook` in a mutex and
//! mirrors every change to storage.

use chrono::{DateTime, Utc};

use super::task::Task;
use crate::error::{ReminderError, Result};

/// Which collection an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskList {
    Pending,
    Completed,
}

/// Outcome of advancing a task after it fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Task stays pending at its next occurrence.
    Rescheduled(Task),
    /// Last repeat fired; task moved to the completed list.
    Completed(Task),
}

#[derive(Debug, Clone, Default)]
pub struct ReminderBook {
    /// Sorted ascending by `time`.
    pending: Vec<Task>,
    /// Most recently completed first.
    completed: Vec<Task>,
}

impl ReminderBook {
    /// Rebuild a book from stored collections, repairing anything that
    /// breaks the collection invariants.
    pub fn restore(pending: Vec<Task>, completed: Vec<Task>) -> Self {
        let mut book = Self {
            pending: Vec::with_capacity(pending.len()),
            completed,
        };

        let mut finished = Vec::new();
        for mut task in pending {
            task.repeats_left = task.repeats_left.min(task.total_repeats);
            if task.repeats_left == 0 {
                finished.push(task);
            } else {
                book.pending.push(task);
            }
        }

        if !finished.is_empty() {
            tracing::warn!(
                "{} stored pending reminder(s) had no repeats left, moving to completed",
                finished.len()
            );
            finished.extend(book.completed.drain(..));
            book.completed = finished;
        }

        for task in &mut book.completed {
            task.repeats_left = 0;
        }

        book.sort_pending();
        book
    }

    pub fn pending(&self) -> &[Task] {
        &self.pending
    }

    pub fn completed(&self) -> &[Task] {
        &self.completed
    }

    pub fn list(&self, list: TaskList) -> &[Task] {
        match list {
            TaskList::Pending => &self.pending,
            TaskList::Completed => &self.completed,
        }
    }

    /// True when a pending task other than `except` is due at exactly `time`.
    pub fn has_time_conflict(&self, time: DateTime<Utc>, except: Option<&str>) -> bool {
        self.pending
            .iter()
            .any(|t| t.time == time && Some(t.id.as_str()) != except)
    }

    /// Insert a new pending task, rejecting a time collision.
    pub fn insert(&mut self, task: Task) -> Result<()> {
        if self.has_time_conflict(task.time, None) {
            return Err(ReminderError::DuplicateTime(task.time));
        }
        self.pending.push(task);
        self.sort_pending();
        Ok(())
    }

    /// Replace the schedule of an existing pending task. The repeat counter
    /// restarts from `repeat_count`.
    pub fn update(
        &mut self,
        id: &str,
        text: &str,
        time: DateTime<Utc>,
        repeat_count: u32,
        repeat_interval: u64,
    ) -> Result<Task> {
        if self.has_time_conflict(time, Some(id)) {
            return Err(ReminderError::DuplicateTime(time));
        }

        let task = self
            .pending
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| ReminderError::NotFound(id.to_string()))?;

        task.text = text.to_string();
        task.time = time;
        task.total_repeats = repeat_count;
        task.repeats_left = repeat_count;
        task.repeat_interval = repeat_interval;
        let updated = task.clone();

        self.sort_pending();
        Ok(updated)
    }

    /// Remove a task from one collection. Absent ids return `None`.
    pub fn remove(&mut self, list: TaskList, id: &str) -> Option<Task> {
        let tasks = match list {
            TaskList::Pending => &mut self.pending,
            TaskList::Completed => &mut self.completed,
        };
        let index = tasks.iter().position(|t| t.id == id)?;
        Some(tasks.remove(index))
    }

    /// Earliest pending task that is due at `now`.
    pub fn next_due(&self, now: DateTime<Utc>) -> Option<&Task> {
        self.pending.iter().find(|t| t.is_due(now))
    }

    /// Count one firing of `id`. Returns `None` when the task is no longer
    /// pending (deleted while it was being spoken).
    pub fn advance(&mut self, id: &str) -> Option<Advance> {
        let index = self.pending.iter().position(|t| t.id == id)?;

        let task = &mut self.pending[index];
        task.repeats_left = task.repeats_left.saturating_sub(1);

        if task.repeats_left > 0 {
            task.time = task.next_occurrence();
            let next = task.clone();
            self.sort_pending();
            return Some(Advance::Rescheduled(next));
        }

        let mut done = self.pending.remove(index);
        done.repeats_left = 0;
        self.completed.insert(0, done.clone());
        Some(Advance::Completed(done))
    }

    fn sort_pending(&mut self) {
        self.pending.sort_by_key(|t| t.time);
    }
}
