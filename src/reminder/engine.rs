//! Reminder engine: scheduling, due checks and the fire transition.
//!
//! `tick` looks for the earliest due reminder and claims the single
//! in-flight slot only when one is found. The reminder is spoken on a
//! spawned task, then re-located by id before it is advanced. A reminder
//! deleted while it is being spoken is simply not found again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::book::{Advance, ReminderBook, TaskList};
use super::store::{TaskStore, COMPLETED_KEY, PENDING_KEY};
use super::task::{compose_message, resolve_due_time, Task, TaskDraft};
use crate::error::Result;
use crate::notifier::Alert;
use crate::speech::{SpeechError, Speaker};

const ALERT_SUMMARY: &str = "Reminder";

pub struct ReminderEngine {
    book: Mutex<ReminderBook>,
    in_flight: AtomicBool,
    store: TaskStore,
    speaker: Arc<dyn Speaker>,
    alert: Arc<dyn Alert>,
}

/// Releases the in-flight slot when the fire transition ends, even if the
/// speaker panicked.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ReminderEngine {
    /// Load both collections from `store` and reconcile them.
    pub fn open(store: TaskStore, speaker: Arc<dyn Speaker>, alert: Arc<dyn Alert>) -> Self {
        let book = ReminderBook::restore(store.load(PENDING_KEY), store.load(COMPLETED_KEY));
        info!(
            "Loaded {} pending and {} completed reminders from {}",
            book.pending().len(),
            book.completed().len(),
            store.dir().display()
        );

        Self {
            book: Mutex::new(book),
            in_flight: AtomicBool::new(false),
            store,
            speaker,
            alert,
        }
    }

    fn book(&self) -> MutexGuard<'_, ReminderBook> {
        self.book.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn pending(&self) -> Vec<Task> {
        self.book().pending().to_vec()
    }

    pub fn completed(&self) -> Vec<Task> {
        self.book().completed().to_vec()
    }

    /// True while a reminder is being spoken.
    pub fn is_speaking(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Create a reminder at the next occurrence of the draft's time of day.
    pub fn schedule(&self, draft: TaskDraft, now: DateTime<Local>) -> Result<Task> {
        let task = Task {
            id: uuid::Uuid::new_v4().to_string(),
            text: draft.text,
            time: resolve_due_time(now, draft.time_of_day),
            total_repeats: draft.repeat_count,
            repeats_left: draft.repeat_count,
            repeat_interval: draft.repeat_interval,
        };

        let mut book = self.book();
        book.insert(task.clone())?;
        self.persist(&book, TaskList::Pending);

        info!("Scheduled reminder {} at {}", task.id, task.time);
        Ok(task)
    }

    /// Edit a pending reminder. Its repeat counter starts over.
    pub fn reschedule(&self, id: &str, draft: TaskDraft, now: DateTime<Local>) -> Result<Task> {
        let time = resolve_due_time(now, draft.time_of_day);

        let mut book = self.book();
        let task = book.update(
            id,
            &draft.text,
            time,
            draft.repeat_count,
            draft.repeat_interval,
        )?;
        self.persist(&book, TaskList::Pending);

        info!("Rescheduled reminder {id} to {time}");
        Ok(task)
    }

    /// Remove a reminder from `list`. Unknown ids are ignored.
    pub fn delete(&self, id: &str, list: TaskList) {
        let mut book = self.book();
        if book.remove(list, id).is_some() {
            self.persist(&book, list);
            info!("Deleted reminder {id} from {list:?}");
        } else {
            debug!("Reminder {id} not in {list:?}, nothing to delete");
        }
    }

    /// Periodic due check.
    ///
    /// Returns the handle of the spawned fire transition, or `None` when
    /// nothing is due or a reminder is already being spoken. Must be called
    /// inside a tokio runtime.
    pub fn tick(self: &Arc<Self>, now: DateTime<Utc>) -> Option<JoinHandle<()>> {
        if self.is_speaking() {
            return None;
        }

        let task = self.book().next_due(now).cloned()?;

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return None;
        }

        let engine = Arc::clone(self);
        Some(tokio::spawn(async move {
            let _in_flight = InFlight(&engine.in_flight);
            engine.fire(task).await;
        }))
    }

    async fn fire(&self, task: Task) {
        let message = compose_message(&task);
        info!(
            "Reminder {} due ({} of {} left): \"{}\"",
            task.id, task.repeats_left, task.total_repeats, task.text
        );

        // A panicking speaker counts as a failed speech attempt
        let speaker = Arc::clone(&self.speaker);
        let spoken = message.clone();
        let result = tokio::spawn(async move { speaker.speak(&spoken).await })
            .await
            .unwrap_or_else(|e| Err(SpeechError::Task(e.to_string())));

        if let Err(e) = result {
            warn!("Could not speak reminder {}: {e}", task.id);
            self.alert.alert(ALERT_SUMMARY, &message);
        }

        // The collections may have changed while we were speaking
        let mut book = self.book();
        match book.advance(&task.id) {
            Some(Advance::Rescheduled(next)) => {
                info!(
                    "Reminder {} repeats at {} ({} left)",
                    next.id, next.time, next.repeats_left
                );
                self.persist(&book, TaskList::Pending);
            }
            Some(Advance::Completed(done)) => {
                info!("Reminder {} completed", done.id);
                self.persist(&book, TaskList::Pending);
                self.persist(&book, TaskList::Completed);
            }
            None => debug!("Reminder {} was deleted while speaking", task.id),
        }
    }

    fn persist(&self, book: &ReminderBook, list: TaskList) {
        let key = match list {
            TaskList::Pending => PENDING_KEY,
            TaskList::Completed => COMPLETED_KEY,
        };
        if let Err(e) = self.store.save(key, book.list(list)) {
            error!("Failed to save {key}: {e}");
        }
    }
}
