//! Integration tests for the reminder engine
//!
//! These tests drive the engine the way the service loop does:
//! - scheduling and editing with time collisions
//! - repeat cycles and completion
//! - single-flight firing and deletion while speaking
//! - a crashing speaker falling back to the alert
//! - reloading persisted state

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use tempfile::TempDir;
use tokio::sync::Notify;

use voice_reminder::error::ReminderError;
use voice_reminder::notifier::Alert;
use voice_reminder::reminder::{ReminderEngine, TaskDraft, TaskList, TaskStore};
use voice_reminder::speech::{SpeechError, Speaker};

/// Records messages and either succeeds or fails immediately.
#[derive(Default)]
struct ScriptedSpeaker {
    fail: bool,
    spoken: Mutex<Vec<String>>,
}

#[async_trait]
impl Speaker for ScriptedSpeaker {
    async fn speak(&self, message: &str) -> Result<(), SpeechError> {
        self.spoken.lock().unwrap().push(message.to_string());
        if self.fail {
            Err(SpeechError::Playback("no audio device".into()))
        } else {
            Ok(())
        }
    }
}

/// Blocks inside `speak` until the test releases it.
#[derive(Default)]
struct GatedSpeaker {
    started: Notify,
    release: Notify,
    calls: AtomicUsize,
}

#[async_trait]
impl Speaker for GatedSpeaker {
    async fn speak(&self, _message: &str) -> Result<(), SpeechError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        self.release.notified().await;
        Ok(())
    }
}

/// Panics instead of speaking.
struct PanickingSpeaker;

#[async_trait]
impl Speaker for PanickingSpeaker {
    async fn speak(&self, _message: &str) -> Result<(), SpeechError> {
        panic!("audio backend crashed");
    }
}

#[derive(Default)]
struct RecordingAlert {
    alerts: Mutex<Vec<String>>,
}

impl Alert for RecordingAlert {
    fn alert(&self, _summary: &str, body: &str) {
        self.alerts.lock().unwrap().push(body.to_string());
    }
}

fn morning() -> DateTime<Local> {
    Local.with_ymd_and_hms(2026, 1, 15, 8, 0, 0).unwrap()
}

fn local_utc(h: u32, m: u32) -> DateTime<Utc> {
    Local
        .with_ymd_and_hms(2026, 1, 15, h, m, 0)
        .unwrap()
        .with_timezone(&Utc)
}

fn draft(text: &str, time: &str, repeats: u32, interval: u64) -> TaskDraft {
    TaskDraft::new(text, time, repeats, interval).unwrap()
}

fn open_engine(
    dir: &TempDir,
    speaker: Arc<dyn Speaker>,
    alert: Arc<RecordingAlert>,
) -> Arc<ReminderEngine> {
    Arc::new(ReminderEngine::open(TaskStore::new(dir.path()), speaker, alert))
}

#[tokio::test]
async fn test_schedule_rejects_time_collision() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(
        &temp,
        Arc::new(ScriptedSpeaker::default()),
        Arc::new(RecordingAlert::default()),
    );

    let tea = engine.schedule(draft("tea", "10:00", 1, 5), morning()).unwrap();
    let err = engine
        .schedule(draft("coffee", "10:00", 1, 5), morning())
        .unwrap_err();
    assert!(matches!(err, ReminderError::DuplicateTime(t) if t == tea.time));

    engine.schedule(draft("lunch", "12:30", 1, 5), morning()).unwrap();
    engine.schedule(draft("walk", "09:00", 1, 5), morning()).unwrap();

    let times: Vec<_> = engine.pending().iter().map(|t| t.time).collect();
    let mut sorted = times.clone();
    sorted.sort();
    assert_eq!(times, sorted);
    assert_eq!(engine.pending().len(), 3);
}

#[tokio::test]
async fn test_schedule_past_time_rolls_to_tomorrow() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(
        &temp,
        Arc::new(ScriptedSpeaker::default()),
        Arc::new(RecordingAlert::default()),
    );

    let task = engine.schedule(draft("early", "07:30", 1, 5), morning()).unwrap();
    assert_eq!(task.time, local_utc(7, 30) + Duration::days(1));
}

#[tokio::test]
async fn test_reschedule_collision_rules() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(
        &temp,
        Arc::new(ScriptedSpeaker::default()),
        Arc::new(RecordingAlert::default()),
    );

    let a = engine.schedule(draft("a", "09:00", 1, 5), morning()).unwrap();
    let b = engine.schedule(draft("b", "10:00", 1, 5), morning()).unwrap();

    let err = engine
        .reschedule(&b.id, draft("b", "09:00", 1, 5), morning())
        .unwrap_err();
    assert!(matches!(err, ReminderError::DuplicateTime(_)));
    assert_eq!(engine.pending()[1].time, b.time);

    let same = engine
        .reschedule(&a.id, draft("a again", "09:00", 3, 30), morning())
        .unwrap();
    assert_eq!(same.time, a.time);
    assert_eq!(same.total_repeats, 3);
    assert_eq!(same.repeats_left, 3);
    assert_eq!(same.repeat_interval, 30);

    let err = engine
        .reschedule("missing", draft("x", "11:00", 1, 5), morning())
        .unwrap_err();
    assert!(matches!(err, ReminderError::NotFound(_)));
}

#[tokio::test]
async fn test_repeat_cycles_then_completes() {
    let temp = TempDir::new().unwrap();
    let speaker = Arc::new(ScriptedSpeaker::default());
    let engine = open_engine(&temp, speaker.clone(), Arc::new(RecordingAlert::default()));

    let task = engine.schedule(draft("stretch", "09:00", 3, 5), morning()).unwrap();
    let due = task.time;

    assert!(engine.tick(due - Duration::seconds(1)).is_none());

    engine.tick(due).unwrap().await.unwrap();
    let pending = engine.pending();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].repeats_left, 2);
    assert_eq!(pending[0].time, due + Duration::seconds(5));

    // Not due again until the interval has passed
    assert!(engine.tick(due + Duration::seconds(4)).is_none());

    engine.tick(due + Duration::seconds(5)).unwrap().await.unwrap();
    assert_eq!(engine.pending()[0].repeats_left, 1);

    engine.tick(due + Duration::seconds(10)).unwrap().await.unwrap();
    assert!(engine.pending().is_empty());

    let completed = engine.completed();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].id, task.id);
    assert_eq!(completed[0].repeats_left, 0);
    assert_eq!(completed[0].total_repeats, 3);

    let spoken = speaker.spoken.lock().unwrap();
    assert_eq!(spoken.len(), 3);
    assert!(spoken[0].starts_with("It's time to stretch."));
}

#[tokio::test]
async fn test_speech_failure_falls_back_and_still_advances() {
    let temp = TempDir::new().unwrap();
    let speaker = Arc::new(ScriptedSpeaker {
        fail: true,
        ..ScriptedSpeaker::default()
    });
    let alert = Arc::new(RecordingAlert::default());
    let engine = open_engine(&temp, speaker, alert.clone());

    let task = engine.schedule(draft("call mom", "09:00", 1, 5), morning()).unwrap();
    engine.tick(task.time).unwrap().await.unwrap();

    let alerts = alert.alerts.lock().unwrap();
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].starts_with("It's time to call mom."));
    assert!(engine.pending().is_empty());
    assert_eq!(engine.completed().len(), 1);
    assert!(!engine.is_speaking());
}

#[tokio::test]
async fn test_speaker_panic_falls_back_and_unblocks_later_reminders() {
    let temp = TempDir::new().unwrap();
    let alert = Arc::new(RecordingAlert::default());
    let engine = open_engine(&temp, Arc::new(PanickingSpeaker), alert.clone());

    let a = engine.schedule(draft("a", "09:00", 1, 5), morning()).unwrap();
    let b = engine.schedule(draft("b", "09:05", 1, 5), morning()).unwrap();

    engine.tick(b.time).unwrap().await.unwrap();
    assert_eq!(engine.pending(), vec![b.clone()]);
    assert_eq!(engine.completed()[0].id, a.id);
    assert!(!engine.is_speaking());

    engine.tick(b.time).unwrap().await.unwrap();
    assert!(engine.pending().is_empty());
    assert_eq!(engine.completed()[0].id, b.id);

    assert!(engine.tick(b.time).is_none());
    let alerts = alert.alerts.lock().unwrap();
    assert_eq!(alerts.len(), 2);
    assert!(alerts[0].starts_with("It's time to a."));
    assert!(alerts[1].starts_with("It's time to b."));
}

#[tokio::test]
async fn test_idle_tick_never_reports_speaking() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(
        &temp,
        Arc::new(ScriptedSpeaker::default()),
        Arc::new(RecordingAlert::default()),
    );
    let task = engine.schedule(draft("tea", "09:00", 1, 5), morning()).unwrap();
    let before = task.time - Duration::minutes(1);

    let stop = Arc::new(AtomicBool::new(false));
    let watcher = {
        let engine = engine.clone();
        let stop = stop.clone();
        std::thread::spawn(move || {
            let mut seen = false;
            while !stop.load(Ordering::Acquire) {
                seen |= engine.is_speaking();
            }
            seen
        })
    };

    for _ in 0..20_000 {
        assert!(engine.tick(before).is_none());
    }
    stop.store(true, Ordering::Release);
    assert!(!watcher.join().unwrap());

    // The reminder still fires once it is due
    engine.tick(task.time).unwrap().await.unwrap();
    assert_eq!(engine.completed()[0].id, task.id);
}

#[tokio::test]
async fn test_single_flight_picks_earliest_due() {
    let temp = TempDir::new().unwrap();
    let speaker = Arc::new(GatedSpeaker::default());
    let engine = open_engine(&temp, speaker.clone(), Arc::new(RecordingAlert::default()));

    let late = engine.schedule(draft("late", "09:30", 1, 5), morning()).unwrap();
    let early = engine.schedule(draft("early", "09:00", 1, 5), morning()).unwrap();
    let now = local_utc(10, 0);

    let handle = engine.tick(now).unwrap();
    speaker.started.notified().await;
    assert!(engine.is_speaking());

    // Both are due, but only one transition may run
    assert!(engine.tick(now).is_none());
    assert!(engine.tick(now).is_none());
    assert_eq!(speaker.calls.load(Ordering::SeqCst), 1);

    speaker.release.notify_one();
    handle.await.unwrap();

    assert_eq!(engine.completed()[0].id, early.id);
    assert_eq!(engine.pending()[0].id, late.id);
    assert!(!engine.is_speaking());

    let handle = engine.tick(now).unwrap();
    speaker.started.notified().await;
    speaker.release.notify_one();
    handle.await.unwrap();
    assert!(engine.pending().is_empty());
    assert_eq!(engine.completed()[0].id, late.id);
}

#[tokio::test]
async fn test_delete_while_speaking_leaves_no_ghost() {
    let temp = TempDir::new().unwrap();
    let speaker = Arc::new(GatedSpeaker::default());
    let engine = open_engine(&temp, speaker.clone(), Arc::new(RecordingAlert::default()));

    let task = engine.schedule(draft("laundry", "09:00", 2, 5), morning()).unwrap();

    let handle = engine.tick(task.time).unwrap();
    speaker.started.notified().await;
    engine.delete(&task.id, TaskList::Pending);

    speaker.release.notify_one();
    handle.await.unwrap();

    assert!(engine.pending().is_empty());
    assert!(engine.completed().is_empty());

    // Nothing comes back after a reload either
    drop(engine);
    let reopened = open_engine(
        &temp,
        Arc::new(ScriptedSpeaker::default()),
        Arc::new(RecordingAlert::default()),
    );
    assert!(reopened.pending().is_empty());
    assert!(reopened.completed().is_empty());
}

#[tokio::test]
async fn test_delete_unknown_id_is_noop() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(
        &temp,
        Arc::new(ScriptedSpeaker::default()),
        Arc::new(RecordingAlert::default()),
    );

    let task = engine.schedule(draft("tea", "09:00", 1, 5), morning()).unwrap();
    engine.tick(task.time).unwrap().await.unwrap();
    let other = engine.schedule(draft("coffee", "09:15", 1, 5), morning()).unwrap();

    engine.delete("nope", TaskList::Pending);
    engine.delete("nope", TaskList::Completed);
    engine.delete(&other.id, TaskList::Completed);
    engine.delete(&task.id, TaskList::Pending);

    assert_eq!(engine.pending(), vec![other]);
    assert_eq!(engine.completed().len(), 1);

    engine.delete(&task.id, TaskList::Completed);
    engine.delete(&task.id, TaskList::Completed);
    assert!(engine.completed().is_empty());
}

#[tokio::test]
async fn test_state_survives_reload() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(
        &temp,
        Arc::new(ScriptedSpeaker::default()),
        Arc::new(RecordingAlert::default()),
    );

    let first = engine.schedule(draft("pills", "09:00", 2, 60), morning()).unwrap();
    engine.schedule(draft("water", "11:00", 3, 300), morning()).unwrap();
    let done = engine.schedule(draft("mail", "08:30", 1, 5), morning()).unwrap();
    engine.tick(done.time).unwrap().await.unwrap();
    engine.tick(first.time).unwrap().await.unwrap();

    let pending = engine.pending();
    let completed = engine.completed();
    drop(engine);

    let reopened = open_engine(
        &temp,
        Arc::new(ScriptedSpeaker::default()),
        Arc::new(RecordingAlert::default()),
    );
    assert_eq!(reopened.pending(), pending);
    assert_eq!(reopened.completed(), completed);
    assert_eq!(reopened.pending()[0].repeats_left, 1);
}
