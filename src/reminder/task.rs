//! Reminder task model, input validation and time-of-day resolution.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ReminderError, Result};

/// Upper bound for how many times one reminder may fire.
pub const MAX_REPEAT_COUNT: u32 = 5;

/// Interval used when none is given or a stored record lacks one.
pub const DEFAULT_REPEAT_INTERVAL: u64 = 5;

/// Selectable repeat intervals in seconds (5s, 10s, 30s, 1m, 5m, 10m, 15m).
pub const INTERVAL_OPTIONS: &[u64] = &[5, 10, 30, 60, 300, 600, 900];

/// A scheduled reminder.
///
/// Serialized with camelCase keys so stored collections stay readable by
/// older builds. Missing repeat fields fall back to a single firing every
/// five seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    pub time: DateTime<Utc>,
    #[serde(default = "default_repeats")]
    pub total_repeats: u32,
    #[serde(default = "default_repeats")]
    pub repeats_left: u32,
    #[serde(default = "default_repeat_interval")]
    pub repeat_interval: u64,
}

fn default_repeats() -> u32 {
    1
}

fn default_repeat_interval() -> u64 {
    DEFAULT_REPEAT_INTERVAL
}

impl Task {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.time <= now
    }

    /// Instant of the next repeat cycle. Saturates instead of overflowing
    /// when a stored interval is absurdly large.
    pub fn next_occurrence(&self) -> DateTime<Utc> {
        i64::try_from(self.repeat_interval)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|step| self.time.checked_add_signed(step))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Validated user input for creating or editing a reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub(crate) text: String,
    pub(crate) time_of_day: NaiveTime,
    pub(crate) repeat_count: u32,
    pub(crate) repeat_interval: u64,
}

impl TaskDraft {
    /// Validate raw input. `time_of_day` is a 24-hour `HH:MM` string.
    pub fn new(
        text: &str,
        time_of_day: &str,
        repeat_count: u32,
        repeat_interval: u64,
    ) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ReminderError::InvalidInput(
                "reminder text must not be empty".into(),
            ));
        }

        let time_of_day = parse_time_of_day(time_of_day)?;

        if !(1..=MAX_REPEAT_COUNT).contains(&repeat_count) {
            return Err(ReminderError::InvalidInput(format!(
                "repeat count must be between 1 and {MAX_REPEAT_COUNT}, got {repeat_count}"
            )));
        }

        if !INTERVAL_OPTIONS.contains(&repeat_interval) {
            return Err(ReminderError::InvalidInput(format!(
                "unsupported repeat interval {repeat_interval}s (choose one of {INTERVAL_OPTIONS:?})"
            )));
        }

        Ok(Self {
            text: text.to_string(),
            time_of_day,
            repeat_count,
            repeat_interval,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn time_of_day(&self) -> NaiveTime {
        self.time_of_day
    }

    pub fn repeat_count(&self) -> u32 {
        self.repeat_count
    }

    pub fn repeat_interval(&self) -> u64 {
        self.repeat_interval
    }
}

/// Parse an `HH:MM` clock value. Seconds are always zero.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|e| {
        ReminderError::InvalidInput(format!("invalid time of day '{value}' (expected HH:MM): {e}"))
    })
}

/// Resolve a time of day against `now`'s local date.
///
/// The result is always strictly after `now`: a time that has already
/// passed today (or is exactly now) moves to tomorrow.
pub fn resolve_due_time(now: DateTime<Local>, time_of_day: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive();
    let candidate = local_instant(today, time_of_day);
    if candidate > now.with_timezone(&Utc) {
        return candidate;
    }

    match today.succ_opt() {
        Some(tomorrow) => local_instant(tomorrow, time_of_day),
        None => candidate + Duration::days(1),
    }
}

fn local_instant(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    let naive = date.and_time(time);
    Local
        .from_local_datetime(&naive)
        .earliest()
        // Wall-clock time skipped by a DST jump: use the first valid hour after it
        .or_else(|| Local.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

/// Spoken form of a reminder, e.g. "It's time to stretch. It's 9:05 AM."
pub fn compose_message(task: &Task) -> String {
    let local = task.time.with_timezone(&Local);
    format!("It's time to {}. It's {}.", task.text, local.format("%-I:%M %p"))
}

/// "5 seconds", "1 minute", "15 minutes".
pub fn format_interval(seconds: u64) -> String {
    if seconds < 60 || seconds % 60 != 0 {
        return format!("{seconds} seconds");
    }
    let minutes = seconds / 60;
    format!("{minutes} minute{}", if minutes > 1 { "s" } else { "" })
}

/// Clock label for list views, e.g. "09:05 AM".
pub fn format_clock(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local).format("%I:%M %p").to_string()
}

/// "Today" when `time` falls on `now`'s local date, otherwise "Mon, Oct 20".
pub fn format_day(time: DateTime<Utc>, now: DateTime<Local>) -> String {
    let local = time.with_timezone(&Local);
    if local.date_naive() == now.date_naive() {
        "Today".to_string()
    } else {
        local.format("%a, %b %-d").to_string()
    }
}
