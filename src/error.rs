//! Error types for voice-reminder.
//!
//! Engine and storage failures use thiserror. Speech failures live in
//! `crate::speech` because the engine always recovers from them locally.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReminderError {
    #[error("Another reminder for this time already exists ({0})")]
    DuplicateTime(DateTime<Utc>),

    #[error("Reminder not found: {0}")]
    NotFound(String),

    #[error("Invalid reminder: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReminderError>;
