//! voice-reminder: spoken reminders for the Linux desktop.
//!
//! The library holds the reminder engine and its collaborators so both
//! binaries (the `voice-reminder` service and the `remind` client) share
//! one task model.

pub mod api;
pub mod config;
pub mod error;
pub mod notifier;
pub mod reminder;
pub mod service;
pub mod speech;
