//! Reminders: task model, collections, persistence and the engine that
//! fires them.
//!
//! Components:
//! - `task`: `Task`, validated `TaskDraft`, time-of-day resolution
//! - `book`: pending/completed collections and repeat transitions
//! - `store`: JSON file persistence
//! - `engine`: due checks and the single-flight fire transition

pub mod book;
pub mod engine;
pub mod store;
pub mod task;

pub use book::TaskList;
pub use engine::ReminderEngine;
pub use store::TaskStore;
pub use task::{Task, TaskDraft};
