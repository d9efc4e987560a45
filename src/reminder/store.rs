//! JSON file persistence for reminder collections.
//!
//! Each collection is one file, `<dir>/<key>.json`, holding a JSON array of
//! tasks. Loading never fails: a missing or unreadable file yields an empty
//! collection.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::task::Task;
use crate::error::Result;

/// Storage key of the pending collection.
pub const PENDING_KEY: &str = "tasks";

/// Storage key of the completed collection.
pub const COMPLETED_KEY: &str = "completedTasks";

#[derive(Debug, Clone)]
pub struct TaskStore {
    dir: PathBuf,
}

impl TaskStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Load a collection in stored order.
    pub fn load(&self, key: &str) -> Vec<Task> {
        let path = self.path(key);
        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No stored reminders at {}", path.display());
                return Vec::new();
            }
            Err(e) => {
                warn!("Failed to read {}: {e}, starting empty", path.display());
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Task>>(&contents) {
            Ok(tasks) => {
                debug!("Loaded {} reminders from {}", tasks.len(), path.display());
                tasks
            }
            Err(e) => {
                warn!("Failed to parse {}: {e}, starting empty", path.display());
                Vec::new()
            }
        }
    }

    /// Replace a stored collection with `tasks`.
    ///
    /// Writes a temporary sibling file and renames it into place so a crash
    /// mid-write never leaves a truncated collection behind.
    pub fn save(&self, key: &str, tasks: &[Task]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        let json = serde_json::to_string_pretty(tasks)?;

        let mut file = fs::File::create(&tmp)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp, &path)?;

        debug!("Saved {} reminders to {}", tasks.len(), path.display());
        Ok(())
    }
}
