//! Local cache of completed tasks.
//!
//! The cache is a JSON array of task objects with dates written as ISO-8601
//! strings. Loading is forgiving: a missing file is an empty cache, a garbled
//! file is logged and treated as empty, and individual records that fail to
//! parse are skipped.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use service_core::error::AppError;
use tracing::{info, instrument, warn};

use crate::models::Task;
use crate::services::metrics::record_task_cache_skipped;

#[derive(Debug, Clone)]
pub struct CompletedTaskCache {
    path: PathBuf,
}

impl CompletedTaskCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every well-formed task in the cache.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> Vec<Task> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read completed-task cache");
                record_task_cache_skipped("unreadable");
                return Vec::new();
            }
        };
        parse_tasks(&raw)
    }

    /// Replace the cache contents with `tasks`.
    #[instrument(skip(self, tasks), fields(path = %self.path.display(), count = tasks.len()))]
    pub fn save(&self, tasks: &[Task]) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(tasks)?;
        fs::write(&self.path, json)?;

        info!("Completed-task cache saved");

        Ok(())
    }

    /// Add `task` to the cache, replacing any cached task with the same id.
    pub fn append_completed(&self, task: Task) -> Result<Vec<Task>, AppError> {
        let mut tasks = self.load();
        match tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => *existing = task,
            None => tasks.push(task),
        }
        self.save(&tasks)?;
        Ok(tasks)
    }
}

/// Parse a cache document, skipping anything that is not a valid task.
pub fn parse_tasks(raw: &str) -> Vec<Task> {
    let items = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            warn!("Completed-task cache is not a JSON array, ignoring it");
            record_task_cache_skipped("not_array");
            return Vec::new();
        }
        Err(e) => {
            warn!(error = %e, "Completed-task cache is not valid JSON, ignoring it");
            record_task_cache_skipped("invalid_json");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(idx, item)| match serde_json::from_value::<Task>(item) {
            Ok(task) => Some(task),
            Err(e) => {
                warn!(index = idx, error = %e, "Skipping malformed cached task");
                record_task_cache_skipped("malformed");
                None
            }
        })
        .collect()
}
