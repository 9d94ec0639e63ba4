// Persistence bridge: mirror the task collection to blob storage,
// rehydrate at startup, export and import JSON backups

use crate::models::{Task, TaskId, seed_tasks};
use crate::storage::BlobStore;
use chrono::{Local, NaiveDate};
use eyre::{Context, Result, eyre};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, warn};

/// Well-known storage key for the persisted collection.
pub const TASKS_KEY: &str = "todotree.tasks.v1";

/// Errors from importing a backup file. On either variant the current
/// collection is left untouched.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The payload is not valid JSON at all.
    #[error("import payload is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    /// The payload parsed but is not an acceptable task collection: the top
    /// level is not an array, or a record is malformed, or the records break
    /// the collection invariants.
    #[error("import payload rejected: {0}")]
    Format(String),
}

/// Keeps a blob store in sync with the task collection.
///
/// `save` is called once per completed mutation with that mutation's exact
/// snapshot; the bridge never mutates tasks itself.
pub struct Persister<S: BlobStore> {
    store: S,
}

impl<S: BlobStore> Persister<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Serialize the full collection to the well-known key, overwriting any
    /// prior value.
    pub fn save(&mut self, tasks: &[Task]) -> Result<()> {
        let json = serde_json::to_string(tasks).context("Failed to serialize task collection")?;
        self.store.put(TASKS_KEY, &json)?;
        debug!(count = tasks.len(), "persisted task collection");
        Ok(())
    }

    /// Read the persisted collection.
    ///
    /// An absent key yields the fixed seed collection. A present but corrupt
    /// value (unparsable, not an array, or invariant-breaking records) also
    /// falls back to the seed; that state is logged, never fatal.
    pub fn load(&self) -> Result<Vec<Task>> {
        let Some(raw) = self.store.get(TASKS_KEY)? else {
            debug!("no persisted state, using seed collection");
            return Ok(seed_tasks());
        };

        match parse_persisted(&raw) {
            Ok(tasks) => {
                debug!(count = tasks.len(), "loaded persisted task collection");
                Ok(tasks)
            }
            Err(e) => {
                warn!(error = %e, "persisted state is corrupt, falling back to seed data");
                Ok(seed_tasks())
            }
        }
    }
}

fn parse_persisted(raw: &str) -> Result<Vec<Task>> {
    let value: Value = serde_json::from_str(raw).context("not valid JSON")?;
    if !value.is_array() {
        return Err(eyre!("top-level value is not an array"));
    }
    let tasks: Vec<Task> = serde_json::from_value(value).context("malformed task record")?;
    validate_tasks(&tasks)?;
    Ok(tasks)
}

/// Suggested backup file payload.
pub struct ExportPayload {
    /// `todos-YYYY-MM-DD.json` from the current local date.
    pub file_name: String,
    /// Pretty-printed JSON array of task records.
    pub json: String,
}

/// Serialize the collection for a user-facing backup file.
pub fn export(tasks: &[Task]) -> Result<ExportPayload> {
    let json =
        serde_json::to_string_pretty(tasks).context("Failed to serialize task collection")?;
    Ok(ExportPayload {
        file_name: export_file_name(Local::now().date_naive()),
        json,
    })
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("todos-{}.json", date.format("%Y-%m-%d"))
}

/// Parse a backup file into a replacement collection.
///
/// Unlike loading persisted state, failures here surface to the user: bad
/// JSON is [`ImportError::Parse`], everything else that makes the payload
/// unusable is [`ImportError::Format`]. The original application trusted any
/// JSON array wholesale; records are fully validated here instead so a bad
/// backup can never break the collection invariants.
pub fn import(contents: &str) -> Result<Vec<Task>, ImportError> {
    let value: Value = serde_json::from_str(contents)?;
    if !value.is_array() {
        return Err(ImportError::Format(
            "top-level value is not an array".to_string(),
        ));
    }
    let tasks: Vec<Task> = serde_json::from_value(value)
        .map_err(|e| ImportError::Format(format!("malformed task record: {e}")))?;
    validate_tasks(&tasks).map_err(|e| ImportError::Format(e.to_string()))?;
    Ok(tasks)
}

/// Check the collection invariants: unique ids, parents that exist, no
/// parent cycles, no empty titles.
fn validate_tasks(tasks: &[Task]) -> Result<()> {
    let mut ids = HashSet::new();
    for task in tasks {
        if !ids.insert(task.id) {
            return Err(eyre!("duplicate task id {}", task.id));
        }
        if task.title.trim().is_empty() {
            return Err(eyre!("task {} has an empty title", task.id));
        }
    }

    let parents: HashMap<TaskId, Option<TaskId>> =
        tasks.iter().map(|t| (t.id, t.parent_id)).collect();
    for task in tasks {
        if let Some(parent_id) = task.parent_id {
            if !parents.contains_key(&parent_id) {
                return Err(eyre!(
                    "task {} references missing parent {}",
                    task.id,
                    parent_id
                ));
            }
        }

        // Walk the parent chain; more hops than tasks means a cycle.
        let mut hops = 0;
        let mut current = task.parent_id;
        while let Some(parent_id) = current {
            hops += 1;
            if hops > tasks.len() {
                return Err(eyre!("parent cycle involving task {}", task.id));
            }
            current = parents.get(&parent_id).copied().flatten();
        }
    }

    Ok(())
}
