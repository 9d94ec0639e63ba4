// Task entity and seed data

use serde::{Deserialize, Serialize};

/// Stable task identifier. Unique across the whole collection (soft-deleted
/// tasks included) and never reused within a session.
pub type TaskId = u64;

/// Placeholder title given to tasks created under a parent.
pub const NEW_TASK_TITLE: &str = "新しいタスク";

/// A single todo item.
///
/// `parent_id == None` marks a root (top-level) task. The wire schema uses
/// camelCase field names; `isDone` is absent in legacy persisted records and
/// defaults to false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub parent_id: Option<TaskId>,
    pub is_deleted: bool,
    #[serde(default)]
    pub is_done: bool,
}

impl Task {
    pub fn new(id: TaskId, title: impl Into<String>, parent_id: Option<TaskId>) -> Self {
        Self {
            id,
            title: title.into(),
            parent_id,
            is_deleted: false,
            is_done: false,
        }
    }

    /// True for top-level tasks.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Fixed collection used when no persisted state exists.
pub fn seed_tasks() -> Vec<Task> {
    vec![
        Task::new(1, "親タスク1", None),
        Task::new(2, "子タスク1-1", Some(1)),
        Task::new(3, "子タスク1-2", Some(1)),
        Task::new(4, "親タスク2", None),
        Task::new(5, "孫タスク1-1-1", Some(2)),
    ]
}
