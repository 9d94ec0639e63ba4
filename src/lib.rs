// TodoTree - hierarchical task list with soft delete and JSON persistence

pub mod models;
pub mod persist;
pub mod storage;
pub mod store;

// Re-export main types for convenience
pub use models::{NEW_TASK_TITLE, Task, TaskId, seed_tasks};
pub use persist::{ExportPayload, ImportError, Persister, TASKS_KEY, export, import};
pub use storage::{BlobStore, MemoryBlobStore, SqliteBlobStore};
pub use store::{StoreError, TaskStore};
