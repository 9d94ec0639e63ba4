// Task collection with mutation and query operations

use crate::models::{NEW_TASK_TITLE, Task, TaskId, seed_tasks};
use thiserror::Error;
use tracing::debug;

/// Errors from task store operations.
///
/// Every variant is recoverable: the collection is left exactly as it was.
/// Callers that want silent no-op behavior simply discard the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Title is empty after trimming whitespace.
    #[error("title is empty after trimming")]
    EmptyTitle,
    /// No task with the given id exists.
    #[error("no task with id {0}")]
    NotFound(TaskId),
    /// The id does not belong to a current root task.
    #[error("task {0} is not a root task")]
    NotARoot(TaskId),
}

/// Owns the authoritative task collection.
///
/// Tasks are append-only: deletion only flips the soft-delete flag, so ids
/// stay unique across the whole collection for the lifetime of the store.
/// Every mutation either fully succeeds and bumps `revision`, or fails with
/// a [`StoreError`] and changes nothing.
pub struct TaskStore {
    tasks: Vec<Task>,
    next_id: TaskId,
    revision: u64,
}

impl TaskStore {
    /// Create a store around an existing collection.
    ///
    /// The id counter is seeded from the highest id present, so ids handed
    /// out later never collide with loaded tasks, deleted ones included.
    pub fn new(tasks: Vec<Task>) -> Self {
        let next_id = Self::next_id_after(&tasks);
        Self {
            tasks,
            next_id,
            revision: 0,
        }
    }

    /// Create a store holding the fixed seed collection.
    pub fn seeded() -> Self {
        Self::new(seed_tasks())
    }

    fn next_id_after(tasks: &[Task]) -> TaskId {
        tasks.iter().map(|t| t.id).max().map_or(1, |max| max + 1)
    }

    /// Current snapshot of the whole collection, deleted tasks included.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Bumped once per successful mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Append a new root task with the given title.
    ///
    /// The title is trimmed; an empty result is rejected without touching
    /// the collection.
    pub fn add_root(&mut self, title: &str) -> Result<TaskId, StoreError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(StoreError::EmptyTitle);
        }

        let id = self.allocate_id();
        self.tasks.push(Task::new(id, title, None));
        self.revision += 1;
        debug!(id, "added root task");
        Ok(id)
    }

    /// Append a new child task under `parent_id` with the placeholder title.
    ///
    /// The parent must exist but may itself be soft-deleted.
    pub fn add_child(&mut self, parent_id: TaskId) -> Result<TaskId, StoreError> {
        if self.get(parent_id).is_none() {
            return Err(StoreError::NotFound(parent_id));
        }

        let id = self.allocate_id();
        self.tasks.push(Task::new(id, NEW_TASK_TITLE, Some(parent_id)));
        self.revision += 1;
        debug!(id, parent_id, "added child task");
        Ok(id)
    }

    /// Replace a task's title.
    ///
    /// A whitespace-only title is rejected and the stored title is kept, so
    /// a task never ends up with an empty title.
    pub fn rename(&mut self, id: TaskId, new_title: &str) -> Result<(), StoreError> {
        let new_title = new_title.trim();
        if new_title.is_empty() {
            return Err(StoreError::EmptyTitle);
        }

        let task = self.task_mut(id)?;
        task.title = new_title.to_string();
        self.revision += 1;
        Ok(())
    }

    /// Mark a task deleted. Children are not cascaded: they stay visible and
    /// editable under a deleted ancestor.
    pub fn soft_delete(&mut self, id: TaskId) -> Result<(), StoreError> {
        let task = self.task_mut(id)?;
        task.is_deleted = true;
        self.revision += 1;
        debug!(id, "soft-deleted task");
        Ok(())
    }

    /// Clear a task's deleted flag.
    pub fn restore(&mut self, id: TaskId) -> Result<(), StoreError> {
        let task = self.task_mut(id)?;
        task.is_deleted = false;
        self.revision += 1;
        debug!(id, "restored task");
        Ok(())
    }

    /// Flip a task's completion flag.
    pub fn toggle_done(&mut self, id: TaskId) -> Result<(), StoreError> {
        let task = self.task_mut(id)?;
        task.is_done = !task.is_done;
        self.revision += 1;
        Ok(())
    }

    /// Reposition root task `moved_id` at the slot root task `target_id`
    /// currently occupies, shifting the roots in between.
    ///
    /// Array-move semantics: both positions are taken among current roots
    /// before anything moves, then the moved root is removed and spliced
    /// back in at the target's original index. The resulting collection is
    /// the reordered roots followed by all non-root tasks in their prior
    /// relative order.
    pub fn reorder_roots(&mut self, moved_id: TaskId, target_id: TaskId) -> Result<(), StoreError> {
        if moved_id == target_id {
            return Ok(());
        }

        let root_ids: Vec<TaskId> = self
            .tasks
            .iter()
            .filter(|t| t.is_root())
            .map(|t| t.id)
            .collect();
        let from = root_ids
            .iter()
            .position(|&id| id == moved_id)
            .ok_or(StoreError::NotARoot(moved_id))?;
        let to = root_ids
            .iter()
            .position(|&id| id == target_id)
            .ok_or(StoreError::NotARoot(target_id))?;

        let mut roots = Vec::new();
        let mut rest = Vec::new();
        for task in self.tasks.drain(..) {
            if task.is_root() {
                roots.push(task);
            } else {
                rest.push(task);
            }
        }
        let moved = roots.remove(from);
        roots.insert(to, moved);
        roots.extend(rest);
        self.tasks = roots;

        self.revision += 1;
        debug!(moved_id, target_id, "reordered root tasks");
        Ok(())
    }

    /// Wholesale-replace the collection (used by import) and reseed the id
    /// counter from the new contents.
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        self.next_id = Self::next_id_after(&tasks);
        self.tasks = tasks;
        self.revision += 1;
        debug!(count = self.tasks.len(), "replaced task collection");
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// All root tasks in collection order, deleted ones included.
    pub fn roots(&self) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.is_root()).collect()
    }

    /// All direct children of `id` in collection order. No deletion
    /// filtering: the caller decides what to show.
    pub fn children(&self, id: TaskId) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| t.parent_id == Some(id))
            .collect()
    }

    /// All soft-deleted tasks across the whole tree, not just roots.
    pub fn deleted_tasks(&self) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.is_deleted).collect()
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn allocate_id(&mut self) -> TaskId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn task_mut(&mut self, id: TaskId) -> Result<&mut Task, StoreError> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(tasks: &[&Task]) -> Vec<TaskId> {
        tasks.iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_add_root_appends_unique_root() {
        let mut store = TaskStore::seeded();
        let before = store.len();

        let id = store.add_root("親タスク3").unwrap();

        assert_eq!(store.len(), before + 1);
        let task = store.get(id).unwrap();
        assert!(task.is_root());
        assert_eq!(task.title, "親タスク3");

        let mut seen = std::collections::HashSet::new();
        assert!(store.tasks().iter().all(|t| seen.insert(t.id)));
    }

    #[test]
    fn test_add_root_trims_title() {
        let mut store = TaskStore::seeded();
        let id = store.add_root("  買い物  ").unwrap();
        assert_eq!(store.get(id).unwrap().title, "買い物");
    }

    #[test]
    fn test_add_root_rejects_whitespace_title() {
        let mut store = TaskStore::seeded();
        let before = store.len();
        assert_eq!(store.add_root("   "), Err(StoreError::EmptyTitle));
        assert_eq!(store.len(), before);
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn test_add_child_appends_in_order() {
        // Seed: root 1 with children 2 and 3. Adding a child of 1 must yield
        // three children in append order with the originals unchanged.
        let mut store = TaskStore::seeded();
        let new_id = store.add_child(1).unwrap();

        let children = store.children(1);
        assert_eq!(ids(&children), vec![2, 3, new_id]);
        assert_eq!(children[0].title, "子タスク1-1");
        assert_eq!(children[1].title, "子タスク1-2");
        assert_eq!(children[2].title, NEW_TASK_TITLE);
    }

    #[test]
    fn test_add_child_missing_parent() {
        let mut store = TaskStore::seeded();
        assert_eq!(store.add_child(99), Err(StoreError::NotFound(99)));
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn test_add_child_under_deleted_parent_is_allowed() {
        let mut store = TaskStore::seeded();
        store.soft_delete(1).unwrap();
        let id = store.add_child(1).unwrap();
        assert_eq!(store.get(id).unwrap().parent_id, Some(1));
        assert!(!store.get(id).unwrap().is_deleted);
    }

    #[test]
    fn test_rename_replaces_title() {
        let mut store = TaskStore::seeded();
        store.rename(1, "親タスク1(改)").unwrap();
        assert_eq!(store.get(1).unwrap().title, "親タスク1(改)");
    }

    #[test]
    fn test_rename_whitespace_preserves_title() {
        let mut store = TaskStore::seeded();
        assert_eq!(store.rename(1, "   "), Err(StoreError::EmptyTitle));
        assert_eq!(store.get(1).unwrap().title, "親タスク1");
    }

    #[test]
    fn test_rename_missing_id() {
        let mut store = TaskStore::seeded();
        assert_eq!(store.rename(42, "x"), Err(StoreError::NotFound(42)));
    }

    #[test]
    fn test_soft_delete_then_restore_round_trip() {
        let mut store = TaskStore::seeded();
        let before = store.tasks().to_vec();

        store.soft_delete(2).unwrap();
        assert!(store.get(2).unwrap().is_deleted);

        store.restore(2).unwrap();
        assert_eq!(store.tasks(), &before[..]);
    }

    #[test]
    fn test_delete_does_not_cascade_to_children() {
        let mut store = TaskStore::seeded();
        store.soft_delete(1).unwrap();

        // Children of the deleted root keep their own flags and stay
        // editable.
        assert!(!store.get(2).unwrap().is_deleted);
        assert!(!store.get(3).unwrap().is_deleted);
        store.rename(2, "まだ編集できる").unwrap();
        assert_eq!(store.get(2).unwrap().title, "まだ編集できる");
    }

    #[test]
    fn test_deleted_tasks_spans_whole_tree() {
        let mut store = TaskStore::seeded();
        store.soft_delete(4).unwrap();
        store.soft_delete(5).unwrap();
        assert_eq!(ids(&store.deleted_tasks()), vec![4, 5]);
    }

    #[test]
    fn test_toggle_done_is_self_inverse() {
        let mut store = TaskStore::seeded();
        let before = store.tasks().to_vec();

        store.toggle_done(3).unwrap();
        assert!(store.get(3).unwrap().is_done);

        store.toggle_done(3).unwrap();
        assert_eq!(store.tasks(), &before[..]);
    }

    #[test]
    fn test_reorder_roots_moves_to_target_slot() {
        let mut store = TaskStore::seeded();
        let extra = store.add_root("親タスク3").unwrap();
        assert_eq!(ids(&store.roots()), vec![1, 4, extra]);

        store.reorder_roots(1, extra).unwrap();
        assert_eq!(ids(&store.roots()), vec![4, extra, 1]);
    }

    #[test]
    fn test_reorder_roots_inverse_on_adjacent_roots() {
        let mut store = TaskStore::seeded();
        let non_roots_before: Vec<TaskId> = store
            .tasks()
            .iter()
            .filter(|t| !t.is_root())
            .map(|t| t.id)
            .collect();

        store.reorder_roots(1, 4).unwrap();
        assert_eq!(ids(&store.roots()), vec![4, 1]);

        store.reorder_roots(4, 1).unwrap();
        assert_eq!(ids(&store.roots()), vec![1, 4]);

        let non_roots_after: Vec<TaskId> = store
            .tasks()
            .iter()
            .filter(|t| !t.is_root())
            .map(|t| t.id)
            .collect();
        assert_eq!(non_roots_after, non_roots_before);
    }

    #[test]
    fn test_reorder_roots_same_id_is_noop() {
        let mut store = TaskStore::seeded();
        let before = store.tasks().to_vec();
        store.reorder_roots(1, 1).unwrap();
        assert_eq!(store.tasks(), &before[..]);
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn test_reorder_roots_rejects_non_root() {
        let mut store = TaskStore::seeded();
        let before = store.tasks().to_vec();
        assert_eq!(store.reorder_roots(2, 4), Err(StoreError::NotARoot(2)));
        assert_eq!(store.reorder_roots(1, 5), Err(StoreError::NotARoot(5)));
        assert_eq!(store.reorder_roots(1, 99), Err(StoreError::NotARoot(99)));
        assert_eq!(store.tasks(), &before[..]);
    }

    #[test]
    fn test_ids_unique_under_rapid_adds() {
        let mut store = TaskStore::seeded();
        for i in 0..100 {
            store.add_root(format!("タスク{i}").as_str()).unwrap();
        }
        let mut seen = std::collections::HashSet::new();
        assert!(store.tasks().iter().all(|t| seen.insert(t.id)));
    }

    #[test]
    fn test_next_id_seeded_from_max() {
        let store_tasks = vec![
            Task::new(1, "a", None),
            Task::new(7, "b", None),
            Task::new(3, "c", Some(7)),
        ];
        let mut store = TaskStore::new(store_tasks);
        let id = store.add_root("d").unwrap();
        assert_eq!(id, 8);
    }

    #[test]
    fn test_replace_all_reseeds_ids() {
        let mut store = TaskStore::seeded();
        store.replace_all(vec![Task::new(10, "imported", None)]);
        assert_eq!(store.len(), 1);
        let id = store.add_root("next").unwrap();
        assert_eq!(id, 11);
    }

    #[test]
    fn test_revision_bumps_once_per_mutation() {
        let mut store = TaskStore::seeded();
        assert_eq!(store.revision(), 0);
        store.add_root("x").unwrap();
        store.toggle_done(1).unwrap();
        assert_eq!(store.revision(), 2);
        let _ = store.rename(1, "  ");
        assert_eq!(store.revision(), 2);
    }

    #[test]
    fn test_queries_keep_collection_order() {
        let store = TaskStore::seeded();
        assert_eq!(ids(&store.roots()), vec![1, 4]);
        assert_eq!(ids(&store.children(1)), vec![2, 3]);
        assert_eq!(ids(&store.children(2)), vec![5]);
        assert!(store.children(5).is_empty());
        assert!(store.deleted_tasks().is_empty());
    }
}
