//! Concurrent id -> handle map; the admission gate for id uniqueness.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::handle::{TaskHandle, TaskId, TaskSnapshot};

/// Registry of live (non-reaped) tasks.
///
/// Read-heavy: status and await calls take the read lock, admission and
/// removal take the write lock briefly.
#[derive(Default)]
pub struct TaskRegistry {
    tasks: RwLock<HashMap<TaskId, Arc<TaskHandle>>>,
}

impl TaskRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `handle` under its id unless that id is already registered.
    ///
    /// Check and insert happen under one write lock, so two concurrent
    /// submissions of the same id cannot both be admitted.
    pub fn insert_if_absent(&self, handle: Arc<TaskHandle>) -> bool {
        let mut tasks = self.tasks.write();
        match tasks.entry(handle.id().clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(handle);
                true
            }
        }
    }

    /// Look up a handle.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<TaskHandle>> {
        self.tasks.read().get(id).cloned()
    }

    /// Whether `id` is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.tasks.read().contains_key(id)
    }

    /// Remove by id. Removing an absent id is a no-op.
    pub fn remove(&self, id: &str) -> Option<Arc<TaskHandle>> {
        self.tasks.write().remove(id)
    }

    /// Remove only if the entry under the handle's id is this exact handle.
    pub fn remove_handle(&self, handle: &Arc<TaskHandle>) -> bool {
        let mut tasks = self.tasks.write();
        match tasks.get(handle.id().as_str()) {
            Some(current) if Arc::ptr_eq(current, handle) => {
                tasks.remove(handle.id().as_str());
                true
            }
            _ => false,
        }
    }

    /// Number of registered tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    /// Whether no tasks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }

    /// Registered ids, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<TaskId> {
        let mut ids: Vec<_> = self.tasks.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Snapshots of every registered task, oldest admission first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<TaskSnapshot> {
        let mut snaps: Vec<_> = self.tasks.read().values().map(|h| h.snapshot()).collect();
        snaps.sort_by(|a, b| {
            a.submitted_at_ms
                .cmp(&b.submitted_at_ms)
                .then_with(|| a.id.cmp(&b.id))
        });
        snaps
    }
}

impl std::fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRegistry").field("len", &self.len()).finish()
    }
}
