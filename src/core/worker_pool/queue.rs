//! Pending-work FIFO shared by the pool's workers.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use super::WorkItem;
use crate::core::handle::TaskHandle;

struct QueueState {
    items: VecDeque<WorkItem>,
    /// Set once at shutdown; no pushes afterwards.
    closed: bool,
}

/// Unbounded FIFO of [`WorkItem`]s with targeted removal.
///
/// One `Mutex` guards both the items and the closed flag, so "is this item
/// still pending" and "has a worker taken it" can never disagree.
pub(crate) struct PendingQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

impl PendingQueue {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Append an item. Hands it back if the queue is closed.
    pub(crate) fn push(&self, item: WorkItem) -> Result<(), WorkItem> {
        {
            let mut state = self.state.lock();
            if state.closed {
                return Err(item);
            }
            state.items.push_back(item);
        }
        self.available.notify_one();
        Ok(())
    }

    /// Block until an item is available. `None` once the queue is closed.
    pub(crate) fn pop(&self) -> Option<WorkItem> {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return None;
            }
            if let Some(item) = state.items.pop_front() {
                return Some(item);
            }
            self.available.wait(&mut state);
        }
    }

    /// Remove the pending item carrying `handle`, if a worker has not taken
    /// it yet. Items are matched by handle identity, not by id.
    pub(crate) fn remove(&self, handle: &Arc<TaskHandle>) -> Option<WorkItem> {
        let mut state = self.state.lock();
        let position = state
            .items
            .iter()
            .position(|item| Arc::ptr_eq(item.handle(), handle))?;
        state.items.remove(position)
    }

    /// Close the queue and hand back everything still pending.
    ///
    /// Idle workers wake and observe the closed queue.
    pub(crate) fn close(&self) -> Vec<WorkItem> {
        let drained = {
            let mut state = self.state.lock();
            state.closed = true;
            state.items.drain(..).collect()
        };
        self.available.notify_all();
        drained
    }

    pub(crate) fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    #[cfg(test)]
    pub(crate) fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}
