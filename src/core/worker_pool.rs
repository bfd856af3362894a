//! Fixed-size worker pool with dedicated OS threads.
//!
//! `N` long-lived threads consume a FIFO of typed [`WorkItem`]s. Each item
//! wraps the `Arc<TaskHandle>` it was created for, so a pending item can be
//! found and pulled out of the queue by task id without knowing anything
//! about the queue's internals.
//!
//! # Key Features
//!
//! - **Unbounded FIFO**: submission never blocks and is only refused after shutdown
//! - **Targeted removal**: [`WorkerPool::remove_if_pending`] for cancel-before-start
//! - **Guaranteed settlement**: every dequeued item fires its completion signal
//!   and leaves the registry, whatever way execution ends
//! - **No polling**: idle workers park on a `Condvar`
//!
//! # Example
//!
//! ```rust,ignore
//! use prometheus_task_lifecycle::config::WorkerPoolConfig;
//! use prometheus_task_lifecycle::core::{TaskRegistry, TimedExecutor, WorkerPool};
//!
//! let registry = Arc::new(TaskRegistry::new());
//! let pool = WorkerPool::new(
//!     WorkerPoolConfig::new().with_worker_count(4),
//!     TimedExecutor::from_millis(100),
//!     Arc::clone(&registry),
//!     Arc::new(NoopAuditSink),
//! )?;
//! ```

mod native;
mod queue;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use super::handle::{TaskHandle, TaskId};

/// Errors that can occur when using a `WorkerPool`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The pool has been shut down.
    PoolShutdown,

    /// Configuration validation failed.
    InvalidConfig(String),

    /// Internal error (worker thread spawn failure, ...).
    Internal(String),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PoolShutdown => write!(f, "pool has been shut down"),
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for PoolError {}

/// Statistics about pool utilization.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct PoolStats {
    /// Number of worker threads.
    pub worker_count: usize,

    /// Tasks currently executing.
    pub active_tasks: u64,

    /// Tasks waiting in the queue.
    pub queued_tasks: u64,

    /// Total tasks accepted into the queue.
    pub submitted_tasks: u64,

    /// Tasks that reached `DONE`.
    pub completed_tasks: u64,

    /// Tasks that reached `STOPPED` (any path).
    pub stopped_tasks: u64,

    /// Tasks pulled out of the queue by cancellation before starting.
    pub dequeued_tasks: u64,
}

/// Internal counters for pool statistics (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub active_tasks: AtomicU64,
    pub queued_tasks: AtomicU64,
    pub submitted_tasks: AtomicU64,
    pub completed_tasks: AtomicU64,
    pub stopped_tasks: AtomicU64,
    pub dequeued_tasks: AtomicU64,
}

impl PoolCounters {
    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, worker_count: usize) -> PoolStats {
        PoolStats {
            worker_count,
            active_tasks: self.active_tasks.load(Ordering::Relaxed),
            queued_tasks: self.queued_tasks.load(Ordering::Relaxed),
            submitted_tasks: self.submitted_tasks.load(Ordering::Relaxed),
            completed_tasks: self.completed_tasks.load(Ordering::Relaxed),
            stopped_tasks: self.stopped_tasks.load(Ordering::Relaxed),
            dequeued_tasks: self.dequeued_tasks.load(Ordering::Relaxed),
        }
    }
}

/// A queued unit of work: a typed token referencing its task handle.
pub struct WorkItem {
    handle: Arc<TaskHandle>,
    enqueued_at: Instant,
}

impl WorkItem {
    /// Wrap a handle for queueing.
    #[must_use]
    pub fn new(handle: Arc<TaskHandle>) -> Self {
        Self {
            handle,
            enqueued_at: Instant::now(),
        }
    }

    /// Id of the task this item runs.
    #[must_use]
    pub fn id(&self) -> &TaskId {
        self.handle.id()
    }

    /// The referenced handle.
    #[must_use]
    pub const fn handle(&self) -> &Arc<TaskHandle> {
        &self.handle
    }

    /// When the item entered the queue.
    #[must_use]
    pub const fn enqueued_at(&self) -> Instant {
        self.enqueued_at
    }

    /// Give up the item, keeping the handle.
    #[must_use]
    pub fn into_handle(self) -> Arc<TaskHandle> {
        self.handle
    }
}

impl fmt::Debug for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkItem")
            .field("id", self.id())
            .field("waited", &self.enqueued_at.elapsed())
            .finish()
    }
}

pub use native::WorkerPool;
