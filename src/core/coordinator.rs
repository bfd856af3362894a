//! Lifecycle coordinator: submit, cancel, status and await-completion.
//!
//! The coordinator owns a [`TaskRegistry`] and a [`WorkerPool`] that share
//! the same handles. It resolves the races between a cancel request, the
//! worker picking the task up, and the worker finishing it:
//!
//! 1. A task still in the pending queue is pulled out and settled `STOPPED`
//!    by the canceller. No worker ever sees it.
//! 2. A task a worker has dequeued but not started is flipped `QUEUED ->
//!    STOPPED` by the canceller; the worker's own `QUEUED -> RUNNING` then
//!    fails and the worker only settles it. If the claim lands before
//!    admission has pushed the item, whichever of the canceller and the
//!    admitting thread later finds it pending pulls it out and settles it.
//! 3. A running task gets its cancel token tripped; the worker observes it
//!    at the next checkpoint and settles `STOPPED`.
//! 4. A task that already reached a terminal status is left alone.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::audit::{build_audit_event, AuditAction, AuditSink, NoopAuditSink};
use super::cancel::CancelToken;
use super::error::LifecycleError;
use super::executor::TaskExecutor;
use super::handle::{TaskHandle, TaskId, TaskSnapshot};
use super::registry::TaskRegistry;
use super::status::TaskStatus;
use super::worker_pool::{PoolStats, WorkerPool};
use crate::config::WorkerPoolConfig;

/// What a cancel request actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelOutcome {
    /// The task was still pending and was removed before any worker took it.
    Dequeued,
    /// The task had been taken by a worker; interruption was requested.
    StopRequested,
    /// No live task with that id (never submitted, or already terminal).
    NotFound,
}

impl CancelOutcome {
    /// Status reported to callers of the stop operation, whatever happened.
    #[must_use]
    pub const fn reported_status(self) -> TaskStatus {
        TaskStatus::Stopped
    }

    /// Whether a live task was found.
    #[must_use]
    pub const fn was_found(self) -> bool {
        !matches!(self, Self::NotFound)
    }
}

/// Front door of the task lifecycle engine.
pub struct LifecycleCoordinator<E: TaskExecutor> {
    registry: Arc<TaskRegistry>,
    pool: WorkerPool<E>,
    audit: Arc<dyn AuditSink>,
}

impl<E: TaskExecutor> LifecycleCoordinator<E> {
    /// Start the worker pool and return a ready coordinator.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for a bad configuration, `Internal` if worker threads
    /// cannot be spawned.
    pub fn start(config: WorkerPoolConfig, executor: E) -> Result<Self, LifecycleError> {
        Self::with_audit(config, executor, Arc::new(NoopAuditSink))
    }

    /// Like [`start`](Self::start), recording lifecycle events to `audit`.
    ///
    /// # Errors
    ///
    /// Same as [`start`](Self::start).
    pub fn with_audit(
        config: WorkerPoolConfig,
        executor: E,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, LifecycleError> {
        let registry = Arc::new(TaskRegistry::new());
        let pool = WorkerPool::new(config, executor, Arc::clone(&registry), Arc::clone(&audit))?;
        info!(worker_count = pool.worker_count(), "Lifecycle coordinator started");
        Ok(Self {
            registry,
            pool,
            audit,
        })
    }

    /// Admit a task and queue it for execution.
    ///
    /// Returns `Ok(false)` without side effects if a live task already uses
    /// `id`.
    ///
    /// # Errors
    ///
    /// `EmptyId` for a blank id, `PoolShutdown` once shutdown has begun.
    pub fn submit(&self, id: &str, duration: u64) -> Result<bool, LifecycleError> {
        Ok(self.admit(id, duration)?.is_some())
    }

    /// Submit a task and block until it settles.
    ///
    /// # Errors
    ///
    /// `Duplicate` if the id is taken, plus everything [`submit`](Self::submit)
    /// returns.
    pub fn submit_and_wait(&self, id: &str, duration: u64) -> Result<TaskStatus, LifecycleError> {
        match self.admit(id, duration)? {
            Some(handle) => Ok(handle.wait()),
            None => Err(LifecycleError::Duplicate(id.to_string())),
        }
    }

    /// Current status of `id`. Unknown ids report `DONE`.
    #[must_use]
    pub fn status(&self, id: &str) -> TaskStatus {
        self.registry
            .get(id)
            .map_or_else(TaskStatus::default, |handle| handle.status())
    }

    /// Live handle for `id`, if the task has not settled and been reaped.
    #[must_use]
    pub fn handle(&self, id: &str) -> Option<Arc<TaskHandle>> {
        self.registry.get(id)
    }

    /// Stop a task, whether pending or running.
    pub fn cancel(&self, id: &str) -> CancelOutcome {
        let Some(handle) = self.registry.get(id) else {
            debug!(task_id = id, "Cancel for unknown task");
            return CancelOutcome::NotFound;
        };

        if handle.status() == TaskStatus::Queued && self.pool.remove_if_pending(&handle) {
            info!(task_id = %handle.id(), "Pending task cancelled");
            return CancelOutcome::Dequeued;
        }

        // Dequeued but not yet started: claim it before the worker does.
        let claimed = match handle.transition(TaskStatus::Queued, TaskStatus::Stopped) {
            Ok(()) => true,
            Err(TaskStatus::Running) => false,
            Err(_) => {
                debug!(task_id = %handle.id(), "Cancel for already finished task");
                return CancelOutcome::NotFound;
            }
        };

        self.record(&handle, AuditAction::StopRequested, None);
        // Claimed before `admit` pushed it: whoever finds it queued settles it.
        if claimed && self.pool.remove_if_pending(&handle) {
            info!(task_id = %handle.id(), "Pending task cancelled");
            return CancelOutcome::Dequeued;
        }
        handle.cancel_token().cancel();
        info!(task_id = %handle.id(), "Stop requested for task");
        CancelOutcome::StopRequested
    }

    /// Block until `id` settles and return its final status.
    ///
    /// Unknown ids return `DONE` immediately.
    pub fn await_completion(&self, id: &str) -> TaskStatus {
        self.registry
            .get(id)
            .map_or_else(TaskStatus::default, |handle| handle.wait())
    }

    /// Like [`await_completion`](Self::await_completion) with an upper bound.
    ///
    /// # Errors
    ///
    /// `Timeout` if the task has not settled within `timeout`.
    pub fn await_completion_timeout(
        &self,
        id: &str,
        timeout: Duration,
    ) -> Result<TaskStatus, LifecycleError> {
        let Some(handle) = self.registry.get(id) else {
            return Ok(TaskStatus::default());
        };
        handle
            .signal()
            .wait_timeout(timeout)
            .ok_or(LifecycleError::Timeout)
    }

    /// Like [`await_completion`](Self::await_completion), giving up when the
    /// caller's own `token` is cancelled. The task itself is unaffected.
    ///
    /// # Errors
    ///
    /// `WaitInterrupted` if `token` is cancelled before the task settles.
    pub fn await_completion_interruptible(
        &self,
        id: &str,
        token: &CancelToken,
    ) -> Result<TaskStatus, LifecycleError> {
        let Some(handle) = self.registry.get(id) else {
            return Ok(TaskStatus::default());
        };
        handle
            .signal()
            .wait_cancellable(token)
            .map_err(|_| LifecycleError::WaitInterrupted(id.to_string()))
    }

    /// Snapshot of every live task, oldest first.
    #[must_use]
    pub fn tasks(&self) -> Vec<TaskSnapshot> {
        self.registry.snapshot()
    }

    /// Pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Whether shutdown has begun.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.pool.is_shutdown()
    }

    /// Stop accepting work, stop every live task and join the workers.
    pub fn shutdown(&self) {
        info!(live_tasks = self.registry.len(), "Lifecycle coordinator shutting down");
        self.pool.shutdown();
    }

    fn admit(&self, id: &str, duration: u64) -> Result<Option<Arc<TaskHandle>>, LifecycleError> {
        let id = TaskId::new(id)?;
        if self.pool.is_shutdown() {
            self.audit.record(build_audit_event(
                id.as_str(),
                AuditAction::Rejected,
                None,
                Some("pool shut down".into()),
            ));
            return Err(LifecycleError::PoolShutdown);
        }

        let handle = Arc::new(TaskHandle::new(id, duration));
        if !self.registry.insert_if_absent(Arc::clone(&handle)) {
            debug!(task_id = %handle.id(), "Duplicate task id rejected");
            self.record(&handle, AuditAction::Rejected, Some("duplicate id"));
            return Ok(None);
        }
        self.record(&handle, AuditAction::Submitted, None);

        if let Err(e) = self.pool.enqueue(Arc::clone(&handle)) {
            warn!(task_id = %handle.id(), error = %e, "Admitted task could not be queued");
            let _ = handle.transition(TaskStatus::Queued, TaskStatus::Stopped);
            self.record(&handle, AuditAction::Rejected, Some("pool shut down"));
            handle.settle(&self.registry);
            return Err(e.into());
        }

        // A cancel that landed before the push could not dequeue the item.
        if handle.status() == TaskStatus::Stopped && self.pool.remove_if_pending(&handle) {
            debug!(task_id = %handle.id(), "Task stopped during admission");
            return Ok(Some(handle));
        }

        debug!(task_id = %handle.id(), duration, "Task admitted");
        Ok(Some(handle))
    }

    fn record(&self, handle: &TaskHandle, action: AuditAction, detail: Option<&str>) {
        self.audit.record(build_audit_event(
            handle.id().as_str(),
            action,
            None,
            detail.map(str::to_string),
        ));
    }
}

#[cfg(feature = "tokio-runtime")]
impl<E: TaskExecutor> LifecycleCoordinator<E> {
    /// Async [`await_completion`](Self::await_completion).
    ///
    /// The blocking wait runs on tokio's blocking pool.
    ///
    /// # Errors
    ///
    /// `Internal` if the blocking wait task fails.
    pub async fn await_completion_async(&self, id: &str) -> Result<TaskStatus, LifecycleError> {
        match self.registry.get(id) {
            Some(handle) => wait_blocking(handle).await,
            None => Ok(TaskStatus::default()),
        }
    }

    /// Async [`submit_and_wait`](Self::submit_and_wait).
    ///
    /// # Errors
    ///
    /// Same as [`submit_and_wait`](Self::submit_and_wait), plus `Internal` if
    /// the blocking wait task fails.
    pub async fn submit_and_wait_async(
        &self,
        id: &str,
        duration: u64,
    ) -> Result<TaskStatus, LifecycleError> {
        match self.admit(id, duration)? {
            Some(handle) => wait_blocking(handle).await,
            None => Err(LifecycleError::Duplicate(id.to_string())),
        }
    }
}

#[cfg(feature = "tokio-runtime")]
async fn wait_blocking(handle: Arc<TaskHandle>) -> Result<TaskStatus, LifecycleError> {
    if let Some(status) = handle.signal().poll() {
        return Ok(status);
    }
    tokio::task::spawn_blocking(move || handle.wait())
        .await
        .map_err(|e| LifecycleError::Internal(format!("completion wait failed: {e}")))
}

impl<E: TaskExecutor> fmt::Debug for LifecycleCoordinator<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleCoordinator")
            .field("live_tasks", &self.registry.len())
            .field("stats", &self.pool.stats())
            .finish_non_exhaustive()
    }
}
