//! Native implementation of `WorkerPool` using OS threads.
//!
//! # Design Principles
//!
//! - **No polling**: idle workers block on the queue's `Condvar`; running
//!   workloads sleep on their task's cancel token
//! - **Typed queue**: pending work is a `VecDeque<WorkItem>` owned by the pool
//! - **Settle on every exit path**: a scope guard fires the completion signal
//!   and reaps the handle whether the workload finished, was interrupted,
//!   failed or panicked
//! - **Clean shutdown**: closing the queue unblocks idle workers, cancelling
//!   in-flight tokens unblocks busy ones

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::WorkerPoolConfig;
use crate::core::audit::{build_audit_event, AuditAction, AuditSink};
use crate::core::executor::{ExecOutcome, TaskExecutor};
use crate::core::handle::TaskHandle;
use crate::core::registry::TaskRegistry;
use crate::core::status::TaskStatus;
use crate::util::guard::ScopeGuard;

use super::queue::PendingQueue;
use super::{PoolCounters, PoolError, PoolStats, WorkItem};

/// State shared between the pool front-end and its worker threads.
struct PoolShared<E> {
    queue: PendingQueue,
    registry: Arc<TaskRegistry>,
    executor: E,
    counters: PoolCounters,
    audit: Arc<dyn AuditSink>,
    shutdown: AtomicBool,
    /// Handle executing on each worker, indexed by worker id.
    active: Mutex<Vec<Option<Arc<TaskHandle>>>>,
}

impl<E> PoolShared<E> {
    fn audit(&self, handle: &TaskHandle, action: AuditAction, worker: Option<usize>) {
        self.audit
            .record(build_audit_event(handle.id().as_str(), action, worker, None));
    }

    /// Settle a task that never reached `RUNNING`.
    ///
    /// A canceller may already have moved it to `STOPPED`; either way it ends
    /// `STOPPED` here.
    fn settle_unstarted(&self, handle: &Arc<TaskHandle>, worker: Option<usize>) {
        let _ = handle.transition(TaskStatus::Queued, TaskStatus::Stopped);
        self.counters.stopped_tasks.fetch_add(1, Ordering::Relaxed);
        self.audit(handle, AuditAction::Stopped, worker);
        handle.settle(&self.registry);
    }

    fn set_active(&self, worker_id: usize, handle: Option<Arc<TaskHandle>>) {
        if let Some(slot) = self.active.lock().get_mut(worker_id) {
            *slot = handle;
        }
    }

    /// Close the pool: refuse new work, stop everything pending, interrupt
    /// everything running. Returns `false` if already closed.
    fn close(&self) -> bool {
        if self.shutdown.swap(true, Ordering::SeqCst) {
            return false;
        }

        let drained = self.queue.close();
        if !drained.is_empty() {
            debug!(count = drained.len(), "Stopping pending tasks at shutdown");
        }
        for item in drained {
            self.counters.queued_tasks.fetch_sub(1, Ordering::Relaxed);
            self.settle_unstarted(item.handle(), None);
        }

        for handle in self.active.lock().iter().flatten() {
            debug!(task_id = %handle.id(), "Interrupting running task at shutdown");
            handle.cancel_token().cancel();
        }
        true
    }
}

/// Worker pool with dedicated OS threads.
///
/// # Design
///
/// - **FIFO dispatch**: items are handed to workers in submission order
/// - **Unbounded**: `enqueue` never blocks; it only fails after shutdown
/// - **Lock-light**: atomic counters, one queue mutex, one registry lock
pub struct WorkerPool<E: TaskExecutor> {
    /// Pool configuration.
    config: WorkerPoolConfig,

    /// Queue, registry, executor and bookkeeping shared with workers.
    shared: Arc<PoolShared<E>>,

    /// Worker thread handles.
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl<E: TaskExecutor> WorkerPool<E> {
    /// Create a new worker pool and spawn its threads.
    ///
    /// Workers settle finished tasks against `registry` and report
    /// transitions to `audit`.
    ///
    /// # Errors
    ///
    /// - `PoolError::InvalidConfig` if the configuration is invalid
    /// - `PoolError::Internal` if a worker thread cannot be spawned
    pub fn new(
        config: WorkerPoolConfig,
        executor: E,
        registry: Arc<TaskRegistry>,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, PoolError> {
        config.validate().map_err(PoolError::InvalidConfig)?;

        let shared = Arc::new(PoolShared {
            queue: PendingQueue::new(),
            registry,
            executor,
            counters: PoolCounters::default(),
            audit,
            shutdown: AtomicBool::new(false),
            active: Mutex::new(vec![None; config.worker_count]),
        });

        let mut workers = Vec::with_capacity(config.worker_count);
        for worker_id in 0..config.worker_count {
            match spawn_worker(worker_id, Arc::clone(&shared), config.thread_stack_size) {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    error!(worker_id, error = %e, "Failed to spawn worker thread");
                    shared.close();
                    return Err(PoolError::Internal(format!(
                        "failed to spawn worker {worker_id}: {e}"
                    )));
                }
            }
        }

        info!(
            worker_count = config.worker_count,
            unit_millis = config.unit_millis,
            "WorkerPool initialized with dedicated OS threads"
        );

        Ok(Self {
            config,
            shared,
            workers: Mutex::new(workers),
        })
    }

    /// Queue a task for execution.
    ///
    /// # Errors
    ///
    /// `PoolError::PoolShutdown` if the pool has been shut down.
    pub fn enqueue(&self, handle: Arc<TaskHandle>) -> Result<(), PoolError> {
        if self.shared.shutdown.load(Ordering::Acquire) {
            return Err(PoolError::PoolShutdown);
        }

        // Count before pushing so a fast worker never decrements first.
        self.shared.counters.queued_tasks.fetch_add(1, Ordering::Relaxed);
        match self.shared.queue.push(WorkItem::new(handle)) {
            Ok(()) => {
                self.shared
                    .counters
                    .submitted_tasks
                    .fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(item) => {
                self.shared.counters.queued_tasks.fetch_sub(1, Ordering::Relaxed);
                debug!(task_id = %item.id(), "Enqueue refused, pool closed");
                Err(PoolError::PoolShutdown)
            }
        }
    }

    /// Pull the pending item for `handle` out of the queue before any worker
    /// takes it, and settle its task as `STOPPED`.
    ///
    /// Returns `false` if no such item is pending (never queued, already
    /// taken by a worker, or already removed).
    pub fn remove_if_pending(&self, handle: &Arc<TaskHandle>) -> bool {
        let Some(item) = self.shared.queue.remove(handle) else {
            return false;
        };
        let counters = &self.shared.counters;
        counters.queued_tasks.fetch_sub(1, Ordering::Relaxed);
        counters.dequeued_tasks.fetch_add(1, Ordering::Relaxed);

        let handle = item.into_handle();
        self.shared.audit(&handle, AuditAction::Dequeued, None);
        self.shared.settle_unstarted(&handle, None);
        debug!(task_id = %handle.id(), "Pending task removed from queue");
        true
    }

    /// Number of items waiting for a worker.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.shared.queue.len()
    }

    /// Number of worker threads.
    #[must_use]
    pub const fn worker_count(&self) -> usize {
        self.config.worker_count
    }

    /// Pool configuration.
    #[must_use]
    pub const fn config(&self) -> &WorkerPoolConfig {
        &self.config
    }

    /// Whether shutdown has begun.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shared.shutdown.load(Ordering::Acquire)
    }

    /// Get current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.shared.counters.snapshot(self.config.worker_count)
    }

    /// Shut down the pool.
    ///
    /// Pending tasks are settled as `STOPPED`, running tasks are interrupted,
    /// then each worker is joined for up to `join_timeout_ms`. Workers that
    /// don't exit within the timeout are detached to prevent hangs.
    pub fn shutdown(&self) {
        if !self.shared.close() {
            return;
        }

        info!("Shutting down worker pool");

        let timeout = Duration::from_millis(self.config.join_timeout_ms);
        let mut workers = self.workers.lock();
        let worker_count = workers.len();

        for (idx, worker) in workers.drain(..).enumerate() {
            if worker.thread().id() == thread::current().id() {
                warn!(worker_id = idx, "Shutdown called from a worker thread - detaching it");
                continue;
            }

            // Join on a helper thread so the wait can be bounded.
            let (tx, rx) = crossbeam_channel::bounded(1);
            let joiner = thread::Builder::new()
                .name(format!("task-worker-join-{idx}"))
                .spawn(move || {
                    let _ = tx.send(worker.join().is_ok());
                });
            if let Err(e) = joiner {
                warn!(worker_id = idx, error = %e, "Could not spawn join helper - detaching worker");
                continue;
            }

            match rx.recv_timeout(timeout) {
                Ok(true) => debug!(worker_id = idx, "Worker joined successfully"),
                Ok(false) => warn!(worker_id = idx, "Worker panicked"),
                Err(_) => {
                    warn!(worker_id = idx, "Worker did not exit within timeout - detaching");
                }
            }
        }

        info!(worker_count, "Worker pool shut down complete");
    }
}

impl<E: TaskExecutor> Drop for WorkerPool<E> {
    fn drop(&mut self) {
        // Signal shutdown but don't join: explicit shutdown() is the graceful path.
        if self.shared.close() {
            debug!("WorkerPool dropped without explicit shutdown - workers will be detached");
        }
    }
}

/// Spawn a worker thread.
fn spawn_worker<E: TaskExecutor>(
    worker_id: usize,
    shared: Arc<PoolShared<E>>,
    stack_size: usize,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("task-worker-{worker_id}"))
        .stack_size(stack_size)
        .spawn(move || {
            debug!(worker_id, "Worker thread started");

            // Blocks on the queue condvar; `None` once the queue is closed.
            while let Some(item) = shared.queue.pop() {
                shared.counters.queued_tasks.fetch_sub(1, Ordering::Relaxed);
                run_item(worker_id, &shared, item);
            }

            debug!(worker_id, "Worker thread exiting");
        })
}

/// Execute one dequeued item and settle its task.
fn run_item<E: TaskExecutor>(worker_id: usize, shared: &PoolShared<E>, item: WorkItem) {
    let waited = item.enqueued_at().elapsed();
    let handle = item.into_handle();

    // Cancelled between dequeue and start: never becomes RUNNING.
    if let Err(actual) = handle.transition(TaskStatus::Queued, TaskStatus::Running) {
        debug!(worker_id, task_id = %handle.id(), status = %actual, "Task stopped before start, skipping");
        shared.settle_unstarted(&handle, Some(worker_id));
        return;
    }

    shared.set_active(worker_id, Some(Arc::clone(&handle)));
    if shared.shutdown.load(Ordering::SeqCst) {
        handle.cancel_token().cancel();
    }
    shared.counters.active_tasks.fetch_add(1, Ordering::Relaxed);
    shared.audit(&handle, AuditAction::Started, Some(worker_id));

    debug!(
        worker_id,
        task_id = %handle.id(),
        duration = handle.duration(),
        waited_ms = waited.as_millis(),
        "Worker executing task"
    );

    let _settle = ScopeGuard::new(|| finish(worker_id, shared, &handle));

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        shared.executor.execute(&handle, handle.cancel_token())
    }))
    .unwrap_or_else(|payload| {
        warn!(worker_id, task_id = %handle.id(), "Task workload panicked");
        ExecOutcome::Failed(panic_message(payload.as_ref()))
    });

    let terminal = match outcome {
        ExecOutcome::Completed => TaskStatus::Done,
        ExecOutcome::Interrupted => {
            debug!(worker_id, task_id = %handle.id(), "Task interrupted");
            TaskStatus::Stopped
        }
        ExecOutcome::Failed(reason) => {
            error!(worker_id, task_id = %handle.id(), reason = %reason, "Task workload failed");
            TaskStatus::Stopped
        }
    };

    if let Err(actual) = handle.transition(TaskStatus::Running, terminal) {
        warn!(worker_id, task_id = %handle.id(), status = %actual, "Unexpected status after execution");
    }
}

/// Final step for a started task; runs from the scope guard on every path.
fn finish<E>(worker_id: usize, shared: &PoolShared<E>, handle: &Arc<TaskHandle>) {
    // Still RUNNING only if the worker's own bookkeeping unwound.
    let _ = handle.transition(TaskStatus::Running, TaskStatus::Stopped);

    shared.set_active(worker_id, None);
    shared.counters.active_tasks.fetch_sub(1, Ordering::Relaxed);

    let status = handle.status();
    if status == TaskStatus::Done {
        shared.counters.completed_tasks.fetch_add(1, Ordering::Relaxed);
        shared.audit(handle, AuditAction::Completed, Some(worker_id));
    } else {
        shared.counters.stopped_tasks.fetch_add(1, Ordering::Relaxed);
        shared.audit(handle, AuditAction::Stopped, Some(worker_id));
    }

    handle.settle(&shared.registry);
    debug!(worker_id, task_id = %handle.id(), status = %status, "Worker completed task");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "workload panicked".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::audit::{InMemoryAuditSink, NoopAuditSink};
    use crate::core::cancel::CancelToken;
    use crate::core::executor::TimedExecutor;
    use crate::core::handle::TaskId;
    use std::time::Instant;

    fn submit<E: TaskExecutor>(
        pool: &WorkerPool<E>,
        registry: &TaskRegistry,
        id: &str,
        duration: u64,
    ) -> Arc<TaskHandle> {
        let handle = Arc::new(TaskHandle::new(TaskId::new(id).unwrap(), duration));
        assert!(registry.insert_if_absent(Arc::clone(&handle)));
        pool.enqueue(Arc::clone(&handle)).unwrap();
        handle
    }

    fn pool_with<E: TaskExecutor>(workers: usize, executor: E) -> (WorkerPool<E>, Arc<TaskRegistry>) {
        let registry = Arc::new(TaskRegistry::new());
        let pool = WorkerPool::new(
            WorkerPoolConfig::new().with_worker_count(workers),
            executor,
            Arc::clone(&registry),
            Arc::new(NoopAuditSink),
        )
        .unwrap();
        (pool, registry)
    }

    #[test]
    fn test_worker_pool_basic() {
        let (pool, registry) = pool_with(2, TimedExecutor::from_millis(5));
        let handle = submit(&pool, &registry, "basic", 2);

        assert_eq!(handle.signal().wait_timeout(Duration::from_secs(5)), Some(TaskStatus::Done));
        assert!(registry.get("basic").is_none());

        let stats = pool.stats();
        assert_eq!(stats.submitted_tasks, 1);
        assert_eq!(stats.completed_tasks, 1);
        pool.shutdown();
    }

    #[test]
    fn test_invalid_config() {
        let result = WorkerPool::new(
            WorkerPoolConfig::new().with_worker_count(0),
            TimedExecutor::default(),
            Arc::new(TaskRegistry::new()),
            Arc::new(NoopAuditSink),
        );
        assert!(matches!(result, Err(PoolError::InvalidConfig(_))));
    }

    #[test]
    fn test_panicking_workload_still_settles() {
        let exec = |_: &TaskHandle, _: &CancelToken| -> ExecOutcome { panic!("workload exploded") };
        let (pool, registry) = pool_with(1, exec);

        let first = submit(&pool, &registry, "boom", 1);
        assert_eq!(first.signal().wait_timeout(Duration::from_secs(5)), Some(TaskStatus::Stopped));
        assert!(registry.is_empty());

        // The worker survived and keeps serving.
        let second = submit(&pool, &registry, "boom-2", 1);
        assert_eq!(second.signal().wait_timeout(Duration::from_secs(5)), Some(TaskStatus::Stopped));
        assert_eq!(pool.stats().stopped_tasks, 2);
        pool.shutdown();
    }

    #[test]
    fn test_failed_workload_is_stopped() {
        let exec = |_: &TaskHandle, _: &CancelToken| ExecOutcome::Failed("bad input".into());
        let (pool, registry) = pool_with(1, exec);
        let handle = submit(&pool, &registry, "fail", 1);
        assert_eq!(handle.signal().wait_timeout(Duration::from_secs(5)), Some(TaskStatus::Stopped));
        pool.shutdown();
    }

    #[test]
    fn test_remove_if_pending() {
        let (pool, registry) = pool_with(1, TimedExecutor::from_millis(50));
        let busy = submit(&pool, &registry, "busy", 4);
        let waiting = submit(&pool, &registry, "waiting", 4);

        // Give the single worker time to take "busy".
        thread::sleep(Duration::from_millis(30));
        assert!(!pool.remove_if_pending(&busy));
        assert!(pool.remove_if_pending(&waiting));
        assert!(!pool.remove_if_pending(&waiting));

        assert_eq!(waiting.signal().poll(), Some(TaskStatus::Stopped));
        assert!(registry.get("waiting").is_none());
        assert_eq!(pool.stats().dequeued_tasks, 1);

        busy.cancel_token().cancel();
        assert_eq!(busy.signal().wait_timeout(Duration::from_secs(5)), Some(TaskStatus::Stopped));
        pool.shutdown();
    }

    #[test]
    fn test_shutdown_stops_pending_and_running() {
        let audit = InMemoryAuditSink::new(64);
        let registry = Arc::new(TaskRegistry::new());
        let pool = WorkerPool::new(
            WorkerPoolConfig::new().with_worker_count(1),
            TimedExecutor::from_millis(1_000),
            Arc::clone(&registry),
            Arc::new(audit.clone()),
        )
        .unwrap();

        let running = submit(&pool, &registry, "running", 30);
        let pending = submit(&pool, &registry, "pending", 30);
        thread::sleep(Duration::from_millis(30));

        let start = Instant::now();
        pool.shutdown();
        assert!(start.elapsed() < Duration::from_secs(2), "shutdown waited on workload");

        assert_eq!(running.signal().wait_timeout(Duration::from_secs(1)), Some(TaskStatus::Stopped));
        assert_eq!(pending.signal().poll(), Some(TaskStatus::Stopped));
        assert!(!audit.actions_for("pending").contains(&AuditAction::Started));
        assert!(registry.is_empty());

        let late = Arc::new(TaskHandle::new(TaskId::new("late").unwrap(), 1));
        assert_eq!(pool.enqueue(late), Err(PoolError::PoolShutdown));
        assert!(pool.is_shutdown());
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let (pool, _registry) = pool_with(2, TimedExecutor::from_millis(5));
        pool.shutdown();
        pool.shutdown();
        assert!(pool.is_shutdown());
    }

    #[test]
    fn test_panic_message_extraction() {
        let s: Box<dyn Any + Send> = Box::new("static str");
        assert_eq!(panic_message(s.as_ref()), "static str");
        let s: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(s.as_ref()), "owned");
        let s: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(s.as_ref()), "workload panicked");
    }
}
