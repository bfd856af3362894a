//! Task lifecycle engine: handles, registry, worker pool and coordinator.

pub mod audit;
pub mod cancel;
pub mod coordinator;
pub mod error;
pub mod executor;
pub mod handle;
pub mod registry;
pub mod signal;
pub mod status;
pub mod worker_pool;

pub use audit::{
    build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink, NoopAuditSink,
};
pub use cancel::{CancelRegistration, CancelToken, Interrupted};
pub use coordinator::{CancelOutcome, LifecycleCoordinator};
pub use error::{AppResult, LifecycleError};
pub use executor::{run_chunked, ExecOutcome, StepError, TaskExecutor, TimedExecutor};
pub use handle::{TaskHandle, TaskId, TaskSnapshot};
pub use registry::TaskRegistry;
pub use signal::CompletionSignal;
pub use status::{AtomicStatus, TaskStatus};
pub use worker_pool::{PoolError, PoolStats, WorkItem, WorkerPool};
