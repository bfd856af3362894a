//! Build a coordinator, its executor and its audit sink from [`LifecycleConfig`].

use std::sync::Arc;

use tracing::debug;

use crate::config::{LifecycleConfig, WorkerPoolConfig};
use crate::core::{
    AuditSink, InMemoryAuditSink, LifecycleCoordinator, LifecycleError, NoopAuditSink,
    TaskExecutor, TimedExecutor,
};

/// A started coordinator plus the audit trail it writes to, if enabled.
#[derive(Debug)]
pub struct LifecycleRuntime<E: TaskExecutor> {
    /// The running coordinator.
    pub coordinator: LifecycleCoordinator<E>,
    /// Shared view of the audit trail; `None` when `audit_capacity` is 0.
    pub audit: Option<InMemoryAuditSink>,
}

/// Build a coordinator running the built-in [`TimedExecutor`] with the
/// configured unit length.
///
/// # Errors
///
/// `InvalidConfig` if validation fails, `Internal` if workers cannot start.
pub fn build_coordinator(
    cfg: &LifecycleConfig,
) -> Result<LifecycleRuntime<TimedExecutor>, LifecycleError> {
    build_coordinator_with(cfg, |pool_cfg| {
        Ok(TimedExecutor::from_millis(pool_cfg.unit_millis))
    })
}

/// Build a coordinator whose executor comes from `executor_factory`.
///
/// # Errors
///
/// `InvalidConfig` if validation fails, whatever the factory returns, and
/// `Internal` if workers cannot start.
pub fn build_coordinator_with<E, FE>(
    cfg: &LifecycleConfig,
    executor_factory: FE,
) -> Result<LifecycleRuntime<E>, LifecycleError>
where
    E: TaskExecutor,
    FE: FnOnce(&WorkerPoolConfig) -> Result<E, LifecycleError>,
{
    cfg.validate()
        .map_err(|e| LifecycleError::InvalidConfig(format!("config invalid: {e}")))?;

    let executor = executor_factory(&cfg.pool)?;
    let audit = (cfg.audit_capacity > 0).then(|| InMemoryAuditSink::new(cfg.audit_capacity));
    let sink: Arc<dyn AuditSink> = match &audit {
        Some(sink) => Arc::new(sink.clone()),
        None => Arc::new(NoopAuditSink),
    };
    debug!(
        worker_count = cfg.pool.worker_count,
        audit_capacity = cfg.audit_capacity,
        "Building lifecycle coordinator"
    );

    let coordinator = LifecycleCoordinator::with_audit(cfg.pool.clone(), executor, sink)?;
    Ok(LifecycleRuntime { coordinator, audit })
}
