//! Tests for builder modules

use prometheus_task_lifecycle::builders::{build_coordinator, build_coordinator_with};
use prometheus_task_lifecycle::config::{LifecycleConfig, WorkerPoolConfig};
use prometheus_task_lifecycle::core::{
    AuditAction, CancelToken, ExecOutcome, LifecycleError, TaskHandle, TaskStatus,
};

fn fast_config(audit_capacity: usize) -> LifecycleConfig {
    LifecycleConfig {
        pool: WorkerPoolConfig::new().with_worker_count(2).with_unit_millis(5),
        audit_capacity,
    }
}

#[test]
fn test_build_coordinator_with_audit() {
    let runtime = build_coordinator(&fast_config(64)).unwrap();
    let audit = runtime.audit.expect("audit enabled");

    assert_eq!(runtime.coordinator.submit_and_wait("b1", 2), Ok(TaskStatus::Done));
    assert_eq!(
        audit.actions_for("b1"),
        vec![AuditAction::Submitted, AuditAction::Started, AuditAction::Completed]
    );
    assert_eq!(runtime.coordinator.stats().worker_count, 2);
    runtime.coordinator.shutdown();
}

#[test]
fn test_build_coordinator_without_audit() {
    let runtime = build_coordinator(&fast_config(0)).unwrap();
    assert!(runtime.audit.is_none());
    runtime.coordinator.shutdown();
}

#[test]
fn test_build_coordinator_rejects_invalid_config() {
    let mut cfg = fast_config(0);
    cfg.pool.worker_count = 0;
    assert!(matches!(
        build_coordinator(&cfg),
        Err(LifecycleError::InvalidConfig(_))
    ));
}

#[test]
fn test_build_coordinator_with_custom_executor() {
    let runtime = build_coordinator_with(&fast_config(0), |pool| {
        let limit = pool.unit_millis;
        Ok(move |task: &TaskHandle, _: &CancelToken| {
            if task.duration() > limit {
                ExecOutcome::Failed("too long".into())
            } else {
                ExecOutcome::Completed
            }
        })
    })
    .unwrap();

    assert_eq!(runtime.coordinator.submit_and_wait("ok", 1), Ok(TaskStatus::Done));
    assert_eq!(runtime.coordinator.submit_and_wait("big", 99), Ok(TaskStatus::Stopped));
    runtime.coordinator.shutdown();
}

#[test]
fn test_executor_factory_error_propagates() {
    let result = build_coordinator_with(&fast_config(0), |_| {
        Err::<fn(&TaskHandle, &CancelToken) -> ExecOutcome, _>(LifecycleError::Internal(
            "no model".into(),
        ))
    });
    assert_eq!(result.err(), Some(LifecycleError::Internal("no model".into())));
}
