//! Tests for error types

use prometheus_task_lifecycle::core::{LifecycleError, PoolError};

#[test]
fn test_empty_id_error() {
    let err = LifecycleError::EmptyId;
    assert_eq!(format!("{}", err), "task id must not be empty");
}

#[test]
fn test_duplicate_error() {
    let err = LifecycleError::Duplicate("t1".to_string());
    assert_eq!(format!("{}", err), "duplicate task id: t1");
}

#[test]
fn test_wait_interrupted_error() {
    let err = LifecycleError::WaitInterrupted("t9".to_string());
    assert_eq!(format!("{}", err), "wait for task t9 was interrupted");
}

#[test]
fn test_pool_error_conversion() {
    assert_eq!(LifecycleError::from(PoolError::PoolShutdown), LifecycleError::PoolShutdown);
    assert_eq!(
        LifecycleError::from(PoolError::InvalidConfig("worker_count".into())),
        LifecycleError::InvalidConfig("worker_count".into())
    );
    assert_eq!(
        LifecycleError::from(PoolError::Internal("spawn".into())),
        LifecycleError::Internal("spawn".into())
    );
}

#[test]
fn test_errors_into_anyhow() {
    let err: anyhow::Error = LifecycleError::Timeout.into();
    assert_eq!(err.to_string(), "timed out waiting for task");
}
