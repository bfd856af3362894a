//! Tests for configuration validation

use prometheus_task_lifecycle::config::{LifecycleConfig, WorkerPoolConfig};
use std::collections::HashMap;

#[test]
fn test_pool_config_validation() {
    let valid = WorkerPoolConfig::new()
        .with_worker_count(4)
        .with_unit_millis(250)
        .with_join_timeout_ms(100);
    assert!(valid.validate().is_ok());
}

#[test]
fn test_pool_config_invalid_values() {
    assert!(WorkerPoolConfig::new().with_worker_count(0).validate().is_err());
    assert!(WorkerPoolConfig::new().with_unit_millis(0).validate().is_err());
    assert!(WorkerPoolConfig::new().with_thread_stack_size(0).validate().is_err());
    assert!(WorkerPoolConfig::new().with_join_timeout_ms(0).validate().is_err());
}

#[test]
fn test_lifecycle_config_from_json() {
    let cfg = LifecycleConfig::from_json_str(
        r#"{"pool": {"worker_count": 8, "unit_millis": 20}, "audit_capacity": 0}"#,
    )
    .unwrap();
    assert_eq!(cfg.pool.worker_count, 8);
    assert_eq!(cfg.pool.unit_millis, 20);
    assert_eq!(cfg.pool.join_timeout_ms, WorkerPoolConfig::default().join_timeout_ms);
    assert_eq!(cfg.audit_capacity, 0);
}

#[test]
fn test_lifecycle_config_json_rejects_invalid() {
    assert!(LifecycleConfig::from_json_str(r#"{"pool": {"worker_count": 0}}"#).is_err());
    assert!(LifecycleConfig::from_json_str("not json").is_err());
}

#[test]
fn test_lifecycle_config_from_lookup() {
    let vars: HashMap<&str, &str> = [("TASK_WORKER_COUNT", "5"), ("TASK_UNIT_MILLIS", " 75 ")]
        .into_iter()
        .collect();
    let cfg = LifecycleConfig::from_lookup(|key: &str| vars.get(key).map(|v| (*v).to_string())).unwrap();
    assert_eq!(cfg.pool.worker_count, 5);
    assert_eq!(cfg.pool.unit_millis, 75);
    assert_eq!(cfg.audit_capacity, LifecycleConfig::default().audit_capacity);
}

#[test]
fn test_lifecycle_config_from_lookup_bad_number() {
    let err = LifecycleConfig::from_lookup(|key: &str| {
        (key == "TASK_JOIN_TIMEOUT_MS").then(|| "soon".to_string())
    })
    .unwrap_err();
    assert!(err.to_string().contains("TASK_JOIN_TIMEOUT_MS"));
}
