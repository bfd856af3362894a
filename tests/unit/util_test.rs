//! Tests for utility functions

use prometheus_task_lifecycle::util::{init_tracing, now_ms};

#[test]
fn test_now_ms() {
    let before = now_ms();
    std::thread::sleep(std::time::Duration::from_millis(5));
    assert!(now_ms() >= before + 5);
}

#[test]
fn test_init_tracing_is_repeatable() {
    init_tracing();
    init_tracing();
    tracing::info!(task_id = "t1", "tracing initialized twice without panicking");
}
