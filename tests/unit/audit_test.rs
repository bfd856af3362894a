//! Tests for audit sink

use prometheus_task_lifecycle::core::{build_audit_event, AuditAction, AuditSink, InMemoryAuditSink};

#[test]
fn test_in_memory_audit_sink() {
    let sink = InMemoryAuditSink::new(10);

    let event = build_audit_event("task1", AuditAction::Started, Some(2), Some("payload".to_string()));
    sink.record(event);
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].task_id, "task1");
    assert_eq!(events[0].action, AuditAction::Started);
    assert_eq!(events[0].worker, Some(2));
    assert!(events[0].created_at_ms > 0);
}

#[test]
fn test_audit_sink_overflow() {
    let sink = InMemoryAuditSink::new(2);

    sink.record(build_audit_event("a", AuditAction::Submitted, None, None));
    sink.record(build_audit_event("b", AuditAction::Submitted, None, None));
    sink.record(build_audit_event("c", AuditAction::Submitted, None, None));

    let ids: Vec<_> = sink.events().into_iter().map(|e| e.task_id).collect();
    assert_eq!(ids, vec!["b", "c"]);
}

#[test]
fn test_audit_event_json() {
    let event = build_audit_event("t1", AuditAction::StopRequested, None, None);
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["action"], "stop_requested");
    assert_eq!(json["task_id"], "t1");
    assert!(json["worker"].is_null());
}
