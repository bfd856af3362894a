//! Lifecycle audit trail.
//!
//! Every admission decision and status transition can be recorded to an
//! [`AuditSink`]. The in-memory sink is bounded and intended for tests and
//! diagnostics; production deployments plug in their own sink.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::util::clock::now_ms;

/// What happened to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Admitted and queued.
    Submitted,
    /// Refused at admission (duplicate id or pool shut down).
    Rejected,
    /// A worker moved it to `RUNNING`.
    Started,
    /// Reached `DONE`.
    Completed,
    /// Reached `STOPPED`.
    Stopped,
    /// Pulled out of the pending queue by a cancel.
    Dequeued,
    /// Interruption requested for a running task.
    StopRequested,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Submitted => "submitted",
            Self::Rejected => "rejected",
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Stopped => "stopped",
            Self::Dequeued => "dequeued",
            Self::StopRequested => "stop_requested",
        };
        f.write_str(s)
    }
}

/// Audit event structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Related task identifier.
    pub task_id: String,
    /// Action taken.
    pub action: AuditAction,
    /// Worker that performed the action, if any.
    pub worker: Option<usize>,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
    /// Additional context.
    pub detail: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: AuditEvent);
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: AuditEvent) {}
}

/// In-memory audit sink for testing and dev.
///
/// Bounded: once full, the oldest event is evicted. Clones share the same
/// buffer, so a test can keep one clone and hand another to the coordinator.
#[derive(Clone)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<VecDeque<AuditEvent>>>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(max_events.min(4096)))),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Actions recorded for one task, in order.
    #[must_use]
    pub fn actions_for(&self, task_id: &str) -> Vec<AuditAction> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.task_id == task_id)
            .map(|e| e.action)
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        if self.max_events == 0 {
            return;
        }
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

impl fmt::Debug for InMemoryAuditSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryAuditSink")
            .field("len", &self.events.lock().len())
            .field("max_events", &self.max_events)
            .finish()
    }
}

/// Helper to build an audit event from context.
pub fn build_audit_event(
    task_id: impl Into<String>,
    action: AuditAction,
    worker: Option<usize>,
    detail: Option<String>,
) -> AuditEvent {
    AuditEvent {
        task_id: task_id.into(),
        action,
        worker,
        created_at_ms: now_ms(),
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_buffer() {
        let sink = InMemoryAuditSink::new(8);
        let other = sink.clone();
        other.record(build_audit_event("t1", AuditAction::Submitted, None, None));
        assert_eq!(sink.events().len(), 1);
    }

    #[test]
    fn test_zero_capacity_records_nothing() {
        let sink = InMemoryAuditSink::new(0);
        sink.record(build_audit_event("t1", AuditAction::Submitted, None, None));
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_actions_for_filters_by_task() {
        let sink = InMemoryAuditSink::new(8);
        sink.record(build_audit_event("a", AuditAction::Submitted, None, None));
        sink.record(build_audit_event("b", AuditAction::Submitted, None, None));
        sink.record(build_audit_event("a", AuditAction::Started, Some(0), None));
        assert_eq!(
            sink.actions_for("a"),
            vec![AuditAction::Submitted, AuditAction::Started]
        );
    }

    #[test]
    fn test_action_display() {
        assert_eq!(AuditAction::StopRequested.to_string(), "stop_requested");
    }
}
