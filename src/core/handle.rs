//! Per-task state: identity, status, completion signal and cancel token.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::cancel::CancelToken;
use super::error::LifecycleError;
use super::registry::TaskRegistry;
use super::signal::CompletionSignal;
use super::status::{AtomicStatus, TaskStatus};
use crate::util::clock::now_ms;

/// Caller-assigned task identifier. Never empty or all-whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Validate and wrap an id.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::EmptyId`] for empty or blank input.
    pub fn new(id: impl Into<String>) -> Result<Self, LifecycleError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(LifecycleError::EmptyId);
        }
        Ok(Self(id))
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TaskId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for TaskId {
    type Error = LifecycleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Point-in-time view of a registered task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    /// Task identifier.
    pub id: TaskId,
    /// Workload size in time units.
    pub duration: u64,
    /// Status when the snapshot was taken.
    pub status: TaskStatus,
    /// Admission time (ms since epoch).
    pub submitted_at_ms: u128,
}

/// Mutable record for one submitted unit of work.
///
/// Shared as `Arc<TaskHandle>` between the registry, the queued work item,
/// the executing worker and any waiters.
pub struct TaskHandle {
    id: TaskId,
    duration: u64,
    status: AtomicStatus,
    signal: CompletionSignal,
    cancel: CancelToken,
    submitted_at_ms: u128,
}

impl TaskHandle {
    /// New handle in `QUEUED`.
    #[must_use]
    pub fn new(id: TaskId, duration: u64) -> Self {
        Self {
            id,
            duration,
            status: AtomicStatus::new(TaskStatus::Queued),
            signal: CompletionSignal::new(),
            cancel: CancelToken::new(),
            submitted_at_ms: now_ms(),
        }
    }

    /// Task identifier.
    #[must_use]
    pub const fn id(&self) -> &TaskId {
        &self.id
    }

    /// Workload size in time units.
    #[must_use]
    pub const fn duration(&self) -> u64 {
        self.duration
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> TaskStatus {
        self.status.load()
    }

    /// Completion signal; fires once the task is terminal.
    #[must_use]
    pub const fn signal(&self) -> &CompletionSignal {
        &self.signal
    }

    /// Token the executing worker checks between work increments.
    #[must_use]
    pub const fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Admission time (ms since epoch).
    #[must_use]
    pub const fn submitted_at_ms(&self) -> u128 {
        self.submitted_at_ms
    }

    /// Block until the task is terminal.
    pub fn wait(&self) -> TaskStatus {
        self.signal.wait()
    }

    /// Snapshot for listings.
    #[must_use]
    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            id: self.id.clone(),
            duration: self.duration,
            status: self.status(),
            submitted_at_ms: self.submitted_at_ms,
        }
    }

    pub(crate) fn transition(&self, from: TaskStatus, to: TaskStatus) -> Result<(), TaskStatus> {
        self.status.transition(from, to)
    }

    /// Fire the completion signal with the current (terminal) status and
    /// drop this handle from the registry.
    ///
    /// Returns the status if this call fired the signal, `None` if it had
    /// already been fired. Registry removal only affects this exact handle.
    pub(crate) fn settle(self: &Arc<Self>, registry: &TaskRegistry) -> Option<TaskStatus> {
        let status = self.status();
        debug_assert!(status.is_terminal(), "settling non-terminal task {}", self.id);
        let fired = self.signal.fire(status);
        registry.remove_handle(self);
        fired.then_some(status)
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("duration", &self.duration)
            .field("status", &self.status())
            .field("fired", &self.signal.is_fired())
            .finish_non_exhaustive()
    }
}
