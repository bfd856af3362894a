//! Task status and the lock-free cell that enforces its transition graph.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

/// Status of a task in its lifecycle.
///
/// ```text
/// QUEUED ──► RUNNING ──► DONE
///    │          │
///    └──────────┴──────► STOPPED
/// ```
///
/// `DONE` and `STOPPED` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Admitted and waiting for a free worker.
    Queued,
    /// A worker is executing the task.
    Running,
    /// Workload ran to exhaustion.
    ///
    /// Also the reported status for ids the registry does not know.
    #[default]
    Done,
    /// Cancelled while queued, interrupted while running, or failed.
    Stopped,
}

impl TaskStatus {
    /// Returns `true` for `Done` and `Stopped`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Stopped)
    }

    /// Returns `true` for `Queued` and `Running`.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !self.is_terminal()
    }

    /// Whether `self -> next` is an edge of the lifecycle graph.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Running | Self::Stopped) | (Self::Running, Self::Done | Self::Stopped)
        )
    }

    /// Wire name (`QUEUED`, `RUNNING`, `DONE`, `STOPPED`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Done => "DONE",
            Self::Stopped => "STOPPED",
        }
    }

    const fn to_u8(self) -> u8 {
        match self {
            Self::Queued => 0,
            Self::Running => 1,
            Self::Done => 2,
            Self::Stopped => 3,
        }
    }

    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Queued,
            1 => Self::Running,
            2 => Self::Done,
            _ => Self::Stopped,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Atomic status cell.
///
/// Every write goes through [`AtomicStatus::transition`], a compare-and-swap
/// restricted to edges of the lifecycle graph, so concurrent writers racing
/// on the same edge resolve to exactly one winner.
#[derive(Debug)]
pub struct AtomicStatus {
    raw: AtomicU8,
}

impl AtomicStatus {
    /// New cell in the given status.
    #[must_use]
    pub const fn new(status: TaskStatus) -> Self {
        Self {
            raw: AtomicU8::new(status.to_u8()),
        }
    }

    /// Current status.
    #[must_use]
    pub fn load(&self) -> TaskStatus {
        TaskStatus::from_u8(self.raw.load(Ordering::Acquire))
    }

    /// Move from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns the status actually observed when the cell no longer holds
    /// `from`, or `from` itself when `from -> to` is not a legal edge.
    pub fn transition(&self, from: TaskStatus, to: TaskStatus) -> Result<(), TaskStatus> {
        if !from.can_transition_to(to) {
            return Err(from);
        }
        self.raw
            .compare_exchange(from.to_u8(), to.to_u8(), Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(TaskStatus::from_u8)
    }
}

impl Default for AtomicStatus {
    fn default() -> Self {
        Self::new(TaskStatus::Queued)
    }
}
