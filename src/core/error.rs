//! Error types for lifecycle operations.

use thiserror::Error;

use super::worker_pool::PoolError;

/// Errors produced by the lifecycle coordinator and its collaborators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// Submission carried an empty or missing id.
    #[error("task id must not be empty")]
    EmptyId,
    /// A task with this id is still registered.
    #[error("duplicate task id: {0}")]
    Duplicate(String),
    /// The worker pool has been shut down; no new work is accepted.
    #[error("worker pool has been shut down")]
    PoolShutdown,
    /// A caller-imposed wait limit elapsed before the task settled.
    #[error("timed out waiting for task")]
    Timeout,
    /// The waiting caller was itself asked to stop.
    #[error("wait for task {0} was interrupted")]
    WaitInterrupted(String),
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Internal failure (thread spawn, runtime join, ...).
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<PoolError> for LifecycleError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::PoolShutdown => Self::PoolShutdown,
            PoolError::InvalidConfig(msg) => Self::InvalidConfig(msg),
            PoolError::Internal(msg) => Self::Internal(msg),
        }
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
