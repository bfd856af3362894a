//! API-facing request/response models and the handlers a transport calls.
//!
//! Bodies mirror the JSON a client sends: `{"id": "...", "time": 3}` to queue
//! and `{"id": "..."}` for status and stop. Handlers never panic on bad
//! input; they answer with an [`ApiError`] the transport maps to a status
//! code.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{
    LifecycleCoordinator, LifecycleError, PoolStats, TaskExecutor, TaskSnapshot, TaskStatus,
};

/// Queue request: run task `id` for `time` units and wait for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    /// Task identifier.
    pub id: Option<String>,
    /// Workload length in units.
    #[serde(default)]
    pub time: u64,
}

/// Request naming a single task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRequest {
    /// Task identifier.
    pub id: Option<String>,
}

/// Task status response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatusResponse {
    /// Task identifier.
    pub id: String,
    /// Current or final status.
    pub status: TaskStatus,
}

/// Listing of live tasks.
#[derive(Debug, Clone, Serialize)]
pub struct TaskList {
    /// Live tasks, oldest first.
    pub tasks: Vec<TaskSnapshot>,
    /// Pool counters.
    pub stats: PoolStats,
}

/// Health response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag.
    pub ok: bool,
}

/// Error class, for mapping onto transport status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// Malformed or refused request.
    BadRequest,
    /// The service is shutting down.
    Unavailable,
    /// Anything else.
    Internal,
}

impl ApiErrorKind {
    /// HTTP status code conventionally used for this kind.
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::Unavailable => 503,
            Self::Internal => 500,
        }
    }
}

/// Error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error class.
    pub kind: ApiErrorKind,
    /// Optional message; omitted for a bare bad request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiError {
    fn new(kind: ApiErrorKind, error: Option<&str>) -> Self {
        Self {
            kind,
            error: error.map(str::to_string),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(msg) => write!(f, "{:?}: {msg}", self.kind),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::EmptyId => Self::new(ApiErrorKind::BadRequest, None),
            LifecycleError::Duplicate(_) => Self::new(ApiErrorKind::BadRequest, Some("duplicate id")),
            LifecycleError::PoolShutdown => {
                Self::new(ApiErrorKind::Unavailable, Some("pool has been shut down"))
            }
            other => Self::new(ApiErrorKind::Internal, Some(&other.to_string())),
        }
    }
}

fn require_id(id: Option<&str>) -> Result<&str, ApiError> {
    match id {
        Some(id) if !id.trim().is_empty() => Ok(id),
        _ => Err(ApiError::new(ApiErrorKind::BadRequest, None)),
    }
}

/// Submit a task and block until it settles.
///
/// # Errors
///
/// `BadRequest` for a missing, blank or duplicate id; `Unavailable` after
/// shutdown.
pub fn queue_task<E: TaskExecutor>(
    coordinator: &LifecycleCoordinator<E>,
    req: &SubmitRequest,
) -> Result<TaskStatusResponse, ApiError> {
    let id = require_id(req.id.as_deref())?;
    let status = coordinator.submit_and_wait(id, req.time)?;
    Ok(TaskStatusResponse {
        id: id.to_string(),
        status,
    })
}

/// Async [`queue_task`]; the wait runs on tokio's blocking pool.
///
/// # Errors
///
/// Same as [`queue_task`].
#[cfg(feature = "tokio-runtime")]
pub async fn queue_task_async<E: TaskExecutor>(
    coordinator: &LifecycleCoordinator<E>,
    req: &SubmitRequest,
) -> Result<TaskStatusResponse, ApiError> {
    let id = require_id(req.id.as_deref())?;
    let status = coordinator.submit_and_wait_async(id, req.time).await?;
    Ok(TaskStatusResponse {
        id: id.to_string(),
        status,
    })
}

/// Current status of a task. Unknown ids report `DONE`.
///
/// # Errors
///
/// `BadRequest` for a missing or blank id.
pub fn check_status<E: TaskExecutor>(
    coordinator: &LifecycleCoordinator<E>,
    req: &IdRequest,
) -> Result<TaskStatusResponse, ApiError> {
    let id = require_id(req.id.as_deref())?;
    Ok(TaskStatusResponse {
        id: id.to_string(),
        status: coordinator.status(id),
    })
}

/// Stop a task. Always answers `STOPPED`, found or not.
///
/// # Errors
///
/// `BadRequest` for a missing or blank id.
pub fn stop_task<E: TaskExecutor>(
    coordinator: &LifecycleCoordinator<E>,
    req: &IdRequest,
) -> Result<TaskStatusResponse, ApiError> {
    let id = require_id(req.id.as_deref())?;
    let outcome = coordinator.cancel(id);
    Ok(TaskStatusResponse {
        id: id.to_string(),
        status: outcome.reported_status(),
    })
}

/// Live tasks and pool counters.
pub fn list_tasks<E: TaskExecutor>(coordinator: &LifecycleCoordinator<E>) -> TaskList {
    TaskList {
        tasks: coordinator.tasks(),
        stats: coordinator.stats(),
    }
}

/// Healthy until shutdown begins.
pub fn health<E: TaskExecutor>(coordinator: &LifecycleCoordinator<E>) -> Health {
    Health {
        ok: !coordinator.is_shutdown(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_id() {
        assert_eq!(require_id(Some("a")), Ok("a"));
        assert!(require_id(Some("  ")).is_err());
        assert!(require_id(None).is_err());
    }

    #[test]
    fn test_error_mapping() {
        let dup: ApiError = LifecycleError::Duplicate("x".into()).into();
        assert_eq!(dup.kind, ApiErrorKind::BadRequest);
        assert_eq!(dup.error.as_deref(), Some("duplicate id"));

        let down: ApiError = LifecycleError::PoolShutdown.into();
        assert_eq!(down.kind.status_code(), 503);

        let empty: ApiError = LifecycleError::EmptyId.into();
        assert_eq!(serde_json::to_string(&empty).unwrap(), r#"{"kind":"bad_request"}"#);
    }

    #[test]
    fn test_submit_request_defaults_time() {
        let req: SubmitRequest = serde_json::from_str(r#"{"id":"t1"}"#).unwrap();
        assert_eq!(req.time, 0);
        let req: SubmitRequest = serde_json::from_str(r#"{"time":2}"#).unwrap();
        assert!(req.id.is_none());
    }
}
