//! Transport-facing request/response models and handlers.

pub mod api;

pub use api::{
    check_status, health, list_tasks, queue_task, stop_task, ApiError, ApiErrorKind, Health,
    IdRequest, SubmitRequest, TaskList, TaskStatusResponse,
};
#[cfg(feature = "tokio-runtime")]
pub use api::queue_task_async;
