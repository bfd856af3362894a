//! Task execution traits and the built-in timed workload.

use std::time::Duration;

use super::cancel::{CancelToken, Interrupted};
use super::handle::TaskHandle;

/// How an execution ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    /// The workload was exhausted; the task becomes `DONE`.
    Completed,
    /// The cancel token was observed; the task becomes `STOPPED`.
    Interrupted,
    /// The workload failed; the task becomes `STOPPED`.
    Failed(String),
}

/// Why a chunk of work did not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    /// Cancellation was observed inside the chunk.
    Interrupted,
    /// The chunk failed.
    Failed(String),
}

impl From<Interrupted> for StepError {
    fn from(_: Interrupted) -> Self {
        Self::Interrupted
    }
}

/// Executes a task's workload on a worker thread.
///
/// Implementations should work in small increments and stop promptly once
/// `cancel` is cancelled; [`run_chunked`] captures that pattern. The worker
/// catches panics and treats them as [`ExecOutcome::Failed`].
///
/// # Example
///
/// ```rust
/// use prometheus_task_lifecycle::core::{
///     run_chunked, CancelToken, ExecOutcome, TaskExecutor, TaskHandle,
/// };
///
/// struct Checksum;
///
/// impl TaskExecutor for Checksum {
///     fn execute(&self, task: &TaskHandle, cancel: &CancelToken) -> ExecOutcome {
///         let mut acc = 0u64;
///         run_chunked(cancel, task.duration(), |chunk| {
///             acc = acc.wrapping_add(chunk);
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait TaskExecutor: Send + Sync + 'static {
    /// Run `task`'s workload, checking `cancel` between increments.
    fn execute(&self, task: &TaskHandle, cancel: &CancelToken) -> ExecOutcome;
}

impl<F> TaskExecutor for F
where
    F: Fn(&TaskHandle, &CancelToken) -> ExecOutcome + Send + Sync + 'static,
{
    fn execute(&self, task: &TaskHandle, cancel: &CancelToken) -> ExecOutcome {
        self(task, cancel)
    }
}

/// Run `chunks` increments of work with a cancellation checkpoint before each.
///
/// `step` receives the chunk index. Returning [`StepError::Interrupted`]
/// (e.g. via `?` on [`CancelToken::sleep`]) ends the run as interrupted.
pub fn run_chunked<F>(cancel: &CancelToken, chunks: u64, mut step: F) -> ExecOutcome
where
    F: FnMut(u64) -> Result<(), StepError>,
{
    for chunk in 0..chunks {
        if cancel.is_cancelled() {
            return ExecOutcome::Interrupted;
        }
        match step(chunk) {
            Ok(()) => {}
            Err(StepError::Interrupted) => return ExecOutcome::Interrupted,
            Err(StepError::Failed(reason)) => return ExecOutcome::Failed(reason),
        }
    }
    ExecOutcome::Completed
}

/// Default workload: the task "runs" for `duration` units of `unit` each.
///
/// Each unit is an interruptible sleep, so a cancelled task stops within
/// moments rather than at the next unit boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedExecutor {
    unit: Duration,
}

impl TimedExecutor {
    /// Executor with the given unit length.
    #[must_use]
    pub const fn new(unit: Duration) -> Self {
        Self { unit }
    }

    /// Executor with a unit of `millis` milliseconds.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    /// Length of one unit.
    #[must_use]
    pub const fn unit(&self) -> Duration {
        self.unit
    }
}

impl Default for TimedExecutor {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl TaskExecutor for TimedExecutor {
    fn execute(&self, task: &TaskHandle, cancel: &CancelToken) -> ExecOutcome {
        run_chunked(cancel, task.duration(), |_| {
            cancel.sleep(self.unit)?;
            Ok(())
        })
    }
}
