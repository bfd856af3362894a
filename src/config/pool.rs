//! Worker pool configuration.

use serde::{Deserialize, Serialize};

/// Default number of worker threads.
pub const DEFAULT_WORKER_COUNT: usize = 3;
/// Default length of one workload unit, in milliseconds.
pub const DEFAULT_UNIT_MILLIS: u64 = 1_000;
/// Default worker thread stack size (2 MiB).
pub const DEFAULT_THREAD_STACK_SIZE: usize = 2 * 1024 * 1024;
/// Default per-worker join timeout at shutdown, in milliseconds.
pub const DEFAULT_JOIN_TIMEOUT_MS: u64 = 2_000;

/// Worker pool configuration.
///
/// Missing fields fall back to the defaults above when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerPoolConfig {
    /// Number of worker threads.
    pub worker_count: usize,
    /// Length of one workload unit in milliseconds.
    pub unit_millis: u64,
    /// Stack size for each worker thread, in bytes.
    pub thread_stack_size: usize,
    /// How long shutdown waits for each worker before detaching it.
    pub join_timeout_ms: u64,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            unit_millis: DEFAULT_UNIT_MILLIS,
            thread_stack_size: DEFAULT_THREAD_STACK_SIZE,
            join_timeout_ms: DEFAULT_JOIN_TIMEOUT_MS,
        }
    }
}

impl WorkerPoolConfig {
    /// Configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads.
    #[must_use]
    pub const fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the workload unit length in milliseconds.
    #[must_use]
    pub const fn with_unit_millis(mut self, unit_millis: u64) -> Self {
        self.unit_millis = unit_millis;
        self
    }

    /// Set the worker thread stack size in bytes.
    #[must_use]
    pub const fn with_thread_stack_size(mut self, thread_stack_size: usize) -> Self {
        self.thread_stack_size = thread_stack_size;
        self
    }

    /// Set the per-worker join timeout in milliseconds.
    #[must_use]
    pub const fn with_join_timeout_ms(mut self, join_timeout_ms: u64) -> Self {
        self.join_timeout_ms = join_timeout_ms;
        self
    }

    /// Validate pool configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        if self.unit_millis == 0 {
            return Err("unit_millis must be greater than 0".into());
        }
        if self.thread_stack_size == 0 {
            return Err("thread_stack_size must be greater than 0".into());
        }
        if self.join_timeout_ms == 0 {
            return Err("join_timeout_ms must be greater than 0".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = WorkerPoolConfig::new();
        assert_eq!(cfg.worker_count, 3);
        assert_eq!(cfg.unit_millis, 1_000);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let cfg = WorkerPoolConfig::new()
            .with_worker_count(8)
            .with_unit_millis(25)
            .with_join_timeout_ms(500);
        assert_eq!(cfg.worker_count, 8);
        assert_eq!(cfg.unit_millis, 25);
        assert_eq!(cfg.join_timeout_ms, 500);
    }

    #[test]
    fn test_zero_workers_invalid() {
        let err = WorkerPoolConfig::new().with_worker_count(0).validate().unwrap_err();
        assert!(err.contains("worker_count"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: WorkerPoolConfig = serde_json::from_str(r#"{"worker_count": 5}"#).unwrap();
        assert_eq!(cfg.worker_count, 5);
        assert_eq!(cfg.unit_millis, DEFAULT_UNIT_MILLIS);
    }
}
