//! Root configuration for a lifecycle coordinator.

use anyhow::Context;
use serde::{Deserialize, Serialize};

use super::pool::WorkerPoolConfig;
use crate::core::AppResult;

/// Default number of audit events kept by the in-memory sink.
pub const DEFAULT_AUDIT_CAPACITY: usize = 1_024;

/// Environment variable for [`WorkerPoolConfig::worker_count`].
pub const ENV_WORKER_COUNT: &str = "TASK_WORKER_COUNT";
/// Environment variable for [`WorkerPoolConfig::unit_millis`].
pub const ENV_UNIT_MILLIS: &str = "TASK_UNIT_MILLIS";
/// Environment variable for [`WorkerPoolConfig::thread_stack_size`].
pub const ENV_THREAD_STACK_SIZE: &str = "TASK_THREAD_STACK_SIZE";
/// Environment variable for [`WorkerPoolConfig::join_timeout_ms`].
pub const ENV_JOIN_TIMEOUT_MS: &str = "TASK_JOIN_TIMEOUT_MS";
/// Environment variable for [`LifecycleConfig::audit_capacity`].
pub const ENV_AUDIT_CAPACITY: &str = "TASK_AUDIT_CAPACITY";

/// Lifecycle coordinator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Worker pool settings.
    pub pool: WorkerPoolConfig,
    /// Capacity of the in-memory audit trail; `0` disables auditing.
    pub audit_capacity: usize,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            pool: WorkerPoolConfig::default(),
            audit_capacity: DEFAULT_AUDIT_CAPACITY,
        }
    }
}

impl LifecycleConfig {
    /// Validate all sections.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        self.pool.validate().map_err(|e| format!("pool invalid: {e}"))
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation message.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from the process environment.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Fails when a variable is not a valid number or validation fails.
    pub fn from_env() -> AppResult<Self> {
        // A missing .env file is fine; the process environment still applies.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Fails when a value is not a valid number or validation fails.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(v) = parse_var(&lookup, ENV_WORKER_COUNT)? {
            cfg.pool.worker_count = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_UNIT_MILLIS)? {
            cfg.pool.unit_millis = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_THREAD_STACK_SIZE)? {
            cfg.pool.thread_stack_size = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_JOIN_TIMEOUT_MS)? {
            cfg.pool.join_timeout_ms = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_AUDIT_CAPACITY)? {
            cfg.audit_capacity = v;
        }

        cfg.validate().map_err(anyhow::Error::msg)?;
        Ok(cfg)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> AppResult<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("{key}={raw:?} is not a valid number"))
        })
        .transpose()
}
