//! # Prometheus Task Lifecycle
//!
//! A concurrent task-lifecycle manager: callers submit named tasks with a
//! workload length, a fixed pool of worker threads runs them in FIFO order,
//! and any task can be observed, awaited or stopped at any point of its life.
//!
//! ## Core Problem Solved
//!
//! Stopping work is racy. A stop request can land while the task is still
//! queued, while a worker is picking it up, mid-execution, or just after it
//! finished. This crate resolves each of those cases so that:
//!
//! - **Every task settles exactly once**: its completion signal fires once and
//!   every waiter sees the same terminal status
//! - **Cancelled-while-queued tasks never run**: they go `QUEUED -> STOPPED`
//!   without ever being `RUNNING`
//! - **Running tasks stop promptly**: workloads sleep on an interruptible
//!   cancel token instead of polling
//! - **Ids are unique while live**: a second submission with a live id is
//!   refused without side effects
//!
//! ## Task States
//!
//! ```text
//! QUEUED ──> RUNNING ──> DONE
//!    │          │
//!    └──────────┴──────> STOPPED
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use prometheus_task_lifecycle::config::WorkerPoolConfig;
//! use prometheus_task_lifecycle::core::{LifecycleCoordinator, TaskStatus, TimedExecutor};
//!
//! # fn main() -> Result<(), prometheus_task_lifecycle::core::LifecycleError> {
//! let coordinator = LifecycleCoordinator::start(
//!     WorkerPoolConfig::new().with_worker_count(3),
//!     TimedExecutor::from_millis(1_000),
//! )?;
//!
//! assert!(coordinator.submit("t1", 2)?);
//! assert_eq!(coordinator.await_completion("t1"), TaskStatus::Done);
//!
//! coordinator.submit("t2", 10)?;
//! coordinator.cancel("t2");
//! assert_eq!(coordinator.await_completion("t2"), TaskStatus::Stopped);
//!
//! coordinator.shutdown();
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! [`config::LifecycleConfig::from_env`] reads `TASK_*` variables (and a
//! `.env` file); [`builders::build_coordinator`] turns a config into a
//! running coordinator with an optional in-memory audit trail.
//!
//! For complete examples, see `tests/lifecycle_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Task lifecycle engine: handles, registry, worker pool and coordinator.
pub mod core;
/// Configuration models for the pool and coordinator.
pub mod config;
/// Builders to construct coordinators from configuration.
pub mod builders;
/// Transport-facing request/response models and handlers.
pub mod runtime;
/// Shared utilities.
pub mod util;
