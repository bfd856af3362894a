//! Configuration models for the worker pool and coordinator.

pub mod lifecycle;
pub mod pool;

pub use lifecycle::LifecycleConfig;
pub use pool::WorkerPoolConfig;
