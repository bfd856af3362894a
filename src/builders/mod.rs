//! Builders to construct lifecycle coordinators from configuration.

pub mod coordinator_builder;

pub use coordinator_builder::{build_coordinator, build_coordinator_with, LifecycleRuntime};
