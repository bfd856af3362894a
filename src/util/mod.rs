//! Shared utilities.

pub mod clock;
pub mod telemetry;

pub(crate) mod guard;

pub use clock::*;
pub use telemetry::*;
