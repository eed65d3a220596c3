//! Shared utilities.

pub mod delay;
pub mod telemetry;

pub use delay::{wait, AccessDelay};
pub use telemetry::init_tracing;
