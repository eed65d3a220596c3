//! Configuration for the store and the job scheduler.

pub mod ems;

pub use ems::{EmsConfig, DEFAULT_ACCESS_DELAY_MS};
