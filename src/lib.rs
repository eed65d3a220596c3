//! # EMS
//!
//! An in-memory event seat reservation store, driven by job files and executed
//! concurrently by a pool of worker processes, each running a pool of worker
//! threads.
//!
//! ## Core Problem Solved
//!
//! Many clients reserve seats in the same events at the same time:
//!
//! - **Atomic multi-seat reserve**: a request for several seats either takes all
//!   of them under one sequence number or none of them
//! - **Consistent show**: printing an event never exposes half of a reservation
//! - **Deadlock freedom**: seat locks are always taken in row-major order
//! - **Ordered phases**: `BARRIER` lines split a job into epochs whose effects
//!   are visible to everything after them
//!
//! ## Store
//!
//! ```rust
//! use ems::core::{Coordinate, Ems};
//!
//! let ems = Ems::with_delay(0)?;
//! ems.create(1, 2, 2)?;
//! ems.reserve(1, &[Coordinate::new(1, 1)])?;
//!
//! let mut out = Vec::new();
//! ems.show(1, &mut out)?;
//! assert_eq!(out, b"1 0\n0 0\n");
//! ems.terminate()?;
//! # Ok::<(), ems::core::EmsError>(())
//! ```
//!
//! ## Jobs
//!
//! A job is a text file of commands (`CREATE`, `RESERVE`, `SHOW`, `LIST`,
//! `WAIT`, `BARRIER`, `HELP`). [`scheduler::run_job_file`] runs one job in the
//! current process; [`scheduler::ProcessPool`] runs a whole directory of
//! `.jobs` files in bounded parallel, writing each job's results to a matching
//! `.out` file.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Seat grids, the reservation store and the `Ems` lifetime handle.
pub mod core;
/// Job-file commands: parsing, dispatch and output.
pub mod command;
/// Configuration for the store and the scheduler.
pub mod config;
/// Process and thread pools that run jobs.
pub mod scheduler;
/// Shared utilities.
pub mod util;
