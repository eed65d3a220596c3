//! Job scheduling: a process pool over job files and, inside each worker
//! process, a thread pool over the lines of one job.
//!
//! # Two levels
//!
//! - [`ProcessPool`] runs one OS process per `.jobs` file, never more than
//!   `max_proc` at a time, and reaps every one of them.
//! - [`JobRunner`] runs one job inside the current process with `max_threads`
//!   threads that split the job's lines round-robin, restarting all threads at
//!   every `BARRIER`.
//!
//! # Example
//!
//! ```rust,no_run
//! use ems::command::OutputSink;
//! use ems::core::Ems;
//! use ems::scheduler::{InMemoryJob, JobRunner};
//!
//! let ems = Ems::with_delay(0)?;
//! let sink = OutputSink::new(Vec::new());
//! let job = InMemoryJob::new("CREATE 1 2 2\nRESERVE 1 [(1,1)]\nBARRIER\nSHOW 1\n");
//! let stats = JobRunner::new(2)?.run(&job, &ems, &sink)?;
//! assert_eq!(stats.epochs, 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod jobs;
mod processes;
mod threads;

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tracing::info;

use crate::command::OutputSink;
use crate::config::EmsConfig;
use crate::core::{Ems, EmsError};

pub use jobs::{discover_jobs, InMemoryJob, JobFile, JobSource, JOBS_EXTENSION, OUTPUT_EXTENSION};
pub use processes::{PoolReport, ProcessPool, SelfExecLauncher, WorkerExit, WorkerLauncher};
pub use threads::{EpochEnd, JobRunner};

/// Errors that stop a job or the scheduler itself.
///
/// Per-command failures never show up here; they are logged and skipped.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Pool sizes or other settings are unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The jobs directory could not be read.
    #[error("cannot open jobs directory {path}: {source}")]
    JobsDir {
        /// Directory that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// A thread or process could not be started.
    #[error("failed to spawn {what}: {source}")]
    Spawn {
        /// What was being spawned.
        what: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// A worker thread panicked.
    #[error("worker thread {0} panicked")]
    WorkerPanicked(usize),
    /// The job failed as a whole (unreadable input, store not up, ...).
    #[error("job failed: {0}")]
    Job(#[from] EmsError),
}

/// Summary of one job run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobStats {
    /// Worker threads per epoch.
    pub threads: usize,
    /// Epochs started (barriers hit plus one).
    pub epochs: u64,
    /// Commands executed across all threads.
    pub executed: u64,
    /// Executed commands that failed.
    pub failed: u64,
}

/// Internal counters for a job run (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct JobCounters {
    pub epochs: AtomicU64,
    pub executed: AtomicU64,
    pub failed: AtomicU64,
}

impl JobCounters {
    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, threads: usize) -> JobStats {
        JobStats {
            threads,
            epochs: self.epochs.load(Ordering::Relaxed),
            executed: self.executed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Run one job file in this process: fresh store in, `.out` file out.
///
/// This is what every worker process spawned by [`ProcessPool`] executes.
///
/// # Errors
///
/// - `SchedulerError::InvalidConfig` if the configuration does not validate
/// - `SchedulerError::Job` if the store cannot start, the input cannot be
///   read, or the output cannot be written
pub fn run_job_file(job: &JobFile, config: &EmsConfig) -> Result<JobStats, SchedulerError> {
    config.validate().map_err(SchedulerError::InvalidConfig)?;

    // No `.out` file for a job whose input cannot be read.
    job.open().map_err(EmsError::from)?;

    let ems = Ems::with_delay(config.access_delay_ms)?;
    let output = File::create(job.output()).map_err(EmsError::from)?;
    let sink = OutputSink::new(BufWriter::new(output));

    let result = JobRunner::new(config.max_threads).and_then(|runner| runner.run(job, &ems, &sink));
    ems.terminate()?;
    let stats = result?;

    info!(
        job = %job.input().display(),
        epochs = stats.epochs,
        executed = stats.executed,
        failed = stats.failed,
        "Job finished"
    );
    Ok(stats)
}
