//! Process pool over job files.
//!
//! One worker process per job, at most `max_proc` alive at once. Each child is
//! handed to its own reaper thread that blocks in `wait()` and reports the exit
//! over a channel; the pool blocks on that channel whenever it is at capacity
//! and drains it completely before returning, so every child is reaped.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use tracing::{debug, error, info, warn};

use super::{JobFile, SchedulerError};
use crate::config::EmsConfig;

/// Starts the worker process for one job.
pub trait WorkerLauncher {
    /// Spawn a child that runs `job` and exits.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the process cannot be started.
    fn launch(&self, job: &JobFile) -> io::Result<Child>;
}

/// Launches workers by re-running a binary in its hidden single-job mode.
#[derive(Debug, Clone)]
pub struct SelfExecLauncher {
    program: PathBuf,
    args: Vec<OsString>,
}

impl SelfExecLauncher {
    /// Flag that puts the binary into single-job worker mode.
    pub const WORKER_FLAG: &'static str = "--worker-job";

    /// Launch `program <jobs_dir> <max_proc> <max_threads> <delay_ms>
    /// --worker-job <input>` for each job.
    pub fn new(program: impl Into<PathBuf>, jobs_dir: &Path, config: &EmsConfig) -> Self {
        let args = vec![
            jobs_dir.as_os_str().to_os_string(),
            config.max_proc.to_string().into(),
            config.max_threads.to_string().into(),
            config.access_delay_ms.to_string().into(),
        ];
        Self {
            program: program.into(),
            args,
        }
    }

    /// Launcher for the currently running executable.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::Spawn` if the executable path is unavailable.
    pub fn current(jobs_dir: &Path, config: &EmsConfig) -> Result<Self, SchedulerError> {
        let program = std::env::current_exe().map_err(|source| SchedulerError::Spawn {
            what: "worker (current executable unknown)".into(),
            source,
        })?;
        Ok(Self::new(program, jobs_dir, config))
    }
}

impl WorkerLauncher for SelfExecLauncher {
    fn launch(&self, job: &JobFile) -> io::Result<Child> {
        Command::new(&self.program)
            .args(&self.args)
            .arg(Self::WORKER_FLAG)
            .arg(job.input())
            .stdin(Stdio::null())
            .spawn()
    }
}

/// How one worker process ended.
#[derive(Debug)]
pub struct WorkerExit {
    /// Job the worker ran.
    pub job: PathBuf,
    /// OS process id.
    pub pid: u32,
    /// Exit status, or the error from waiting on the child.
    pub status: io::Result<ExitStatus>,
}

impl WorkerExit {
    /// Whether the worker exited with status 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.status.as_ref().is_ok_and(ExitStatus::success)
    }
}

/// Outcome of running every job through the pool.
#[derive(Debug, Default)]
pub struct PoolReport {
    /// Every reaped worker, in exit order.
    pub exits: Vec<WorkerExit>,
    /// Jobs whose worker could not be started.
    pub launch_failures: Vec<PathBuf>,
    /// Most workers alive at the same time.
    pub peak_running: usize,
}

impl PoolReport {
    /// Whether every job was launched and exited successfully.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.launch_failures.is_empty() && self.exits.iter().all(WorkerExit::success)
    }
}

/// Bounded pool of worker processes.
#[derive(Debug)]
pub struct ProcessPool<L> {
    max_proc: usize,
    launcher: L,
}

impl<L: WorkerLauncher> ProcessPool<L> {
    /// Pool running at most `max_proc` workers at once.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidConfig` if `max_proc` is zero.
    pub fn new(max_proc: usize, launcher: L) -> Result<Self, SchedulerError> {
        if max_proc == 0 {
            return Err(SchedulerError::InvalidConfig(
                "max_proc must be greater than 0".into(),
            ));
        }
        Ok(Self { max_proc, launcher })
    }

    /// Run every job, blocking until all workers have been reaped.
    ///
    /// A worker that fails to start or exits badly is recorded and logged;
    /// it never stops the remaining jobs.
    pub fn run(&self, jobs: &[JobFile]) -> PoolReport {
        let (exit_tx, exit_rx) = unbounded::<WorkerExit>();
        let mut report = PoolReport::default();
        let mut reapers: Vec<JoinHandle<()>> = Vec::with_capacity(jobs.len());
        let mut running = 0usize;

        for job in jobs {
            while running >= self.max_proc {
                if !collect_exit(&exit_rx, &mut report) {
                    break;
                }
                running -= 1;
            }

            let child = match self.launcher.launch(job) {
                Ok(child) => child,
                Err(err) => {
                    error!(job = %job.input().display(), error = %err, "Failed to start worker");
                    report.launch_failures.push(job.input().to_path_buf());
                    continue;
                }
            };
            running += 1;
            report.peak_running = report.peak_running.max(running);
            debug!(pid = child.id(), job = %job.input().display(), running, "Worker started");

            match spawn_reaper(child, job.input().to_path_buf(), exit_tx.clone()) {
                Ok(handle) => reapers.push(handle),
                Err((child, err)) => {
                    // No reaper thread: wait for this child here instead.
                    warn!(error = %err, "Failed to start reaper thread; waiting inline");
                    let exit = reap(child, job.input().to_path_buf());
                    log_exit(&exit);
                    report.exits.push(exit);
                    running -= 1;
                }
            }
        }

        drop(exit_tx);
        while running > 0 && collect_exit(&exit_rx, &mut report) {
            running -= 1;
        }
        for reaper in reapers {
            let _ = reaper.join();
        }

        info!(
            jobs = jobs.len(),
            peak_running = report.peak_running,
            failed = report.launch_failures.len()
                + report.exits.iter().filter(|exit| !exit.success()).count(),
            "All workers reaped"
        );
        report
    }
}

/// Block for the next worker exit. Returns false once no reaper is left.
fn collect_exit(exit_rx: &Receiver<WorkerExit>, report: &mut PoolReport) -> bool {
    match exit_rx.recv() {
        Ok(exit) => {
            log_exit(&exit);
            report.exits.push(exit);
            true
        }
        Err(_) => false,
    }
}

fn log_exit(exit: &WorkerExit) {
    match &exit.status {
        Ok(status) if status.success() => {
            info!(pid = exit.pid, job = %exit.job.display(), "Worker exited");
        }
        Ok(status) => {
            warn!(pid = exit.pid, job = %exit.job.display(), status = %status, "Worker failed");
        }
        Err(err) => {
            error!(pid = exit.pid, job = %exit.job.display(), error = %err, "Failed to wait for worker");
        }
    }
}

fn reap(mut child: Child, job: PathBuf) -> WorkerExit {
    let pid = child.id();
    WorkerExit {
        job,
        pid,
        status: child.wait(),
    }
}

/// Hand `child` to a new thread that waits for it and reports on `exit_tx`.
///
/// The child is passed through a one-slot channel after the thread starts, so
/// it is given back to the caller if the thread cannot be spawned.
fn spawn_reaper(
    child: Child,
    job: PathBuf,
    exit_tx: Sender<WorkerExit>,
) -> Result<JoinHandle<()>, (Child, io::Error)> {
    let (handoff_tx, handoff_rx) = bounded::<Child>(1);
    let spawned = thread::Builder::new()
        .name(format!("ems-reaper-{}", child.id()))
        .spawn(move || {
            if let Ok(child) = handoff_rx.recv() {
                let _ = exit_tx.send(reap(child, job));
            }
        });

    match spawned {
        Ok(handle) => match handoff_tx.send(child) {
            Ok(()) => Ok(handle),
            Err(returned) => Err((returned.into_inner(), io::Error::other("reaper thread exited early"))),
        },
        Err(err) => Err((child, err)),
    }
}
