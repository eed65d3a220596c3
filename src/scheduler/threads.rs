//! Thread pool over the lines of one job, with barrier epochs.
//!
//! A job runs as a sequence of epochs. Each epoch starts `max_threads`
//! threads that each read the whole job from the top and decode every line.
//! Thread `t` executes line `i` when `i >= start_line` and
//! `i % max_threads == t`, so a barrier never shifts the round-robin
//! assignment of the lines after it.
//!
//! Every thread decodes the `BARRIER` line itself, so each one stops there
//! after finishing all of its earlier lines. When every thread has reported
//! back over the results channel, the controller either starts the next
//! epoch just past the barrier (fresh threads, ids 0 again) or, if no
//! thread saw a barrier, finishes the job.
//!
//! Inside an epoch, a command never runs before the `CREATE` lines above it
//! in the same epoch have run, whichever thread owns them. Everything else
//! within an epoch is unordered.

use std::collections::HashSet;
use std::io::Write;
use std::sync::atomic::Ordering;
use std::thread;

use crossbeam_channel::unbounded;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use super::{JobCounters, JobSource, JobStats, SchedulerError};
use crate::command::{Command, CommandReader, Dispatcher, JobLine, OutputSink};
use crate::core::{Ems, EmsError, EmsResult};

/// How one thread (or one whole epoch) ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochEnd {
    /// Reached the end of the job.
    Drained,
    /// Stopped at a barrier; the next epoch starts at `next_start`.
    Barrier {
        /// Line index just after the barrier.
        next_start: usize,
    },
}

/// What a worker thread sends back when it stops.
#[derive(Debug)]
struct ThreadReport {
    thread_id: usize,
    end: EmsResult<EpochEnd>,
}

/// Completed `CREATE` lines of the current epoch.
#[derive(Debug, Default)]
struct CreateFence {
    state: Mutex<FenceState>,
    changed: Condvar,
}

#[derive(Debug, Default)]
struct FenceState {
    done: HashSet<usize>,
    aborted: bool,
}

impl CreateFence {
    fn complete(&self, line: usize) {
        self.state.lock().done.insert(line);
        self.changed.notify_all();
    }

    /// Release every waiter for good; some thread will never finish its lines.
    fn abort(&self) {
        self.state.lock().aborted = true;
        self.changed.notify_all();
    }

    /// Block until every line in `pending` has completed, emptying it.
    fn wait_for(&self, pending: &mut Vec<usize>) {
        if pending.is_empty() {
            return;
        }
        let mut state = self.state.lock();
        loop {
            pending.retain(|line| !state.done.contains(line));
            if pending.is_empty() || state.aborted {
                pending.clear();
                return;
            }
            self.changed.wait(&mut state);
        }
    }
}

/// Aborts the fence if the owning thread unwinds.
struct AbortOnPanic<'a>(&'a CreateFence);

impl Drop for AbortOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.abort();
        }
    }
}

/// Everything a worker thread needs, shared by reference.
struct EpochContext<'a, S, W> {
    source: &'a S,
    dispatcher: Dispatcher<'a, W>,
    counters: &'a JobCounters,
    fence: CreateFence,
    threads: usize,
    start_line: usize,
}

impl<S, W> EpochContext<'_, S, W>
where
    S: JobSource,
    W: Write,
{
    /// Whether thread `thread_id` executes this line.
    fn owns(&self, thread_id: usize, line: &JobLine) -> bool {
        match line.command {
            // A targeted WAIT belongs to its thread wherever it sits.
            Command::Wait {
                thread_id: Some(target),
                ..
            } => usize::try_from(target).is_ok_and(|target| target == thread_id + 1),
            _ => line.index % self.threads == thread_id,
        }
    }

    fn run_thread(&self, thread_id: usize) -> EmsResult<EpochEnd> {
        let _guard = AbortOnPanic(&self.fence);
        let end = self.run_lines(thread_id);
        if end.is_err() {
            self.fence.abort();
        }
        end
    }

    fn run_lines(&self, thread_id: usize) -> EmsResult<EpochEnd> {
        let mut reader = CommandReader::new(self.source.open()?);
        // CREATE lines above the cursor that other threads own.
        let mut foreign_creates = Vec::new();

        while let Some(line) = reader.next_command()? {
            if line.command == Command::Empty || line.index < self.start_line {
                continue;
            }
            if line.command == Command::Barrier {
                debug!(thread_id, line = line.index, "Barrier reached");
                return Ok(EpochEnd::Barrier {
                    next_start: line.index + 1,
                });
            }
            let is_create = matches!(line.command, Command::Create { .. });
            if !self.owns(thread_id, &line) {
                if is_create {
                    foreign_creates.push(line.index);
                }
                continue;
            }

            self.fence.wait_for(&mut foreign_creates);
            self.counters.executed.fetch_add(1, Ordering::Relaxed);
            let result = self.dispatcher.dispatch(&line.command);
            if is_create {
                self.fence.complete(line.index);
            }
            if let Err(err) = result {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(
                    thread_id,
                    line = line.index,
                    command = line.command.keyword(),
                    error = %err,
                    "Command failed"
                );
            }
        }
        Ok(EpochEnd::Drained)
    }
}

/// Runs jobs on a fixed number of worker threads.
#[derive(Debug, Clone, Copy)]
pub struct JobRunner {
    threads: usize,
}

impl JobRunner {
    /// Runner with `max_threads` threads per epoch.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidConfig` if `max_threads` is zero.
    pub fn new(max_threads: usize) -> Result<Self, SchedulerError> {
        if max_threads == 0 {
            return Err(SchedulerError::InvalidConfig(
                "max_threads must be greater than 0".into(),
            ));
        }
        Ok(Self {
            threads: max_threads,
        })
    }

    /// Threads per epoch.
    #[must_use]
    pub const fn threads(&self) -> usize {
        self.threads
    }

    /// Run a job to completion against `ems`, writing results to `sink`.
    ///
    /// Failed commands are logged and counted; they never stop the job.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::Job` if the job cannot be read or the sink cannot be flushed
    /// - `SchedulerError::Spawn` / `SchedulerError::WorkerPanicked` if a thread is lost
    pub fn run<S, W>(
        &self,
        source: &S,
        ems: &Ems,
        sink: &OutputSink<W>,
    ) -> Result<JobStats, SchedulerError>
    where
        S: JobSource,
        W: Write + Send,
    {
        let counters = JobCounters::default();
        let dispatcher = Dispatcher::new(ems, sink);
        let mut start_line = 0;

        loop {
            counters.epochs.fetch_add(1, Ordering::Relaxed);
            let ctx = EpochContext {
                source,
                dispatcher,
                counters: &counters,
                fence: CreateFence::default(),
                threads: self.threads,
                start_line,
            };
            match run_epoch(&ctx)? {
                EpochEnd::Drained => break,
                EpochEnd::Barrier { next_start } => {
                    debug!(job = %source.name(), next_start, "Epoch ended at barrier");
                    start_line = next_start;
                }
            }
        }

        sink.flush().map_err(EmsError::from)?;
        Ok(counters.snapshot(self.threads))
    }
}

/// Start every thread of one epoch, join them all, and merge their reports.
fn run_epoch<S, W>(ctx: &EpochContext<'_, S, W>) -> Result<EpochEnd, SchedulerError>
where
    S: JobSource,
    W: Write + Send,
{
    let (report_tx, report_rx) = unbounded::<ThreadReport>();

    let (spawn_error, panicked) = thread::scope(|scope| {
        let mut handles = Vec::with_capacity(ctx.threads);
        let mut spawn_error = None;

        for thread_id in 0..ctx.threads {
            let report_tx = report_tx.clone();
            let spawned = thread::Builder::new()
                .name(format!("ems-worker-{thread_id}"))
                .spawn_scoped(scope, move || {
                    let end = ctx.run_thread(thread_id);
                    let _ = report_tx.send(ThreadReport { thread_id, end });
                });
            match spawned {
                Ok(handle) => handles.push((thread_id, handle)),
                Err(source) => {
                    ctx.fence.abort();
                    spawn_error = Some(SchedulerError::Spawn {
                        what: format!("worker thread {thread_id}"),
                        source,
                    });
                    break;
                }
            }
        }

        let panicked: Vec<usize> = handles
            .into_iter()
            .filter_map(|(thread_id, handle)| handle.join().is_err().then_some(thread_id))
            .collect();
        (spawn_error, panicked)
    });
    drop(report_tx);

    if let Some(err) = spawn_error {
        return Err(err);
    }
    if let Some(&thread_id) = panicked.first() {
        return Err(SchedulerError::WorkerPanicked(thread_id));
    }

    let mut epoch_end = EpochEnd::Drained;
    for report in report_rx.iter() {
        match report.end? {
            EpochEnd::Drained => {}
            EpochEnd::Barrier { next_start } => {
                debug!(thread_id = report.thread_id, next_start, "Thread stopped at barrier");
                epoch_end = match epoch_end {
                    EpochEnd::Barrier { next_start: seen } if seen <= next_start => epoch_end,
                    _ => EpochEnd::Barrier { next_start },
                };
            }
        }
    }
    Ok(epoch_end)
}
