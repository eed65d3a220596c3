//! `ems` command-line entry point.
//!
//! Runs every `.jobs` file in a directory through a bounded pool of worker
//! processes. Each worker is this same binary started with the hidden
//! `--worker-job` flag, which runs exactly one job in-process.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use clap::Parser;
use tracing::{error, info, warn};

use ems::config::EmsConfig;
use ems::core::AppResult;
use ems::scheduler::{self, JobFile, ProcessPool, SelfExecLauncher};
use ems::util::init_tracing;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run seat reservation job files concurrently")]
struct Cli {
    /// Directory containing `.jobs` files
    jobs_dir: PathBuf,

    /// Maximum number of worker processes running at once
    max_proc: usize,

    /// Worker threads per job
    max_threads: usize,

    /// Delay paid on every store access, in milliseconds
    delay_ms: Option<u32>,

    /// Run a single job file in this process
    #[arg(long, hide = true, value_name = "FILE")]
    worker_job: Option<PathBuf>,
}

impl Cli {
    /// Environment configuration with the command-line values on top.
    fn config(&self) -> AppResult<EmsConfig> {
        let mut config = EmsConfig::from_env().map_err(|e| anyhow!(e))?;
        config.max_proc = self.max_proc;
        config.max_threads = self.max_threads;
        if let Some(delay_ms) = self.delay_ms {
            config.access_delay_ms = delay_ms;
        }
        config
            .validate()
            .map_err(|e| anyhow!(e))
            .context("invalid pool sizes")?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match &cli.worker_job {
        Some(job) => run_worker(&cli, job),
        None => run_pool(&cli),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %format!("{err:#}"), "ems failed");
            eprintln!("ems: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run_worker(cli: &Cli, input: &Path) -> AppResult<()> {
    let config = cli.config()?;
    let job = JobFile::new(input);
    scheduler::run_job_file(&job, &config)
        .with_context(|| format!("job {} failed", input.display()))?;
    Ok(())
}

fn run_pool(cli: &Cli) -> AppResult<()> {
    let config = cli.config()?;
    let jobs = scheduler::discover_jobs(&cli.jobs_dir)?;
    info!(
        dir = %cli.jobs_dir.display(),
        jobs = jobs.len(),
        max_proc = config.max_proc,
        max_threads = config.max_threads,
        delay_ms = config.access_delay_ms,
        "Starting job pool"
    );

    let launcher = SelfExecLauncher::current(&cli.jobs_dir, &config)?;
    let report = ProcessPool::new(config.max_proc, launcher)?.run(&jobs);

    // A failed job is reported but does not fail the run as a whole.
    for exit in report.exits.iter().filter(|exit| !exit.success()) {
        warn!(job = %exit.job.display(), pid = exit.pid, "Job did not complete cleanly");
    }
    for job in &report.launch_failures {
        warn!(job = %job.display(), "Job was never started");
    }
    Ok(())
}
