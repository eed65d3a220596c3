//! End-to-end tests for running job files in-process.

use std::fs;
use std::path::Path;

use ems::config::EmsConfig;
use ems::scheduler::{discover_jobs, run_job_file, JobFile, SchedulerError};

fn config(threads: usize) -> EmsConfig {
    EmsConfig::new()
        .with_access_delay_ms(0)
        .with_max_proc(1)
        .with_max_threads(threads)
}

fn run(dir: &Path, name: &str, job: &str, threads: usize) -> String {
    let input = dir.join(name);
    fs::write(&input, job).unwrap();
    let job = JobFile::new(input);
    run_job_file(&job, &config(threads)).unwrap();
    fs::read_to_string(job.output()).unwrap()
}

#[test]
fn test_basic_job_output() {
    let dir = tempfile::tempdir().unwrap();
    let job = "\
# two events, one reservation each
CREATE 1 10 20
CREATE 2 3 3
RESERVE 1 [(1,1) (1,2) (1,3)]
RESERVE 2 [(3,3)]
SHOW 2
LIST
";
    let out = run(dir.path(), "basic.jobs", job, 1);
    assert_eq!(out, "0 0 0\n0 0 0\n0 0 1\nEvent: 1\nEvent: 2\n");
}

#[test]
fn test_conflicting_reservation_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let job = "CREATE 1 2 2\nRESERVE 1 [(1,1)]\nRESERVE 1 [(1,1) (2,2)]\nSHOW 1\n";
    let out = run(dir.path(), "conflict.jobs", job, 1);
    assert_eq!(out, "1 0\n0 0\n");
}

#[test]
fn test_barrier_orders_epochs_across_threads() {
    let dir = tempfile::tempdir().unwrap();
    let job = "CREATE 1 2 2\nRESERVE 1 (1,1) (1,2)\nBARRIER\nSHOW 1\n";
    for threads in [1, 2, 4] {
        let out = run(dir.path(), "barrier.jobs", job, threads);
        assert_eq!(out, "1 1\n0 0\n", "threads = {threads}");
    }
}

#[test]
fn test_stats_count_epochs_and_failures() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("stats.jobs");
    fs::write(&input, "CREATE 1 1 1\nBARRIER\nSHOW 5\nNOPE\nBARRIER\nLIST\n").unwrap();

    let stats = run_job_file(&JobFile::new(&input), &config(3)).unwrap();
    assert_eq!(stats.threads, 3);
    assert_eq!(stats.epochs, 3);
    assert_eq!(stats.executed, 4);
    assert_eq!(stats.failed, 2);
}

#[test]
fn test_help_and_empty_job() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(run(dir.path(), "empty.jobs", "", 2), "");
    assert_eq!(run(dir.path(), "list.jobs", "LIST\n", 2), "No events\n");

    let help = run(dir.path(), "help.jobs", "HELP\n", 1);
    assert!(help.starts_with("Available commands:"));
    assert!(help.contains("RESERVE"));
}

#[test]
fn test_each_job_gets_its_own_store() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.jobs"), "CREATE 1 1 1\nLIST\n").unwrap();
    fs::write(dir.path().join("b.jobs"), "LIST\n").unwrap();

    for job in discover_jobs(dir.path()).unwrap() {
        run_job_file(&job, &config(2)).unwrap();
    }
    assert_eq!(fs::read_to_string(dir.path().join("a.out")).unwrap(), "Event: 1\n");
    assert_eq!(fs::read_to_string(dir.path().join("b.out")).unwrap(), "No events\n");
}

#[test]
fn test_missing_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let job = JobFile::new(dir.path().join("missing.jobs"));
    let err = run_job_file(&job, &config(2)).unwrap_err();
    assert!(matches!(err, SchedulerError::Job(_)));
    assert!(!job.output().exists());
}

#[test]
fn test_invalid_thread_count_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("zero.jobs");
    fs::write(&input, "LIST\n").unwrap();
    let err = run_job_file(&JobFile::new(input), &config(0)).unwrap_err();
    assert!(matches!(err, SchedulerError::InvalidConfig(_)));
}
