//! Job sources and `.jobs` file discovery.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use super::SchedulerError;

/// Extension of job input files.
pub const JOBS_EXTENSION: &str = "jobs";
/// Extension of job output files.
pub const OUTPUT_EXTENSION: &str = "out";

/// Something a worker thread can read a job from, from the beginning, as many
/// times as it likes. Every thread opens its own reader.
pub trait JobSource: Sync {
    /// Reader positioned at the start of the job.
    type Reader<'a>: BufRead
    where
        Self: 'a;

    /// Open a fresh reader.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from opening the underlying input.
    fn open(&self) -> io::Result<Self::Reader<'_>>;

    /// Name used in logs.
    fn name(&self) -> String;
}

/// A `.jobs` input file and the `.out` file its results go to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFile {
    input: PathBuf,
    output: PathBuf,
}

impl JobFile {
    /// Job reading `input`, writing next to it with the `.out` extension.
    pub fn new(input: impl Into<PathBuf>) -> Self {
        let input = input.into();
        let output = input.with_extension(OUTPUT_EXTENSION);
        Self { input, output }
    }

    /// Input path.
    #[must_use]
    pub fn input(&self) -> &Path {
        &self.input
    }

    /// Output path.
    #[must_use]
    pub fn output(&self) -> &Path {
        &self.output
    }
}

impl JobSource for JobFile {
    type Reader<'a> = BufReader<File>;

    fn open(&self) -> io::Result<Self::Reader<'_>> {
        File::open(&self.input).map(BufReader::new)
    }

    fn name(&self) -> String {
        self.input.display().to_string()
    }
}

/// A job held in memory, for tests and embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemoryJob {
    text: String,
}

impl InMemoryJob {
    /// Job with the given contents.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl JobSource for InMemoryJob {
    type Reader<'a> = &'a [u8];

    fn open(&self) -> io::Result<Self::Reader<'_>> {
        Ok(self.text.as_bytes())
    }

    fn name(&self) -> String {
        "<memory>".to_string()
    }
}

/// Every `*.jobs` regular file directly inside `dir`, sorted by path.
///
/// # Errors
///
/// Returns `SchedulerError::JobsDir` if the directory cannot be read.
pub fn discover_jobs(dir: &Path) -> Result<Vec<JobFile>, SchedulerError> {
    let dir_error = |source: io::Error| SchedulerError::JobsDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut inputs = Vec::new();
    for entry in fs::read_dir(dir).map_err(dir_error)? {
        let path = entry.map_err(dir_error)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == JOBS_EXTENSION) {
            inputs.push(path);
        }
    }
    inputs.sort();
    Ok(inputs.into_iter().map(JobFile::new).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_output_path_replaces_extension() {
        let job = JobFile::new("/tmp/jobs/test-1.jobs");
        assert_eq!(job.output(), Path::new("/tmp/jobs/test-1.out"));
    }

    #[test]
    fn test_discover_only_jobs_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.jobs", "a.jobs", "a.out", "notes.txt", "c.jobs.bak"] {
            fs::write(dir.path().join(name), "LIST\n").unwrap();
        }
        fs::create_dir(dir.path().join("nested.jobs")).unwrap();

        let jobs = discover_jobs(dir.path()).unwrap();
        let names: Vec<_> = jobs
            .iter()
            .map(|job| job.input().file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.jobs", "b.jobs"]);
    }

    #[test]
    fn test_missing_dir_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_jobs(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, SchedulerError::JobsDir { .. }));
    }

    #[test]
    fn test_in_memory_job_reopens_from_start() {
        let job = InMemoryJob::new("LIST\n");
        for _ in 0..2 {
            let mut text = String::new();
            job.open().unwrap().read_to_string(&mut text).unwrap();
            assert_eq!(text, "LIST\n");
        }
    }
}
