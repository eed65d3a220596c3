//! Serialized output for one job.
//!
//! All worker threads of a job share one sink. Formatting and writing happen
//! inside a single critical section so two `SHOW`/`LIST` results can never
//! interleave. The sink's mutex is separate from every seat lock.

use std::io::{self, Write};

use parking_lot::Mutex;

/// A writer shared by every worker thread of one job.
#[derive(Debug)]
pub struct OutputSink<W> {
    inner: Mutex<W>,
}

impl<W: Write> OutputSink<W> {
    /// Wrap a writer.
    pub const fn new(writer: W) -> Self {
        Self {
            inner: Mutex::new(writer),
        }
    }

    /// Run `f` with exclusive access to the writer.
    pub fn with<T>(&self, f: impl FnOnce(&mut W) -> T) -> T {
        let mut writer = self.inner.lock();
        f(&mut writer)
    }

    /// Write a complete chunk of text atomically with respect to other writers.
    ///
    /// # Errors
    ///
    /// Propagates the writer's I/O error.
    pub fn write_str(&self, text: &str) -> io::Result<()> {
        self.with(|writer| writer.write_all(text.as_bytes()))
    }

    /// Flush the underlying writer.
    ///
    /// # Errors
    ///
    /// Propagates the writer's I/O error.
    pub fn flush(&self) -> io::Result<()> {
        self.with(W::flush)
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.inner.into_inner()
    }
}
