//! Store and scheduler configuration.

use std::env;

use serde::{Deserialize, Serialize};

/// Access latency used when none is configured.
pub const DEFAULT_ACCESS_DELAY_MS: u32 = 10;

/// Environment variable overriding the access delay.
pub const ENV_ACCESS_DELAY_MS: &str = "EMS_ACCESS_DELAY_MS";
/// Environment variable overriding the process cap.
pub const ENV_MAX_PROC: &str = "EMS_MAX_PROC";
/// Environment variable overriding the thread count.
pub const ENV_MAX_THREADS: &str = "EMS_MAX_THREADS";

/// Runtime configuration for one `ems` run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmsConfig {
    /// Sleep paid on every store access, in milliseconds.
    pub access_delay_ms: u32,
    /// Maximum number of worker processes running at once.
    pub max_proc: usize,
    /// Worker threads per job.
    pub max_threads: usize,
}

impl Default for EmsConfig {
    fn default() -> Self {
        Self {
            access_delay_ms: DEFAULT_ACCESS_DELAY_MS,
            max_proc: 1,
            max_threads: num_cpus::get(),
        }
    }
}

impl EmsConfig {
    /// Configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-access delay.
    #[must_use]
    pub const fn with_access_delay_ms(mut self, delay_ms: u32) -> Self {
        self.access_delay_ms = delay_ms;
        self
    }

    /// Set the worker process cap.
    #[must_use]
    pub const fn with_max_proc(mut self, max_proc: usize) -> Self {
        self.max_proc = max_proc;
        self
    }

    /// Set the worker thread count per job.
    #[must_use]
    pub const fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads;
        self
    }

    /// Validate pool sizes.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_proc == 0 {
            return Err("max_proc must be greater than 0".into());
        }
        if self.max_threads == 0 {
            return Err("max_threads must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults overridden by `EMS_*` environment variables.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    ///
    /// # Errors
    ///
    /// Returns a description of the first variable that does not parse.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();
        let mut cfg = Self::default();
        if let Some(delay) = read_var(ENV_ACCESS_DELAY_MS)? {
            cfg.access_delay_ms = delay;
        }
        if let Some(max_proc) = read_var(ENV_MAX_PROC)? {
            cfg.max_proc = max_proc;
        }
        if let Some(max_threads) = read_var(ENV_MAX_THREADS)? {
            cfg.max_threads = max_threads;
        }
        Ok(cfg)
    }
}

fn read_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>, String>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| format!("{name}={value}: {e}")),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(format!("{name}: {e}")),
    }
}
