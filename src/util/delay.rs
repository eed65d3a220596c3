//! Artificial latency used to emulate a slow backing store.

use std::thread;
use std::time::Duration;

/// Fixed sleep paid on every store access.
///
/// The sleep occupies the calling thread without spinning. A zero delay is
/// a no-op, which is what tests use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessDelay {
    delay: Duration,
}

impl AccessDelay {
    /// Build a delay from a millisecond count.
    #[must_use]
    pub const fn from_millis(delay_ms: u32) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms as u64),
        }
    }

    /// No latency at all.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            delay: Duration::ZERO,
        }
    }

    /// The configured latency.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.delay
    }

    /// Sleep for the configured latency.
    pub fn pause(&self) {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
    }
}

/// Sleep for `delay_ms` milliseconds. Backs the `WAIT` command.
pub fn wait(delay_ms: u32) {
    AccessDelay::from_millis(delay_ms).pause();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_zero_delay_is_default() {
        assert_eq!(AccessDelay::default(), AccessDelay::none());
        assert!(AccessDelay::none().duration().is_zero());
    }

    #[test]
    fn test_pause_sleeps_at_least_delay() {
        let delay = AccessDelay::from_millis(15);
        let start = Instant::now();
        delay.pause();
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn test_wait_sleeps() {
        let start = Instant::now();
        wait(5);
        assert!(start.elapsed() >= Duration::from_millis(5));
    }
}
