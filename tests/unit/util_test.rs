//! Tests for utility functions

use std::time::{Duration, Instant};

use ems::util::{wait, AccessDelay};

#[test]
fn test_access_delay_from_millis() {
    let delay = AccessDelay::from_millis(15);
    assert_eq!(delay.duration(), Duration::from_millis(15));
}

#[test]
fn test_access_delay_none_is_zero() {
    assert_eq!(AccessDelay::none().duration(), Duration::ZERO);
    let start = Instant::now();
    for _ in 0..1000 {
        AccessDelay::none().pause();
    }
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_wait_sleeps_at_least_requested() {
    let start = Instant::now();
    wait(20);
    assert!(start.elapsed() >= Duration::from_millis(20));
}
