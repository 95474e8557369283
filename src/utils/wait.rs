//! Fixed-interval polling with a hard timeout

use std::time::{Duration, Instant};

/// Interval and overall budget for a polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollSettings {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

/// Check `condition` immediately, then every `interval`, until it returns true
/// or `timeout` has elapsed. Returns whether the condition was met.
///
/// Blocks the calling thread; callers run inside the fan-out's blocking pool.
pub fn poll_immediate<F>(settings: &PollSettings, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = Instant::now();
    loop {
        if condition() {
            return true;
        }

        let elapsed = start.elapsed();
        if elapsed >= settings.timeout {
            return false;
        }

        let remaining = settings.timeout - elapsed;
        std::thread::sleep(settings.interval.min(remaining));
    }
}
