use std::time::{Duration, Instant};

/// Tracks the pacing of a single fetch worker
///
/// Each worker keeps its own instance and consults it before every fetch so that
/// two consecutive requests from one worker are never closer than the configured
/// politeness delay.
#[derive(Debug, Clone)]
pub struct WorkerState {
    /// Minimum gap between two request starts
    pub min_delay: Duration,

    /// Number of requests this worker has started
    pub request_count: u32,

    /// When this worker last started a request
    pub last_request_time: Option<Instant>,
}

impl WorkerState {
    /// Creates a new WorkerState for the given politeness delay
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            request_count: 0,
            last_request_time: None,
        }
    }

    /// Checks if a request can be started now
    pub fn can_request(&self, now: Instant) -> bool {
        self.time_until_next_request(now).is_none()
    }

    /// Records that a request was started
    pub fn record_request(&mut self, now: Instant) {
        self.request_count += 1;
        self.last_request_time = Some(now);
    }

    /// Calculates the time until the next request can be started
    ///
    /// Returns None if a request can be started now, or the duration to wait otherwise.
    pub fn time_until_next_request(&self, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < self.min_delay {
            Some(self.min_delay - elapsed)
        } else {
            None
        }
    }
}
