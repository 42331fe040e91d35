//! General time utility functions and time sources

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use chrono;
use std::thread;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A source of monotonic time which can also wait.
///
/// Control loops take their time from a `Clock` rather than from the system
/// directly so that they can be driven by simulated time.
pub trait Clock {
    /// Time elapsed since the clock's epoch.
    fn now(&self) -> Duration;

    /// Wait for the given duration.
    fn sleep(&mut self, duration: Duration);

    /// Time elapsed since the clock's epoch in seconds.
    fn now_s(&self) -> f64 {
        self.now().as_secs_f64()
    }
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A clock running on the system's monotonic time, sleeping the calling
/// thread.
#[derive(Debug, Clone, Copy)]
pub struct WallClock {
    epoch: Instant
}

/// A simulated clock. Time only advances when the clock sleeps.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimClock {
    now: Duration
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl WallClock {
    /// Create a new clock with its epoch at the current instant.
    pub fn new() -> Self {
        Self {
            epoch: Instant::now()
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for WallClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn sleep(&mut self, duration: Duration) {
        thread::sleep(duration)
    }
}

impl SimClock {
    /// Create a new simulated clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward without sleeping.
    pub fn advance(&mut self, duration: Duration) {
        self.now += duration;
    }
}

impl Clock for SimClock {
    fn now(&self) -> Duration {
        self.now
    }

    fn sleep(&mut self, duration: Duration) {
        self.advance(duration)
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sim_clock() {
        let mut clock = SimClock::new();
        assert_eq!(clock.now(), Duration::ZERO);

        clock.sleep(Duration::from_millis(10));
        clock.advance(Duration::from_millis(90));
        assert_eq!(clock.now(), Duration::from_millis(100));

        // Ten 10 ms samples land exactly on the 100 ms boundary
        let mut clock = SimClock::new();
        for _ in 0..10 {
            clock.sleep(Duration::from_secs_f64(0.01));
        }
        assert_eq!(clock.now(), Duration::from_secs_f64(0.1));
    }

    #[test]
    fn test_duration_to_seconds() {
        assert_eq!(
            duration_to_seconds(chrono::Duration::milliseconds(1500)),
            Some(1.5)
        );
    }
}
