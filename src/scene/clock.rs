//! Monotonic frame clock

use std::time::Instant;

/// Tracks elapsed and per-frame time for a render loop.
///
/// The first [`Clock::tick`] measures from construction.
#[derive(Debug, Clone)]
pub struct Clock {
    start: Instant,
    last: Instant,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
        }
    }

    /// Advance the clock, returning seconds since the previous tick
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now.saturating_duration_since(self.last);
        self.last = now;
        delta.as_secs_f32()
    }

    /// Seconds from construction to the most recent tick
    pub fn elapsed_secs(&self) -> f64 {
        self.last.saturating_duration_since(self.start).as_secs_f64()
    }
}
