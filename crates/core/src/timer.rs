//! High-resolution timer for frame timing.

use std::time::{Duration, Instant};

/// Tracks total run time and per-frame delta time for the render loop.
#[derive(Debug)]
pub struct Timer {
    start: Instant,
    last_tick: Instant,
}

impl Timer {
    /// Create a new timer, starting from now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_tick: now,
        }
    }

    /// Total elapsed time since the timer was created, in seconds.
    pub fn elapsed_secs(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }

    /// Time elapsed since the last call to `tick()`.
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let delta = now - self.last_tick;
        self.last_tick = now;
        delta
    }

    /// Delta time in seconds since the last tick.
    pub fn delta_secs(&mut self) -> f32 {
        self.tick().as_secs_f32()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_advances_monotonically() {
        let mut timer = Timer::new();
        let first = timer.delta_secs();
        let second = timer.delta_secs();
        assert!(first >= 0.0);
        assert!(second >= 0.0);
    }

    #[test]
    fn elapsed_is_nonnegative() {
        let timer = Timer::new();
        assert!(timer.elapsed_secs() >= 0.0);
    }
}
