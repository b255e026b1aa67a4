//! Time measurement utilities
//!
//! The simulation itself never reads the wall clock; these are for measuring
//! how long host-side work (such as a rollback replay) took.

use std::time::{Duration, Instant};

/// Simple stopwatch for measuring elapsed time
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub fn new() -> Self {
        Self {
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Create a new stopwatch and start it immediately
    pub fn start_new() -> Self {
        let mut stopwatch = Self::new();
        stopwatch.start();
        stopwatch
    }

    /// Start the stopwatch
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Stop the stopwatch and accumulate elapsed time
    pub fn stop(&mut self) {
        if let Some(start) = self.start_time.take() {
            self.elapsed += start.elapsed();
        }
    }

    /// Reset the stopwatch to zero
    pub fn reset(&mut self) {
        self.start_time = None;
        self.elapsed = Duration::ZERO;
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        let running = self.start_time.map_or(Duration::ZERO, |start| start.elapsed());
        self.elapsed + running
    }

    /// Get the elapsed time in milliseconds
    pub fn elapsed_millis(&self) -> f32 {
        self.elapsed().as_secs_f32() * 1000.0
    }

    /// Check if the stopwatch is currently running
    pub fn is_running(&self) -> bool {
        self.start_time.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_freezes_elapsed() {
        let mut stopwatch = Stopwatch::start_new();
        assert!(stopwatch.is_running());
        stopwatch.stop();
        let frozen = stopwatch.elapsed();
        assert!(!stopwatch.is_running());
        assert_eq!(stopwatch.elapsed(), frozen);

        stopwatch.reset();
        assert_eq!(stopwatch.elapsed(), Duration::ZERO);
    }
}
