//! Time management utilities

use std::time::{Duration, Instant};

/// Default ceiling for a single simulation step, in seconds
pub const DEFAULT_MAX_DELTA: f32 = 1.0;

/// Frame timer driven by host timestamps
///
/// The presentation driver hands out a timestamp in milliseconds with every
/// frame callback. `update` feeds that timestamp in, `get_delta` reports the
/// seconds elapsed since the previous `get_delta` call.
///
/// Deltas are never negative (a timestamp going backwards is ignored) and
/// are clamped to `max_delta`, so a stalled tab or a debugger pause does not
/// push the simulation through one enormous step.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    /// Latest host timestamp in milliseconds
    current_ms: Option<f64>,
    /// Clock value at the previous `get_delta` call
    last_delta_ms: Option<f64>,
    max_delta: f32,
    elapsed: f64,
    frame_count: u64,
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTimer {
    /// Create a new timer with the default delta ceiling
    pub fn new() -> Self {
        Self::with_max_delta(DEFAULT_MAX_DELTA)
    }

    /// Create a timer with a custom delta ceiling in seconds
    ///
    /// Non-finite or non-positive ceilings fall back to [`DEFAULT_MAX_DELTA`].
    pub fn with_max_delta(max_delta: f32) -> Self {
        let max_delta = if max_delta.is_finite() && max_delta > 0.0 {
            max_delta
        } else {
            DEFAULT_MAX_DELTA
        };

        Self {
            current_ms: None,
            last_delta_ms: None,
            max_delta,
            elapsed: 0.0,
            frame_count: 0,
        }
    }

    /// Advance the internal clock to the host timestamp (milliseconds)
    pub fn update(&mut self, timestamp_ms: f64) {
        if !timestamp_ms.is_finite() {
            log::warn!("Ignoring non-finite frame timestamp");
            return;
        }

        self.current_ms = Some(match self.current_ms {
            Some(current) if timestamp_ms < current => {
                log::debug!("Frame timestamp went backwards ({timestamp_ms} < {current}), holding clock");
                current
            }
            _ => timestamp_ms,
        });
        self.frame_count += 1;
    }

    /// Seconds elapsed since the previous `get_delta` call
    ///
    /// Returns 0 on the first call and whenever no update happened since.
    pub fn get_delta(&mut self) -> f32 {
        let Some(current) = self.current_ms else {
            return 0.0;
        };

        let delta_ms = self.last_delta_ms.map_or(0.0, |last| (current - last).max(0.0));
        self.last_delta_ms = Some(current);

        let delta = ((delta_ms / 1000.0) as f32).min(self.max_delta);
        self.elapsed += f64::from(delta);
        delta
    }

    /// Ceiling applied to every delta
    pub fn max_delta(&self) -> f32 {
        self.max_delta
    }

    /// Total simulated time handed out through `get_delta`, in seconds
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Number of `update` calls so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Simple stopwatch for measuring elapsed time
#[derive(Debug, Clone)]
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
        if let Some(start) = self.start_time {
            self.elapsed += start.elapsed();
            self.start_time = None;
        }
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        let current_elapsed = self.start_time.map_or(Duration::ZERO, |start| start.elapsed());
        self.elapsed + current_elapsed
    }

    /// Get the elapsed time in milliseconds
    pub fn elapsed_millis(&self) -> f32 {
        self.elapsed().as_secs_f32() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_first_delta_is_zero() {
        let mut timer = FrameTimer::new();
        assert_eq!(timer.get_delta(), 0.0);

        timer.update(1000.0);
        assert_eq!(timer.get_delta(), 0.0);
    }

    #[test]
    fn test_delta_between_calls() {
        let mut timer = FrameTimer::new();
        timer.update(1000.0);
        timer.get_delta();

        timer.update(1016.0);
        assert_relative_eq!(timer.get_delta(), 0.016, epsilon = 1e-6);

        // No update since the last call: nothing elapsed
        assert_eq!(timer.get_delta(), 0.0);
    }

    #[test]
    fn test_delta_spans_multiple_updates() {
        let mut timer = FrameTimer::new();
        timer.update(0.0);
        timer.get_delta();
        timer.update(10.0);
        timer.update(30.0);
        assert_relative_eq!(timer.get_delta(), 0.030, epsilon = 1e-6);
    }

    #[test]
    fn test_clock_jump_is_clamped() {
        let mut timer = FrameTimer::new();
        timer.update(0.0);
        timer.get_delta();

        timer.update(3_600_000.0);
        assert_eq!(timer.get_delta(), DEFAULT_MAX_DELTA);
    }

    #[test]
    fn test_backwards_timestamp_never_negative() {
        let mut timer = FrameTimer::new();
        timer.update(500.0);
        timer.get_delta();

        timer.update(100.0);
        assert_eq!(timer.get_delta(), 0.0);

        timer.update(600.0);
        assert_relative_eq!(timer.get_delta(), 0.1, epsilon = 1e-6);
    }

    #[test]
    fn test_invalid_ceiling_falls_back() {
        assert_eq!(FrameTimer::with_max_delta(-2.0).max_delta(), DEFAULT_MAX_DELTA);
        assert_eq!(FrameTimer::with_max_delta(f32::NAN).max_delta(), DEFAULT_MAX_DELTA);
        assert_eq!(FrameTimer::with_max_delta(0.25).max_delta(), 0.25);
    }

    #[test]
    fn test_deltas_stay_in_range_under_jitter() {
        let mut timer = FrameTimer::with_max_delta(0.5);
        let stamps = [0.0, 16.0, 10.0, 5000.0, 5016.0, 4000.0, 9_999_999.0];
        for stamp in stamps {
            timer.update(stamp);
            let delta = timer.get_delta();
            assert!((0.0..=0.5).contains(&delta), "delta {delta} out of range");
        }
    }
}
