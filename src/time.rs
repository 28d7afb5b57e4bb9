//! Simulation time
//!
//! The host engine drives materials with a simulation time that is
//! monotonic but not tied to the wall clock: it may run faster, slower,
//! or be paused. [`SimTime`] is that instant, [`Clock`] advances it.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// An instant on the simulation timeline, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct SimTime(f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    pub const fn from_seconds(seconds: f64) -> Self {
        Self(seconds)
    }

    /// Wall-clock now, as seconds since the Unix epoch.
    ///
    /// Used when a caller evaluates a material without supplying a time.
    pub fn now() -> Self {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        Self(since_epoch.as_secs_f64())
    }

    pub fn seconds(self) -> f64 {
        self.0
    }

    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }

    #[must_use]
    pub fn add_seconds(self, seconds: f64) -> Self {
        Self(self.0 + seconds)
    }

    /// Signed distance from `earlier` to `self` in seconds.
    pub fn seconds_since(self, earlier: SimTime) -> f64 {
        self.0 - earlier.0
    }
}

impl From<f64> for SimTime {
    fn from(seconds: f64) -> Self {
        Self(seconds)
    }
}

/// Simulation clock advanced once per frame by the host loop.
#[derive(Debug, Clone)]
pub struct Clock {
    /// Current simulation time
    pub current: SimTime,
    /// Simulated seconds per wall-clock second
    pub multiplier: f64,
    /// When paused, `tick` leaves `current` untouched
    pub paused: bool,
}

impl Default for Clock {
    fn default() -> Self {
        Self {
            current: SimTime::ZERO,
            multiplier: 1.0,
            paused: false,
        }
    }
}

impl Clock {
    pub fn new(start: SimTime) -> Self {
        Self {
            current: start,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    #[must_use]
    pub fn with_paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }

    /// Advance by `elapsed` wall time and return the new simulation time.
    ///
    /// Negative multipliers are clamped to zero so time never runs backwards.
    pub fn tick(&mut self, elapsed: Duration) -> SimTime {
        if !self.paused {
            let step = elapsed.as_secs_f64() * self.multiplier.max(0.0);
            self.current = self.current.add_seconds(step);
        }
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_applies_multiplier() {
        let mut clock = Clock::new(SimTime::from_seconds(10.0)).with_multiplier(2.0);
        let t = clock.tick(Duration::from_millis(500));
        assert_eq!(t.seconds(), 11.0);
    }

    #[test]
    fn paused_clock_holds_time() {
        let mut clock = Clock::default().with_paused(true);
        clock.tick(Duration::from_secs(3));
        assert_eq!(clock.current, SimTime::ZERO);
    }

    #[test]
    fn clock_never_runs_backwards() {
        let mut clock = Clock::default().with_multiplier(-4.0);
        assert_eq!(clock.tick(Duration::from_secs(1)), SimTime::ZERO);
    }

    #[test]
    fn now_is_after_epoch() {
        assert!(SimTime::now().seconds() > 0.0);
    }
}
