//! Delay computation between attempts.
//!
//! The wait after attempt `n` (1-indexed) is `interval * factor^n`, so the
//! very first wait is already backed off once. With `interval = 10ms` and
//! `factor = 2` the waits are 20ms, 40ms, 80ms, ... Every delay is clamped
//! to `max_delay` so large factors cannot overflow or stall for days.

use std::time::Duration;

use rand::Rng;

use crate::config::PollConfig;

/// Exponential backoff with a ceiling and optional jitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    /// Base delay.
    interval: Duration,
    /// Growth factor per attempt.
    factor: f64,
    /// Fraction of the delay used as the jitter spread.
    jitter: f64,
    /// Ceiling on any single delay.
    max_delay: Duration,
}

impl Backoff {
    /// Create a backoff without jitter.
    #[must_use]
    pub const fn new(interval: Duration, factor: f64, max_delay: Duration) -> Self {
        Self {
            interval,
            factor,
            jitter: 0.0,
            max_delay,
        }
    }

    /// Create the backoff described by a poll configuration.
    #[must_use]
    pub const fn from_config(config: &PollConfig) -> Self {
        Self {
            interval: config.interval,
            factor: config.backoff_factor,
            jitter: config.jitter_factor,
            max_delay: config.max_delay,
        }
    }

    /// Set the jitter factor.
    #[must_use]
    pub const fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Get the ceiling.
    #[must_use]
    pub const fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Get the delay that follows attempt `attempt`, before jitter.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if self.interval.is_zero() {
            return Duration::ZERO;
        }
        let secs = self.interval.as_secs_f64() * self.factor.powf(f64::from(attempt));
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(secs)
    }

    /// Perturb `delay` uniformly within `+- jitter * delay`.
    pub fn jittered<R: Rng + ?Sized>(&self, delay: Duration, rng: &mut R) -> Duration {
        if self.jitter <= 0.0 || delay.is_zero() {
            return delay;
        }
        let secs = delay.as_secs_f64();
        let spread = secs * self.jitter.min(1.0);
        let realized = (secs + rng.random_range(-spread..=spread)).max(0.0);
        Duration::from_secs_f64(realized).min(self.max_delay)
    }

    /// Get the jittered delay that follows attempt `attempt`.
    pub fn next_delay<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        self.jittered(self.delay_for_attempt(attempt), rng)
    }
}
