//! Configuration types for watchfor.
//!
//! A [`PollConfig`] is built once at startup and handed to the
//! [`Poller`](crate::poller::Poller) by value. Values are layered in this
//! order, later layers winning: built-in defaults, an optional TOML file
//! ([`file`]), `WATCHFOR_*` environment variables ([`env`]), and finally
//! command-line flags.

pub mod env;
pub mod file;

use std::time::Duration;

use crate::error::{Result, WatchError};

/// Default base interval between attempts (1 second).
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Default maximum number of attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default backoff factor (no growth).
pub const DEFAULT_BACKOFF_FACTOR: f64 = 1.0;

/// Default jitter factor (no randomization).
pub const DEFAULT_JITTER_FACTOR: f64 = 0.0;

/// Ceiling on any single wait between attempts (1 hour).
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60 * 60);

/// How the pattern is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Plain substring containment.
    #[default]
    Literal,
    /// Regular expression searched across the whole output.
    Regex,
}

impl MatchMode {
    /// Get the mode name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Literal => "literal",
            Self::Regex => "regex",
        }
    }
}

/// Configuration for one poll run.
#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    /// The pattern to look for.
    pub pattern: String,

    /// How the pattern is interpreted.
    pub match_mode: MatchMode,

    /// Whether matching ignores case.
    pub case_insensitive: bool,

    /// Base delay between attempts.
    pub interval: Duration,

    /// Maximum number of attempts; `0` means unbounded.
    pub max_attempts: u32,

    /// Exponential growth factor for the delay (`>= 1`).
    pub backoff_factor: f64,

    /// Random perturbation applied to each delay (`0..=1`).
    pub jitter_factor: f64,

    /// Overall time limit. Overrides `max_attempts` when set.
    pub timeout: Option<Duration>,

    /// Bound on a single probe.
    pub probe_timeout: Option<Duration>,

    /// Ceiling on any single wait.
    pub max_delay: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            pattern: String::new(),
            match_mode: MatchMode::Literal,
            case_insensitive: false,
            interval: DEFAULT_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            jitter_factor: DEFAULT_JITTER_FACTOR,
            timeout: None,
            probe_timeout: None,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl PollConfig {
    /// Create a configuration looking for `pattern` with default retry settings.
    #[must_use]
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Self::default()
        }
    }

    /// Set the pattern.
    #[must_use]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Interpret the pattern as a regular expression.
    #[must_use]
    pub const fn regex(mut self, enabled: bool) -> Self {
        self.match_mode = if enabled {
            MatchMode::Regex
        } else {
            MatchMode::Literal
        };
        self
    }

    /// Set case-insensitive matching.
    #[must_use]
    pub const fn case_insensitive(mut self, enabled: bool) -> Self {
        self.case_insensitive = enabled;
        self
    }

    /// Set the base interval.
    #[must_use]
    pub const fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the maximum number of attempts (`0` = unbounded).
    #[must_use]
    pub const fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the backoff factor.
    #[must_use]
    pub const fn backoff(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    /// Set the jitter factor.
    #[must_use]
    pub const fn jitter(mut self, factor: f64) -> Self {
        self.jitter_factor = factor;
        self
    }

    /// Set the overall timeout. A zero duration clears it.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = if timeout.is_zero() {
            None
        } else {
            Some(timeout)
        };
        self
    }

    /// Set the per-probe timeout. A zero duration clears it.
    #[must_use]
    pub const fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = if timeout.is_zero() {
            None
        } else {
            Some(timeout)
        };
        self
    }

    /// Set the ceiling on a single wait.
    #[must_use]
    pub const fn max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Check the invariants a run relies on.
    pub fn validate(&self) -> Result<()> {
        if self.pattern.is_empty() {
            return Err(WatchError::config("pattern must not be empty"));
        }
        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            return Err(WatchError::config(format!(
                "backoff must be >= 1, got {}",
                self.backoff_factor
            )));
        }
        if !(0.0..=1.0).contains(&self.jitter_factor) {
            return Err(WatchError::config(format!(
                "jitter must be between 0 and 1, got {}",
                self.jitter_factor
            )));
        }
        Ok(())
    }

    /// Whether the run has nothing that would ever stop it short of a match.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.max_attempts == 0 && self.timeout.is_none()
    }
}
