//! File-based configuration loading.
//!
//! A config file only supplies defaults for the retry settings; the watch
//! target and the pattern always come from the command line.
//!
//! ```toml
//! [poll]
//! interval = "2s"
//! max_retries = 30
//! backoff = 1.5
//! jitter = 0.1
//! timeout = "5m"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use super::PollConfig;
use crate::error::{Result, WatchError};

/// Parsed contents of a config file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Retry and matching defaults.
    #[serde(default)]
    pub poll: PollSection,
}

/// The `[poll]` table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollSection {
    /// Treat the pattern as a regex.
    pub regex: Option<bool>,
    /// Ignore case when matching.
    pub ignore_case: Option<bool>,
    /// Base interval.
    #[serde(with = "humantime_serde")]
    pub interval: Option<Duration>,
    /// Maximum attempts, `0` for unbounded.
    pub max_retries: Option<u32>,
    /// Backoff factor.
    pub backoff: Option<f64>,
    /// Jitter factor.
    pub jitter: Option<f64>,
    /// Overall timeout, `"0s"` for none.
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
    /// Per-probe timeout, `"0s"` for none.
    #[serde(with = "humantime_serde")]
    pub probe_timeout: Option<Duration>,
    /// Ceiling on a single wait.
    #[serde(with = "humantime_serde")]
    pub max_delay: Option<Duration>,
}

impl ConfigFile {
    /// Load and parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            WatchError::io_context(format!("reading config file {}", path.display()), e)
        })?;
        Self::parse(&content, path)
    }

    /// Parse config content. `path` is only used for error messages.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|source| WatchError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Layer the file's values over `config`.
    #[must_use]
    pub fn apply(&self, mut config: PollConfig) -> PollConfig {
        let poll = &self.poll;
        if let Some(regex) = poll.regex {
            config = config.regex(regex);
        }
        if let Some(ignore_case) = poll.ignore_case {
            config.case_insensitive = ignore_case;
        }
        if let Some(interval) = poll.interval {
            config.interval = interval;
        }
        if let Some(max_retries) = poll.max_retries {
            config.max_attempts = max_retries;
        }
        if let Some(backoff) = poll.backoff {
            config.backoff_factor = backoff;
        }
        if let Some(jitter) = poll.jitter {
            config.jitter_factor = jitter;
        }
        if let Some(timeout) = poll.timeout {
            config = config.timeout(timeout);
        }
        if let Some(timeout) = poll.probe_timeout {
            config = config.probe_timeout(timeout);
        }
        if let Some(max_delay) = poll.max_delay {
            config.max_delay = max_delay;
        }
        config
    }
}
