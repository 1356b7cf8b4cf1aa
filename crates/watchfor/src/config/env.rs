//! Environment-based configuration.
//!
//! Every poll setting can be supplied as `WATCHFOR_<NAME>`, e.g.
//! `WATCHFOR_INTERVAL=500ms` or `WATCHFOR_MAX_RETRIES=0`.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use super::PollConfig;
use crate::error::{Result, WatchError};

/// Environment configuration prefix.
pub const DEFAULT_PREFIX: &str = "WATCHFOR";

/// Environment variable reader.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Prefix for environment variables.
    prefix: String,
    /// Values that shadow the process environment.
    overrides: HashMap<String, String>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl EnvConfig {
    /// Create a new environment config reader.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            overrides: HashMap::new(),
        }
    }

    /// Shadow a variable without touching the process environment.
    ///
    /// `name` is the unprefixed setting name, e.g. `"interval"`.
    #[must_use]
    pub fn with_var(mut self, name: &str, value: impl Into<String>) -> Self {
        let var_name = self.var_name(name);
        self.overrides.insert(var_name, value.into());
        self
    }

    /// Build the full environment variable name.
    fn var_name(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_uppercase()
        } else {
            format!("{}_{}", self.prefix, name.to_uppercase())
        }
    }

    /// Get a string value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        let var_name = self.var_name(name);
        self.overrides
            .get(&var_name)
            .cloned()
            .or_else(|| std::env::var(&var_name).ok())
            .filter(|v| !v.trim().is_empty())
    }

    /// Get a parsed value, failing on malformed input.
    pub fn parse<T>(&self, name: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(name)
            .map(|v| {
                v.trim().parse().map_err(|e| {
                    WatchError::config(format!("{}={v:?}: {e}", self.var_name(name)))
                })
            })
            .transpose()
    }

    /// Get a boolean value.
    #[must_use]
    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).map(|v| {
            matches!(
                v.trim().to_lowercase().as_str(),
                "1" | "true" | "yes" | "on" | "enabled"
            )
        })
    }

    /// Get a human-readable duration such as `500ms` or `1m30s`.
    pub fn duration(&self, name: &str) -> Result<Option<Duration>> {
        self.get(name)
            .map(|v| {
                humantime::parse_duration(v.trim()).map_err(|e| {
                    WatchError::config(format!("{}={v:?}: {e}", self.var_name(name)))
                })
            })
            .transpose()
    }

    /// Check if a variable is set.
    #[must_use]
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Layer the variables that are set over `config`.
    pub fn apply(&self, mut config: PollConfig) -> Result<PollConfig> {
        if let Some(regex) = self.bool("regex") {
            config = config.regex(regex);
        }
        if let Some(ignore_case) = self.bool("ignore_case") {
            config.case_insensitive = ignore_case;
        }
        if let Some(interval) = self.duration("interval")? {
            config.interval = interval;
        }
        if let Some(max_retries) = self.parse::<u32>("max_retries")? {
            config.max_attempts = max_retries;
        }
        if let Some(backoff) = self.parse::<f64>("backoff")? {
            config.backoff_factor = backoff;
        }
        if let Some(jitter) = self.parse::<f64>("jitter")? {
            config.jitter_factor = jitter;
        }
        if let Some(timeout) = self.duration("timeout")? {
            config = config.timeout(timeout);
        }
        if let Some(timeout) = self.duration("probe_timeout")? {
            config = config.probe_timeout(timeout);
        }
        Ok(config)
    }
}
