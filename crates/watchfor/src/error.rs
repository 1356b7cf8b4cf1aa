//! Error types for watchfor.
//!
//! This module defines all error types used throughout the library.
//! Errors fall into three groups: configuration errors that stop a run before
//! it starts, resource errors raised while constructing a state source, and
//! transient probe errors that the poll loop records and then retries past.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// The main error type for watchfor operations.
#[derive(Debug, Error)]
pub enum WatchError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An I/O error occurred with additional context.
    #[error("{context}: {source}")]
    IoWithContext {
        /// What operation was being performed.
        context: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The watched file could not be opened.
    #[error("failed to open {}: {source}", path.display())]
    SourceOpen {
        /// The path that could not be opened.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A command could not be started.
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        /// The command line that failed to start.
        command: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A command ran but exited unsuccessfully.
    #[error("`{command}` exited with {status}")]
    CommandFailed {
        /// The command line that was run.
        command: String,
        /// Its exit status.
        status: ExitStatus,
    },

    /// A command line that can never be run (empty, or containing a NUL byte).
    #[error("invalid command: {reason}")]
    InvalidCommand {
        /// Why the command was rejected.
        reason: String,
    },

    /// A single probe ran longer than its allotted time.
    #[error("probe timed out after {duration:?}")]
    ProbeTimeout {
        /// The per-probe bound that elapsed.
        duration: Duration,
    },

    /// Invalid regex pattern.
    #[error("invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// A configuration file could not be parsed.
    #[error("invalid config file {}: {source}", path.display())]
    ConfigFile {
        /// The file that failed to parse.
        path: PathBuf,
        /// The parser error.
        #[source]
        source: toml::de::Error,
    },
}

/// Result type alias for watchfor operations.
pub type Result<T> = std::result::Result<T, WatchError>;

impl WatchError {
    /// Create a source-open error.
    pub fn source_open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SourceOpen {
            path: path.into(),
            source,
        }
    }

    /// Create a spawn error.
    pub fn spawn(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            command: command.into(),
            source,
        }
    }

    /// Create a command-failed error.
    pub fn command_failed(command: impl Into<String>, status: ExitStatus) -> Self {
        Self::CommandFailed {
            command: command.into(),
            status,
        }
    }

    /// Create an invalid command error.
    pub fn invalid_command(reason: impl Into<String>) -> Self {
        Self::InvalidCommand {
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an I/O error with context.
    pub fn io_context(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoWithContext {
            context: context.into(),
            source,
        }
    }

    /// Wrap an I/O result with context.
    pub fn with_io_context<T>(result: std::io::Result<T>, context: impl Into<String>) -> Result<T> {
        result.map_err(|e| Self::io_context(context, e))
    }

    /// Check if this error is one a later probe could recover from.
    ///
    /// Transient errors are recorded against an attempt and the loop keeps
    /// going. Everything else ends the run.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::IoWithContext { .. }
                | Self::Spawn { .. }
                | Self::CommandFailed { .. }
                | Self::ProbeTimeout { .. }
        )
    }

    /// Check if this is a configuration error (bad pattern, command, option or file).
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(
            self,
            Self::InvalidPattern(_)
                | Self::InvalidCommand { .. }
                | Self::Config { .. }
                | Self::ConfigFile { .. }
        )
    }

    /// Get the exit code of a failed command, if this error carries one.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::CommandFailed { status, .. } => status.code(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_open_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = WatchError::source_open("/var/log/app.log", io_err);
        let msg = err.to_string();
        assert!(msg.contains("/var/log/app.log"));
        assert!(msg.contains("no such file"));
        assert!(!err.is_transient());
    }

    #[test]
    fn probe_errors_are_transient() {
        let err = WatchError::ProbeTimeout {
            duration: Duration::from_secs(2),
        };
        assert!(err.is_transient());
        assert!(err.to_string().contains("2s"));

        let err = WatchError::spawn("curl -s localhost", std::io::Error::other("boom"));
        assert!(err.is_transient());
        assert!(err.to_string().contains("curl -s localhost"));
    }

    #[test]
    fn invalid_pattern_is_config() {
        let regex_err = regex::Regex::new("[a-z").unwrap_err();
        let err = WatchError::from(regex_err);
        assert!(err.is_config());
        assert!(!err.is_transient());
        assert!(err.to_string().contains("invalid regex pattern"));
    }

    #[test]
    fn io_with_context_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = WatchError::io_context("reading watched file", io_err);
        let msg = err.to_string();
        assert!(msg.contains("reading watched file"));
        assert!(msg.contains("file not found"));
    }

    #[test]
    fn with_io_context_helper() {
        let result: std::io::Result<()> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "access denied",
        ));
        let err = WatchError::with_io_context(result, "seeking watched file").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("seeking watched file"));
        assert!(msg.contains("access denied"));
    }

    #[test]
    fn exit_code_only_for_failed_commands() {
        let err = WatchError::config("bad");
        assert_eq!(err.exit_code(), None);
        assert!(err.is_config());
    }
}
