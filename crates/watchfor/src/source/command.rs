//! Command output as a state source.

use std::process::Stdio;

use tracing::trace;

use super::{Observation, StateSource};
use crate::error::{Result, WatchError};
use crate::shell::Invocation;

/// Runs a command on every probe and returns what it printed.
///
/// Standard output is returned first, followed by standard error. A non-zero
/// exit is reported as [`WatchError::CommandFailed`] alongside the captured
/// bytes. The child is killed if the probe is abandoned mid-run.
#[derive(Debug, Clone)]
pub struct CommandSource {
    invocation: Invocation,
}

impl CommandSource {
    /// Create a command source.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::InvalidCommand`] for an empty command line.
    pub fn new(invocation: Invocation) -> Result<Self> {
        invocation.validate()?;
        Ok(Self { invocation })
    }

    /// Get the invocation.
    #[must_use]
    pub const fn invocation(&self) -> &Invocation {
        &self.invocation
    }
}

impl StateSource for CommandSource {
    async fn probe(&mut self) -> Observation {
        let mut cmd = match self.invocation.command() {
            Ok(cmd) => cmd,
            Err(e) => return Observation::error(e),
        };
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match cmd.output().await {
            Ok(output) => output,
            Err(e) => return Observation::error(WatchError::spawn(self.invocation.to_string(), e)),
        };
        trace!(
            status = %output.status,
            stdout = output.stdout.len(),
            stderr = output.stderr.len(),
            "command finished"
        );

        let mut bytes = output.stdout;
        bytes.extend_from_slice(&output.stderr);
        if output.status.success() {
            Observation::ok(bytes)
        } else {
            Observation::failed(
                bytes,
                WatchError::command_failed(self.invocation.to_string(), output.status),
            )
        }
    }

    fn describe(&self) -> String {
        format!("command `{}`", self.invocation)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout() {
        let mut source = CommandSource::new(Invocation::shell("echo hello world")).unwrap();
        let obs = source.probe().await;
        assert!(!obs.is_err());
        assert_eq!(obs.bytes, b"hello world\n");
    }

    #[tokio::test]
    async fn captures_stderr_after_stdout() {
        let mut source = CommandSource::new(Invocation::shell("echo out; echo err >&2")).unwrap();
        let obs = source.probe().await;
        assert_eq!(obs.bytes, b"out\nerr\n");
    }

    #[tokio::test]
    async fn non_zero_exit_keeps_output() {
        let mut source =
            CommandSource::new(Invocation::shell("echo 'service unavailable' >&2; exit 3")).unwrap();
        let obs = source.probe().await;
        assert_eq!(obs.bytes, b"service unavailable\n");
        let err = obs.error.unwrap();
        assert!(err.is_transient());
        assert_eq!(err.exit_code(), Some(3));
    }

    #[tokio::test]
    async fn missing_program_is_transient() {
        let mut source =
            CommandSource::new(Invocation::argv(["/nonexistent/watchfor-probe"])).unwrap();
        let obs = source.probe().await;
        assert!(obs.bytes.is_empty());
        assert!(matches!(obs.error, Some(WatchError::Spawn { .. })));
    }

    #[tokio::test]
    async fn each_probe_runs_again() {
        let dir = tempfile::tempdir().unwrap();
        let counter = dir.path().join("count");
        let line = format!("echo x >> {0}; wc -l < {0}", counter.display());
        let mut source = CommandSource::new(Invocation::shell(line)).unwrap();

        let first = String::from_utf8(source.probe().await.bytes).unwrap();
        let second = String::from_utf8(source.probe().await.bytes).unwrap();
        assert_eq!(first.trim(), "1");
        assert_eq!(second.trim(), "2");
    }

    #[test]
    fn rejects_empty_command() {
        assert!(CommandSource::new(Invocation::shell("")).is_err());
    }
}
