//! Follow-up commands run after a poll finishes.
//!
//! The poll loop never runs these itself; the caller picks the success or
//! failure command from the [`PollOutcome`] and hands it to
//! [`run_follow_up`]. Output streams straight to the parent's stdio.

use std::process::{ExitStatus, Stdio};

use tracing::debug;

use crate::error::{Result, WatchError};
use crate::poller::PollOutcome;
use crate::shell::Invocation;

/// The pair of commands to choose between once a run ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowUp {
    /// Run when the pattern was found.
    pub on_success: Option<Invocation>,
    /// Run on any other outcome.
    pub on_failure: Option<Invocation>,
}

impl FollowUp {
    /// Create a follow-up pair.
    #[must_use]
    pub const fn new(on_success: Option<Invocation>, on_failure: Option<Invocation>) -> Self {
        Self {
            on_success,
            on_failure,
        }
    }

    /// Pick the command for `outcome`, if one was configured.
    #[must_use]
    pub fn for_outcome(&self, outcome: &PollOutcome) -> Option<&Invocation> {
        let chosen = if outcome.is_success() {
            self.on_success.as_ref()
        } else {
            self.on_failure.as_ref()
        };
        chosen.filter(|invocation| !invocation.is_empty())
    }
}

/// Run a follow-up command with inherited stdio and wait for it.
///
/// An empty command is a no-op and returns `Ok(None)`.
///
/// # Errors
///
/// Returns [`WatchError::Spawn`] if the command cannot start and
/// [`WatchError::CommandFailed`] if it exits unsuccessfully.
pub async fn run_follow_up(invocation: &Invocation) -> Result<Option<ExitStatus>> {
    if invocation.is_empty() {
        return Ok(None);
    }
    let mut cmd = invocation.command()?;
    cmd.stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    debug!(command = %invocation, "executing follow-up command");
    let status = cmd
        .status()
        .await
        .map_err(|e| WatchError::spawn(invocation.to_string(), e))?;
    if status.success() {
        Ok(Some(status))
    } else {
        Err(WatchError::command_failed(invocation.to_string(), status))
    }
}
