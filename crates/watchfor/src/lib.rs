//! watchfor: condition-based waiting for automation pipelines
//!
//! This crate replaces fixed `sleep` calls with a poll loop: observe a state
//! source until a pattern appears, with retries, exponential backoff, jitter
//! and an overall deadline.
//!
//! # Features
//!
//! - **Two state sources**: command output ([`CommandSource`]) and appended
//!   file content ([`FileSource`]) with truncation and rotation handling
//! - **Literal or regex matching**, each optionally case-insensitive
//! - **Interruptible waits**: a deadline ends the run immediately, even
//!   mid-probe
//! - **Transient-error tolerance**: failing probes are recorded and retried
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use watchfor::{Invocation, PollConfig, Poller, Source, WatchTarget};
//!
//! # async fn example() -> watchfor::Result<()> {
//! let config = PollConfig::new("status: healthy")
//!     .interval(Duration::from_millis(500))
//!     .backoff(2.0)
//!     .timeout(Duration::from_secs(60));
//! config.validate()?;
//!
//! let target = WatchTarget::Command(Invocation::shell("curl -s http://localhost/health"));
//! let source = Source::open(&target).await?;
//! let report = Poller::new(source, config).run().await;
//! assert!(report.is_success());
//! # Ok(())
//! # }
//! ```

pub mod backoff;
pub mod config;
pub mod error;
pub mod matcher;
pub mod poller;
pub mod prelude;
pub mod runner;
pub mod shell;
pub mod source;
pub mod util;

pub use backoff::Backoff;
pub use config::{MatchMode, PollConfig};
pub use error::{Result, WatchError};
pub use matcher::{CompiledRegex, Matcher, matches};
pub use poller::{AttemptRecord, PollOutcome, PollReport, Poller};
pub use runner::{FollowUp, run_follow_up};
pub use shell::{Invocation, Shell};
pub use source::{
    CommandSource, FileIdentity, FileSource, Observation, Source, StateSource, WatchTarget,
};
pub use util::{Deadline, TimeoutExt};
