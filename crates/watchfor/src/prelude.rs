//! Convenient re-exports for common watchfor usage.
//!
//! # Example
//!
//! ```no_run
//! use watchfor::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let source = Source::open(&WatchTarget::File("build.log".into())).await?;
//! let report = Poller::new(source, PollConfig::new("BUILD SUCCESSFUL")).run().await;
//! println!("{}", report.outcome);
//! # Ok(())
//! # }
//! ```

// Configuration
pub use crate::config::{MatchMode, PollConfig};

// Error handling
pub use crate::error::{Result, WatchError};

// Poll loop
pub use crate::poller::{AttemptRecord, PollOutcome, PollReport, Poller};

// Sources
pub use crate::source::{Observation, Source, StateSource, WatchTarget};

// Commands
pub use crate::runner::{FollowUp, run_follow_up};
pub use crate::shell::Invocation;
