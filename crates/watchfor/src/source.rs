//! State sources: what the poll loop observes on each attempt.
//!
//! A source produces the bytes representing "current observable state" each
//! time it is probed. Two variants exist:
//!
//! - [`CommandSource`] runs a command line and captures its output.
//! - [`FileSource`] returns only the bytes appended to a file since the last
//!   probe, following truncation and rotation.
//!
//! The poll loop is generic over [`StateSource`], so tests can drive it with
//! scripted sources.

mod command;
mod file;

use std::future::Future;
use std::path::PathBuf;

pub use command::CommandSource;
pub use file::{FileIdentity, FileSource};

use crate::error::{Result, WatchError};
use crate::shell::Invocation;

/// The result of one probe.
///
/// A probe can fail and still return bytes: a command that exits non-zero
/// may print exactly the message being waited for.
#[derive(Debug, Default)]
pub struct Observation {
    /// Bytes observed by this probe.
    pub bytes: Vec<u8>,
    /// The probe's error, if any.
    pub error: Option<WatchError>,
}

impl Observation {
    /// A successful probe.
    #[must_use]
    pub const fn ok(bytes: Vec<u8>) -> Self {
        Self { bytes, error: None }
    }

    /// A failed probe that still produced output.
    #[must_use]
    pub const fn failed(bytes: Vec<u8>, error: WatchError) -> Self {
        Self {
            bytes,
            error: Some(error),
        }
    }

    /// A failed probe with no output.
    #[must_use]
    pub const fn error(error: WatchError) -> Self {
        Self::failed(Vec::new(), error)
    }

    /// Check whether the probe reported an error.
    #[must_use]
    pub const fn is_err(&self) -> bool {
        self.error.is_some()
    }
}

/// Something the poll loop can observe repeatedly.
pub trait StateSource {
    /// Take one observation.
    fn probe(&mut self) -> impl Future<Output = Observation> + Send;

    /// Short human-readable description for logs.
    fn describe(&self) -> String;
}

/// What to watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchTarget {
    /// Run a command on every attempt.
    Command(Invocation),
    /// Tail a file.
    File(PathBuf),
}

/// The concrete source chosen at startup.
#[derive(Debug)]
pub enum Source {
    /// Command output.
    Command(CommandSource),
    /// Appended file content.
    File(FileSource),
}

impl Source {
    /// Build the source for `target`.
    ///
    /// # Errors
    ///
    /// Fails for an unusable command line, or when the file cannot be opened.
    /// Both are fatal: retrying would never succeed.
    pub async fn open(target: &WatchTarget) -> Result<Self> {
        match target {
            WatchTarget::Command(invocation) => {
                Ok(Self::Command(CommandSource::new(invocation.clone())?))
            }
            WatchTarget::File(path) => Ok(Self::File(FileSource::open(path).await?)),
        }
    }

    /// Release any held resources. Calling it again does nothing.
    pub fn close(&mut self) {
        if let Self::File(file) = self {
            file.close();
        }
    }
}

impl StateSource for Source {
    async fn probe(&mut self) -> Observation {
        match self {
            Self::Command(source) => source.probe().await,
            Self::File(source) => source.probe().await,
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Command(source) => source.describe(),
            Self::File(source) => source.describe(),
        }
    }
}
