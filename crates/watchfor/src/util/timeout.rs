//! Timeout utilities.
//!
//! This module provides the deadline used to bound a whole poll run and an
//! extension trait for bounding a single probe.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, Timeout, timeout};

/// Extension trait for adding timeouts to futures.
pub trait TimeoutExt: Sized {
    /// Wrap this future with a timeout.
    fn with_timeout(self, duration: Duration) -> Timeout<Self>;
}

impl<F: Future> TimeoutExt for F {
    fn with_timeout(self, duration: Duration) -> Timeout<Self> {
        timeout(duration, self)
    }
}

/// An absolute instant after which a run must stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    /// The deadline instant.
    deadline: Instant,
}

impl Deadline {
    /// Create a new deadline from now.
    ///
    /// Returns `None` when `duration` reaches past the furthest instant the
    /// platform clock can represent; such a deadline can never pass.
    #[must_use]
    pub fn from_now(duration: Duration) -> Option<Self> {
        Instant::now().checked_add(duration).map(Self::at)
    }

    /// Create a deadline at a fixed instant.
    #[must_use]
    pub const fn at(deadline: Instant) -> Self {
        Self { deadline }
    }

    /// Get the deadline instant.
    #[must_use]
    pub const fn instant(&self) -> Instant {
        self.deadline
    }

    /// Check if the deadline has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Get the remaining time until the deadline.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Sleep until the deadline.
    pub async fn sleep(&self) {
        tokio::time::sleep_until(self.deadline).await;
    }
}

/// Resolve when `deadline` passes, or never if there is none.
///
/// Meant to be raced against other work in `tokio::select!`.
pub async fn expiry(deadline: Option<Deadline>) {
    match deadline {
        Some(d) => d.sleep().await,
        None => std::future::pending().await,
    }
}
