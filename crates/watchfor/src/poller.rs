//! The poll loop.
//!
//! Each attempt probes the source, evaluates the matcher on whatever bytes
//! came back, and then either stops or waits before the next attempt:
//!
//! ```text
//! Probing -> Evaluating -> Matched
//!                       -> FatalError        (pattern does not compile)
//!                       -> TimedOut          (deadline passed)
//!                       -> ExhaustedRetries  (no deadline, attempt limit hit)
//!                       -> Waiting -> Probing
//! ```
//!
//! The first probe happens immediately. When a timeout is configured it is
//! the only bound: `max_attempts` is ignored and attempts continue until the
//! deadline. Both the probe and the wait are raced against the deadline, so
//! a run never overshoots it by a full delay. A command probe cut short this
//! way has its child process killed.

use std::fmt;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::backoff::Backoff;
use crate::config::PollConfig;
use crate::error::WatchError;
use crate::matcher::Matcher;
use crate::source::{Observation, StateSource};
use crate::util::timeout::{Deadline, TimeoutExt, expiry};

/// How a run ended.
#[derive(Debug)]
pub enum PollOutcome {
    /// The pattern was found.
    Matched,
    /// The attempt limit was reached without a match.
    ExhaustedRetries,
    /// The deadline passed without a match.
    TimedOut,
    /// The run cannot succeed, e.g. the pattern does not compile.
    FatalError(WatchError),
}

impl PollOutcome {
    /// Check whether the pattern was found.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Matched)
    }

    /// Get the outcome name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Matched => "matched",
            Self::ExhaustedRetries => "exhausted_retries",
            Self::TimedOut => "timed_out",
            Self::FatalError(_) => "fatal_error",
        }
    }
}

impl fmt::Display for PollOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matched => f.write_str("pattern found"),
            Self::ExhaustedRetries => f.write_str("max retries reached"),
            Self::TimedOut => f.write_str("timeout reached"),
            Self::FatalError(e) => write!(f, "fatal error: {e}"),
        }
    }
}

/// Summary of a finished run.
#[derive(Debug)]
pub struct PollReport {
    /// How the run ended.
    pub outcome: PollOutcome,
    /// Number of probes performed.
    pub attempts: u32,
    /// Wall time from the first probe to the end.
    pub elapsed: Duration,
    /// Time spent sleeping between attempts.
    pub waited: Duration,
}

impl PollReport {
    /// Check whether the pattern was found.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

/// What happened on a single attempt.
#[derive(Debug)]
pub struct AttemptRecord {
    /// 1-based attempt number.
    pub attempt: u32,
    /// Bytes returned by the probe.
    pub output: Vec<u8>,
    /// The probe's error, if any.
    pub probe_error: Option<WatchError>,
    /// Whether the pattern matched.
    pub matched: bool,
}

type AttemptObserver = Box<dyn FnMut(&AttemptRecord) + Send>;

/// Drives a [`StateSource`] until the pattern appears or the run gives up.
pub struct Poller<S> {
    source: S,
    config: PollConfig,
    backoff: Backoff,
    matcher: Option<Matcher>,
    rng: StdRng,
    observer: Option<AttemptObserver>,
}

impl<S: StateSource> Poller<S> {
    /// Create a poller.
    ///
    /// The pattern is compiled on the first evaluation. Call
    /// [`PollConfig::validate`] first to reject bad settings before probing.
    #[must_use]
    pub fn new(source: S, config: PollConfig) -> Self {
        Self {
            source,
            backoff: Backoff::from_config(&config),
            config,
            matcher: None,
            rng: StdRng::from_os_rng(),
            observer: None,
        }
    }

    /// Use a precompiled matcher instead of compiling from the config.
    #[must_use]
    pub fn with_matcher(mut self, matcher: Matcher) -> Self {
        self.matcher = Some(matcher);
        self
    }

    /// Seed the jitter generator, for reproducible delays.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Register a callback invoked after every attempt.
    #[must_use]
    pub fn on_attempt(mut self, observer: impl FnMut(&AttemptRecord) + Send + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Get the source.
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Get the source mutably.
    pub const fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Consume the poller, returning the source.
    pub fn into_source(self) -> S {
        self.source
    }

    /// Poll until a terminal outcome.
    pub async fn run(&mut self) -> PollReport {
        let started = Instant::now();
        let deadline = self.config.timeout.and_then(|timeout| {
            let deadline = Deadline::from_now(timeout);
            if deadline.is_none() {
                warn!(?timeout, "timeout too large to schedule, running without a deadline");
            }
            deadline
        });
        let mut attempt: u32 = 0;
        let mut waited = Duration::ZERO;

        debug!(
            source = %self.source.describe(),
            pattern = %self.config.pattern,
            mode = self.config.match_mode.name(),
            ignore_case = self.config.case_insensitive,
            "starting poll"
        );

        let outcome = loop {
            attempt = attempt.saturating_add(1);

            let observation = tokio::select! {
                biased;
                observation = self.probe_once() => observation,
                () = expiry(deadline) => {
                    info!(attempt, "timeout reached while probing");
                    break PollOutcome::TimedOut;
                }
            };
            log_observation(attempt, &observation);

            let evaluated = self.evaluate(&observation.bytes);
            let matched = evaluated.as_ref().is_ok_and(|&matched| matched);
            self.notify(AttemptRecord {
                attempt,
                output: observation.bytes,
                probe_error: observation.error,
                matched,
            });
            if let Err(e) = evaluated {
                error!(attempt, error = %e, "error matching pattern");
                break PollOutcome::FatalError(e);
            }

            if matched {
                info!(attempt, "pattern found");
                break PollOutcome::Matched;
            }
            match deadline {
                Some(d) if d.is_expired() => {
                    info!(attempt, "timeout reached");
                    break PollOutcome::TimedOut;
                }
                Some(_) => {}
                // A configured timeout still replaces the attempt limit when it
                // was too far out to schedule.
                None if self.config.timeout.is_none()
                    && self.config.max_attempts > 0
                    && attempt >= self.config.max_attempts =>
                {
                    info!(attempt, "max retries reached");
                    break PollOutcome::ExhaustedRetries;
                }
                None => {}
            }

            let delay = self.backoff.next_delay(attempt, &mut self.rng);
            debug!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                "no pattern match, waiting before next attempt"
            );
            tokio::select! {
                biased;
                () = expiry(deadline) => {
                    info!(attempt, "timeout reached while waiting");
                    break PollOutcome::TimedOut;
                }
                () = tokio::time::sleep(delay) => waited += delay,
            }
        };

        PollReport {
            outcome,
            attempts: attempt,
            elapsed: started.elapsed(),
            waited,
        }
    }

    async fn probe_once(&mut self) -> Observation {
        match self.config.probe_timeout {
            Some(limit) => match self.source.probe().with_timeout(limit).await {
                Ok(observation) => observation,
                Err(_) => Observation::error(WatchError::ProbeTimeout { duration: limit }),
            },
            None => self.source.probe().await,
        }
    }

    fn evaluate(&mut self, candidate: &[u8]) -> Result<bool, WatchError> {
        if self.matcher.is_none() {
            self.matcher = Some(Matcher::from_config(&self.config)?);
        }
        Ok(self
            .matcher
            .as_ref()
            .is_some_and(|matcher| matcher.evaluate(candidate)))
    }

    fn notify(&mut self, record: AttemptRecord) {
        if let Some(observer) = self.observer.as_mut() {
            observer(&record);
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for Poller<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Poller")
            .field("source", &self.source)
            .field("config", &self.config)
            .field("matcher", &self.matcher)
            .field("observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

fn log_observation(attempt: u32, observation: &Observation) {
    match &observation.error {
        Some(e) => debug!(attempt, error = %e, "error checking source"),
        None => debug!(attempt, bytes = observation.bytes.len(), "probe succeeded"),
    }
    if !observation.bytes.is_empty() {
        debug!(
            attempt,
            output = %String::from_utf8_lossy(&observation.bytes).trim_end(),
            "probe output"
        );
    }
}
