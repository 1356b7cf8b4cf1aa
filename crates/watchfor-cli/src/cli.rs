//! CLI definition using clap derive.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgGroup, Parser};
use watchfor::config::env::EnvConfig;
use watchfor::config::file::ConfigFile;
use watchfor::{FollowUp, Invocation, PollConfig, Result, WatchError, WatchTarget};

const EXAMPLES: &str = "\
Examples:
  # Wait for a health check to return 'healthy' with exponential backoff
  watchfor -c 'curl -s https://api/health' -p 'status: healthy' --backoff 2 -- ./run_tests.sh

  # Wait for a log file to contain 'BUILD SUCCESSFUL' for up to 5 minutes
  watchfor -f build.log -p 'BUILD SUCCESSFUL' --timeout 5m -- ./deploy.sh";

#[derive(Debug, Parser)]
#[command(
    name = "watchfor",
    version,
    about = "Poll a command or file until a pattern appears, then run a follow-up command",
    long_about = "Poll a command or file until a pattern appears, then run a follow-up command.\n\n\
                  Designed to replace brittle `sleep` calls in CI/CD pipelines and scripts.",
    override_usage = "watchfor [OPTIONS] <--command <CMD>|--file <PATH>> --pattern <PATTERN> [-- <SUCCESS_COMMAND>...]",
    after_help = EXAMPLES
)]
#[command(group(ArgGroup::new("target").required(true).args(["command", "file"])))]
pub struct Cli {
    /// Command to execute and inspect on every attempt
    #[arg(short = 'c', long, value_name = "CMD")]
    pub command: Option<String>,

    /// File to follow; only content appended after startup is inspected
    #[arg(short = 'f', long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Text to search for in the output or file content
    #[arg(short = 'p', long)]
    pub pattern: String,

    /// Treat the pattern as a regular expression
    #[arg(long)]
    pub regex: bool,

    /// Match without regard to case
    #[arg(long)]
    pub ignore_case: bool,

    /// Initial delay between attempts, e.g. `500ms`, `5s`, `1m` [default: 1s]
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub interval: Option<Duration>,

    /// Maximum number of attempts, `0` to retry forever [default: 10]
    #[arg(long, value_name = "N")]
    pub max_retries: Option<u32>,

    /// Exponential backoff factor, `1` disables backoff [default: 1]
    #[arg(long, value_name = "FACTOR")]
    pub backoff: Option<f64>,

    /// Random spread applied to each delay, between 0 and 1 [default: 0]
    #[arg(long, value_name = "FACTOR")]
    pub jitter: Option<f64>,

    /// Overall time limit; overrides --max-retries, `0` for none [default: 0]
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Time limit for a single probe, `0` for none [default: 0]
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub probe_timeout: Option<Duration>,

    /// Command to execute if the pattern is not found
    #[arg(long, value_name = "CMD")]
    pub on_fail: Option<String>,

    /// Log every attempt
    #[arg(short, long)]
    pub verbose: bool,

    /// TOML file with default retry settings (also WATCHFOR_CONFIG)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Command to execute once the pattern is found
    #[arg(last = true, value_name = "SUCCESS_COMMAND")]
    pub success_command: Vec<String>,
}

impl Cli {
    /// Build the poll configuration: defaults, then the config file, then
    /// `WATCHFOR_*` variables, then flags.
    pub fn poll_config(&self, env: &EnvConfig) -> Result<PollConfig> {
        let mut config = PollConfig::new(self.pattern.as_str());

        let file = self
            .config
            .clone()
            .or_else(|| env.get("config").map(PathBuf::from));
        if let Some(path) = file {
            config = ConfigFile::load(&path)?.apply(config);
        }
        config = env.apply(config)?;

        if self.regex {
            config = config.regex(true);
        }
        if self.ignore_case {
            config = config.case_insensitive(true);
        }
        if let Some(interval) = self.interval {
            config = config.interval(interval);
        }
        if let Some(max_retries) = self.max_retries {
            config = config.max_attempts(max_retries);
        }
        if let Some(backoff) = self.backoff {
            config = config.backoff(backoff);
        }
        if let Some(jitter) = self.jitter {
            config = config.jitter(jitter);
        }
        if let Some(timeout) = self.timeout {
            config = config.timeout(timeout);
        }
        if let Some(timeout) = self.probe_timeout {
            config = config.probe_timeout(timeout);
        }

        config.validate()?;
        Ok(config)
    }

    /// The state source selected by `--command` or `--file`.
    pub fn target(&self) -> Result<WatchTarget> {
        match (&self.command, &self.file) {
            (Some(command), None) => Ok(WatchTarget::Command(Invocation::shell(command.as_str()))),
            (None, Some(path)) => Ok(WatchTarget::File(path.clone())),
            (Some(_), Some(_)) => Err(WatchError::config(
                "--command (-c) and --file (-f) cannot be used together",
            )),
            (None, None) => Err(WatchError::config(
                "either --command (-c) or --file (-f) must be specified",
            )),
        }
    }

    /// The success command (everything after `--`) and the `--on-fail` command.
    pub fn follow_up(&self) -> FollowUp {
        let on_success = (!self.success_command.is_empty())
            .then(|| Invocation::shell(self.success_command.join(" ")));
        let on_failure = self.on_fail.as_deref().map(Invocation::shell);
        FollowUp::new(on_success, on_failure)
    }
}
