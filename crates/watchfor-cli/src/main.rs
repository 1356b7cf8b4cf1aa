//! watchfor: replace `sleep` calls with condition-based waiting.
//!
//! Exit codes: 0 when the pattern was found and the success command (if any)
//! succeeded, 1 on any other outcome or a failed follow-up command, 2 for
//! configuration and usage errors, 130 when interrupted.

use std::io::IsTerminal;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use watchfor::config::env::EnvConfig;
use watchfor::{Matcher, Poller, Source, StateSource, WatchError, run_follow_up};

mod cli;

const EXIT_FAILURE: u8 = 1;
const EXIT_USAGE: u8 = 2;
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::Cli::parse();
    init_tracing(args.verbose);
    run(args).await
}

fn init_tracing(verbose: bool) {
    let filter = std::env::var("RUST_LOG").map_or_else(
        |_| EnvFilter::new(if verbose { "watchfor=debug" } else { "watchfor=info" }),
        EnvFilter::new,
    );
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();
}

async fn run(args: cli::Cli) -> ExitCode {
    // Usage problems are reported before the first probe.
    let config = match args.poll_config(&EnvConfig::default()) {
        Ok(config) => config,
        Err(e) => return fail(&e, EXIT_USAGE),
    };
    let matcher = match Matcher::from_config(&config) {
        Ok(matcher) => matcher,
        Err(e) => return fail(&e, EXIT_USAGE),
    };
    let target = match args.target() {
        Ok(target) => target,
        Err(e) => return fail(&e, EXIT_USAGE),
    };
    let follow_up = args.follow_up();

    let source = match Source::open(&target).await {
        Ok(source) => source,
        Err(e) if e.is_config() => return fail(&e, EXIT_USAGE),
        Err(e) => return fail(&e, EXIT_FAILURE),
    };
    debug!(source = %source.describe(), "source ready");

    let mut poller = Poller::new(source, config).with_matcher(matcher);
    let report = tokio::select! {
        report = poller.run() => Some(report),
        () = interrupted() => None,
    };
    poller.into_source().close();

    let Some(report) = report else {
        eprintln!("Interrupted.");
        return ExitCode::from(EXIT_INTERRUPTED);
    };
    info!(
        outcome = %report.outcome,
        attempts = report.attempts,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "poll finished"
    );

    let success = report.is_success();
    let which = if success {
        println!("\nSuccess: executing success command.");
        "success"
    } else {
        println!("\nFailure: executing fail command.");
        "fail"
    };
    if let Some(command) = follow_up.for_outcome(&report.outcome) {
        println!("\n--- Executing: {command} ---");
        if let Err(e) = run_follow_up(command).await {
            eprintln!("Error executing {which} command: {e}");
            return ExitCode::from(EXIT_FAILURE);
        }
    }

    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_FAILURE)
    }
}

fn fail(err: &WatchError, code: u8) -> ExitCode {
    eprintln!("Error: {err}");
    ExitCode::from(code)
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
