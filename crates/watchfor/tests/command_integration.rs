//! End-to-end tests against real processes and files.

#![cfg(unix)]

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::time::{Duration, Instant};

use watchfor::{FollowUp, Invocation, PollConfig, PollOutcome, Poller, Source, WatchTarget};

const MS: Duration = Duration::from_millis(1);

#[tokio::test]
async fn command_becomes_ready_after_retries() {
    let dir = tempfile::tempdir().unwrap();
    let counter = dir.path().join("count");
    fs::write(&counter, "").unwrap();

    // Prints "ready" from the third run onwards.
    let script = format!(
        "echo x >> {path}; if [ $(wc -l < {path}) -ge 3 ]; then echo ready; else echo starting; fi",
        path = counter.display()
    );
    let target = WatchTarget::Command(Invocation::shell(script));
    let source = Source::open(&target).await.unwrap();

    let mut poller = Poller::new(source, PollConfig::new("ready").interval(5 * MS).max_attempts(10));
    let report = poller.run().await;

    assert!(matches!(report.outcome, PollOutcome::Matched));
    assert_eq!(report.attempts, 3);
}

#[tokio::test]
async fn failing_command_exhausts_retries() {
    let target = WatchTarget::Command(Invocation::shell("echo 'connection refused' >&2; exit 7"));
    let source = Source::open(&target).await.unwrap();

    let mut poller = Poller::new(
        source,
        PollConfig::new("healthy").interval(MS).max_attempts(3),
    );
    let report = poller.run().await;

    assert!(matches!(report.outcome, PollOutcome::ExhaustedRetries));
    assert_eq!(report.attempts, 3);
}

#[tokio::test]
async fn regex_matches_stderr_of_failing_command() {
    let target = WatchTarget::Command(Invocation::shell("echo 'Error 503: unavailable' >&2; exit 1"));
    let source = Source::open(&target).await.unwrap();

    let config = PollConfig::new(r"error \d{3}")
        .regex(true)
        .case_insensitive(true)
        .interval(MS)
        .max_attempts(2);
    let report = Poller::new(source, config).run().await;
    assert!(report.is_success());
}

#[tokio::test]
async fn deadline_kills_slow_command() {
    let started = Instant::now();
    let target = WatchTarget::Command(Invocation::shell("sleep 30"));
    let source = Source::open(&target).await.unwrap();

    let mut poller = Poller::new(
        source,
        PollConfig::new("never").interval(MS).timeout(200 * MS),
    );
    let report = poller.run().await;

    assert!(matches!(report.outcome, PollOutcome::TimedOut));
    assert_eq!(report.attempts, 1);
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn file_source_sees_background_append() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("server.log");
    fs::write(&path, "Server listening on port 8080\n").unwrap();

    let source = Source::open(&WatchTarget::File(path.clone())).await.unwrap();

    let writer_path = path.clone();
    let writer = tokio::spawn(async move {
        tokio::time::sleep(50 * MS).await;
        let mut file = OpenOptions::new().append(true).open(&writer_path).unwrap();
        writeln!(file, "Initializing...").unwrap();
        tokio::time::sleep(50 * MS).await;
        writeln!(file, "Server listening on port 9090").unwrap();
    });

    let mut poller = Poller::new(
        source,
        PollConfig::new("Server listening")
            .interval(10 * MS)
            .timeout(Duration::from_secs(5)),
    );
    let report = poller.run().await;
    writer.await.unwrap();

    // The pre-existing line must not count.
    assert!(report.is_success());
    assert!(report.attempts > 1);
    assert!(report.elapsed >= 100 * MS);

    let mut source = poller.into_source();
    source.close();
    source.close();
}

#[tokio::test]
async fn follow_up_is_chosen_by_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("marker");
    let follow_up = FollowUp::new(
        Some(Invocation::shell(format!("echo deployed > {}", marker.display()))),
        Some(Invocation::shell(format!("echo rolled-back > {}", marker.display()))),
    );

    let source = Source::open(&WatchTarget::Command(Invocation::shell("echo down")))
        .await
        .unwrap();
    let report = Poller::new(source, PollConfig::new("up").interval(MS).max_attempts(2))
        .run()
        .await;

    let command = follow_up.for_outcome(&report.outcome).unwrap();
    watchfor::run_follow_up(command).await.unwrap();
    assert_eq!(fs::read_to_string(&marker).unwrap(), "rolled-back\n");
}
