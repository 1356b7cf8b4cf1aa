//! Incremental file reader tests.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use watchfor::{FileSource, StateSource, WatchError};

fn append(path: &Path, content: &str) {
    let mut file = OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.sync_all().unwrap();
}

async fn probe_str(source: &mut FileSource) -> String {
    let obs = source.probe().await;
    assert!(obs.error.is_none(), "unexpected error: {:?}", obs.error);
    String::from_utf8(obs.bytes).unwrap()
}

#[tokio::test]
async fn skips_existing_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.log");
    fs::write(&path, "Line 1\n").unwrap();

    let mut source = FileSource::open(&path).await.unwrap();
    assert_eq!(source.offset(), 7);
    assert_eq!(probe_str(&mut source).await, "");
}

#[tokio::test]
async fn returns_appended_bytes_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.log");
    fs::write(&path, "Line 1\n").unwrap();
    let mut source = FileSource::open(&path).await.unwrap();

    append(&path, "Line 2\nLine 3\n");
    assert_eq!(probe_str(&mut source).await, "Line 2\nLine 3\n");
    assert_eq!(probe_str(&mut source).await, "");

    append(&path, "Line 4\n");
    assert_eq!(probe_str(&mut source).await, "Line 4\n");
    assert_eq!(source.offset(), 28);
    assert_eq!(source.last_size(), 28);
}

#[tokio::test]
async fn empty_file_reads_from_start() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.log");
    fs::write(&path, "").unwrap();
    let mut source = FileSource::open(&path).await.unwrap();

    append(&path, "first\n");
    assert_eq!(probe_str(&mut source).await, "first\n");
}

#[tokio::test]
async fn truncation_restarts_at_zero() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    fs::write(&path, "old content that is fairly long\n").unwrap();
    let mut source = FileSource::open(&path).await.unwrap();

    // Truncate in place, as copytruncate does, then write less than before.
    fs::write(&path, "").unwrap();
    append(&path, "new\n");

    assert_eq!(probe_str(&mut source).await, "new\n");
    assert_eq!(probe_str(&mut source).await, "");
    assert_eq!(source.offset(), 4);
}

#[tokio::test]
async fn truncation_to_empty_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    fs::write(&path, "previous run\n").unwrap();
    let mut source = FileSource::open(&path).await.unwrap();

    fs::write(&path, "").unwrap();
    assert_eq!(probe_str(&mut source).await, "");
    assert_eq!(source.offset(), 0);

    append(&path, "restarted\n");
    assert_eq!(probe_str(&mut source).await, "restarted\n");
}

#[cfg(unix)]
#[tokio::test]
async fn replacement_reads_new_file_from_start() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    fs::write(&path, "before rotation, a long line of old output\n").unwrap();
    let mut source = FileSource::open(&path).await.unwrap();

    fs::rename(&path, dir.path().join("app.log.1")).unwrap();
    fs::write(&path, "fresh file with more bytes than the old offset covers\nREADY\n").unwrap();

    let content = probe_str(&mut source).await;
    assert_eq!(
        content,
        "fresh file with more bytes than the old offset covers\nREADY\n"
    );
    assert_eq!(probe_str(&mut source).await, "");
}

#[cfg(unix)]
#[tokio::test]
async fn missing_path_mid_rotation_keeps_old_handle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    fs::write(&path, "").unwrap();
    let mut source = FileSource::open(&path).await.unwrap();

    let rotated = dir.path().join("app.log.1");
    fs::rename(&path, &rotated).unwrap();
    append(&rotated, "late write\n");

    assert_eq!(probe_str(&mut source).await, "late write\n");

    fs::write(&path, "new file\n").unwrap();
    assert_eq!(probe_str(&mut source).await, "new file\n");
}

#[tokio::test]
async fn missing_file_fails_at_open() {
    let err = FileSource::open("/non/existent/path/to/file.log")
        .await
        .unwrap_err();
    assert!(matches!(err, WatchError::SourceOpen { .. }));
    assert!(err.to_string().contains("file.log"));
}

#[tokio::test]
async fn directory_fails_at_open() {
    let dir = tempfile::tempdir().unwrap();
    let err = FileSource::open(dir.path()).await.unwrap_err();
    assert!(matches!(err, WatchError::SourceOpen { .. }));
}

#[tokio::test]
async fn close_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("close.log");
    fs::write(&path, "test").unwrap();
    let mut source = FileSource::open(&path).await.unwrap();

    assert!(!source.is_closed());
    source.close();
    assert!(source.is_closed());
    source.close();
    assert!(source.is_closed());
}

#[tokio::test]
async fn probe_after_close_reports_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("close.log");
    fs::write(&path, "test").unwrap();
    let mut source = FileSource::open(&path).await.unwrap();
    source.close();

    let obs = source.probe().await;
    assert!(obs.bytes.is_empty());
    assert!(obs.error.unwrap().is_transient());
}

#[tokio::test]
async fn describe_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("named.log");
    fs::write(&path, "").unwrap();
    let source = FileSource::open(&path).await.unwrap();
    assert!(source.describe().contains("named.log"));
    assert_eq!(source.path(), path.as_path());
}
