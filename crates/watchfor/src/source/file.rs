//! Incremental file reading, `tail -f` style.
//!
//! The reader starts at the end of the file, so content that existed before
//! the run is never treated as new. Each probe returns the bytes appended
//! since the previous probe.
//!
//! Two log-rotation styles are handled:
//!
//! - *Truncation* (`copytruncate`): the file shrinks below the read offset,
//!   so reading restarts at offset 0.
//! - *Replacement* (rename + create): on Unix the path's device and inode are
//!   compared against the open handle, and a different identity makes the
//!   reader reopen the path and start from 0. While the path is missing the
//!   old handle keeps being read.
//!
//! Limits: a truncation followed by enough new writes to pass the old offset
//! before the next probe is indistinguishable from plain appends. Bytes
//! written to the old file after the last probe but before a replacement are
//! not read. Replacement detection is unavailable on non-Unix platforms.

use std::fs::Metadata;
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::debug;

use super::{Observation, StateSource};
use crate::error::{Result, WatchError};

/// Identity of an open file, used to notice the path now names another file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileIdentity {
    device: u64,
    inode: u64,
}

impl FileIdentity {
    /// Read the identity from metadata, where the platform exposes one.
    #[cfg(unix)]
    #[must_use]
    pub fn of(meta: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            device: meta.dev(),
            inode: meta.ino(),
        })
    }

    /// Read the identity from metadata, where the platform exposes one.
    #[cfg(not(unix))]
    #[must_use]
    pub fn of(_meta: &Metadata) -> Option<Self> {
        None
    }
}

/// Read position and bookkeeping for one watched file.
#[derive(Debug)]
struct FileCursor {
    file: Option<File>,
    offset: u64,
    size: u64,
    modified: Option<SystemTime>,
    identity: Option<FileIdentity>,
}

/// Returns the bytes appended to a file since the previous probe.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    cursor: FileCursor,
}

impl FileSource {
    /// Open `path` and position the cursor at its current end.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::SourceOpen`] if the file cannot be opened or is
    /// a directory.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path)
            .await
            .map_err(|e| WatchError::source_open(&path, e))?;
        let meta = file
            .metadata()
            .await
            .map_err(|e| WatchError::source_open(&path, e))?;
        if meta.is_dir() {
            return Err(WatchError::source_open(
                &path,
                io::Error::other("is a directory"),
            ));
        }
        let offset = file
            .seek(SeekFrom::End(0))
            .await
            .map_err(|e| WatchError::source_open(&path, e))?;

        debug!(path = %path.display(), offset, "watching file");
        Ok(Self {
            path,
            cursor: FileCursor {
                file: Some(file),
                offset,
                size: meta.len(),
                modified: meta.modified().ok(),
                identity: FileIdentity::of(&meta),
            },
        })
    }

    /// Get the watched path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the offset the next probe will read from.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.cursor.offset
    }

    /// Get the file size seen by the last probe.
    #[must_use]
    pub const fn last_size(&self) -> u64 {
        self.cursor.size
    }

    /// Get the modification time seen by the last probe.
    #[must_use]
    pub const fn last_modified(&self) -> Option<SystemTime> {
        self.cursor.modified
    }

    /// Check whether the handle has been released.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.cursor.file.is_none()
    }

    /// Release the file handle. A second call does nothing.
    pub fn close(&mut self) {
        if self.cursor.file.take().is_some() {
            debug!(path = %self.path.display(), "closed watched file");
        }
    }

    /// Reopen the path if it now names a different file.
    async fn follow_replacement(&mut self) -> Result<()> {
        let Some(current) = self.cursor.identity else {
            return Ok(());
        };
        let meta = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta,
            // Mid-rotation: the old file is gone and the new one not yet created.
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(WatchError::io_context("checking watched path", e)),
        };
        if FileIdentity::of(&meta) == Some(current) {
            return Ok(());
        }

        let file = File::open(&self.path)
            .await
            .map_err(|e| WatchError::io_context("reopening rotated file", e))?;
        let meta = file
            .metadata()
            .await
            .map_err(|e| WatchError::io_context("reopening rotated file", e))?;
        debug!(path = %self.path.display(), "file replaced, reading new file from start");
        self.cursor.file = Some(file);
        self.cursor.identity = FileIdentity::of(&meta);
        self.cursor.offset = 0;
        Ok(())
    }

    async fn read_appended(&mut self) -> Result<Vec<u8>> {
        if self.is_closed() {
            return Err(WatchError::io_context(
                "reading watched file",
                io::Error::other("source is closed"),
            ));
        }
        self.follow_replacement().await?;

        let cursor = &mut self.cursor;
        let Some(file) = cursor.file.as_mut() else {
            return Ok(Vec::new());
        };
        let meta = file
            .metadata()
            .await
            .map_err(|e| WatchError::io_context("checking watched file", e))?;
        let size = meta.len();
        if cursor.offset > size {
            debug!(
                path = %self.path.display(),
                offset = cursor.offset,
                size,
                "file truncated, reading from start"
            );
            cursor.offset = 0;
        }
        cursor.size = size;
        cursor.modified = meta.modified().ok();

        file.seek(SeekFrom::Start(cursor.offset))
            .await
            .map_err(|e| WatchError::io_context("seeking watched file", e))?;
        let mut buf = Vec::new();
        let read = file
            .read_to_end(&mut buf)
            .await
            .map_err(|e| WatchError::io_context("reading watched file", e))?;
        cursor.offset += read as u64;
        Ok(buf)
    }
}

impl StateSource for FileSource {
    async fn probe(&mut self) -> Observation {
        match self.read_appended().await {
            Ok(bytes) => Observation::ok(bytes),
            Err(e) => Observation::error(e),
        }
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}
