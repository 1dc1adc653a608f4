//! Tree entry entity
//!
//! Metadata snapshot of one file or directory, produced while walking a tree.
//! Entries are transient: they live for one directory level of one run.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::domain::value_objects::relative_path;

/// Kind of a tree entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// Precision of the modification times a transport reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TimestampResolution {
    Nanos,
    Seconds,
}

impl TimestampResolution {
    /// The coarser of two resolutions
    pub fn coarsest(self, other: Self) -> Self {
        self.max(other)
    }

    /// Truncate a timestamp to this resolution, as a duration since the epoch.
    ///
    /// Times before the epoch collapse to zero.
    pub fn truncate(self, time: SystemTime) -> Duration {
        let since_epoch = time.duration_since(UNIX_EPOCH).unwrap_or_default();
        match self {
            TimestampResolution::Nanos => since_epoch,
            TimestampResolution::Seconds => Duration::from_secs(since_epoch.as_secs()),
        }
    }
}

/// One file or directory on an endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// `/`-separated path relative to the endpoint root
    pub relative_path: String,
    pub kind: EntryKind,
    pub modified: SystemTime,
    /// Size in bytes (always 0 for directories)
    pub size: u64,
    /// Unix permission bits, when the backend exposes them
    pub permissions: Option<u32>,
}

impl TreeEntry {
    pub fn file(relative_path: impl Into<String>, modified: SystemTime, size: u64) -> Self {
        Self {
            relative_path: relative_path.into(),
            kind: EntryKind::File,
            modified,
            size,
            permissions: None,
        }
    }

    pub fn directory(relative_path: impl Into<String>, modified: SystemTime) -> Self {
        Self {
            relative_path: relative_path.into(),
            kind: EntryKind::Directory,
            modified,
            size: 0,
            permissions: None,
        }
    }

    pub fn with_permissions(mut self, mode: u32) -> Self {
        self.permissions = Some(mode & 0o7777);
        self
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Last path segment
    pub fn name(&self) -> &str {
        relative_path::file_name(&self.relative_path)
    }
}
