//! Transport port - abstraction over one storage endpoint
//!
//! The sync engine walks trees exclusively through this trait so the same
//! diff algorithm drives local and SFTP endpoints.
//!
//! Implementations:
//! - `LocalTransport` - direct filesystem calls
//! - `SftpTransport` - one SSH session with an SFTP channel
//!
//! All paths are `/`-separated and relative to the endpoint root; the empty
//! string is the root itself.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::entities::{TimestampResolution, TreeEntry};
use crate::domain::value_objects::SyncDirection;

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Transport operation errors
#[derive(Error, Debug)]
pub enum TransportError {
    /// Entry does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Permission denied
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Local I/O error
    #[error("I/O error on {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Server-side failure reported by a remote protocol
    #[error("remote error on {path}: {message}")]
    Remote { path: String, message: String },

    /// Session to the endpoint is gone
    #[error("connection lost: {0}")]
    Connection(String),

    /// Some entries of a recursive delete could not be removed.
    /// Siblings were still attempted; `first` is the earliest failure.
    #[error("{failed} entries under {path} could not be removed, first: {first}")]
    Partial {
        path: String,
        failed: usize,
        first: Box<TransportError>,
    },
}

impl TransportError {
    /// Classify a local I/O error for `path`
    pub fn from_io(path: impl Into<String>, err: std::io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            std::io::ErrorKind::NotFound => TransportError::NotFound(path),
            std::io::ErrorKind::PermissionDenied => TransportError::AccessDenied(path),
            _ => TransportError::Io { path, source: err },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TransportError::NotFound(_))
    }
}

/// Capability interface over one storage endpoint
pub trait Transport {
    /// Display name for logs and errors
    fn describe(&self) -> String;

    /// Directions this transport can take part in
    fn supported_directions(&self) -> &'static [SyncDirection];

    /// Precision of the modification times this transport reports
    fn timestamp_resolution(&self) -> TimestampResolution;

    /// Local filesystem path of `path` when the endpoint is reachable
    /// through the local filesystem. `None` for remote transports.
    fn local_path(&self, path: &str) -> Option<PathBuf>;

    /// Children of a directory
    ///
    /// Fails with `NotFound` if the directory does not exist and
    /// `AccessDenied` on permission failure.
    fn list(&self, dir: &str) -> TransportResult<Vec<TreeEntry>>;

    /// Metadata of an entry; `None` when it does not exist
    fn stat(&self, path: &str) -> TransportResult<Option<TreeEntry>>;

    /// Create a directory. No-op when it already exists.
    fn mkdir(&self, path: &str) -> TransportResult<()>;

    /// Copy a local file onto this endpoint at `dest`, carrying the
    /// modification time and permission bits where supported
    fn copy_in(&self, local_source: &Path, dest: &str) -> TransportResult<()>;

    /// Copy `source` from this endpoint to a local file
    fn copy_out(&self, source: &str, local_dest: &Path) -> TransportResult<()>;

    /// Remove a file or a whole directory tree.
    ///
    /// Best-effort across siblings: every child is attempted before the
    /// first failure is reported as `Partial`.
    fn delete(&self, path: &str) -> TransportResult<()>;

    /// Canonical location of `path` with every symlink resolved.
    ///
    /// Used to detect directory cycles; `None` when the transport cannot
    /// tell.
    fn real_path(&self, _path: &str) -> TransportResult<Option<PathBuf>> {
        Ok(None)
    }

    /// Whether this transport can take part in `direction`
    fn supports(&self, direction: SyncDirection) -> bool {
        self.supported_directions().contains(&direction)
    }
}
