//! Error types for treesync
//!
//! Uses `thiserror` for library errors. Port-level failures are
//! [`TransportError`]; the engine wraps them with the operation and the
//! relative path so every failure is actionable.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub use crate::domain::ports::TransportError;

/// Result type alias for treesync operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Engine operation that touched an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Stat,
    Mkdir,
    Copy,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::List => "list",
            Operation::Stat => "stat",
            Operation::Mkdir => "mkdir",
            Operation::Copy => "copy",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Main error type for sync runs
#[derive(Error, Debug)]
pub enum SyncError {
    /// Unsupported scheme, direction or transport combination.
    /// Always raised before anything is mutated.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Config file could not be read or parsed
    #[error("invalid config file {file}: {message}")]
    InvalidConfig { file: PathBuf, message: String },

    /// Connection, handshake, host key or authentication failure
    #[error("transport failure on {endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    /// A single list/stat/mkdir/copy/delete failed
    #[error("{operation} failed for '{path}'")]
    Io {
        operation: Operation,
        path: String,
        #[source]
        source: TransportError,
    },

    /// External tool exited unsuccessfully
    #[error("{tool} failed ({}): {}", exit_label(.code), .stderr.trim())]
    DelegatedTool {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Run stopped by a cancellation request
    #[error("sync cancelled")]
    Cancelled,
}

impl SyncError {
    pub fn configuration(message: impl Into<String>) -> Self {
        SyncError::Configuration(message.into())
    }

    /// Wrap a transport error raised while working on `path`.
    ///
    /// A dropped connection is a transport failure rather than a per-entry
    /// I/O failure.
    pub fn from_transport(
        operation: Operation,
        path: &str,
        endpoint: &str,
        source: TransportError,
    ) -> Self {
        match source {
            TransportError::Connection(message) => SyncError::Transport {
                endpoint: endpoint.to_string(),
                message,
            },
            source => SyncError::Io {
                operation,
                path: display_path(path).to_string(),
                source,
            },
        }
    }

    /// Whether the failure happened before any mutation could occur
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            SyncError::Configuration(_) | SyncError::InvalidConfig { .. }
        )
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// Root is shown as `.` in messages
fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "."
    } else {
        path
    }
}
