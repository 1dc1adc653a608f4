//! Infrastructure Layer
//!
//! Concrete implementations of domain ports.
//! This layer handles all I/O operations.
//!
//! ## Structure
//!
//! - `transport/` - Local, SFTP and delegated-tool transports plus
//!   backend selection

pub mod transport;

// Re-export for convenience
pub use transport::{
    connect, select_backend, Backend, BackendKind, LocalTransport, ProcessTransport,
    SftpTransport,
};
