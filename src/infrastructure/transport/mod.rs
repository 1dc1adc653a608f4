//! Transport implementations
//!
//! - `local` - Direct filesystem access
//! - `sftp` - SSH hosts over SFTP (`ssh2`)
//! - `process` - Delegated external copy tool
//! - `select` - Backend selection and connection

pub mod local;
pub mod process;
pub mod select;
pub mod sftp;

pub use local::LocalTransport;
pub use process::{DelegatedRun, ProcessOutput, ProcessTransport};
pub use select::{connect, open_transport, select_backend, Backend, BackendKind};
pub use sftp::SftpTransport;
