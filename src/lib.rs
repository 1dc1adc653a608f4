//! treesync - one-directional directory tree synchronization
//!
//! Copies new and changed files from a source tree onto a destination
//! tree, creating missing directories and optionally deleting destination
//! entries the source no longer has. Endpoints are local directories,
//! directories on SSH hosts (SFTP), or anything an external copy tool such
//! as rsync can reach.
//!
//! ```ignore
//! use treesync::{Endpoint, FilterChain, SyncConfiguration, SyncDirection, SyncEngine};
//!
//! let config = SyncConfiguration::new(
//!     Endpoint::parse("/home/me/site")?,
//!     Endpoint::parse("sftp://deploy@example.org/srv/site")?,
//! )
//! .with_delete(true);
//! let report = SyncEngine::new().sync(
//!     &config,
//!     SyncDirection::ToDestination,
//!     &[],
//!     false,
//!     &FilterChain::new(),
//! )?;
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;

// Re-exports for convenience
pub use application::{CancelToken, SyncEngine, SyncReport, SyncRequest};
pub use config::{Config, ConfigWarning};
pub use domain::entities::{
    DelegateOptions, Endpoint, HostKeyPolicy, Locator, SshOptions, SyncConfiguration,
    TransportMode, TreeEntry,
};
pub use domain::ports::Transport;
pub use domain::value_objects::{FilterChain, PathFilter, SyncDirection};
pub use error::{SyncError, SyncResult};
pub use infrastructure::{select_backend, BackendKind, LocalTransport};
