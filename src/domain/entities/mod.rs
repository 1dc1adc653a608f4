//! Domain Entities
//!
//! Core domain objects with identity and lifecycle.

mod configuration;
pub mod endpoint;
mod tree_entry;

pub use configuration::{
    DelegateOptions, HostKeyPolicy, SshOptions, SyncConfiguration, TransportMode,
};
pub use endpoint::{Endpoint, Locator};
pub use tree_entry::{EntryKind, TimestampResolution, TreeEntry};
