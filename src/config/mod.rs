//! Configuration module for treesync
//!
//! Configuration hierarchy:
//! 1. CLI flags (highest priority)
//! 2. Environment variables (TREESYNC_*)
//! 3. Config file (`--config`, `./treesync.toml`, or
//!    `~/.config/treesync/config.toml`)
//! 4. Built-in defaults (lowest priority)

mod loader;
mod types;

pub use loader::{discover, ConfigWarning, CONFIG_FILE_NAME};
pub use types::{Config, DelegateConfig, EndpointConfig, FilterConfig, SshConfig, SyncSection};
