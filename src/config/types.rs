//! Configuration type definitions

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::entities::{
    DelegateOptions, Endpoint, HostKeyPolicy, SshOptions, SyncConfiguration, TransportMode,
};
use crate::domain::value_objects::{PathFilter, SyncDirection};
use crate::error::{SyncError, SyncResult};

use super::loader::{self, ConfigWarning};

/// One endpoint as written in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub uri: String,

    #[serde(default)]
    pub credentials: BTreeMap<String, String>,
}

impl EndpointConfig {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            credentials: BTreeMap::new(),
        }
    }

    fn to_endpoint(&self) -> SyncResult<Endpoint> {
        Ok(Endpoint::parse(&self.uri)?.with_credentials(self.credentials.clone()))
    }
}

/// Include/exclude prefixes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub include: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,
}

/// `[sync]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSection {
    #[serde(default)]
    pub delete: bool,

    #[serde(default)]
    pub force: bool,

    #[serde(default)]
    pub mode: TransportMode,

    #[serde(default)]
    pub direction: SyncDirection,
}

/// `[ssh]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshConfig {
    #[serde(default)]
    pub host_key_policy: HostKeyPolicy,

    #[serde(default)]
    pub known_hosts: Option<PathBuf>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            host_key_policy: HostKeyPolicy::default(),
            known_hosts: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// `[delegate]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateConfig {
    #[serde(default = "default_tool")]
    pub tool: PathBuf,

    #[serde(default = "default_tool_options")]
    pub options: Vec<String>,

    #[serde(default = "default_credential_flag")]
    pub credential_flag: String,
}

impl Default for DelegateConfig {
    fn default() -> Self {
        Self {
            tool: default_tool(),
            options: default_tool_options(),
            credential_flag: default_credential_flag(),
        }
    }
}

fn default_tool() -> PathBuf {
    DelegateOptions::default().tool
}

fn default_tool_options() -> Vec<String> {
    DelegateOptions::default().options
}

fn default_credential_flag() -> String {
    DelegateOptions::default().credential_flag
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: Option<EndpointConfig>,

    #[serde(default)]
    pub destination: Option<EndpointConfig>,

    #[serde(default)]
    pub filter: FilterConfig,

    #[serde(default)]
    pub sync: SyncSection,

    #[serde(default)]
    pub ssh: SshConfig,

    #[serde(default)]
    pub delegate: DelegateConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> SyncResult<Self> {
        let (config, _warnings) = loader::load_with_warnings(path)?;
        Ok(config)
    }

    /// Load configuration and collect non-fatal warnings (e.g. unknown keys).
    pub fn load_with_warnings(path: &Path) -> SyncResult<(Self, Vec<ConfigWarning>)> {
        loader::load_with_warnings(path)
    }

    /// Apply environment variable overrides (TREESYNC_* prefix)
    pub fn with_env_overrides(self) -> Self {
        loader::with_env_overrides(self)
    }

    /// Build the engine's view of this configuration.
    ///
    /// Both endpoints must be set and every filter prefix must be relative.
    pub fn to_sync_configuration(&self) -> SyncResult<SyncConfiguration> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| SyncError::configuration("no source endpoint configured"))?
            .to_endpoint()?;
        let destination = self
            .destination
            .as_ref()
            .ok_or_else(|| SyncError::configuration("no destination endpoint configured"))?
            .to_endpoint()?;

        let filter = PathFilter::validated(self.filter.include.clone(), self.filter.exclude.clone())
            .map_err(|e| SyncError::configuration(format!("invalid filter prefix: {}", e)))?;

        Ok(SyncConfiguration::new(source, destination)
            .with_filter(filter)
            .with_delete(self.sync.delete)
            .with_mode(self.sync.mode)
            .with_ssh(SshOptions {
                host_key_policy: self.ssh.host_key_policy,
                known_hosts: self.ssh.known_hosts.clone(),
                timeout: Duration::from_secs(self.ssh.timeout_secs),
            })
            .with_delegate(DelegateOptions {
                tool: self.delegate.tool.clone(),
                options: self.delegate.options.clone(),
                credential_flag: self.delegate.credential_flag.clone(),
            }))
    }
}
