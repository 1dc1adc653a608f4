//! Sync configuration entity
//!
//! Everything one run needs to know about the two endpoints and how to move
//! entries between them. Built once per invocation and only read by the
//! engine.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::endpoint::Endpoint;
use crate::domain::value_objects::PathFilter;

/// Which backend family a run may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// Walk with per-entry transports when possible, delegate when a
    /// locator is only understood by the external tool
    #[default]
    Auto,
    /// Always walk with per-entry transports
    Walk,
    /// Always hand the whole run to the external tool
    Delegate,
}

impl TransportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Auto => "auto",
            TransportMode::Walk => "walk",
            TransportMode::Delegate => "delegate",
        }
    }
}

/// How SFTP connections treat the server's host key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum HostKeyPolicy {
    /// Host must already be in known_hosts with a matching key
    #[default]
    Strict,
    /// Unknown hosts are recorded in known_hosts; mismatches still fail
    AcceptNew,
    /// No verification at all
    Ignore,
}

/// SFTP connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshOptions {
    pub host_key_policy: HostKeyPolicy,
    /// known_hosts file; `None` means `~/.ssh/known_hosts`
    pub known_hosts: Option<PathBuf>,
    pub timeout: Duration,
}

impl Default for SshOptions {
    fn default() -> Self {
        Self {
            host_key_policy: HostKeyPolicy::Strict,
            known_hosts: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// External copy tool settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegateOptions {
    pub tool: PathBuf,
    pub options: Vec<String>,
    /// Flag used to hand over a credential file, rendered as `<flag>=<path>`
    pub credential_flag: String,
}

impl Default for DelegateOptions {
    fn default() -> Self {
        Self {
            tool: PathBuf::from("/usr/bin/rsync"),
            options: vec!["-avzru".to_string()],
            credential_flag: "--password-file".to_string(),
        }
    }
}

/// Complete description of one sync run's endpoints and policies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfiguration {
    pub source: Endpoint,
    pub destination: Endpoint,
    /// Global include/exclude policy
    pub filter: PathFilter,
    /// Reconcile: delete destination entries with no source counterpart
    pub delete: bool,
    pub mode: TransportMode,
    pub ssh: SshOptions,
    pub delegate: DelegateOptions,
}

impl SyncConfiguration {
    pub fn new(source: Endpoint, destination: Endpoint) -> Self {
        Self {
            source,
            destination,
            filter: PathFilter::default(),
            delete: false,
            mode: TransportMode::default(),
            ssh: SshOptions::default(),
            delegate: DelegateOptions::default(),
        }
    }

    pub fn with_filter(mut self, filter: PathFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_delete(mut self, delete: bool) -> Self {
        self.delete = delete;
        self
    }

    pub fn with_mode(mut self, mode: TransportMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_delegate(mut self, delegate: DelegateOptions) -> Self {
        self.delegate = delegate;
        self
    }

    pub fn with_ssh(mut self, ssh: SshOptions) -> Self {
        self.ssh = ssh;
        self
    }
}
