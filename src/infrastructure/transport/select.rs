//! Backend selection
//!
//! Decides once per run whether the engine walks the tree itself or hands
//! the run to the delegated tool. The decision depends only on the two
//! locators and the configured transport mode; connecting happens after.

use std::fmt;

use super::local::LocalTransport;
use super::process::ProcessTransport;
use super::sftp::SftpTransport;
use crate::domain::entities::{Endpoint, Locator, SshOptions, SyncConfiguration, TransportMode};
use crate::domain::ports::Transport;
use crate::error::{SyncError, SyncResult};

/// Backend family chosen for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Per-entry walk through two transports
    Walk,
    /// Whole run handed to the external tool
    Delegated,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Walk => f.write_str("walk"),
            BackendKind::Delegated => f.write_str("delegated"),
        }
    }
}

/// Connected backend, ready to run
pub enum Backend {
    Walk {
        source: Box<dyn Transport>,
        destination: Box<dyn Transport>,
    },
    Delegated(ProcessTransport),
}

impl Backend {
    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::Walk { .. } => BackendKind::Walk,
            Backend::Delegated(_) => BackendKind::Delegated,
        }
    }
}

/// Pick the backend family for `configuration` without touching either
/// endpoint
pub fn select_backend(configuration: &SyncConfiguration) -> SyncResult<BackendKind> {
    let source = configuration.source.locator();
    let destination = configuration.destination.locator();
    let is_ssh = |locator: &Locator| matches!(locator, Locator::Ssh { .. });

    if is_ssh(source) && is_ssh(destination) {
        return Err(SyncError::configuration(
            "syncing between two ssh endpoints is not supported",
        ));
    }

    let needs_delegate = source.requires_delegate() || destination.requires_delegate();
    let has_ssh = is_ssh(source) || is_ssh(destination);

    match configuration.mode {
        TransportMode::Auto if needs_delegate && has_ssh => Err(SyncError::configuration(
            format!(
                "cannot combine '{}' with '{}': the delegated tool does not speak sftp",
                configuration.source, configuration.destination
            ),
        )),
        TransportMode::Auto if needs_delegate => Ok(BackendKind::Delegated),
        TransportMode::Auto => Ok(BackendKind::Walk),
        TransportMode::Walk if needs_delegate => {
            let endpoint = if source.requires_delegate() {
                &configuration.source
            } else {
                &configuration.destination
            };
            Err(SyncError::configuration(format!(
                "'{}' can only be reached by the delegated tool",
                endpoint
            )))
        }
        TransportMode::Walk => Ok(BackendKind::Walk),
        TransportMode::Delegate if has_ssh => Err(SyncError::configuration(
            "delegate mode does not support ssh endpoints",
        )),
        TransportMode::Delegate => Ok(BackendKind::Delegated),
    }
}

/// Select and connect the backend for `configuration`
pub fn connect(configuration: &SyncConfiguration) -> SyncResult<Backend> {
    match select_backend(configuration)? {
        BackendKind::Walk => Ok(Backend::Walk {
            source: open_transport(&configuration.source, &configuration.ssh)?,
            destination: open_transport(&configuration.destination, &configuration.ssh)?,
        }),
        BackendKind::Delegated => Ok(Backend::Delegated(ProcessTransport::new(
            configuration.delegate.clone(),
            configuration.source.clone(),
            configuration.destination.clone(),
        ))),
    }
}

/// Open a per-entry transport for one endpoint
pub fn open_transport(endpoint: &Endpoint, ssh: &SshOptions) -> SyncResult<Box<dyn Transport>> {
    match endpoint.locator() {
        Locator::Local { path } => Ok(Box::new(LocalTransport::new(path))),
        Locator::Ssh { .. } => Ok(Box::new(SftpTransport::connect(endpoint, ssh)?)),
        Locator::Rsync { .. } | Locator::Shorthand { .. } => Err(SyncError::configuration(
            format!("'{}' can only be reached by the delegated tool", endpoint),
        )),
    }
}
