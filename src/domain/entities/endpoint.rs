//! Endpoint entity
//!
//! One side of a sync: a root locator plus an opaque credential map.
//! Parsing is strict about schemes so that backend selection can be a pure
//! function of the two locators.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use percent_encoding::percent_decode_str;
use url::Url;

use crate::error::{SyncError, SyncResult};

/// Well-known credential keys
pub mod credential {
    pub const USERNAME: &str = "username";
    pub const PASSWORD: &str = "password";
    pub const PASSWORD_FILE: &str = "password_file";
    pub const IDENTITY_FILE: &str = "identity_file";
}

const DEFAULT_SSH_PORT: u16 = 22;

/// Where an endpoint's tree lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Directory on the local filesystem (`file://` URL or plain path)
    Local { path: PathBuf },
    /// Directory on an SSH host, reached over SFTP (`ssh://` or `sftp://`)
    Ssh {
        user: Option<String>,
        host: String,
        port: u16,
        /// Remote path. Relative paths resolve against the login directory.
        path: String,
    },
    /// rsync daemon URL (`rsync://host/module/path`)
    Rsync { url: String },
    /// `[user@]host:path` shorthand, only understood by the delegated tool
    Shorthand { spec: String },
}

impl Locator {
    /// Parse a locator string.
    ///
    /// Strings with `://` must use a supported scheme. `[user@]host:path`
    /// is shorthand. Anything else is a local path.
    pub fn parse(input: &str) -> SyncResult<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(SyncError::configuration("endpoint locator is empty"));
        }

        if input.contains("://") {
            let url = Url::parse(input).map_err(|e| {
                SyncError::configuration(format!("invalid endpoint '{}': {}", input, e))
            })?;
            return Self::from_url(&url);
        }

        if is_shorthand(input) {
            return Ok(Locator::Shorthand {
                spec: input.to_string(),
            });
        }

        Ok(Locator::Local {
            path: PathBuf::from(input),
        })
    }

    fn from_url(url: &Url) -> SyncResult<Self> {
        match url.scheme().to_ascii_lowercase().as_str() {
            "file" => {
                let path = url.to_file_path().map_err(|_| {
                    SyncError::configuration(format!("'{}' is not a usable file URL", url))
                })?;
                Ok(Locator::Local { path })
            }
            "ssh" | "sftp" => {
                let host = url
                    .host_str()
                    .filter(|h| !h.is_empty())
                    .ok_or_else(|| {
                        SyncError::configuration(format!("'{}' does not name a host", url))
                    })?
                    .to_string();
                let user = Some(url.username())
                    .filter(|u| !u.is_empty())
                    .map(|u| percent_decode_str(u).decode_utf8_lossy().into_owned());
                Ok(Locator::Ssh {
                    user,
                    host,
                    port: url.port().unwrap_or(DEFAULT_SSH_PORT),
                    path: remote_path(url.path()),
                })
            }
            "rsync" => {
                let mut url = url.clone();
                // the password travels in the credential map instead
                let _ = url.set_password(None);
                Ok(Locator::Rsync {
                    url: url.to_string(),
                })
            }
            other => Err(SyncError::configuration(format!(
                "unsupported endpoint scheme '{}'",
                other
            ))),
        }
    }

    /// Scheme name used in logs and backend selection errors
    pub fn scheme(&self) -> &'static str {
        match self {
            Locator::Local { .. } => "file",
            Locator::Ssh { .. } => "ssh",
            Locator::Rsync { .. } => "rsync",
            Locator::Shorthand { .. } => "shorthand",
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Locator::Local { .. })
    }

    /// Only the delegated tool understands these locators
    pub fn requires_delegate(&self) -> bool {
        matches!(self, Locator::Rsync { .. } | Locator::Shorthand { .. })
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Local { path } => write!(f, "{}", path.display()),
            Locator::Ssh {
                user,
                host,
                port,
                path,
            } => {
                write!(f, "sftp://")?;
                if let Some(user) = user {
                    write!(f, "{}@", user)?;
                }
                write!(f, "{}", host)?;
                if *port != DEFAULT_SSH_PORT {
                    write!(f, ":{}", port)?;
                }
                if path.starts_with('/') {
                    write!(f, "{}", path)
                } else if path == "." {
                    write!(f, "/~")
                } else {
                    write!(f, "/~/{}", path)
                }
            }
            Locator::Rsync { url } => write!(f, "{}", url),
            Locator::Shorthand { spec } => write!(f, "{}", spec),
        }
    }
}

/// `[user@]host:path`, but not a Windows drive letter like `C:\dir`
fn is_shorthand(input: &str) -> bool {
    let Some((host, _)) = input.split_once(':') else {
        return false;
    };
    if host.is_empty() || host.contains('/') || host.contains('\\') {
        return false;
    }
    let is_drive_letter = host.len() == 1 && host.chars().all(|c| c.is_ascii_alphabetic());
    !is_drive_letter
}

/// Decode a URL path, mapping `/~` and `/~/...` onto the login directory
fn remote_path(raw: &str) -> String {
    let decoded = percent_decode_str(raw).decode_utf8_lossy().into_owned();
    match decoded.as_str() {
        "" | "/~" | "/~/" => ".".to_string(),
        path => match path.strip_prefix("/~/") {
            Some(rest) => rest.to_string(),
            None => path.to_string(),
        },
    }
}

/// Resolved connection info for one side of a sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    locator: Locator,
    credentials: BTreeMap<String, String>,
}

impl Endpoint {
    pub fn new(locator: Locator) -> Self {
        Self {
            locator,
            credentials: BTreeMap::new(),
        }
    }

    /// Parse a locator string. A password embedded in an SSH URL moves into
    /// the credential map so it never shows up in logs.
    pub fn parse(input: &str) -> SyncResult<Self> {
        let mut credentials = BTreeMap::new();
        if let Ok(url) = Url::parse(input.trim()) {
            if let Some(password) = url.password() {
                credentials.insert(
                    credential::PASSWORD.to_string(),
                    percent_decode_str(password).decode_utf8_lossy().into_owned(),
                );
            }
        }
        Ok(Self {
            locator: Locator::parse(input)?,
            credentials,
        })
    }

    /// Local directory endpoint
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::new(Locator::Local { path: path.into() })
    }

    pub fn with_credential(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.credentials.insert(key.into(), value.into());
        self
    }

    pub fn with_credentials<I, K, V>(mut self, credentials: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in credentials {
            self.credentials.insert(key.into(), value.into());
        }
        self
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn credentials(&self) -> &BTreeMap<String, String> {
        &self.credentials
    }

    pub fn credential(&self, key: &str) -> Option<&str> {
        self.credentials.get(key).map(String::as_str)
    }

    /// Login name: explicit credential first, then the URL user
    pub fn username(&self) -> Option<&str> {
        self.credential(credential::USERNAME).or(match &self.locator {
            Locator::Ssh { user, .. } => user.as_deref(),
            _ => None,
        })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.locator)
    }
}
