//! Configuration loading

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::domain::entities::{HostKeyPolicy, TransportMode};
use crate::error::{SyncError, SyncResult};

use super::types::Config;

/// Project config file name, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "treesync.toml";

/// Non-fatal configuration warning surfaced to CLI users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub file: PathBuf,
    pub line: Option<usize>,
    pub suggestion: Option<String>,
}

/// Load configuration and collect non-fatal warnings (e.g. unknown keys).
pub fn load_with_warnings(path: &Path) -> SyncResult<(Config, Vec<ConfigWarning>)> {
    let content = fs::read_to_string(path).map_err(|e| SyncError::InvalidConfig {
        file: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut unknown_paths: Vec<String> = Vec::new();
    let deserializer = toml::de::Deserializer::new(&content);

    let config: Config = serde_ignored::deserialize(deserializer, |p| {
        unknown_paths.push(p.to_string());
    })
    .map_err(|e| SyncError::InvalidConfig {
        file: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let warnings = unknown_paths
        .into_iter()
        .map(|path_str| {
            let key = path_str
                .split('.')
                .next_back()
                .unwrap_or(path_str.as_str())
                .to_string();
            ConfigWarning {
                key: key.clone(),
                file: path.to_path_buf(),
                line: find_line_number(&content, &key),
                suggestion: suggest(&key, KNOWN_KEYS),
            }
        })
        .collect();

    Ok((config, warnings))
}

/// Find the config file to use.
///
/// An explicit path wins. Otherwise `./treesync.toml`, then
/// `<config dir>/treesync/config.toml`. `None` means built-in defaults.
pub fn discover(explicit: Option<&Path>) -> SyncResult<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(SyncError::InvalidConfig {
                file: path.to_path_buf(),
                message: "file not found".to_string(),
            });
        }
        return Ok(Some(path.to_path_buf()));
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Ok(Some(local));
    }

    Ok(dirs::config_dir()
        .map(|dir| dir.join("treesync/config.toml"))
        .filter(|path| path.is_file()))
}

/// Apply environment variable overrides (TREESYNC_* prefix)
pub fn with_env_overrides(config: Config) -> Config {
    apply_overrides(config, |name| std::env::var(name).ok())
}

pub(crate) fn apply_overrides<F>(mut config: Config, var: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    // TREESYNC_MODE
    if let Some(value) = var("TREESYNC_MODE") {
        let parsed = match value.trim().to_lowercase().as_str() {
            "auto" => Some(TransportMode::Auto),
            "walk" => Some(TransportMode::Walk),
            "delegate" => Some(TransportMode::Delegate),
            _ => None,
        };
        match parsed {
            Some(mode) => config.sync.mode = mode,
            None => invalid_env("TREESYNC_MODE", &value, &["auto", "walk", "delegate"]),
        }
    }

    // TREESYNC_HOST_KEY_POLICY
    if let Some(value) = var("TREESYNC_HOST_KEY_POLICY") {
        let parsed = match value.trim().to_lowercase().as_str() {
            "strict" => Some(HostKeyPolicy::Strict),
            "accept-new" => Some(HostKeyPolicy::AcceptNew),
            "ignore" => Some(HostKeyPolicy::Ignore),
            _ => None,
        };
        match parsed {
            Some(policy) => config.ssh.host_key_policy = policy,
            None => invalid_env(
                "TREESYNC_HOST_KEY_POLICY",
                &value,
                &["strict", "accept-new", "ignore"],
            ),
        }
    }

    // TREESYNC_DELEGATE_TOOL
    if let Some(value) = var("TREESYNC_DELEGATE_TOOL") {
        if !value.trim().is_empty() {
            config.delegate.tool = PathBuf::from(value.trim());
        }
    }

    // TREESYNC_DELETE
    if let Some(value) = var("TREESYNC_DELETE") {
        match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" => config.sync.delete = true,
            "0" | "false" | "no" => config.sync.delete = false,
            _ => invalid_env("TREESYNC_DELETE", &value, &["true", "false"]),
        }
    }

    config
}

fn invalid_env(name: &str, value: &str, valid: &[&str]) {
    match suggest(&value.to_lowercase(), valid) {
        Some(suggestion) => warn!(
            "ignoring invalid {} value '{}' (did you mean '{}'?)",
            name, value, suggestion
        ),
        None => warn!(
            "ignoring invalid {} value '{}', valid values: {}",
            name,
            value,
            valid.join(", ")
        ),
    }
}

const KNOWN_KEYS: &[&str] = &[
    "source",
    "destination",
    "uri",
    "credentials",
    "filter",
    "include",
    "exclude",
    "sync",
    "delete",
    "force",
    "mode",
    "direction",
    "ssh",
    "host_key_policy",
    "known_hosts",
    "timeout_secs",
    "delegate",
    "tool",
    "options",
    "credential_flag",
];

fn find_line_number(content: &str, needle: &str) -> Option<usize> {
    content
        .lines()
        .position(|line| line.contains(needle))
        .map(|i| i + 1)
}

/// Closest candidate within two edits
fn suggest(unknown: &str, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .map(|candidate| (*candidate, levenshtein(unknown, candidate)))
        .min_by_key(|(_, dist)| *dist)
        .filter(|(_, dist)| *dist <= 2)
        .map(|(candidate, _)| candidate.to_string())
}

fn levenshtein(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }

    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    let mut prev: Vec<usize> = (0..=b_bytes.len()).collect();
    let mut curr = vec![0usize; b_bytes.len() + 1];

    for (i, &ac) in a_bytes.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &bc) in b_bytes.iter().enumerate() {
            let cost = if ac == bc { 0 } else { 1 };
            curr[j + 1] =
                std::cmp::min(std::cmp::min(prev[j + 1] + 1, curr[j] + 1), prev[j] + cost);
        }
        prev.clone_from_slice(&curr);
    }

    prev[b_bytes.len()]
}
