//! Sync Report
//!
//! What a run did, for the human summary and `--json` output.

use serde::Serialize;

/// Result of a sync run. Paths are relative to the endpoint roots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Directories created on the destination
    pub created_dirs: Vec<String>,
    /// Files copied
    pub copied: Vec<String>,
    /// Files already up to date
    pub skipped: Vec<String>,
    /// Destination entries removed by reconciliation
    pub deleted: Vec<String>,
    /// The external tool performed the run
    pub delegated: bool,
    /// Nothing was actually changed
    pub dry_run: bool,
}

impl SyncReport {
    pub fn has_changes(&self) -> bool {
        !self.created_dirs.is_empty() || !self.copied.is_empty() || !self.deleted.is_empty()
    }

    /// One-line human summary
    pub fn summary(&self) -> String {
        if self.delegated {
            return "delegated sync completed".to_string();
        }
        let prefix = if self.dry_run { "would have " } else { "" };
        format!(
            "{}copied {} file(s), created {} dir(s), deleted {} entr{}; {} up to date",
            prefix,
            self.copied.len(),
            self.created_dirs.len(),
            self.deleted.len(),
            if self.deleted.len() == 1 { "y" } else { "ies" },
            self.skipped.len()
        )
    }
}
