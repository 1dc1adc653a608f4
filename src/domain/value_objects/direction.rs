//! Sync direction value object

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which way entries flow between the configured endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SyncDirection {
    /// Configured source is copied onto the configured destination
    #[default]
    ToDestination,
    /// Configured destination is copied back onto the configured source
    ToSource,
    /// Bidirectional sync. Declared for configuration compatibility; no
    /// transport supports it.
    TwoWay,
}

impl SyncDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncDirection::ToDestination => "to-destination",
            SyncDirection::ToSource => "to-source",
            SyncDirection::TwoWay => "two-way",
        }
    }

    pub fn is_one_way(&self) -> bool {
        !matches!(self, SyncDirection::TwoWay)
    }
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
