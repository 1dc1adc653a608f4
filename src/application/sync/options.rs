//! Sync Options
//!
//! Per-call request types for the sync engine.

use crate::domain::value_objects::FilterChain;

/// What one walk should do, on top of the transports it runs between
#[derive(Debug, Clone, Default)]
pub struct SyncRequest {
    /// Restrict the run to these relative paths (empty = whole tree)
    pub explicit_paths: Vec<String>,
    /// Copy files regardless of modification times
    pub force: bool,
    /// Delete destination entries with no source counterpart
    pub delete: bool,
    /// Combined include/exclude policy
    pub filter: FilterChain,
}

impl SyncRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_explicit_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.explicit_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_delete(mut self, delete: bool) -> Self {
        self.delete = delete;
        self
    }

    pub fn with_filter(mut self, filter: FilterChain) -> Self {
        self.filter = filter;
        self
    }
}
