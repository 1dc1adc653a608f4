//! Sync planning service
//!
//! Pure domain logic for deciding what happens to each tree entry.
//! This service determines actions from entry metadata alone, without
//! performing any I/O.

use std::collections::HashMap;

use crate::domain::entities::{EntryKind, TimestampResolution, TreeEntry};
use crate::domain::value_objects::FilterChain;

/// The action to take for a single entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// Directory missing on the destination
    CreateDir,
    /// File missing, older on the destination, or forced
    CopyFile,
    /// Destination already up to date
    SkipUnchanged,
    /// Destination entry has no source counterpart
    DeleteExtraneous,
}

/// Pure planning service
pub struct Planner;

impl Planner {
    /// Plan a source directory against its destination counterpart
    pub fn plan_directory(destination: Option<&TreeEntry>) -> SyncAction {
        match destination {
            None => SyncAction::CreateDir,
            Some(_) => SyncAction::SkipUnchanged,
        }
    }

    /// Plan a source file against its destination counterpart.
    ///
    /// Copies when forced, when the destination is absent, or when the
    /// source is strictly newer at `resolution`. Equal times are a no-op.
    pub fn plan_file(
        source: &TreeEntry,
        destination: Option<&TreeEntry>,
        force: bool,
        resolution: TimestampResolution,
    ) -> SyncAction {
        if force {
            return SyncAction::CopyFile;
        }
        match destination {
            None => SyncAction::CopyFile,
            Some(dest) if Self::is_newer(source, dest, resolution) => SyncAction::CopyFile,
            Some(_) => SyncAction::SkipUnchanged,
        }
    }

    /// Strict greater-than on modification times truncated to `resolution`
    pub fn is_newer(
        source: &TreeEntry,
        destination: &TreeEntry,
        resolution: TimestampResolution,
    ) -> bool {
        resolution.truncate(source.modified) > resolution.truncate(destination.modified)
    }

    /// Destination exists with a different kind than the source entry
    pub fn kind_conflict(source: &TreeEntry, destination: Option<&TreeEntry>) -> bool {
        destination.is_some_and(|dest| dest.kind != source.kind)
    }

    /// Direct destination children to delete during reconciliation.
    ///
    /// An entry is extraneous when no source child shares its relative path
    /// or the source child has a different kind. Entries the filter rejects
    /// are never selected.
    pub fn extraneous<'a>(
        source_children: &[TreeEntry],
        destination_children: &'a [TreeEntry],
        filter: &FilterChain,
    ) -> Vec<&'a TreeEntry> {
        let source_kinds: HashMap<&str, EntryKind> = source_children
            .iter()
            .map(|entry| (entry.relative_path.as_str(), entry.kind))
            .collect();

        destination_children
            .iter()
            .filter(|dest| filter.accept(&dest.relative_path))
            .filter(|dest| source_kinds.get(dest.relative_path.as_str()) != Some(&dest.kind))
            .collect()
    }
}
