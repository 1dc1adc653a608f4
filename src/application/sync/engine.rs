//! Sync Engine
//!
//! Orchestrates one run:
//! 1. Reject unsupported directions before touching anything
//! 2. Select and connect the backend
//! 3. Walk the source tree breadth-first, reconciling each directory
//!    before propagating into it, or hand the run to the external tool
//!
//! All policy decisions come from the domain `Planner`; this module only
//! sequences transport calls and records what happened.

use std::collections::{HashSet, VecDeque};
use std::io;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use super::options::SyncRequest;
use super::report::SyncReport;
use crate::application::cancel::CancelToken;
use crate::domain::entities::{SyncConfiguration, TimestampResolution, TreeEntry};
use crate::domain::ports::{Transport, TransportError};
use crate::domain::services::{Planner, SyncAction};
use crate::domain::value_objects::{relative_path, FilterChain, SyncDirection};
use crate::error::{Operation, SyncError, SyncResult};
use crate::infrastructure::transport::{connect, Backend, DelegatedRun, ProcessTransport};

/// Runs syncs between two endpoints
#[derive(Debug, Clone, Default)]
pub struct SyncEngine {
    cancel: CancelToken,
    dry_run: bool,
}

impl SyncEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Compute and report every action without mutating the destination
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sync the configured endpoints in `direction`.
    ///
    /// `filter` is combined with the configuration's own filter. When
    /// `explicit_paths` is non-empty only those entries (and the subtrees
    /// of directories among them) are synced.
    pub fn sync(
        &self,
        configuration: &SyncConfiguration,
        direction: SyncDirection,
        explicit_paths: &[String],
        force: bool,
        filter: &FilterChain,
    ) -> SyncResult<SyncReport> {
        reject_two_way(direction)?;
        let request = SyncRequest {
            explicit_paths: normalize_paths(explicit_paths)?,
            force,
            delete: configuration.delete,
            filter: configuration_filter(configuration)?.and(filter.clone()),
        };

        self.cancel.check()?;
        match connect(configuration)? {
            Backend::Walk {
                source,
                destination,
            } => self.walk(source.as_ref(), destination.as_ref(), direction, &request),
            Backend::Delegated(process) => self.delegate(&process, direction, &request),
        }
    }

    /// Walk between transports the caller already holds.
    ///
    /// `source` and `destination` are the configured endpoints; `direction`
    /// decides which one is copied onto the other.
    pub fn walk(
        &self,
        source: &dyn Transport,
        destination: &dyn Transport,
        direction: SyncDirection,
        request: &SyncRequest,
    ) -> SyncResult<SyncReport> {
        reject_two_way(direction)?;
        for transport in [source, destination] {
            if !transport.supports(direction) {
                return Err(SyncError::configuration(format!(
                    "{} does not support {} sync",
                    transport.describe(),
                    direction
                )));
            }
        }

        let (from, to) = match direction {
            SyncDirection::ToSource => (destination, source),
            _ => (source, destination),
        };
        if from.local_path("").is_none() && to.local_path("").is_none() {
            return Err(SyncError::configuration(format!(
                "neither {} nor {} is on the local filesystem",
                from.describe(),
                to.describe()
            )));
        }
        let explicit_paths = normalize_paths(&request.explicit_paths)?;
        self.cancel.check()?;

        info!(
            source = %from.describe(),
            destination = %to.describe(),
            %direction,
            dry_run = self.dry_run,
            "starting sync"
        );

        let mut walk = Walk {
            from,
            to,
            request,
            resolution: from
                .timestamp_resolution()
                .coarsest(to.timestamp_resolution()),
            dry_run: self.dry_run,
            cancel: &self.cancel,
            report: SyncReport {
                dry_run: self.dry_run,
                ..SyncReport::default()
            },
            queue: VecDeque::new(),
        };
        walk.run(&explicit_paths)?;

        info!(summary = %walk.report.summary(), "sync finished");
        Ok(walk.report)
    }

    fn delegate(
        &self,
        process: &ProcessTransport,
        direction: SyncDirection,
        request: &SyncRequest,
    ) -> SyncResult<SyncReport> {
        if !process.supported_directions().contains(&direction) {
            return Err(SyncError::configuration(format!(
                "the delegated tool only supports {} sync",
                SyncDirection::ToDestination
            )));
        }
        process.validate(&request.filter, !request.explicit_paths.is_empty())?;
        process.check_available()?;
        self.cancel.check()?;

        process.run(
            &request.filter,
            DelegatedRun {
                force: request.force,
                delete: request.delete,
                dry_run: self.dry_run,
            },
        )?;

        info!(backend = %process.describe(), "delegated sync finished");
        Ok(SyncReport {
            delegated: true,
            dry_run: self.dry_run,
            ..SyncReport::default()
        })
    }
}

/// Directory waiting in the work queue
struct Pending {
    path: String,
    /// Destination counterpart exists (false only in dry runs)
    present: bool,
    /// Resolved source locations of this directory and its ancestors
    lineage: Vec<PathBuf>,
}

/// State of one tree walk
struct Walk<'a> {
    from: &'a dyn Transport,
    to: &'a dyn Transport,
    request: &'a SyncRequest,
    resolution: TimestampResolution,
    dry_run: bool,
    cancel: &'a CancelToken,
    report: SyncReport,
    queue: VecDeque<Pending>,
}

impl Walk<'_> {
    fn run(&mut self, explicit_paths: &[String]) -> SyncResult<()> {
        if self.source_stat("")?.is_none() {
            return Err(self.source_error(
                Operation::List,
                "",
                TransportError::NotFound(".".to_string()),
            ));
        }
        let root_present = self.ensure_root()?;

        if explicit_paths.is_empty() {
            let lineage = self.source_real("")?.into_iter().collect();
            self.queue.push_back(Pending {
                path: String::new(),
                present: root_present,
                lineage,
            });
        } else {
            for path in explicit_paths {
                self.explicit(path, root_present)?;
            }
        }
        self.drain()
    }

    fn drain(&mut self) -> SyncResult<()> {
        loop {
            self.cancel.check()?;
            let Some(dir) = self.queue.pop_front() else {
                return Ok(());
            };
            self.visit(dir)?;
        }
    }

    fn ensure_root(&mut self) -> SyncResult<bool> {
        match self.dest_stat("")? {
            Some(root) if root.is_dir() => Ok(true),
            Some(_) => Err(self.conflict(Operation::Mkdir, "", "destination root is not a directory")),
            None => {
                info!(destination = %self.to.describe(), "creating destination root");
                if self.dry_run {
                    return Ok(false);
                }
                self.to
                    .mkdir("")
                    .map_err(|e| self.dest_error(Operation::Mkdir, "", e))?;
                Ok(true)
            }
        }
    }

    fn visit(&mut self, dir: Pending) -> SyncResult<()> {
        let mut children = self
            .from
            .list(&dir.path)
            .map_err(|e| self.source_error(Operation::List, &dir.path, e))?;
        children.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        let removed = if self.request.delete && dir.present {
            self.reconcile(&dir.path, &children)?
        } else {
            HashSet::new()
        };

        for child in &children {
            if !self.request.filter.accept(&child.relative_path) {
                debug!(path = %child.relative_path, "filtered out");
                continue;
            }
            let dest = if dir.present && !removed.contains(&child.relative_path) {
                self.dest_stat(&child.relative_path)?
            } else {
                None
            };
            self.propagate(child, dest.as_ref(), &dir.lineage)?;
        }
        Ok(())
    }

    /// Delete direct destination children of `dir` that the source lacks.
    ///
    /// Every extraneous child is attempted; the first failure is returned
    /// once the rest have been tried. Returns the removed paths.
    fn reconcile(&mut self, dir: &str, children: &[TreeEntry]) -> SyncResult<HashSet<String>> {
        let existing = match self.to.list(dir) {
            Ok(existing) => existing,
            Err(e) if e.is_not_found() => return Ok(HashSet::new()),
            Err(e) => return Err(self.dest_error(Operation::List, dir, e)),
        };

        let mut removed = HashSet::new();
        let mut first = None;
        let mut failed = 0;
        for entry in Planner::extraneous(children, &existing, &self.request.filter) {
            let path = &entry.relative_path;
            debug!(path = %path, action = ?SyncAction::DeleteExtraneous, "reconcile");
            if !self.dry_run {
                if let Err(e) = self.to.delete(path) {
                    warn!(path = %path, error = %e, "delete failed");
                    failed += 1;
                    first.get_or_insert_with(|| self.dest_error(Operation::Delete, path, e));
                    continue;
                }
            }
            self.report.deleted.push(path.clone());
            removed.insert(path.clone());
        }

        match first {
            None => Ok(removed),
            Some(err) => {
                warn!(dir, failed, "reconciliation incomplete");
                Err(err)
            }
        }
    }

    fn propagate(
        &mut self,
        entry: &TreeEntry,
        dest: Option<&TreeEntry>,
        lineage: &[PathBuf],
    ) -> SyncResult<()> {
        if Planner::kind_conflict(entry, dest) {
            return Err(if entry.is_dir() {
                self.conflict(Operation::Mkdir, &entry.relative_path, "destination is a file")
            } else {
                self.conflict(Operation::Copy, &entry.relative_path, "destination is a directory")
            });
        }

        if entry.is_dir() {
            let mut lineage = lineage.to_vec();
            if let Some(real) = self.source_real(&entry.relative_path)? {
                if lineage.contains(&real) {
                    warn!(
                        path = %entry.relative_path,
                        target = %real.display(),
                        "directory links back to an ancestor, skipping"
                    );
                    return Ok(());
                }
                lineage.push(real);
            }
            let present = match Planner::plan_directory(dest) {
                SyncAction::CreateDir => {
                    self.create_dir(&entry.relative_path)?;
                    !self.dry_run
                }
                _ => true,
            };
            self.queue.push_back(Pending {
                path: entry.relative_path.clone(),
                present,
                lineage,
            });
            return Ok(());
        }

        let path = &entry.relative_path;
        match Planner::plan_file(entry, dest, self.request.force, self.resolution) {
            SyncAction::CopyFile => {
                debug!(path = %path, "copy");
                if !self.dry_run {
                    self.copy(path)?;
                }
                self.report.copied.push(path.clone());
            }
            _ => {
                debug!(path = %path, "up to date");
                self.report.skipped.push(path.clone());
            }
        }
        Ok(())
    }

    fn explicit(&mut self, path: &str, root_present: bool) -> SyncResult<()> {
        if !self.request.filter.accept(path) {
            warn!(path, "explicit path rejected by filter, skipping");
            return Ok(());
        }
        let Some(entry) = self.source_stat(path)? else {
            return Err(self.source_error(
                Operation::Stat,
                path,
                TransportError::NotFound(path.to_string()),
            ));
        };

        let mut present = root_present;
        let mut lineage: Vec<PathBuf> = self.source_real("")?.into_iter().collect();
        for ancestor in relative_path::ancestors(path) {
            present = self.ensure_dir(ancestor, present)?;
            lineage.extend(self.source_real(ancestor)?);
        }

        let dest = if present { self.dest_stat(path)? } else { None };
        self.propagate(&entry, dest.as_ref(), &lineage)
    }

    /// Create a destination directory unless it exists; returns whether it
    /// exists afterwards
    fn ensure_dir(&mut self, path: &str, parent_present: bool) -> SyncResult<bool> {
        if self.report.created_dirs.iter().any(|dir| dir == path) {
            return Ok(!self.dry_run);
        }
        let dest = if parent_present {
            self.dest_stat(path)?
        } else {
            None
        };
        match dest {
            Some(dir) if dir.is_dir() => Ok(true),
            Some(_) => Err(self.conflict(Operation::Mkdir, path, "destination is a file")),
            None => {
                self.create_dir(path)?;
                Ok(!self.dry_run)
            }
        }
    }

    fn create_dir(&mut self, path: &str) -> SyncResult<()> {
        debug!(path, "create directory");
        if !self.dry_run {
            self.to
                .mkdir(path)
                .map_err(|e| self.dest_error(Operation::Mkdir, path, e))?;
        }
        self.report.created_dirs.push(path.to_string());
        Ok(())
    }

    /// Copy one file, through whichever side is on the local filesystem
    fn copy(&self, path: &str) -> SyncResult<()> {
        let result = if let Some(local) = self.from.local_path(path) {
            self.to.copy_in(&local, path)
        } else if let Some(local) = self.to.local_path(path) {
            self.from.copy_out(path, &local)
        } else {
            Err(TransportError::Remote {
                path: path.to_string(),
                message: "no local side to copy through".to_string(),
            })
        };
        result.map_err(|e| self.dest_error(Operation::Copy, path, e))
    }

    fn source_stat(&self, path: &str) -> SyncResult<Option<TreeEntry>> {
        self.from
            .stat(path)
            .map_err(|e| self.source_error(Operation::Stat, path, e))
    }

    fn source_real(&self, path: &str) -> SyncResult<Option<PathBuf>> {
        self.from
            .real_path(path)
            .map_err(|e| self.source_error(Operation::Stat, path, e))
    }

    fn dest_stat(&self, path: &str) -> SyncResult<Option<TreeEntry>> {
        self.to
            .stat(path)
            .map_err(|e| self.dest_error(Operation::Stat, path, e))
    }

    fn source_error(&self, operation: Operation, path: &str, err: TransportError) -> SyncError {
        SyncError::from_transport(operation, path, &self.from.describe(), err)
    }

    fn dest_error(&self, operation: Operation, path: &str, err: TransportError) -> SyncError {
        SyncError::from_transport(operation, path, &self.to.describe(), err)
    }

    fn conflict(&self, operation: Operation, path: &str, message: &str) -> SyncError {
        self.dest_error(
            operation,
            path,
            TransportError::Io {
                path: path.to_string(),
                source: io::Error::new(io::ErrorKind::AlreadyExists, message.to_string()),
            },
        )
    }
}

fn reject_two_way(direction: SyncDirection) -> SyncResult<()> {
    if direction.is_one_way() {
        Ok(())
    } else {
        Err(SyncError::configuration("two-way sync is not supported"))
    }
}

fn configuration_filter(configuration: &SyncConfiguration) -> SyncResult<FilterChain> {
    let filter = &configuration.filter;
    for prefix in filter.includes().iter().chain(filter.excludes()) {
        relative_path::validate_prefix(prefix)
            .map_err(|e| SyncError::configuration(format!("invalid filter prefix: {}", e)))?;
    }
    Ok(FilterChain::from(filter.clone()))
}

fn normalize_paths(paths: &[String]) -> SyncResult<Vec<String>> {
    paths
        .iter()
        .map(|path| {
            relative_path::normalize(path)
                .map_err(|e| SyncError::configuration(format!("invalid explicit path: {}", e)))
        })
        .collect()
}
