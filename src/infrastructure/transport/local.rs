//! Local Transport
//!
//! Implements the Transport port for a directory on the local filesystem.
//! Copies go through a sibling temp file that is renamed over the target,
//! so readers never observe a half-written file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::domain::entities::{TimestampResolution, TreeEntry};
use crate::domain::ports::{Transport, TransportError, TransportResult};
use crate::domain::value_objects::{relative_path, SyncDirection};

const DIRECTIONS: &[SyncDirection] = &[SyncDirection::ToDestination, SyncDirection::ToSource];

/// Expand a leading `~` to the user's home directory
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

/// Transport over a local directory tree
#[derive(Debug, Clone)]
pub struct LocalTransport {
    root: PathBuf,
}

impl LocalTransport {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: expand_home(root.as_ref()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        if path.is_empty() {
            self.root.clone()
        } else {
            self.root.join(path)
        }
    }

    fn entry_from_metadata(path: String, metadata: &fs::Metadata) -> TreeEntry {
        let modified = metadata.modified().unwrap_or(std::time::UNIX_EPOCH);
        let entry = if metadata.is_dir() {
            TreeEntry::directory(path, modified)
        } else {
            TreeEntry::file(path, modified, metadata.len())
        };
        match unix_mode(metadata) {
            Some(mode) => entry.with_permissions(mode),
            None => entry,
        }
    }

    fn remove_tree(full: &Path, rel: &str) -> TransportResult<()> {
        Self::remove_tree_with(full, rel, &|path| fs::remove_file(path))
    }

    fn remove_tree_with(
        full: &Path,
        rel: &str,
        remove_file: &dyn Fn(&Path) -> io::Result<()>,
    ) -> TransportResult<()> {
        let metadata = match fs::symlink_metadata(full) {
            Ok(metadata) => metadata,
            // already gone
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(TransportError::from_io(rel, e)),
        };

        if !metadata.is_dir() {
            return remove_file(full).map_err(|e| TransportError::from_io(rel, e));
        }

        let mut failed = 0;
        let mut first = None;
        let children = fs::read_dir(full).map_err(|e| TransportError::from_io(rel, e))?;
        for child in children {
            let result = child
                .map_err(|e| TransportError::from_io(rel, e))
                .and_then(|child| {
                    let name = child.file_name().to_string_lossy().into_owned();
                    let child_rel = relative_path::join(rel, &name);
                    Self::remove_tree_with(&child.path(), &child_rel, remove_file)
                });
            if let Err(err) = result {
                failed += match &err {
                    TransportError::Partial { failed, .. } => *failed,
                    _ => 1,
                };
                first.get_or_insert(err);
            }
        }

        match first {
            None => fs::remove_dir(full).map_err(|e| TransportError::from_io(rel, e)),
            Some(first) => Err(TransportError::Partial {
                path: rel.to_string(),
                failed,
                first: Box::new(first),
            }),
        }
    }
}

/// Copy `from` to `to` through a temp file in the target directory,
/// carrying permission bits and modification time
fn atomic_copy(from: &Path, to: &Path, rel: &str) -> TransportResult<()> {
    let io_err = |e: io::Error| TransportError::from_io(rel, e);

    let metadata = fs::metadata(from).map_err(io_err)?;
    let parent = to.parent().unwrap_or_else(|| Path::new("."));

    let mut source = fs::File::open(from).map_err(io_err)?;
    let mut temp = NamedTempFile::new_in(parent).map_err(io_err)?;
    io::copy(&mut source, temp.as_file_mut()).map_err(io_err)?;
    temp.as_file().sync_all().map_err(io_err)?;

    if let Ok(modified) = metadata.modified() {
        temp.as_file().set_modified(modified).map_err(io_err)?;
    }
    fs::set_permissions(temp.path(), metadata.permissions()).map_err(io_err)?;

    temp.persist(to).map_err(|e| io_err(e.error))?;
    Ok(())
}

#[cfg(unix)]
fn unix_mode(metadata: &fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(metadata.permissions().mode())
}

#[cfg(not(unix))]
fn unix_mode(_metadata: &fs::Metadata) -> Option<u32> {
    None
}

impl Transport for LocalTransport {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn supported_directions(&self) -> &'static [SyncDirection] {
        DIRECTIONS
    }

    fn timestamp_resolution(&self) -> TimestampResolution {
        TimestampResolution::Nanos
    }

    fn local_path(&self, path: &str) -> Option<PathBuf> {
        Some(self.resolve(path))
    }

    fn real_path(&self, path: &str) -> TransportResult<Option<PathBuf>> {
        fs::canonicalize(self.resolve(path))
            .map(Some)
            .map_err(|e| TransportError::from_io(path, e))
    }

    fn list(&self, dir: &str) -> TransportResult<Vec<TreeEntry>> {
        let full = self.resolve(dir);
        let read_dir = fs::read_dir(&full).map_err(|e| TransportError::from_io(dir, e))?;

        let mut entries = Vec::new();
        for child in read_dir {
            let child = child.map_err(|e| TransportError::from_io(dir, e))?;
            let name = child.file_name().into_string().map_err(|raw| TransportError::Io {
                path: dir.to_string(),
                source: io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("entry name {:?} is not valid UTF-8", raw),
                ),
            })?;
            let rel = relative_path::join(dir, &name);

            // follows symlinks, so a dangling link has no usable metadata
            match fs::metadata(child.path()) {
                Ok(metadata) => entries.push(Self::entry_from_metadata(rel, &metadata)),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    warn!(path = %rel, "skipping dangling symlink");
                }
                Err(e) => return Err(TransportError::from_io(rel, e)),
            }
        }

        entries.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(entries)
    }

    fn stat(&self, path: &str) -> TransportResult<Option<TreeEntry>> {
        match fs::metadata(self.resolve(path)) {
            Ok(metadata) => Ok(Some(Self::entry_from_metadata(path.to_string(), &metadata))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TransportError::from_io(path, e)),
        }
    }

    fn mkdir(&self, path: &str) -> TransportResult<()> {
        let full = self.resolve(path);
        match fs::create_dir(&full) {
            Ok(()) => {
                debug!(path, "created directory");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && full.is_dir() => Ok(()),
            Err(e) => Err(TransportError::from_io(path, e)),
        }
    }

    fn copy_in(&self, local_source: &Path, dest: &str) -> TransportResult<()> {
        atomic_copy(local_source, &self.resolve(dest), dest)
    }

    fn copy_out(&self, source: &str, local_dest: &Path) -> TransportResult<()> {
        atomic_copy(&self.resolve(source), local_dest, source)
    }

    fn delete(&self, path: &str) -> TransportResult<()> {
        Self::remove_tree(&self.resolve(path), path)
    }
}
