//! Relative Path Helpers
//!
//! Tree entries are addressed by `/`-separated paths relative to an endpoint
//! root. The empty string names the root itself.

use std::fmt;

/// Error when a relative path fails validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Path contains traversal components (..)
    ContainsTraversal(String),
    /// Path is absolute when relative is required
    AbsoluteNotAllowed(String),
    /// Path is empty
    Empty,
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::ContainsTraversal(path) => {
                write!(f, "path '{}' contains traversal components (..)", path)
            }
            PathError::AbsoluteNotAllowed(path) => {
                write!(f, "path '{}' is absolute, a relative path is required", path)
            }
            PathError::Empty => write!(f, "path is empty"),
        }
    }
}

impl std::error::Error for PathError {}

/// Normalize a caller-supplied relative path.
///
/// Strips `./` segments, duplicate and trailing separators. Rejects absolute
/// paths, `..` segments and paths that normalize to nothing.
pub fn normalize(path: &str) -> Result<String, PathError> {
    if path.starts_with('/') || path.starts_with('\\') {
        return Err(PathError::AbsoluteNotAllowed(path.to_string()));
    }

    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(PathError::ContainsTraversal(path.to_string())),
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return Err(PathError::Empty);
    }
    Ok(segments.join("/"))
}

/// Check a filter prefix without rewriting it.
///
/// Prefixes are matched as raw strings, so `sub/` and `sub` mean different
/// things and must be kept verbatim.
pub fn validate_prefix(prefix: &str) -> Result<(), PathError> {
    if prefix.is_empty() {
        return Err(PathError::Empty);
    }
    if prefix.starts_with('/') || prefix.starts_with('\\') {
        return Err(PathError::AbsoluteNotAllowed(prefix.to_string()));
    }
    if prefix.split('/').any(|segment| segment == "..") {
        return Err(PathError::ContainsTraversal(prefix.to_string()));
    }
    Ok(())
}

/// Join a parent relative path with a child name
pub fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Last segment of a relative path
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Proper ancestors of a relative path, outermost first.
///
/// `ancestors("a/b/c")` yields `["a", "a/b"]`.
pub fn ancestors(path: &str) -> Vec<&str> {
    path.match_indices('/').map(|(idx, _)| &path[..idx]).collect()
}
