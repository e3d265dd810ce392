//! Path splitting for tree-relative paths
//!
//! Paths are `/`-separated and relative to the tree root. Empty segments
//! (doubled or trailing separators) are dropped; segment content is opaque.

use crate::error::EditError;
use std::fmt;

/// A relative path decomposed into its non-empty segments
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathSegments(Vec<String>);

impl PathSegments {
    /// Wrap already validated, non-empty segments
    pub(crate) fn from_vec(segments: Vec<String>) -> Self {
        debug_assert!(!segments.is_empty());
        PathSegments(segments)
    }

    /// First segment (the entry name at the current tree level)
    pub fn head(&self) -> &str {
        &self.0[0]
    }

    /// Last segment (the entry name in the terminal directory)
    pub fn leaf(&self) -> &str {
        &self.0[self.0.len() - 1]
    }

    /// Segments below the first one, or `None` for a single-segment path
    pub fn tail(&self) -> Option<PathSegments> {
        if self.0.len() > 1 {
            Some(PathSegments(self.0[1..].to_vec()))
        } else {
            None
        }
    }

    /// Parent directory segments, or `None` for a top-level entry
    pub fn parent(&self) -> Option<PathSegments> {
        if self.0.len() > 1 {
            Some(PathSegments(self.0[..self.0.len() - 1].to_vec()))
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false: a `PathSegments` holds at least one segment
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// True when `self` is a strict ancestor directory of `other`
    pub fn is_ancestor_of(&self, other: &PathSegments) -> bool {
        self.0.len() < other.0.len() && other.0[..self.0.len()] == self.0[..]
    }

    /// Append the segments of `suffix` below this path
    pub fn join(&self, suffix: &[String]) -> PathSegments {
        let mut segments = self.0.clone();
        segments.extend_from_slice(suffix);
        PathSegments(segments)
    }

    /// Canonical `/`-joined form used as a map key
    pub fn to_path_string(&self) -> String {
        self.0.join("/")
    }
}

impl fmt::Display for PathSegments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_path_string())
    }
}

/// Split a relative path into segments
///
/// Fails with `InvalidPath` if no segment remains.
pub fn split(path: &str) -> Result<PathSegments, EditError> {
    let segments: Vec<String> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect();

    if segments.is_empty() {
        return Err(EditError::InvalidPath(path.to_string()));
    }
    Ok(PathSegments(segments))
}
