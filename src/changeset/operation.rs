//! Staged operations

use crate::error::EditError;
use crate::tree::path::{split, PathSegments};
use crate::types::ObjectId;
use std::fmt;

/// A single path-addressed change, recorded in submission order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Create or replace a file with stored blob content
    Insert { path: PathSegments, id: ObjectId },
    /// Delete a file or directory
    Remove { path: PathSegments },
    /// Relocate an entry, overwriting the destination
    Move { from: PathSegments, to: PathSegments },
}

impl Operation {
    pub fn insert(path: &str, id: ObjectId) -> Result<Self, EditError> {
        Ok(Operation::Insert {
            path: split(path)?,
            id,
        })
    }

    pub fn remove(path: &str) -> Result<Self, EditError> {
        Ok(Operation::Remove { path: split(path)? })
    }

    pub fn moved(from: &str, to: &str) -> Result<Self, EditError> {
        Ok(Operation::Move {
            from: split(from)?,
            to: split(to)?,
        })
    }

    /// True if this operation reads or writes `path` or one of its ancestors
    pub fn touches(&self, path: &PathSegments) -> bool {
        let covers = |p: &PathSegments| p == path || p.is_ancestor_of(path);
        match self {
            Operation::Insert { path: p, .. } | Operation::Remove { path: p } => covers(p),
            Operation::Move { from, to } => covers(from) || covers(to),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Insert { path, id } => write!(f, "insert {} ({})", path, id.short()),
            Operation::Remove { path } => write!(f, "remove {}", path),
            Operation::Move { from, to } => write!(f, "move {} -> {}", from, to),
        }
    }
}

/// Commit-message line for a change, in submission order
pub(crate) fn summary_line(op: &Operation, existed: bool) -> String {
    match op {
        Operation::Insert { path, .. } if existed => format!("    M  {}", path),
        Operation::Insert { path, .. } => format!("    A  {}", path),
        Operation::Remove { path } => format!("    D  {}", path),
        Operation::Move { from, to } => format!("    R  {} -> {}", from, to),
    }
}
