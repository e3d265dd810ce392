//! Stored object kinds: blobs, trees and commits

use crate::tree::hasher;
use crate::tree::node::Tree;
use crate::types::ObjectId;
use chrono::{Local, Offset};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Author or committer identity with a timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
    /// Seconds since the Unix epoch
    pub timestamp: i64,
    /// Local offset from UTC in minutes
    pub offset_minutes: i32,
}

impl Signature {
    /// Signature stamped with the current local time
    pub fn now(name: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Local::now();
        Self {
            name: name.into(),
            email: email.into(),
            timestamp: now.timestamp(),
            offset_minutes: now.offset().fix().local_minus_utc() / 60,
        }
    }

    /// Signature with an explicit time (deterministic commits in tests)
    pub fn at(
        name: impl Into<String>,
        email: impl Into<String>,
        timestamp: i64,
        offset_minutes: i32,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            timestamp,
            offset_minutes,
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// Snapshot node linking a tree to its history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub tree: ObjectId,
    /// Zero entries for the first commit, one otherwise
    pub parents: Vec<ObjectId>,
    pub author: Signature,
    pub committer: Signature,
    pub message: String,
}

impl Commit {
    pub fn id(&self) -> ObjectId {
        hasher::compute_commit_id(self)
    }

    /// First line of the message
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

/// Discriminator used in error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Blob => f.write_str("blob"),
            ObjectKind::Tree => f.write_str("tree"),
            ObjectKind::Commit => f.write_str("commit"),
        }
    }
}

/// Any object the store can hold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Object {
    Blob(Vec<u8>),
    Tree(Tree),
    Commit(Commit),
}

impl Object {
    /// Content identity, recomputed from the object itself
    pub fn id(&self) -> ObjectId {
        match self {
            Object::Blob(data) => hasher::compute_blob_id(data),
            Object::Tree(tree) => tree.id(),
            Object::Commit(commit) => commit.id(),
        }
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            Object::Blob(_) => ObjectKind::Blob,
            Object::Tree(_) => ObjectKind::Tree,
            Object::Commit(_) => ObjectKind::Commit,
        }
    }
}
