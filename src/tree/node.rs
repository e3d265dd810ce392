//! Tree entries and immutable tree values

use crate::tree::hasher;
use crate::types::ObjectId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of object a tree entry points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryMode {
    /// File content
    Blob,
    /// Sub-directory
    Tree,
}

impl EntryMode {
    /// Discriminator byte used in tree hashing
    pub fn tag(self) -> u8 {
        match self {
            EntryMode::Blob => b'b',
            EntryMode::Tree => b't',
        }
    }
}

impl fmt::Display for EntryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryMode::Blob => f.write_str("blob"),
            EntryMode::Tree => f.write_str("tree"),
        }
    }
}

/// A named entry inside a tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub name: String,
    pub id: ObjectId,
    pub mode: EntryMode,
}

impl TreeEntry {
    pub fn new(name: impl Into<String>, id: ObjectId, mode: EntryMode) -> Self {
        Self {
            name: name.into(),
            id,
            mode,
        }
    }

    pub fn is_tree(&self) -> bool {
        self.mode == EntryMode::Tree
    }
}

/// Immutable directory listing
///
/// Entries are kept sorted by name so the identity only depends on contents.
/// Edits return a new value and leave `self` untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    entries: BTreeMap<String, TreeEntry>,
}

impl Tree {
    /// The canonical empty tree
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = TreeEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|entry| (entry.name.clone(), entry))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Entries in name order
    pub fn entries(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// New tree with `name` set to `(id, mode)`, replacing any previous entry
    pub fn with_entry(&self, name: &str, id: ObjectId, mode: EntryMode) -> Tree {
        let mut tree = self.clone();
        tree.set_entry(name, id, mode);
        tree
    }

    /// New tree without `name`; identical contents if it was absent
    pub fn without_entry(&self, name: &str) -> Tree {
        let mut tree = self.clone();
        tree.remove_entry(name);
        tree
    }

    /// In-place edit of a tree value that has not been stored yet
    pub(crate) fn set_entry(&mut self, name: &str, id: ObjectId, mode: EntryMode) {
        self.entries
            .insert(name.to_string(), TreeEntry::new(name, id, mode));
    }

    pub(crate) fn remove_entry(&mut self, name: &str) {
        self.entries.remove(name);
    }

    /// Content identity of this tree
    pub fn id(&self) -> ObjectId {
        hasher::compute_tree_id(self)
    }
}
