//! Change-set simplification
//!
//! Replays an ordered operation log into one final outcome per path, then
//! nests those outcomes by directory so the applier can rebuild every
//! touched directory exactly once.
//!
//! Pending outcomes always describe the state as if the operations had run
//! one after the other:
//! - setting an outcome at a path clears pending outcomes beneath it
//! - a move carries the pending outcomes beneath its source to the destination
//! - a move source is resolved against pending outcomes before the base tree

use crate::changeset::apply::apply;
use crate::changeset::operation::{summary_line, Operation};
use crate::error::EditError;
use crate::store::ObjectStore;
use crate::tree::hasher::empty_tree_id;
use crate::tree::lookup;
use crate::tree::node::EntryMode;
use crate::tree::path::{split, PathSegments};
use crate::types::ObjectId;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Final fate of a path after the whole batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The path holds `id` with the given mode
    Write { id: ObjectId, mode: EntryMode },
    /// The path must not exist
    Tombstone,
}

/// Flat map from full path to its final outcome
///
/// Keys order ancestors directly before their descendants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingChangeSet {
    outcomes: BTreeMap<PathSegments, Outcome>,
}

impl PendingChangeSet {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathSegments, &Outcome)> {
        self.outcomes.iter()
    }

    /// Outcome recorded for `path`, if any
    pub fn outcome(&self, path: &str) -> Option<Outcome> {
        split(path)
            .ok()
            .and_then(|segments| self.outcomes.get(&segments).copied())
    }

    fn set(&mut self, path: PathSegments, outcome: Outcome) {
        for key in self.descendant_keys(&path) {
            self.outcomes.remove(&key);
        }
        self.outcomes.insert(path, outcome);
    }

    fn descendant_keys(&self, path: &PathSegments) -> Vec<PathSegments> {
        self.outcomes
            .range(path.clone()..)
            .map(|(key, _)| key)
            .skip_while(|key| *key == path)
            .take_while(|key| path.is_ancestor_of(key))
            .cloned()
            .collect()
    }

    /// Pending outcomes strictly beneath `path`, keyed by their relative segments
    fn descendants(&self, path: &PathSegments) -> Vec<(Vec<String>, Outcome)> {
        self.descendant_keys(path)
            .into_iter()
            .filter_map(|key| {
                let outcome = self.outcomes.get(&key).copied()?;
                Some((key.as_slice()[path.len()..].to_vec(), outcome))
            })
            .collect()
    }

    /// Group outcomes by directory
    ///
    /// Fails with `PathCollision` when the batch writes a file and then writes
    /// beneath that same path.
    pub fn nest(&self) -> Result<NestedDiff, EditError> {
        let mut root = NestedDiff::default();
        for (path, outcome) in &self.outcomes {
            root.place(path, *outcome)?;
        }
        Ok(root)
    }
}

/// Starting contents of a directory node before its children are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirBase {
    /// Whatever the tree being edited holds at this name
    Existing,
    /// The directory was removed earlier in the batch
    Empty,
    /// The directory was replaced by this tree earlier in the batch
    Tree(ObjectId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffNode {
    Leaf(Outcome),
    Dir { base: DirBase, entries: NestedDiff },
}

/// Per-directory view of a [`PendingChangeSet`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NestedDiff {
    entries: BTreeMap<String, DiffNode>,
}

impl NestedDiff {
    pub fn get(&self, name: &str) -> Option<&DiffNode> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DiffNode)> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn place(&mut self, path: &PathSegments, outcome: Outcome) -> Result<(), EditError> {
        let segments = path.as_slice();
        let (leaf, parents) = match segments.split_last() {
            Some(split) => split,
            None => return Err(EditError::InvalidPath(String::new())),
        };

        let mut level = self;
        for (depth, name) in parents.iter().enumerate() {
            let node = level
                .entries
                .entry(name.clone())
                .or_insert_with(|| DiffNode::Dir {
                    base: DirBase::Existing,
                    entries: NestedDiff::default(),
                });

            if let DiffNode::Leaf(previous) = *node {
                let base = match previous {
                    Outcome::Tombstone => DirBase::Empty,
                    Outcome::Write {
                        id,
                        mode: EntryMode::Tree,
                    } => DirBase::Tree(id),
                    Outcome::Write {
                        mode: EntryMode::Blob,
                        ..
                    } => {
                        if outcome == Outcome::Tombstone {
                            // Nothing exists beneath a file.
                            return Ok(());
                        }
                        return Err(EditError::PathCollision {
                            file: segments[..=depth].join("/"),
                            nested: path.to_path_string(),
                        });
                    }
                };
                *node = DiffNode::Dir {
                    base,
                    entries: NestedDiff::default(),
                };
            }

            level = match node {
                DiffNode::Dir { entries, .. } => entries,
                DiffNode::Leaf(_) => {
                    return Err(EditError::PathCollision {
                        file: segments[..=depth].join("/"),
                        nested: path.to_path_string(),
                    })
                }
            };
        }

        match level.entries.entry(leaf.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(DiffNode::Leaf(outcome));
                Ok(())
            }
            Entry::Occupied(_) => Err(EditError::PathCollision {
                file: path.to_path_string(),
                nested: path.to_path_string(),
            }),
        }
    }
}

/// Result of replaying an operation log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Simplified {
    pub changes: PendingChangeSet,
    /// One commit-message line per operation, in submission order
    pub summaries: Vec<String>,
}

/// What a path refers to at some point during replay
enum Current {
    Present(ObjectId, EntryMode),
    Deleted,
    Missing,
}

struct Replay<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    base_tree: ObjectId,
    pending: PendingChangeSet,
}

impl<'a, S: ObjectStore + ?Sized> Replay<'a, S> {
    fn current(&self, path: &PathSegments) -> Result<Current, EditError> {
        if let Some(outcome) = self.pending.outcomes.get(path) {
            return Ok(match *outcome {
                Outcome::Write { id, mode } => Current::Present(id, mode),
                Outcome::Tombstone => Current::Deleted,
            });
        }

        // Nearest pending ancestor decides before the base tree does.
        let segments = path.as_slice();
        for depth in (1..segments.len()).rev() {
            let ancestor = PathSegments::from_vec(segments[..depth].to_vec());
            match self.pending.outcomes.get(&ancestor) {
                None => continue,
                Some(Outcome::Tombstone) => return Ok(Current::Deleted),
                Some(Outcome::Write {
                    mode: EntryMode::Blob,
                    ..
                }) => return Ok(Current::Missing),
                Some(Outcome::Write {
                    id,
                    mode: EntryMode::Tree,
                }) => {
                    let rest = PathSegments::from_vec(segments[depth..].to_vec());
                    return Ok(match lookup::resolve(self.store, *id, &rest)? {
                        Some(entry) => Current::Present(entry.id, entry.mode),
                        None => Current::Missing,
                    });
                }
            }
        }

        Ok(match lookup::resolve(self.store, self.base_tree, path)? {
            Some(entry) => Current::Present(entry.id, entry.mode),
            None => Current::Missing,
        })
    }

    /// Tombstone a file that stands where a directory of `path` must go
    ///
    /// Only files not written by this batch are replaced; a file written
    /// earlier in the batch is left for `nest` to report as a collision.
    fn replace_file_ancestors(&mut self, path: &PathSegments) -> Result<(), EditError> {
        let segments = path.as_slice();
        for depth in 1..segments.len() {
            let ancestor = PathSegments::from_vec(segments[..depth].to_vec());
            if self.pending.outcomes.contains_key(&ancestor) {
                continue;
            }
            match self.current(&ancestor)? {
                Current::Present(_, EntryMode::Blob) => {
                    self.pending.set(ancestor, Outcome::Tombstone);
                    return Ok(());
                }
                Current::Present(_, EntryMode::Tree) => {}
                Current::Deleted | Current::Missing => return Ok(()),
            }
        }
        Ok(())
    }

    /// True if applying `removals` to the directory `tree_id` leaves nothing
    fn emptied(
        &self,
        tree_id: ObjectId,
        removals: &[(Vec<String>, Outcome)],
    ) -> Result<bool, EditError> {
        if removals.is_empty() {
            return Ok(false);
        }
        let mut changes = PendingChangeSet::default();
        for (relative, outcome) in removals {
            changes
                .outcomes
                .insert(PathSegments::from_vec(relative.clone()), *outcome);
        }
        let remaining = apply(self.store, tree_id, &changes.nest()?)?;
        Ok(remaining == empty_tree_id())
    }

    fn step(&mut self, op: &Operation) -> Result<String, EditError> {
        match op {
            Operation::Insert { path, id } => {
                let existed = matches!(self.current(path)?, Current::Present(..));
                self.replace_file_ancestors(path)?;
                self.pending.set(
                    path.clone(),
                    Outcome::Write {
                        id: *id,
                        mode: EntryMode::Blob,
                    },
                );
                Ok(summary_line(op, existed))
            }
            Operation::Remove { path } => {
                self.pending.set(path.clone(), Outcome::Tombstone);
                Ok(summary_line(op, true))
            }
            Operation::Move { from, to } => {
                let carried = self.pending.descendants(from);
                let recreated = carried
                    .iter()
                    .any(|(_, outcome)| matches!(outcome, Outcome::Write { .. }));

                let (id, mode) = match self.current(from)? {
                    Current::Present(id, mode) => (id, mode),
                    // Only pending writes beneath the source bring it back.
                    _ if recreated => (empty_tree_id(), EntryMode::Tree),
                    Current::Deleted => {
                        return Err(EditError::MoveOfDeletedPath {
                            from: from.to_path_string(),
                            to: to.to_path_string(),
                        })
                    }
                    Current::Missing => {
                        return Err(EditError::MoveOfMissingPath {
                            from: from.to_path_string(),
                            to: to.to_path_string(),
                        })
                    }
                };

                // Removals earlier in the batch may have emptied the directory,
                // and empty directories do not exist.
                if mode == EntryMode::Tree && !recreated && self.emptied(id, &carried)? {
                    return Err(EditError::MoveOfDeletedPath {
                        from: from.to_path_string(),
                        to: to.to_path_string(),
                    });
                }

                self.pending.set(from.clone(), Outcome::Tombstone);
                self.replace_file_ancestors(to)?;
                self.pending.set(to.clone(), Outcome::Write { id, mode });
                for (relative, outcome) in carried {
                    self.pending.set(to.join(&relative), outcome);
                }
                Ok(summary_line(op, true))
            }
        }
    }
}

/// Replay `operations` against `base_tree` into a change set
#[instrument(skip_all, fields(base = %base_tree.short(), operations = operations.len()))]
pub fn simplify<S: ObjectStore + ?Sized>(
    store: &S,
    base_tree: ObjectId,
    operations: &[Operation],
) -> Result<Simplified, EditError> {
    let mut replay = Replay {
        store,
        base_tree,
        pending: PendingChangeSet::default(),
    };

    let mut summaries = Vec::with_capacity(operations.len());
    for op in operations {
        summaries.push(replay.step(op)?);
    }

    debug!(paths = replay.pending.len(), "Simplified batch");
    Ok(Simplified {
        changes: replay.pending,
        summaries,
    })
}
