//! Applying a nested change set to a stored tree

use crate::changeset::simplify::{DiffNode, DirBase, NestedDiff, Outcome};
use crate::error::EditError;
use crate::store::ObjectStore;
use crate::tree::hasher::empty_tree_id;
use crate::tree::node::{EntryMode, Tree};
use crate::types::ObjectId;
use tracing::{debug, instrument};

/// Rebuild `tree_id` with every change in `diff`, returning the new root id
///
/// Each touched directory is loaded, edited and written exactly once.
/// Directories left empty are dropped from their parent, so the root is the
/// only tree that may come out empty.
#[instrument(skip_all, fields(base = %tree_id.short()))]
pub fn apply<S: ObjectStore + ?Sized>(
    store: &S,
    tree_id: ObjectId,
    diff: &NestedDiff,
) -> Result<ObjectId, EditError> {
    if diff.is_empty() {
        return Ok(tree_id);
    }
    let tree = store.get_tree(tree_id)?;
    let root = apply_to(store, tree, diff)?;
    debug!(root = %root.short(), "Applied change set");
    Ok(root)
}

fn apply_to<S: ObjectStore + ?Sized>(
    store: &S,
    mut tree: Tree,
    diff: &NestedDiff,
) -> Result<ObjectId, EditError> {
    for (name, node) in diff.iter() {
        match node {
            DiffNode::Leaf(Outcome::Tombstone) => tree.remove_entry(name),
            DiffNode::Leaf(Outcome::Write { id, mode }) => tree.set_entry(name, *id, *mode),
            DiffNode::Dir { base, entries } => {
                let existing = tree.get(name).cloned();
                let start = match base {
                    DirBase::Existing => match &existing {
                        Some(entry) if entry.is_tree() => store.get_tree(entry.id)?,
                        _ => Tree::empty(),
                    },
                    DirBase::Empty => Tree::empty(),
                    DirBase::Tree(id) => store.get_tree(*id)?,
                };

                let sub_id = apply_to(store, start, entries)?;
                if sub_id != empty_tree_id() {
                    tree.set_entry(name, sub_id, EntryMode::Tree);
                } else {
                    // Only removals landed beneath an untouched file: keep it.
                    let over_file = *base == DirBase::Existing
                        && existing.as_ref().map_or(false, |entry| !entry.is_tree())
                        && only_removals(entries);
                    if !over_file {
                        tree.remove_entry(name);
                    }
                }
            }
        }
    }

    if tree.is_empty() {
        return Ok(empty_tree_id());
    }
    Ok(store.put_tree(&tree)?)
}

fn only_removals(diff: &NestedDiff) -> bool {
    diff.iter().all(|(_, node)| match node {
        DiffNode::Leaf(outcome) => *outcome == Outcome::Tombstone,
        DiffNode::Dir { base, entries } => *base == DirBase::Existing && only_removals(entries),
    })
}
