//! Single-change tree edits
//!
//! Each primitive takes the id of an existing tree and returns the id of a new
//! tree. Every directory on the edited path is rebuilt bottom-up and written
//! to the store; the input tree is never modified.

use crate::error::EditError;
use crate::events::{EditEvent, EditObserver};
use crate::store::ObjectStore;
use crate::tree::hasher::empty_tree_id;
use crate::tree::lookup;
use crate::tree::node::{EntryMode, Tree};
use crate::tree::path::PathSegments;
use crate::types::ObjectId;
use tracing::{debug, instrument};

/// Insert `(id, mode)` at `path`, creating intermediate directories
///
/// An existing entry at `path` is replaced, whatever its mode. An intermediate
/// segment that currently names a blob is replaced by a new directory.
#[instrument(skip_all, fields(path = %path))]
pub fn insert<S: ObjectStore + ?Sized>(
    store: &S,
    tree_id: ObjectId,
    path: &PathSegments,
    id: ObjectId,
    mode: EntryMode,
) -> Result<ObjectId, EditError> {
    let tree = store.get_tree(tree_id)?;
    insert_into(store, &tree, path, id, mode)
}

fn insert_into<S: ObjectStore + ?Sized>(
    store: &S,
    tree: &Tree,
    path: &PathSegments,
    id: ObjectId,
    mode: EntryMode,
) -> Result<ObjectId, EditError> {
    let name = path.head();
    let updated = match path.tail() {
        None => tree.with_entry(name, id, mode),
        Some(rest) => {
            let sub_tree = match tree.get(name) {
                Some(entry) if entry.is_tree() => store.get_tree(entry.id)?,
                _ => Tree::empty(),
            };
            let sub_id = insert_into(store, &sub_tree, &rest, id, mode)?;
            tree.with_entry(name, sub_id, EntryMode::Tree)
        }
    };
    Ok(store.put_tree(&updated)?)
}

/// Remove the entry at `path`; a missing path leaves the tree unchanged
///
/// Directories emptied by the removal are dropped from their parent.
#[instrument(skip_all, fields(path = %path))]
pub fn remove<S: ObjectStore + ?Sized>(
    store: &S,
    tree_id: ObjectId,
    path: &PathSegments,
) -> Result<ObjectId, EditError> {
    let tree = store.get_tree(tree_id)?;
    remove_from(store, &tree, tree_id, path)
}

fn remove_from<S: ObjectStore + ?Sized>(
    store: &S,
    tree: &Tree,
    tree_id: ObjectId,
    path: &PathSegments,
) -> Result<ObjectId, EditError> {
    let name = path.head();
    let updated = match path.tail() {
        None => {
            if !tree.contains(name) {
                return Ok(tree_id);
            }
            tree.without_entry(name)
        }
        Some(rest) => {
            let entry = match tree.get(name) {
                Some(entry) if entry.is_tree() => entry,
                _ => return Ok(tree_id),
            };
            let sub_tree = store.get_tree(entry.id)?;
            let sub_id = remove_from(store, &sub_tree, entry.id, &rest)?;
            if sub_id == entry.id {
                return Ok(tree_id);
            }
            if sub_id == empty_tree_id() {
                tree.without_entry(name)
            } else {
                tree.with_entry(name, sub_id, EntryMode::Tree)
            }
        }
    };
    Ok(store.put_tree(&updated)?)
}

/// Move the entry at `old` to `new`, overwriting anything at `new`
///
/// Fails with `PathNotFound` if `old` does not resolve. Emits
/// [`EditEvent::Moved`] to `observer` once the move is applied.
#[instrument(skip_all, fields(old = %old, new = %new))]
pub fn move_entry<S: ObjectStore + ?Sized>(
    store: &S,
    tree_id: ObjectId,
    old: &PathSegments,
    new: &PathSegments,
    observer: &dyn EditObserver,
) -> Result<ObjectId, EditError> {
    let entry = lookup::resolve(store, tree_id, old)?
        .ok_or_else(|| EditError::PathNotFound(old.to_path_string()))?;

    let without_old = remove(store, tree_id, old)?;
    let result = insert(store, without_old, new, entry.id, entry.mode)?;

    debug!(tree = %result.short(), "Moved entry");
    observer.notify(&EditEvent::Moved {
        from: old.to_path_string(),
        to: new.to_path_string(),
    });
    Ok(result)
}
