//! Resolving paths against stored trees

use crate::error::EditError;
use crate::store::ObjectStore;
use crate::tree::node::{Tree, TreeEntry};
use crate::tree::path::PathSegments;
use crate::types::ObjectId;

/// Resolve `path` inside the tree identified by `tree_id`
///
/// Returns `None` when any intermediate segment is missing or is not a tree.
pub fn resolve<S: ObjectStore + ?Sized>(
    store: &S,
    tree_id: ObjectId,
    path: &PathSegments,
) -> Result<Option<TreeEntry>, EditError> {
    let tree = store.get_tree(tree_id)?;
    resolve_in(store, &tree, path)
}

/// Resolve `path` inside an already loaded tree
pub fn resolve_in<S: ObjectStore + ?Sized>(
    store: &S,
    tree: &Tree,
    path: &PathSegments,
) -> Result<Option<TreeEntry>, EditError> {
    let entry = match tree.get(path.head()) {
        Some(entry) => entry,
        None => return Ok(None),
    };

    match path.tail() {
        None => Ok(Some(entry.clone())),
        Some(rest) => {
            if !entry.is_tree() {
                return Ok(None);
            }
            let sub_tree = store.get_tree(entry.id)?;
            resolve_in(store, &sub_tree, &rest)
        }
    }
}
