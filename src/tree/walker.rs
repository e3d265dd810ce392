//! Tree traversal for listings and working-copy indexes

use crate::error::EditError;
use crate::store::ObjectStore;
use crate::tree::lookup;
use crate::tree::node::{Tree, TreeEntry};
use crate::tree::path::PathSegments;
use crate::types::ObjectId;

/// Collect every blob reachable from `tree_id` as (`"dir/file"`, entry)
///
/// Returns entries sorted by path for determinism.
pub fn flatten<S: ObjectStore + ?Sized>(
    store: &S,
    tree_id: ObjectId,
) -> Result<Vec<(String, TreeEntry)>, EditError> {
    let mut files = Vec::new();
    let mut pending: Vec<(String, ObjectId)> = vec![(String::new(), tree_id)];

    while let Some((prefix, id)) = pending.pop() {
        let tree = store.get_tree(id)?;
        for entry in tree.entries() {
            let path = if prefix.is_empty() {
                entry.name.clone()
            } else {
                format!("{}/{}", prefix, entry.name)
            };
            if entry.is_tree() {
                pending.push((path, entry.id));
            } else {
                files.push((path, entry.clone()));
            }
        }
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

/// Load the directory at `path` (the root when `None`)
///
/// Returns `PathNotFound` if the path is missing or names a blob.
pub fn list<S: ObjectStore + ?Sized>(
    store: &S,
    tree_id: ObjectId,
    path: Option<&PathSegments>,
) -> Result<Tree, EditError> {
    let path = match path {
        None => return Ok(store.get_tree(tree_id)?),
        Some(path) => path,
    };

    match lookup::resolve(store, tree_id, path)? {
        Some(entry) if entry.is_tree() => Ok(store.get_tree(entry.id)?),
        _ => Err(EditError::PathNotFound(path.to_path_string())),
    }
}
