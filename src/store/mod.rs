//! Object store
//!
//! Content-addressable storage for blobs, trees and commits plus named
//! references. Tree editing never mutates stored objects: callers compose a
//! new [`Tree`] value and persist it with [`ObjectStore::put_tree`].

pub mod memory;
pub mod object;
pub mod persistence;

pub use memory::MemoryObjectStore;
pub use object::{Commit, Object, ObjectKind, Signature};
pub use persistence::SledObjectStore;

use crate::error::StorageError;
use crate::tree::hasher;
use crate::tree::node::Tree;
use crate::types::ObjectId;

/// Default reference advanced by publishing sessions
pub const DEFAULT_REFERENCE: &str = "refs/heads/master";

/// Object store interface
///
/// `get_tree` must resolve the empty-tree identity even if it was never written.
pub trait ObjectStore: Send + Sync {
    /// Raw object access; `Ok(None)` when the id is unknown
    fn get_object(&self, id: &ObjectId) -> Result<Option<Object>, StorageError>;

    /// Store an object under its content identity (idempotent)
    fn put_object(&self, object: &Object) -> Result<ObjectId, StorageError>;

    /// Current target of a reference, `None` while it is unborn
    fn read_ref(&self, name: &str) -> Result<Option<ObjectId>, StorageError>;

    /// Point `name` at `new` if it still points at `expected`
    ///
    /// Fails with `RefConflict` when the reference moved in between.
    fn update_ref(
        &self,
        name: &str,
        expected: Option<ObjectId>,
        new: ObjectId,
    ) -> Result<(), StorageError>;

    /// Identity `data` would have as a blob, without storing it
    fn hash_blob(&self, data: &[u8]) -> ObjectId {
        hasher::compute_blob_id(data)
    }

    fn put_blob(&self, data: &[u8]) -> Result<ObjectId, StorageError> {
        self.put_object(&Object::Blob(data.to_vec()))
    }

    fn get_blob(&self, id: ObjectId) -> Result<Vec<u8>, StorageError> {
        match self.get_object(&id)? {
            Some(Object::Blob(data)) => Ok(data),
            Some(_) => Err(StorageError::WrongObjectKind {
                id,
                expected: ObjectKind::Blob,
            }),
            None => Err(StorageError::ObjectNotFound(id)),
        }
    }

    fn put_tree(&self, tree: &Tree) -> Result<ObjectId, StorageError> {
        self.put_object(&Object::Tree(tree.clone()))
    }

    fn get_tree(&self, id: ObjectId) -> Result<Tree, StorageError> {
        if id == hasher::empty_tree_id() {
            return Ok(Tree::empty());
        }
        match self.get_object(&id)? {
            Some(Object::Tree(tree)) => Ok(tree),
            Some(_) => Err(StorageError::WrongObjectKind {
                id,
                expected: ObjectKind::Tree,
            }),
            None => Err(StorageError::ObjectNotFound(id)),
        }
    }

    fn put_commit(&self, commit: &Commit) -> Result<ObjectId, StorageError> {
        self.put_object(&Object::Commit(commit.clone()))
    }

    fn get_commit(&self, id: ObjectId) -> Result<Commit, StorageError> {
        match self.get_object(&id)? {
            Some(Object::Commit(commit)) => Ok(commit),
            Some(_) => Err(StorageError::WrongObjectKind {
                id,
                expected: ObjectKind::Commit,
            }),
            None => Err(StorageError::ObjectNotFound(id)),
        }
    }

    /// Tree of the commit `name` points at; the empty tree while unborn
    fn head_tree(&self, name: &str) -> Result<ObjectId, StorageError> {
        match self.read_ref(name)? {
            Some(commit_id) => Ok(self.get_commit(commit_id)?.tree),
            None => Ok(hasher::empty_tree_id()),
        }
    }
}
