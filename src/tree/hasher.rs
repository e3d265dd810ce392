//! Content identity computation using BLAKE3
//!
//! Every object kind hashes a type discriminator first so a blob can never
//! share an identity with a tree or commit of the same bytes.

use crate::store::object::{Commit, Signature};
use crate::tree::node::Tree;
use crate::types::ObjectId;
use blake3::Hasher;
use std::sync::OnceLock;

/// Compute the identity of file content
///
/// BlobID = hash("blob" || len || content)
///
/// Pure: used to detect no-op writes before a blob is stored.
pub fn compute_blob_id(content: &[u8]) -> ObjectId {
    let mut hasher = Hasher::new();

    hasher.update(b"blob");
    hasher.update(&(content.len() as u64).to_be_bytes());
    hasher.update(content);

    ObjectId::from_bytes(*hasher.finalize().as_bytes())
}

/// Compute the identity of a tree
///
/// TreeID = hash("tree" || entry_count || entries)
///
/// Entries are visited in name order, each as mode tag, name length, name and
/// child id, so the result depends only on the final contents.
pub fn compute_tree_id(tree: &Tree) -> ObjectId {
    let mut hasher = Hasher::new();

    hasher.update(b"tree");
    hasher.update(&(tree.len() as u64).to_be_bytes());

    for entry in tree.entries() {
        hasher.update(&[entry.mode.tag()]);
        hasher.update(&(entry.name.len() as u64).to_be_bytes());
        hasher.update(entry.name.as_bytes());
        hasher.update(entry.id.as_bytes());
    }

    ObjectId::from_bytes(*hasher.finalize().as_bytes())
}

/// Compute the identity of a commit
///
/// CommitID = hash("commit" || tree || parent_count || parents || author || committer || message)
pub fn compute_commit_id(commit: &Commit) -> ObjectId {
    let mut hasher = Hasher::new();

    hasher.update(b"commit");
    hasher.update(commit.tree.as_bytes());

    hasher.update(&(commit.parents.len() as u64).to_be_bytes());
    for parent in &commit.parents {
        hasher.update(parent.as_bytes());
    }

    hash_signature(&mut hasher, b"author:", &commit.author);
    hash_signature(&mut hasher, b"committer:", &commit.committer);

    hasher.update(b"message:");
    hasher.update(&(commit.message.len() as u64).to_be_bytes());
    hasher.update(commit.message.as_bytes());

    ObjectId::from_bytes(*hasher.finalize().as_bytes())
}

fn hash_signature(hasher: &mut Hasher, label: &[u8], signature: &Signature) {
    hasher.update(label);
    hasher.update(&(signature.name.len() as u64).to_be_bytes());
    hasher.update(signature.name.as_bytes());
    hasher.update(&(signature.email.len() as u64).to_be_bytes());
    hasher.update(signature.email.as_bytes());
    hasher.update(&signature.timestamp.to_be_bytes());
    hasher.update(&signature.offset_minutes.to_be_bytes());
}

/// The well-known identity of the tree with no entries
pub fn empty_tree_id() -> ObjectId {
    static EMPTY: OnceLock<ObjectId> = OnceLock::new();
    *EMPTY.get_or_init(|| compute_tree_id(&Tree::empty()))
}
