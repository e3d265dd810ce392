//! Content-addressed trees
//!
//! A tree is an immutable, hash-identified directory listing. Editing a tree
//! produces new tree identities for every directory on the changed path.

pub mod editor;
pub mod hasher;
pub mod lookup;
pub mod node;
pub mod path;
pub mod walker;

pub use node::{EntryMode, Tree, TreeEntry};
pub use path::{split, PathSegments};
