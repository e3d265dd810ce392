//! Batched edits
//!
//! An ordered log of [`Operation`]s is replayed into a [`PendingChangeSet`]
//! (one final outcome per path), nested by directory, and applied to a base
//! tree in a single bottom-up pass.

pub mod apply;
pub mod operation;
pub mod simplify;

pub use apply::apply;
pub use operation::Operation;
pub use simplify::{simplify, DiffNode, DirBase, NestedDiff, Outcome, PendingChangeSet, Simplified};
