//! Snaptree: batched edits on content-addressed tree snapshots
//!
//! Trees are immutable, hash-identified directory listings stored in an
//! object store. A [`session::Session`] stages insert, remove and move
//! operations against the head tree of a reference, collapses them into one
//! change set, rebuilds every touched directory once and publishes the
//! result as a new commit.

pub mod changeset;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod session;
pub mod store;
pub mod tree;
pub mod types;
pub mod working_copy;
pub mod workspace;

pub use changeset::Operation;
pub use error::{ConfigError, EditError, StorageError, WorkspaceError};
pub use session::{PublishOutcome, Session, SessionState};
pub use store::{MemoryObjectStore, ObjectStore, Signature, SledObjectStore};
pub use types::ObjectId;
