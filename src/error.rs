//! Error types for snapshot editing, object storage and setup.

use crate::store::object::ObjectKind;
use crate::types::ObjectId;
use thiserror::Error;

/// Object store and filesystem collaborator errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    ObjectNotFound(ObjectId),

    #[error("Object {id} is not a {expected}")]
    WrongObjectKind { id: ObjectId, expected: ObjectKind },

    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: ObjectId, actual: ObjectId },

    #[error("Reference {name} moved: expected {expected:?}, found {actual:?}")]
    RefConflict {
        name: String,
        expected: Option<ObjectId>,
        actual: Option<ObjectId>,
    },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StorageError {
    /// Wrap a foreign error (sled, bincode, walkdir) as an I/O error with context
    pub(crate) fn other(context: &str, err: impl std::fmt::Display) -> Self {
        StorageError::IoError(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("{}: {}", context, err),
        ))
    }
}

/// Errors raised while staging, simplifying, applying or publishing edits
#[derive(Debug, Error)]
pub enum EditError {
    #[error("Invalid path: {0:?}")]
    InvalidPath(String),

    #[error("Path not found in tree: {0}")]
    PathNotFound(String),

    #[error("Cannot move {from} -> {to}: source was deleted earlier in this batch")]
    MoveOfDeletedPath { from: String, to: String },

    #[error("Cannot move {from} -> {to}: source does not exist")]
    MoveOfMissingPath { from: String, to: String },

    #[error("Path collision: {file} is staged as a file but {nested} is staged beneath it")]
    PathCollision { file: String, nested: String },

    #[error("Repository head moved since the session started (expected tree {expected}, found {actual})")]
    ConcurrentModification { expected: ObjectId, actual: ObjectId },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Commit published but working copy update failed: {0}")]
    WorkingCopy(#[source] StorageError),
}

/// Configuration and logging setup errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Invalid(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Configuration I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while opening or operating a workspace
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("No snaptree workspace at {0} (run `snaptree init`)")]
    NotInitialized(std::path::PathBuf),

    #[error("Workspace already initialized at {0}")]
    AlreadyInitialized(std::path::PathBuf),

    #[error("Invalid batch: {0}")]
    InvalidBatch(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Edit(#[from] EditError),
}
