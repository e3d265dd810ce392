//! Edit sessions
//!
//! A [`Session`] captures the head tree of a reference, collects staged
//! operations, and publishes them as one commit. Sessions are plain values:
//! any number of them may target the same store, and the reference only
//! advances for the first one to publish against a given head.

use crate::changeset::{self, Operation};
use crate::error::{EditError, StorageError};
use crate::events::{EditEvent, EditObserver, NullObserver};
use crate::store::{Commit, ObjectStore, Signature, DEFAULT_REFERENCE};
use crate::tree::node::EntryMode;
use crate::tree::path::{split, PathSegments};
use crate::tree::{lookup, walker};
use crate::types::ObjectId;
use crate::working_copy::WorkingCopy;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing staged
    Clean,
    /// Operations waiting to be published
    Staged,
    /// The last publish found the head moved; discard to recover
    Conflict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// A new commit was written and the reference advanced
    Committed { commit: ObjectId, tree: ObjectId },
    /// The batch left the tree as it was; no commit was created
    Unchanged,
}

pub struct Session<S: ObjectStore> {
    store: Arc<S>,
    reference: String,
    base_tree: ObjectId,
    operations: Vec<Operation>,
    observer: Arc<dyn EditObserver>,
    working_copy: Option<Box<dyn WorkingCopy>>,
    marker: Option<PathBuf>,
    conflicted: bool,
}

impl<S: ObjectStore> Session<S> {
    /// Start a session on the default reference
    pub fn open(store: Arc<S>) -> Result<Self, EditError> {
        Self::open_reference(store, DEFAULT_REFERENCE)
    }

    /// Start a session on `reference`, capturing its current head tree
    pub fn open_reference(store: Arc<S>, reference: &str) -> Result<Self, EditError> {
        let base_tree = store.head_tree(reference)?;
        debug!(reference, base = %base_tree.short(), "Opened session");
        Ok(Self {
            store,
            reference: reference.to_string(),
            base_tree,
            operations: Vec::new(),
            observer: Arc::new(NullObserver),
            working_copy: None,
            marker: None,
            conflicted: false,
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn EditObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Mirror published batches into `working_copy`
    pub fn with_working_copy(mut self, working_copy: Box<dyn WorkingCopy>) -> Self {
        self.working_copy = Some(working_copy);
        self
    }

    /// Record every published commit id in the file at `path`
    pub fn with_marker(mut self, path: impl Into<PathBuf>) -> Self {
        self.marker = Some(path.into());
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Tree the staged operations apply to
    pub fn base_tree(&self) -> ObjectId {
        self.base_tree
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn state(&self) -> SessionState {
        if self.conflicted {
            SessionState::Conflict
        } else if self.operations.is_empty() {
            SessionState::Clean
        } else {
            SessionState::Staged
        }
    }

    /// Append an operation to the log; nothing is checked until publish
    pub fn stage(&mut self, op: Operation) {
        self.observer.notify(&EditEvent::Staged {
            operation: op.to_string(),
        });
        self.operations.push(op);
    }

    /// Stage `contents` at `path`, skipping writes that would change nothing
    ///
    /// Returns `false` when the base tree already holds identical content and
    /// no staged operation touches the path.
    pub fn write_file(&mut self, path: &str, contents: &[u8]) -> Result<bool, EditError> {
        let segments = split(path)?;
        let id = self.store.hash_blob(contents);

        let touched = self.operations.iter().any(|op| op.touches(&segments));
        if !touched {
            if let Some(entry) = lookup::resolve(self.store.as_ref(), self.base_tree, &segments)? {
                if entry.mode == EntryMode::Blob && entry.id == id {
                    debug!(path, "Content unchanged, not staging");
                    return Ok(false);
                }
            }
        }

        let stored = self.store.put_blob(contents)?;
        self.stage(Operation::Insert {
            path: segments,
            id: stored,
        });
        Ok(true)
    }

    /// Stage a removal if `path` exists or is touched by a staged operation
    pub fn remove_file(&mut self, path: &str) -> Result<bool, EditError> {
        let segments = split(path)?;
        let touched = self.operations.iter().any(|op| op.touches(&segments));
        if !touched && lookup::resolve(self.store.as_ref(), self.base_tree, &segments)?.is_none() {
            debug!(path, "Nothing to remove");
            return Ok(false);
        }
        self.stage(Operation::Remove { path: segments });
        Ok(true)
    }

    pub fn move_file(&mut self, from: &str, to: &str) -> Result<(), EditError> {
        let op = Operation::moved(from, to)?;
        self.stage(op);
        Ok(())
    }

    /// Publish the staged batch as a single commit
    ///
    /// Fails with `ConcurrentModification` when the reference no longer points
    /// at the tree this session started from; the log is kept so the caller can
    /// inspect it before discarding.
    #[instrument(skip_all, fields(reference = %self.reference, operations = self.operations.len()))]
    pub fn publish(
        &mut self,
        author: &Signature,
        subject: Option<&str>,
    ) -> Result<PublishOutcome, EditError> {
        let head_commit = self.store.read_ref(&self.reference)?;
        let head_tree = self.store.head_tree(&self.reference)?;
        if head_tree != self.base_tree {
            return Err(self.conflict(head_tree));
        }

        let simplified = changeset::simplify(self.store.as_ref(), self.base_tree, &self.operations)?;
        let nested = simplified.changes.nest()?;
        let new_tree = changeset::apply(self.store.as_ref(), self.base_tree, &nested)?;

        if new_tree == self.base_tree {
            let operations = self.operations.len();
            self.operations.clear();
            self.conflicted = false;
            info!(tree = %new_tree.short(), "Batch produced no changes");
            self.observer.notify(&EditEvent::Unchanged {
                tree: new_tree,
                operations,
            });
            return Ok(PublishOutcome::Unchanged);
        }

        let message = commit_message(subject, &simplified.summaries);
        let commit = Commit {
            tree: new_tree,
            parents: head_commit.into_iter().collect(),
            author: author.clone(),
            committer: author.clone(),
            message,
        };
        let commit_id = self.store.put_commit(&commit)?;

        match self.store.update_ref(&self.reference, head_commit, commit_id) {
            Ok(()) => {}
            Err(StorageError::RefConflict { .. }) => {
                let actual = self.store.head_tree(&self.reference)?;
                return Err(self.conflict(actual));
            }
            Err(e) => return Err(e.into()),
        }

        // The reference has moved: the session follows it even if the
        // local files below cannot be updated.
        let operations = std::mem::take(&mut self.operations);
        self.base_tree = new_tree;
        self.conflicted = false;

        info!(commit = %commit_id.short(), tree = %new_tree.short(), "Published commit");
        self.observer.notify(&EditEvent::Published {
            commit: commit_id,
            tree: new_tree,
            operations: operations.len(),
        });

        let marker = match &self.marker {
            Some(marker) => write_marker(marker, commit_id),
            None => Ok(()),
        };
        self.sync_working_copy(&operations, new_tree)?;
        marker.map_err(EditError::WorkingCopy)?;
        Ok(PublishOutcome::Committed {
            commit: commit_id,
            tree: new_tree,
        })
    }

    /// Drop staged operations and rebase onto the current head
    pub fn discard(&mut self) -> Result<(), EditError> {
        let operations = self.operations.len();
        self.operations.clear();
        self.base_tree = self.store.head_tree(&self.reference)?;
        self.conflicted = false;
        self.observer.notify(&EditEvent::Discarded { operations });
        Ok(())
    }

    fn conflict(&mut self, actual: ObjectId) -> EditError {
        warn!(
            expected = %self.base_tree.short(),
            actual = %actual.short(),
            "Head moved since session started"
        );
        self.conflicted = true;
        self.observer.notify(&EditEvent::Conflict {
            expected: self.base_tree,
            actual,
        });
        EditError::ConcurrentModification {
            expected: self.base_tree,
            actual,
        }
    }

    /// Replay a published batch onto the working copy, then refresh its index
    fn sync_working_copy(&self, operations: &[Operation], tree: ObjectId) -> Result<(), EditError> {
        let working_copy = match &self.working_copy {
            Some(working_copy) => working_copy,
            None => return Ok(()),
        };

        let ensure_parent = |path: &PathSegments| match path.parent() {
            Some(parent) => working_copy.ensure_directory(&parent),
            None => Ok(()),
        };
        for op in operations {
            let result = match op {
                Operation::Insert { path, id } => ensure_parent(path)
                    .and_then(|()| self.store.get_blob(*id))
                    .and_then(|contents| working_copy.write_file(path, &contents)),
                Operation::Remove { path } => working_copy.delete_file(path),
                // The parent of a destination beneath the source is the source itself.
                Operation::Move { from, to } if from.is_ancestor_of(to) => {
                    working_copy.rename_file(from, to)
                }
                Operation::Move { from, to } => {
                    ensure_parent(to).and_then(|()| working_copy.rename_file(from, to))
                }
            };
            result.map_err(EditError::WorkingCopy)?;
        }

        let files = walker::flatten(self.store.as_ref(), tree)?;
        working_copy
            .sync_index(&files)
            .map_err(EditError::WorkingCopy)?;
        debug!(files = files.len(), "Working copy synced");
        Ok(())
    }
}

/// Optional subject, a blank line, then one summary line per operation
fn commit_message(subject: Option<&str>, summaries: &[String]) -> String {
    let body = summaries.join("\n");
    match subject {
        Some(subject) if !subject.trim().is_empty() => format!("{}\n\n{}", subject.trim(), body),
        _ => body,
    }
}

/// Scratch file a marker is written to before being renamed into place
pub fn marker_temp_path(path: &Path) -> PathBuf {
    path.with_extension("tmp")
}

/// Atomically replace the marker file with the hex id of `commit`
pub fn write_marker(path: &Path, commit: ObjectId) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let temp_path = marker_temp_path(path);
    fs::write(&temp_path, format!("{}\n", commit.to_hex()))?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

/// Commit id recorded in the marker file, if one was written
pub fn read_marker(path: &Path) -> Result<Option<ObjectId>, StorageError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    ObjectId::from_hex(&text)
        .map(Some)
        .map_err(|e| StorageError::other("Invalid marker file", e))
}
