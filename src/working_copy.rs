//! On-disk working copy
//!
//! A checked-out directory that mirrors the published tree. Publishing replays
//! the committed operations here after the reference moved, then rewrites the
//! index of tracked files kept under the metadata directory.

use crate::error::{EditError, StorageError};
use crate::store::ObjectStore;
use crate::tree::node::{EntryMode, TreeEntry};
use crate::tree::path::PathSegments;
use crate::tree::walker;
use crate::types::ObjectId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Directory holding the object store, config and index inside a workspace
pub const METADATA_DIR: &str = ".snaptree";

const INDEX_FILE: &str = "index.json";

/// Filesystem operations the session replays after publishing
pub trait WorkingCopy {
    /// Create or replace the file at `path`, creating parent directories
    fn write_file(&self, path: &PathSegments, contents: &[u8]) -> Result<(), StorageError>;

    /// Delete the file or directory at `path` and prune emptied parents
    ///
    /// A missing path is not an error.
    fn delete_file(&self, path: &PathSegments) -> Result<(), StorageError>;

    /// Move `from` to `to`, replacing whatever `to` held
    fn rename_file(&self, from: &PathSegments, to: &PathSegments) -> Result<(), StorageError>;

    fn ensure_directory(&self, path: &PathSegments) -> Result<(), StorageError>;

    /// Record the tracked files of the published tree
    fn sync_index(&self, files: &[(String, TreeEntry)]) -> Result<(), StorageError>;
}

/// One tracked file in `index.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub path: String,
    pub id: ObjectId,
    pub mode: EntryMode,
}

/// Differences between a directory on disk and a stored tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Drift {
    /// On disk but not tracked
    pub added: Vec<String>,
    /// Tracked with different content
    pub modified: Vec<String>,
    /// Tracked but missing on disk
    pub deleted: Vec<String>,
}

impl Drift {
    pub fn is_clean(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }
}

/// Working copy rooted at a real directory
#[derive(Debug, Clone)]
pub struct FsWorkingCopy {
    root: PathBuf,
    /// Top-level names never treated as content
    ignored: Vec<String>,
}

impl FsWorkingCopy {
    /// Open the directory at `root`, which must exist
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, StorageError> {
        let root = dunce::canonicalize(root.as_ref()).map_err(|e| {
            StorageError::InvalidPath(format!(
                "Failed to canonicalize {:?}: {}",
                root.as_ref(),
                e
            ))
        })?;
        Ok(Self {
            root,
            ignored: vec![METADATA_DIR.to_string()],
        })
    }

    /// Also skip `name` at the top level (e.g. the last-commit marker)
    pub fn with_ignored(mut self, name: impl Into<String>) -> Self {
        self.ignored.push(name.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(METADATA_DIR).join(INDEX_FILE)
    }

    /// Map tree segments to a location under the root
    fn resolve(&self, path: &PathSegments) -> Result<PathBuf, StorageError> {
        if self.ignored.iter().any(|name| name == path.head()) {
            return Err(StorageError::InvalidPath(format!(
                "{} is reserved in the working copy",
                path
            )));
        }
        let mut target = self.root.clone();
        for segment in path.iter() {
            if segment == "." || segment == ".." || segment.contains('\\') || segment.contains('\0')
            {
                return Err(StorageError::InvalidPath(path.to_path_string()));
            }
            target.push(segment);
        }
        Ok(target)
    }

    /// Remove files standing where parent directories of `target` must go
    fn clear_file_ancestors(&self, target: &Path) -> Result<(), StorageError> {
        let mut ancestors: Vec<&Path> = target
            .ancestors()
            .skip(1)
            .take_while(|ancestor| *ancestor != self.root)
            .collect();
        ancestors.reverse();
        for ancestor in ancestors {
            match fs::symlink_metadata(ancestor) {
                Ok(meta) if !meta.is_dir() => fs::remove_file(ancestor)?,
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => break,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn remove_any(target: &Path) -> Result<bool, StorageError> {
        match fs::symlink_metadata(target) {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(target)?,
            Ok(_) => fs::remove_file(target)?,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            // A file where a parent directory should be also means "absent".
            Err(_) if !target.parent().map_or(false, Path::is_dir) => return Ok(false),
            Err(e) => return Err(e.into()),
        }
        Ok(true)
    }

    /// Remove empty directories from `dir` upward, stopping at the root
    fn prune_empty_parents(&self, mut dir: Option<&Path>) -> Result<(), StorageError> {
        while let Some(current) = dir {
            if current == self.root || !current.starts_with(&self.root) {
                break;
            }
            let empty = match fs::read_dir(current) {
                Ok(mut entries) => entries.next().is_none(),
                Err(e) if e.kind() == ErrorKind::NotFound => false,
                Err(e) => return Err(e.into()),
            };
            if !empty {
                break;
            }
            fs::remove_dir(current)?;
            dir = current.parent();
        }
        Ok(())
    }

    fn relative(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let segments: Vec<String> = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy().into_owned())
            .collect();
        if segments.is_empty() {
            None
        } else {
            Some(segments.join("/"))
        }
    }

    /// Compare the files on disk with the blobs of `tree_id`
    pub fn drift<S: ObjectStore + ?Sized>(
        &self,
        store: &S,
        tree_id: ObjectId,
    ) -> Result<Drift, EditError> {
        let mut tracked: BTreeMap<String, ObjectId> = walker::flatten(store, tree_id)?
            .into_iter()
            .map(|(path, entry)| (path, entry.id))
            .collect();

        let mut drift = Drift::default();
        let walk = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() != 1
                    || !self
                        .ignored
                        .iter()
                        .any(|name| entry.file_name().to_string_lossy() == name.as_str())
            });

        for entry in walk {
            let entry = entry.map_err(|e| StorageError::other("Failed to walk working copy", e))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = match self.relative(entry.path()) {
                Some(path) => path,
                None => continue,
            };
            let contents = fs::read(entry.path()).map_err(StorageError::from)?;
            let on_disk = store.hash_blob(&contents);
            match tracked.remove(&path) {
                None => drift.added.push(path),
                Some(id) if id != on_disk => drift.modified.push(path),
                Some(_) => {}
            }
        }
        drift.deleted = tracked.into_keys().collect();
        Ok(drift)
    }

    /// Read back the index written by the last publish
    pub fn read_index(&self) -> Result<Vec<IndexEntry>, StorageError> {
        let bytes = match fs::read(self.index_path()) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes).map_err(|e| StorageError::other("Invalid index", e))
    }
}

impl WorkingCopy for FsWorkingCopy {
    fn write_file(&self, path: &PathSegments, contents: &[u8]) -> Result<(), StorageError> {
        let target = self.resolve(path)?;
        self.clear_file_ancestors(&target)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        if target.is_dir() {
            fs::remove_dir_all(&target)?;
        }
        fs::write(&target, contents)?;
        debug!(path = %path, bytes = contents.len(), "Wrote working copy file");
        Ok(())
    }

    fn delete_file(&self, path: &PathSegments) -> Result<(), StorageError> {
        let target = self.resolve(path)?;
        if Self::remove_any(&target)? {
            debug!(path = %path, "Deleted working copy entry");
            self.prune_empty_parents(target.parent())?;
        }
        Ok(())
    }

    fn rename_file(&self, from: &PathSegments, to: &PathSegments) -> Result<(), StorageError> {
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;
        if fs::symlink_metadata(&source).is_err() {
            warn!(from = %from, to = %to, "Move source missing from working copy");
            return Ok(());
        }
        if source == target {
            return Ok(());
        }

        if target.starts_with(&source) {
            // Moving an entry beneath itself: park it beside the target first.
            let parked = source.with_extension("snaptree-move");
            fs::rename(&source, &parked)?;
            self.clear_file_ancestors(&target)?;
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::rename(&parked, &target)?;
            return Ok(());
        }

        Self::remove_any(&target)?;
        self.clear_file_ancestors(&target)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(&source, &target)?;
        debug!(from = %from, to = %to, "Renamed working copy entry");
        self.prune_empty_parents(source.parent())
    }

    fn ensure_directory(&self, path: &PathSegments) -> Result<(), StorageError> {
        let target = self.resolve(path)?;
        self.clear_file_ancestors(&target)?;
        if fs::symlink_metadata(&target).map_or(false, |meta| !meta.is_dir()) {
            fs::remove_file(&target)?;
        }
        fs::create_dir_all(target)?;
        Ok(())
    }

    fn sync_index(&self, files: &[(String, TreeEntry)]) -> Result<(), StorageError> {
        let index: Vec<IndexEntry> = files
            .iter()
            .map(|(path, entry)| IndexEntry {
                path: path.clone(),
                id: entry.id,
                mode: entry.mode,
            })
            .collect();
        let json = serde_json::to_vec_pretty(&index)
            .map_err(|e| StorageError::other("Failed to serialize index", e))?;

        let path = self.index_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, &path)?;
        debug!(files = index.len(), "Synced working copy index");
        Ok(())
    }
}
