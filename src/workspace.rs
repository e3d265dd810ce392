//! Workspaces
//!
//! A workspace is a directory with a `.snaptree/` metadata directory holding
//! the object store and config. Published batches are mirrored into the
//! directory itself, and the last published commit id is kept in a marker
//! file at the root.

use crate::config::{workspace_config_path, SnaptreeConfig};
use crate::error::{EditError, WorkspaceError};
use crate::events::TracingObserver;
use crate::session::{marker_temp_path, PublishOutcome, Session};
use crate::store::{Commit, ObjectStore, SledObjectStore};
use crate::tree::node::Tree;
use crate::tree::path::split;
use crate::tree::{lookup, walker};
use crate::types::ObjectId;
use crate::working_copy::{Drift, FsWorkingCopy, METADATA_DIR};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// One entry of a JSON batch file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum BatchOp {
    Write { path: String, text: String },
    Remove { path: String },
    Move { from: String, to: String },
}

/// Parse a JSON array of batch operations
pub fn parse_batch(json: &str) -> Result<Vec<BatchOp>, WorkspaceError> {
    serde_json::from_str(json).map_err(|e| WorkspaceError::InvalidBatch(e.to_string()))
}

pub struct Workspace {
    root: PathBuf,
    config: SnaptreeConfig,
    store: Arc<SledObjectStore>,
}

impl Workspace {
    /// Create `.snaptree/`, a default config and an empty store under `root`
    pub fn init(root: &Path) -> Result<Self, WorkspaceError> {
        Self::init_with(root, SnaptreeConfig::default())
    }

    /// Like [`Workspace::init`], writing `config` as the workspace config
    pub fn init_with(root: &Path, config: SnaptreeConfig) -> Result<Self, WorkspaceError> {
        config.ensure_valid()?;
        fs::create_dir_all(root).map_err(crate::error::StorageError::from)?;
        let metadata = root.join(METADATA_DIR);
        if metadata.exists() {
            return Err(WorkspaceError::AlreadyInitialized(root.to_path_buf()));
        }
        fs::create_dir_all(&metadata).map_err(crate::error::StorageError::from)?;

        let text = toml::to_string_pretty(&config).map_err(|e| {
            WorkspaceError::Config(crate::error::ConfigError::Invalid(format!(
                "Failed to serialize config: {}",
                e
            )))
        })?;
        fs::write(workspace_config_path(root), text).map_err(crate::error::ConfigError::from)?;

        info!(root = %root.display(), "Initialized workspace");
        Self::open(root, config)
    }

    /// Open an initialized workspace with an already loaded configuration
    pub fn open(root: &Path, config: SnaptreeConfig) -> Result<Self, WorkspaceError> {
        if !root.join(METADATA_DIR).is_dir() {
            return Err(WorkspaceError::NotInitialized(root.to_path_buf()));
        }
        config.ensure_valid()?;
        let root = dunce::canonicalize(root).map_err(crate::error::StorageError::from)?;
        let store = SledObjectStore::new(root.join(&config.repository.store_path))?;
        Ok(Self {
            root,
            config,
            store: Arc::new(store),
        })
    }

    /// Nearest directory at or above `start` holding a workspace
    pub fn discover(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .find(|dir| dir.join(METADATA_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &SnaptreeConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<SledObjectStore> {
        &self.store
    }

    pub fn marker_path(&self) -> PathBuf {
        self.root.join(&self.config.repository.marker_file)
    }

    fn working_copy(&self) -> Result<FsWorkingCopy, WorkspaceError> {
        let mut working_copy = FsWorkingCopy::new(&self.root)?;
        let marker = &self.config.repository.marker_file;
        for path in [marker.clone(), marker_temp_path(marker)] {
            if let Some(first) = path.iter().next() {
                working_copy = working_copy.with_ignored(first.to_string_lossy().into_owned());
            }
        }
        Ok(working_copy)
    }

    /// Session on the configured reference, wired to the marker and working copy
    pub fn session(&self) -> Result<Session<SledObjectStore>, WorkspaceError> {
        let mut session = Session::open_reference(self.store.clone(), &self.config.repository.reference)?
            .with_observer(Arc::new(TracingObserver))
            .with_marker(self.marker_path());
        if self.config.repository.update_working_copy {
            session = session.with_working_copy(Box::new(self.working_copy()?));
        }
        Ok(session)
    }

    /// Stage `ops` in a fresh session and publish them as one commit
    pub fn apply_batch(
        &self,
        ops: &[BatchOp],
        subject: Option<&str>,
    ) -> Result<PublishOutcome, WorkspaceError> {
        let author = self.config.identity.signature()?;
        let mut session = self.session()?;
        for op in ops {
            match op {
                BatchOp::Write { path, text } => {
                    session.write_file(path, text.as_bytes())?;
                }
                BatchOp::Remove { path } => {
                    session.remove_file(path)?;
                }
                BatchOp::Move { from, to } => session.move_file(from, to)?,
            }
        }
        Ok(session.publish(&author, subject)?)
    }

    pub fn head(&self) -> Result<Option<ObjectId>, WorkspaceError> {
        Ok(self.store.read_ref(&self.config.repository.reference)?)
    }

    pub fn head_tree(&self) -> Result<ObjectId, WorkspaceError> {
        Ok(self.store.head_tree(&self.config.repository.reference)?)
    }

    /// Contents of the file at `path` in the head tree
    pub fn read_file(&self, path: &str) -> Result<Vec<u8>, WorkspaceError> {
        let segments = split(path)?;
        match lookup::resolve(self.store.as_ref(), self.head_tree()?, &segments)? {
            Some(entry) if !entry.is_tree() => Ok(self.store.get_blob(entry.id)?),
            _ => Err(EditError::PathNotFound(segments.to_path_string()).into()),
        }
    }

    /// Directory listing at `path` (the root when `None`) in the head tree
    pub fn list(&self, path: Option<&str>) -> Result<Tree, WorkspaceError> {
        let segments = path.map(split).transpose()?;
        Ok(walker::list(
            self.store.as_ref(),
            self.head_tree()?,
            segments.as_ref(),
        )?)
    }

    /// Commits reachable from the head, newest first
    pub fn history(&self, limit: usize) -> Result<Vec<(ObjectId, Commit)>, WorkspaceError> {
        let mut commits = Vec::new();
        let mut next = self.head()?;
        while let Some(id) = next {
            if commits.len() >= limit {
                break;
            }
            let commit = self.store.get_commit(id)?;
            next = commit.parents.first().copied();
            commits.push((id, commit));
        }
        Ok(commits)
    }

    /// Differences between the directory and the head tree
    pub fn status(&self) -> Result<Drift, WorkspaceError> {
        Ok(self.working_copy()?.drift(self.store.as_ref(), self.head_tree()?)?)
    }
}
