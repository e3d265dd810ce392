//! CLI route: single route table and run context.

use crate::cli::parse::Commands;
use crate::cli::presentation;
use crate::config::{ConfigLoader, SnaptreeConfig};
use crate::error::WorkspaceError;
use crate::workspace::{parse_batch, Workspace};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Runtime context for CLI execution: workspace root and loaded config.
pub struct RunContext {
    workspace_root: PathBuf,
    config: SnaptreeConfig,
}

impl RunContext {
    /// Build from the `--workspace` and `--config` flags.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, WorkspaceError> {
        let workspace_root = Workspace::discover(&workspace_root).unwrap_or(workspace_root);
        let config = match config_path {
            Some(path) => ConfigLoader::load_from_file(&path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        debug!(workspace = %workspace_root.display(), "Run context ready");
        Ok(Self {
            workspace_root,
            config,
        })
    }

    pub fn config(&self) -> &SnaptreeConfig {
        &self.config
    }

    fn open(&self) -> Result<Workspace, WorkspaceError> {
        Workspace::open(&self.workspace_root, self.config.clone())
    }

    /// Run one command and return what should be printed on stdout.
    pub fn execute(&self, command: &Commands) -> Result<String, WorkspaceError> {
        match command {
            Commands::Init => {
                let workspace = Workspace::init(&self.workspace_root)?;
                Ok(format!(
                    "Initialized empty snaptree workspace in {}",
                    workspace.root().display()
                ))
            }
            Commands::Apply { batch, message } => {
                let text = fs::read_to_string(batch).map_err(|e| {
                    WorkspaceError::InvalidBatch(format!("{}: {}", batch.display(), e))
                })?;
                let ops = parse_batch(&text)?;
                let workspace = self.open()?;
                let outcome = workspace.apply_batch(&ops, message.as_deref())?;
                Ok(presentation::format_publish_outcome(&outcome, ops.len()))
            }
            Commands::Show { path } => {
                let workspace = self.open()?;
                let contents = workspace.read_file(path)?;
                Ok(String::from_utf8_lossy(&contents).into_owned())
            }
            Commands::Ls { path } => {
                let workspace = self.open()?;
                let tree = workspace.list(path.as_deref())?;
                Ok(presentation::format_listing(&tree))
            }
            Commands::Log { limit } => {
                let workspace = self.open()?;
                let commits = workspace.history(*limit)?;
                Ok(presentation::format_log(&commits))
            }
            Commands::Status => {
                let workspace = self.open()?;
                let head = workspace.head()?;
                let drift = workspace.status()?;
                Ok(presentation::format_status(head, &drift))
            }
        }
    }
}
