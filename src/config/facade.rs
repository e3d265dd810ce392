//! Layered configuration loading

use super::merge::merge_policy;
use super::sources::{global_file, workspace_file};
use super::SnaptreeConfig;
use crate::error::ConfigError;
use config::File;
use std::path::Path;
use tracing::debug;

/// Loads [`SnaptreeConfig`] from defaults, files and the environment
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for the workspace at `workspace_root`
    ///
    /// Precedence (lowest to highest): built-in defaults, the global file,
    /// `<root>/.snaptree/config.toml`, `SNAPTREE_*` environment variables.
    pub fn load(workspace_root: &Path) -> Result<SnaptreeConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let config: SnaptreeConfig = builder
            .add_source(merge_policy::environment())
            .build()?
            .try_deserialize()?;
        debug!(workspace = %workspace_root.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load configuration from one explicit file on top of the defaults
    pub fn load_from_file(path: &Path) -> Result<SnaptreeConfig, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::Invalid(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }
        let config = merge_policy::builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Built-in defaults only
    pub fn default() -> SnaptreeConfig {
        SnaptreeConfig::default()
    }
}
