//! Workspace config file source: <root>/.snaptree/config.toml

use crate::working_copy::METADATA_DIR;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::{Path, PathBuf};

pub fn workspace_config_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(METADATA_DIR).join("config.toml")
}

/// Add the workspace config file to the builder.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let path = workspace_config_path(workspace_root);
    if !path.exists() {
        return Ok(builder);
    }
    Ok(builder.add_source(File::from(path.as_path()).required(false)))
}
