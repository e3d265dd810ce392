//! Merge rules: defaults first, every later source overrides earlier ones.

use crate::store::DEFAULT_REFERENCE;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment};

/// Create a Config builder with the built-in defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("repository.store_path", ".snaptree/objects")?
        .set_default("repository.reference", DEFAULT_REFERENCE)?
        .set_default("repository.marker_file", "last_commit")?
        .set_default("repository.update_working_copy", true)
}

/// Environment overrides: `SNAPTREE_REPOSITORY__REFERENCE=refs/heads/main`
pub fn environment() -> Environment {
    Environment::with_prefix("SNAPTREE")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
