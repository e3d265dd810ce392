//! Configuration System
//!
//! Hierarchical configuration for workspaces: built-in defaults, a global
//! file, the workspace file and environment overrides, merged with the
//! `config` crate and validated before use.

use crate::error::ConfigError;
use crate::logging::LoggingConfig;
use crate::store::{Signature, DEFAULT_REFERENCE};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;
pub use sources::workspace_file::workspace_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnaptreeConfig {
    #[serde(default)]
    pub repository: RepositoryConfig,

    /// Author identity recorded on published commits
    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where snapshots live and which reference they advance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Object store directory, relative to the workspace root
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    #[serde(default = "default_reference")]
    pub reference: String,

    /// File at the workspace root holding the last published commit id
    #[serde(default = "default_marker_file")]
    pub marker_file: PathBuf,

    /// Mirror published batches into the workspace directory
    #[serde(default = "default_true")]
    pub update_working_copy: bool,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".snaptree/objects")
}

fn default_reference() -> String {
    DEFAULT_REFERENCE.to_string()
}

fn default_marker_file() -> PathBuf {
    PathBuf::from("last_commit")
}

fn default_true() -> bool {
    true
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            reference: default_reference(),
            marker_file: default_marker_file(),
            update_working_copy: default_true(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl IdentityConfig {
    /// Signature stamped now; both name and email must be configured
    pub fn signature(&self) -> Result<Signature, ConfigError> {
        match (&self.name, &self.email) {
            (Some(name), Some(email)) if !name.trim().is_empty() => {
                Ok(Signature::now(name.trim(), email.trim()))
            }
            _ => Err(ConfigError::Invalid(
                "identity.name and identity.email must be set to publish".to_string(),
            )),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Repository(String),
    Identity(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Repository(msg) => write!(f, "Repository: {}", msg),
            ValidationError::Identity(msg) => write!(f, "Identity: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl RepositoryConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.store_path.as_os_str().is_empty() {
            return Err("Store path cannot be empty".to_string());
        }
        if self.marker_file.as_os_str().is_empty() {
            return Err("Marker file cannot be empty".to_string());
        }
        if self.marker_file.is_absolute() {
            return Err("Marker file must be relative to the workspace root".to_string());
        }
        let reference = self.reference.as_str();
        if !reference.starts_with("refs/")
            || reference.ends_with('/')
            || reference.contains("..")
            || reference.chars().any(char::is_whitespace)
        {
            return Err(format!("Invalid reference name: {:?}", reference));
        }
        Ok(())
    }
}

impl SnaptreeConfig {
    /// Validate the entire configuration, collecting every problem
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.repository.validate() {
            errors.push(ValidationError::Repository(e));
        }

        if let Some(email) = &self.identity.email {
            if !email.contains('@') {
                errors.push(ValidationError::Identity(format!(
                    "Invalid email address: {}",
                    email
                )));
            }
        }

        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and fold every problem into one error
    pub fn ensure_valid(&self) -> Result<(), ConfigError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ConfigError::Invalid(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })
    }
}
