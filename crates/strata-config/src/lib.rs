//! Strata Configuration System
//!
//! Loads everything the resolver needs from disk:
//! - Project configuration (strata.toml)
//! - Global user configuration (~/.strata/config.toml)
//! - Module descriptors (`*.module.toml` under the module roots)
//!
//! # Configuration Hierarchy
//!
//! Default build axes are merged in the following order (later overrides earlier):
//! 1. Global config (~/.strata/config.toml)
//! 2. Project config (./strata.toml)
//! 3. Environment variables (STRATA_*)
//! 4. CLI flags
//!
//! # Example
//!
//! ```no_run
//! use strata_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! let store = config.load_store().unwrap();
//! ```

pub mod global;
pub mod loader;
pub mod manifest;
pub mod project;

use std::path::PathBuf;
use strata_build::BuildError;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Invalid module descriptor {file}: {source}")]
    InvalidDescriptor {
        file: PathBuf,
        #[source]
        source: BuildError,
    },

    #[error("Failed to scan module root: {0}")]
    Walk(#[from] walkdir::Error),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("Home directory not found")]
    HomeNotFound,
}

impl ConfigError {
    pub(crate) fn invalid_value(field: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Read a TOML file, mapping a missing file to [`ConfigError::NotFound`]
pub(crate) fn read_toml<T: serde::de::DeserializeOwned>(path: &std::path::Path) -> ConfigResult<T> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound(path.to_path_buf())
        } else {
            ConfigError::IoError(e)
        }
    })?;

    toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
        file: path.to_path_buf(),
        error: e,
    })
}

// Re-export main types
pub use global::GlobalConfig;
pub use loader::{Config, ConfigLoader};
pub use manifest::ModuleManifest;
pub use project::{DefaultsConfig, ProjectConfig, TargetConfig};
