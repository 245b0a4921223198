//! Global Configuration (~/.strata/config.toml)
//!
//! Handles user-level configuration stored in `~/.strata/config.toml`.

use crate::project::DefaultsConfig;
use crate::{read_toml, ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global user configuration from ~/.strata/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Default build axes, overridden by the project
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Output preferences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
}

/// Output preferences
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Default output format ("text" or "json")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Colorize text output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,
}

impl GlobalConfig {
    /// Load global configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let config: Self = read_toml(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the global configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(defaults) = &self.defaults {
            defaults.validate("defaults")?;
        }

        if let Some(format) = self.output.as_ref().and_then(|o| o.format.as_deref()) {
            if !matches!(format, "text" | "json") {
                return Err(ConfigError::invalid_value(
                    "output.format",
                    format!("must be 'text' or 'json', got '{}'", format),
                ));
            }
        }

        Ok(())
    }

    /// Path of the global configuration file
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".strata").join("config.toml"))
    }

    /// Preferred output format, if configured
    pub fn output_format(&self) -> Option<&str> {
        self.output.as_ref().and_then(|o| o.format.as_deref())
    }

    /// Whether text output should be colorized (default: true)
    pub fn color(&self) -> bool {
        self.output.as_ref().and_then(|o| o.color).unwrap_or(true)
    }
}
