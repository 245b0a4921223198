//! Project Configuration (strata.toml)
//!
//! Handles project-level configuration stored in `strata.toml` at the project root.

use crate::{read_toml, ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strata_build::{name_key, Configuration, Platform, TargetDeclaration, TargetType};

/// Project configuration from strata.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Project metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectInfo>,

    /// Where module descriptors live
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modules: Option<ModulesConfig>,

    /// Default build axes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Target declarations
    #[serde(default, rename = "target")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<TargetConfig>,
}

/// Project metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProjectInfo {
    /// Project name
    pub name: String,

    /// Project description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Module descriptor discovery settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ModulesConfig {
    /// Directories scanned for `*.module.toml`, relative to the project root
    /// (default: the project root itself)
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub roots: Vec<PathBuf>,
}

/// Default build axes, shared by project and global configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct DefaultsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,

    /// Toggles enabled by default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toggles: Option<Vec<String>>,
}

impl DefaultsConfig {
    /// Validate every axis value that is set
    pub fn validate(&self, section: &str) -> ConfigResult<()> {
        self.platform(section)?;
        self.configuration(section)?;
        self.target_type(section)?;
        Ok(())
    }

    pub fn platform(&self, section: &str) -> ConfigResult<Option<Platform>> {
        parse_axis(self.platform.as_deref(), section, "platform")
    }

    pub fn configuration(&self, section: &str) -> ConfigResult<Option<Configuration>> {
        parse_axis(self.configuration.as_deref(), section, "configuration")
    }

    pub fn target_type(&self, section: &str) -> ConfigResult<Option<TargetType>> {
        parse_axis(self.target_type.as_deref(), section, "target_type")
    }

    /// Overlay the fields `other` sets
    pub fn merge(&mut self, other: &DefaultsConfig) {
        if other.platform.is_some() {
            self.platform = other.platform.clone();
        }
        if other.configuration.is_some() {
            self.configuration = other.configuration.clone();
        }
        if other.target_type.is_some() {
            self.target_type = other.target_type.clone();
        }
        if other.toggles.is_some() {
            self.toggles = other.toggles.clone();
        }
    }
}

fn parse_axis<T>(value: Option<&str>, section: &str, field: &str) -> ConfigResult<Option<T>>
where
    T: std::str::FromStr,
    T::Err: ToString,
{
    value
        .map(|v| {
            v.parse::<T>()
                .map_err(|e| ConfigError::invalid_value(format!("{}.{}", section, field), e))
        })
        .transpose()
}

/// A `[[target]]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Target name
    pub name: String,

    /// Target type (Game, Editor, Client, Server, Program)
    #[serde(rename = "type")]
    pub target_type: String,

    /// Entry modules
    pub modules: Vec<String>,

    /// Extra global definitions
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub definitions: Vec<String>,

    /// Toggles enabled for this target
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub toggles: Vec<String>,
}

impl TargetConfig {
    /// Convert to a resolver target declaration
    pub fn to_declaration(&self) -> ConfigResult<TargetDeclaration> {
        let target_type = self
            .target_type
            .parse::<TargetType>()
            .map_err(|e| ConfigError::invalid_value(format!("target.{}.type", self.name), e))?;

        let mut declaration = TargetDeclaration::new(&self.name, target_type)
            .with_modules(self.modules.clone());
        for definition in &self.definitions {
            declaration = declaration.with_definition(definition);
        }
        for toggle in &self.toggles {
            declaration = declaration.with_toggle(toggle);
        }

        declaration
            .validate()
            .map_err(|reason| ConfigError::invalid_value(format!("target.{}", self.name), reason))?;
        Ok(declaration)
    }
}

impl ProjectConfig {
    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let config: Self = read_toml(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(project) = &self.project {
            if project.name.trim().is_empty() {
                return Err(ConfigError::invalid_value(
                    "project.name",
                    "name cannot be empty",
                ));
            }
        }

        if let Some(modules) = &self.modules {
            if let Some(root) = modules.roots.iter().find(|r| r.is_absolute()) {
                return Err(ConfigError::invalid_value(
                    "modules.roots",
                    format!("'{}' must be relative to the project root", root.display()),
                ));
            }
        }

        if let Some(defaults) = &self.defaults {
            defaults.validate("defaults")?;
        }

        let mut seen = std::collections::HashSet::new();
        for target in &self.targets {
            target.to_declaration()?;
            if !seen.insert(name_key(&target.name)) {
                return Err(ConfigError::invalid_value(
                    "target",
                    format!("target '{}' is declared more than once", target.name),
                ));
            }
        }

        Ok(())
    }

    /// Get the project name, if present
    pub fn project_name(&self) -> Option<&str> {
        self.project.as_ref().map(|p| p.name.as_str())
    }

    /// Module roots, defaulting to the project root
    pub fn module_roots(&self) -> Vec<PathBuf> {
        match &self.modules {
            Some(modules) if !modules.roots.is_empty() => modules.roots.clone(),
            _ => vec![PathBuf::from(".")],
        }
    }

    /// Target declarations in file order
    pub fn target_declarations(&self) -> ConfigResult<Vec<TargetDeclaration>> {
        self.targets.iter().map(TargetConfig::to_declaration).collect()
    }
}
