//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper
//! precedence, and turns module descriptors into a declaration store.

use crate::global::GlobalConfig;
use crate::manifest::{ModuleManifest, DESCRIPTOR_SUFFIX};
use crate::project::{DefaultsConfig, ProjectConfig};
use crate::{ConfigError, ConfigResult};
use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};
use strata_build::{BuildContext, Configuration, DeclarationStore, Platform, TargetType};
use tracing::{debug, trace};
use walkdir::{DirEntry, WalkDir};

/// Name of the project configuration file
pub const PROJECT_FILE: &str = "strata.toml";

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.strata/config.toml) - lowest priority
/// 2. Project config (./strata.toml) - overrides global
/// 3. Environment variables (STRATA_*) - overrides project
/// 4. CLI flags - highest priority (handled by caller)
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone)]
pub struct Config {
    /// Project configuration, environment overrides applied
    pub project: ProjectConfig,

    /// Global configuration
    pub global: GlobalConfig,

    /// Project root directory (where strata.toml was found)
    pub project_root: Option<PathBuf>,

    /// Directory module roots are resolved against
    pub base_dir: PathBuf,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Read global configuration from `path` instead of ~/.strata/config.toml
    pub fn with_global_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find strata.toml, then loads and merges
    /// global config if it exists.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_config) = self.find_project_config(start_dir)?;
        let global_config = self.load_global_config()?;
        let project_config = self.apply_env_overrides(project_config)?;

        let base_dir = project_root
            .clone()
            .unwrap_or_else(|| start_dir.to_path_buf());

        Ok(Config {
            project: project_config,
            global: global_config,
            project_root,
            base_dir,
        })
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let project_config = ProjectConfig::load_from_file(config_path)?;
        let global_config = self.load_global_config()?;
        let project_config = self.apply_env_overrides(project_config)?;

        let project_root = config_path.parent().map(|p| p.to_path_buf());
        let base_dir = project_root.clone().unwrap_or_else(|| PathBuf::from("."));

        Ok(Config {
            project: project_config,
            global: global_config,
            project_root,
            base_dir,
        })
    }

    /// Find project configuration by walking up directory tree
    ///
    /// Returns (project_root, project_config); a directory tree without
    /// strata.toml yields the default config and no root.
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_FILE);

            if config_path.exists() {
                debug!(path = %config_path.display(), "found project config");
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok((Some(current), project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, ProjectConfig::default())),
            }
        }
    }

    /// Load global configuration, defaulting when the file does not exist
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => match GlobalConfig::global_config_path() {
                Ok(path) => {
                    self.global_config_path = Some(path.clone());
                    path
                }
                Err(ConfigError::HomeNotFound) => return Ok(GlobalConfig::default()),
                Err(e) => return Err(e),
            },
        };

        if !path.exists() {
            return Ok(GlobalConfig::default());
        }

        GlobalConfig::load_from_file(&path)
    }

    /// Apply environment variable overrides to the project defaults
    ///
    /// STRATA_PLATFORM, STRATA_CONFIGURATION, STRATA_TARGET_TYPE and
    /// STRATA_TOGGLES (comma separated) replace the matching default.
    fn apply_env_overrides(&self, mut config: ProjectConfig) -> ConfigResult<ProjectConfig> {
        let overrides = DefaultsConfig {
            platform: env::var("STRATA_PLATFORM").ok(),
            configuration: env::var("STRATA_CONFIGURATION").ok(),
            target_type: env::var("STRATA_TARGET_TYPE").ok(),
            toggles: env::var("STRATA_TOGGLES").ok().map(|t| split_toggles(&t)),
        };

        if overrides == DefaultsConfig::default() {
            return Ok(config);
        }

        overrides.validate("STRATA")?;
        config
            .defaults
            .get_or_insert_with(DefaultsConfig::default)
            .merge(&overrides);
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a comma separated toggle list, dropping blanks
pub fn split_toggles(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Platform a build defaults to on this host
pub fn host_platform() -> Platform {
    if cfg!(target_os = "windows") {
        Platform::Win64
    } else if cfg!(target_os = "macos") {
        Platform::Mac
    } else {
        Platform::Linux
    }
}

impl Config {
    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Get the project name
    pub fn project_name(&self) -> Option<&str> {
        self.project.project_name()
    }

    /// Check if this is a project (has strata.toml)
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }

    /// Effective defaults (global, then project)
    pub fn defaults(&self) -> DefaultsConfig {
        let mut defaults = self.global.defaults.clone().unwrap_or_default();
        if let Some(project) = &self.project.defaults {
            defaults.merge(project);
        }
        defaults
    }

    /// Build context from the effective defaults
    ///
    /// Unset axes fall back to the host platform, Development and Game.
    pub fn default_context(&self) -> ConfigResult<BuildContext> {
        let defaults = self.defaults();
        let platform = defaults.platform("defaults")?.unwrap_or_else(host_platform);
        let configuration = defaults
            .configuration("defaults")?
            .unwrap_or(Configuration::Development);
        let target_type = defaults.target_type("defaults")?.unwrap_or(TargetType::Game);

        Ok(BuildContext::new(platform, configuration, target_type)
            .with_toggles(defaults.toggles.unwrap_or_default()))
    }

    /// Module descriptor files, sorted by path within each root
    pub fn descriptor_paths(&self) -> ConfigResult<Vec<PathBuf>> {
        let mut seen = HashSet::new();
        let mut paths = Vec::new();

        for root in self.project.module_roots() {
            let dir = self.base_dir.join(&root);
            if !dir.is_dir() {
                return Err(ConfigError::NotFound(dir));
            }

            let walker = WalkDir::new(&dir)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e));

            for entry in walker {
                let entry = entry?;
                let is_descriptor = entry.file_type().is_file()
                    && entry
                        .file_name()
                        .to_str()
                        .is_some_and(|n| n.ends_with(DESCRIPTOR_SUFFIX));
                if is_descriptor && seen.insert(entry.path().to_path_buf()) {
                    trace!(path = %entry.path().display(), "module descriptor");
                    paths.push(entry.path().to_path_buf());
                }
            }
        }

        debug!(count = paths.len(), "module descriptors discovered");
        Ok(paths)
    }

    /// Load every descriptor and target into a declaration store
    pub fn load_store(&self) -> ConfigResult<DeclarationStore> {
        let mut store = DeclarationStore::new();

        for path in self.descriptor_paths()? {
            let manifest = ModuleManifest::load_from_file(&path)?;
            let dir = path.parent().unwrap_or(Path::new(""));
            let base = dir.strip_prefix(&self.base_dir).unwrap_or(dir);

            manifest
                .to_declaration(base)
                .and_then(|d| store.register(d))
                .map_err(|source| ConfigError::InvalidDescriptor {
                    file: path.clone(),
                    source,
                })?;
        }

        for target in self.project.target_declarations()? {
            store.register_target(target)?;
        }

        debug!(
            modules = store.len(),
            targets = store.targets().len(),
            "declaration store loaded"
        );
        Ok(store)
    }
}

/// Hidden directories and build output are never scanned
fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|n| n.starts_with('.') || n == "target")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn create_config_file(dir: &Path, content: &str) -> PathBuf {
        let config_path = dir.join(PROJECT_FILE);
        fs::write(&config_path, content).unwrap();
        config_path
    }

    fn loader(temp_dir: &TempDir) -> ConfigLoader {
        ConfigLoader::new().with_global_config_path(temp_dir.path().join("no-global.toml"))
    }

    #[test]
    #[serial]
    fn test_load_project_config() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(temp_dir.path(), "[project]\nname = \"test-project\"\n");

        let config = loader(&temp_dir).load_from_directory(temp_dir.path()).unwrap();

        assert_eq!(config.project_name(), Some("test-project"));
        assert!(config.is_project());
    }

    #[test]
    #[serial]
    fn test_find_config_in_parent() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(temp_dir.path(), "[project]\nname = \"parent-project\"\n");

        let sub_dir = temp_dir.path().join("Source").join("Engine");
        fs::create_dir_all(&sub_dir).unwrap();

        let config = loader(&temp_dir).load_from_directory(&sub_dir).unwrap();

        assert_eq!(config.project_name(), Some("parent-project"));
        assert_eq!(config.project_root(), Some(temp_dir.path()));
        assert_eq!(config.base_dir, temp_dir.path());
    }

    #[test]
    #[serial]
    fn test_global_defaults_under_project_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let global = temp_dir.path().join("global.toml");
        fs::write(
            &global,
            "[defaults]\nplatform = \"Mac\"\nconfiguration = \"Debug\"\n",
        )
        .unwrap();
        create_config_file(temp_dir.path(), "[defaults]\nconfiguration = \"Shipping\"\n");

        let config = ConfigLoader::new()
            .with_global_config_path(&global)
            .load_from_directory(temp_dir.path())
            .unwrap();
        let ctx = config.default_context().unwrap();

        assert_eq!(ctx.platform, Platform::Mac);
        assert_eq!(ctx.configuration, Configuration::Shipping);
        assert_eq!(ctx.target_type, TargetType::Game);
    }

    #[test]
    #[serial]
    fn test_env_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(
            temp_dir.path(),
            "[defaults]\nplatform = \"Win64\"\ntoggles = [\"A\"]\n",
        );

        env::set_var("STRATA_PLATFORM", "linux");
        env::set_var("STRATA_TOGGLES", "WITH_STEAM, USE_NULL_RHI,");

        let result = loader(&temp_dir).load_from_directory(temp_dir.path());

        env::remove_var("STRATA_PLATFORM");
        env::remove_var("STRATA_TOGGLES");

        let ctx = result.unwrap().default_context().unwrap();
        assert_eq!(ctx.platform, Platform::Linux);
        assert!(ctx.has_toggle("WITH_STEAM"));
        assert!(ctx.has_toggle("USE_NULL_RHI"));
        assert!(!ctx.has_toggle("A"));
    }

    #[test]
    #[serial]
    fn test_invalid_env_override() {
        let temp_dir = TempDir::new().unwrap();
        env::set_var("STRATA_CONFIGURATION", "Turbo");
        let result = loader(&temp_dir).load_from_directory(temp_dir.path());
        env::remove_var("STRATA_CONFIGURATION");

        let err = result.unwrap_err();
        assert!(err.to_string().contains("STRATA.configuration"));
    }

    #[test]
    fn test_split_toggles() {
        assert_eq!(split_toggles("A, B,,C "), vec!["A", "B", "C"]);
        assert!(split_toggles("").is_empty());
    }

    #[test]
    #[serial]
    fn test_missing_module_root() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(temp_dir.path(), "[modules]\nroots = [\"Source\"]\n");
        let config = loader(&temp_dir).load_from_directory(temp_dir.path()).unwrap();
        assert!(matches!(
            config.descriptor_paths(),
            Err(ConfigError::NotFound(_))
        ));
    }
}
