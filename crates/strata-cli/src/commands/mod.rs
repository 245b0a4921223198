pub mod check;
pub mod explain;
pub mod plan;
pub mod targets;

use crate::config::Config as CliConfig;
use anyhow::{Context, Result};
use clap::Args;
use std::env;
use strata_build::{BuildContext, Configuration, DeclarationStore, Platform, TargetType};
use strata_config::{Config, ConfigLoader};

/// Build-axis flags shared by the resolving commands
///
/// Unset flags fall back to the configured defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct ContextArgs {
    /// Target platform (Win64, Linux, Mac, ...)
    #[arg(long, short = 'p')]
    pub platform: Option<Platform>,
    /// Build configuration (Debug, DebugGame, Development, Shipping, Test)
    #[arg(long, short = 'c')]
    pub configuration: Option<Configuration>,
    /// Target type (Game, Editor, Client, Server, Program)
    #[arg(long, short = 't')]
    pub target_type: Option<TargetType>,
    /// Enable a toggle (repeatable)
    #[arg(long = "toggle", value_name = "TOGGLE")]
    pub toggles: Vec<String>,
}

impl ContextArgs {
    /// Overlay the flags on a default context
    pub fn apply(&self, mut ctx: BuildContext) -> BuildContext {
        if let Some(platform) = self.platform {
            ctx.platform = platform;
        }
        if let Some(configuration) = self.configuration {
            ctx.configuration = configuration;
        }
        if let Some(target_type) = self.target_type {
            ctx.target_type = target_type;
        }
        ctx.with_toggles(self.toggles.iter().cloned())
    }
}

/// Loaded configuration plus every declaration it points at
pub struct Workspace {
    pub config: Config,
    pub store: DeclarationStore,
}

impl Workspace {
    /// Load strata.toml (searching upwards from the working directory) and
    /// every module descriptor under its roots
    pub fn load(cli_config: &CliConfig) -> Result<Self> {
        let cwd = env::current_dir().context("Failed to read current directory")?;
        let config = ConfigLoader::new()
            .load_from_directory(&cwd)
            .context("Failed to load configuration")?;
        let store = config
            .load_store()
            .context("Failed to load module descriptors")?;

        if cli_config.no_color || !config.global.color() {
            colored::control::set_override(false);
        }

        Ok(Self { config, store })
    }

    /// Whether JSON output was requested through the environment or global config
    pub fn default_json(&self, cli_config: &CliConfig) -> bool {
        cli_config.wants_json(self.config.global.output_format())
    }

    /// Default context with the command-line flags applied
    pub fn context(&self, args: &ContextArgs) -> Result<BuildContext> {
        let ctx = self
            .config
            .default_context()
            .context("Invalid default build context")?;
        Ok(args.apply(ctx))
    }
}
