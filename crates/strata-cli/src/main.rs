use anyhow::Result;
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use strata_build::{Configuration, Platform};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::ContextArgs;

/// Strata module build-plan resolver.
///
/// Reads module descriptors (*.module.toml) and strata.toml, then resolves
/// the modules, their dependencies and their include paths into a build
/// plan for a platform, configuration and target type.
///
/// EXAMPLES:
///     strata plan                          Plan the default context
///     strata plan -p Linux -c Shipping     Plan a specific context
///     strata plan --target ShooterEditor   Plan what a target reaches
///     strata check -p Win64 -p Linux       Check several contexts at once
///     strata explain Engine                Show where Engine's includes come from
///
/// ENVIRONMENT VARIABLES:
///     STRATA_PLATFORM        Default platform
///     STRATA_CONFIGURATION   Default configuration
///     STRATA_TARGET_TYPE     Default target type
///     STRATA_TOGGLES         Default toggles (comma separated)
///     STRATA_OUTPUT          Set to 'json' for JSON output by default
///     NO_COLOR               Set to disable colored output
#[derive(Parser)]
#[command(name = "strata")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a build plan
    ///
    /// Prints the modules in compile order, the parallel build groups and a
    /// summary of the graph.
    ///
    /// EXAMPLES:
    ///     strata plan                       Default context
    ///     strata plan -p Linux -t Server    Linux dedicated server
    ///     strata plan --toggle WITH_STEAM   Enable a toggle
    ///     strata plan --json                Full plan as JSON
    #[command(visible_alias = "p")]
    Plan {
        #[command(flatten)]
        context: ContextArgs,
        /// Plan only the modules this target reaches
        #[arg(long)]
        target: Option<String>,
        /// Output the plan in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Resolve every combination of the given platforms and configurations
    ///
    /// Fails if any context fails to resolve. Without -p/-c the default
    /// context's platform and configuration are used.
    ///
    /// EXAMPLES:
    ///     strata check -p Win64 -p Linux -c Debug -c Shipping
    ///     strata check --all-platforms --target ShooterGame
    #[command(visible_alias = "c")]
    Check {
        /// Platforms to check
        #[arg(long = "platform", short = 'p')]
        platforms: Vec<Platform>,
        /// Configurations to check
        #[arg(long = "configuration", short = 'c')]
        configurations: Vec<Configuration>,
        /// Check every platform
        #[arg(long, conflicts_with = "platforms")]
        all_platforms: bool,
        /// Check every configuration
        #[arg(long, conflicts_with = "configurations")]
        all_configurations: bool,
        /// Check a target instead of every available module
        #[arg(long)]
        target: Option<String>,
        /// Output results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Explain a module's resolved include paths and definitions
    ///
    /// Lists each entry once, grouped by the module that contributes it.
    ///
    /// EXAMPLES:
    ///     strata explain Engine
    ///     strata explain Engine -p Linux --json
    #[command(visible_alias = "e")]
    Explain {
        /// Module name (case-insensitive)
        module: String,
        #[command(flatten)]
        context: ContextArgs,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List the targets declared in strata.toml
    Targets {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts
    ///
    /// EXAMPLES:
    ///     strata completions bash > ~/.local/share/bash-completion/completions/strata
    ///     strata completions zsh > ~/.zfunc/_strata
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let cli_config = config::Config::from_env();

    match cli.command {
        Commands::Plan {
            context,
            target,
            json,
        } => {
            let workspace = commands::Workspace::load(&cli_config)?;
            let json = json || workspace.default_json(&cli_config);
            commands::plan::run(&workspace, &context, target.as_deref(), json)?;
        }
        Commands::Check {
            platforms,
            configurations,
            all_platforms,
            all_configurations,
            target,
            json,
        } => {
            let workspace = commands::Workspace::load(&cli_config)?;
            let args = commands::check::CheckArgs {
                platforms: if all_platforms {
                    Platform::ALL.to_vec()
                } else {
                    platforms
                },
                configurations: if all_configurations {
                    Configuration::ALL.to_vec()
                } else {
                    configurations
                },
                target,
                json: json || workspace.default_json(&cli_config),
            };
            commands::check::run(&workspace, args)?;
        }
        Commands::Explain {
            module,
            context,
            json,
        } => {
            let workspace = commands::Workspace::load(&cli_config)?;
            let json = json || workspace.default_json(&cli_config);
            commands::explain::run(&workspace, &module, &context, json)?;
        }
        Commands::Targets { json } => {
            let workspace = commands::Workspace::load(&cli_config)?;
            let json = json || workspace.default_json(&cli_config);
            commands::targets::run(&workspace, json)?;
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
        }
    }

    Ok(())
}
