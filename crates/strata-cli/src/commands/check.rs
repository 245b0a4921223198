//! Check command - resolve a matrix of contexts and report failures

use super::{ContextArgs, Workspace};
use anyhow::{bail, Context, Result};
use colored::Colorize;
use strata_build::{BuildContext, BuildPlan, BuildResult, Configuration, Platform, Resolver};

/// Check command arguments
#[derive(Debug, Default)]
pub struct CheckArgs {
    /// Platforms to check (empty = default platform)
    pub platforms: Vec<Platform>,
    /// Configurations to check (empty = default configuration)
    pub configurations: Vec<Configuration>,
    /// Check this target rather than the whole store
    pub target: Option<String>,
    /// JSON output
    pub json: bool,
}

/// Run the check command
pub fn run(workspace: &Workspace, args: CheckArgs) -> Result<()> {
    let defaults = workspace.context(&ContextArgs::default())?;
    let platforms = or_default(args.platforms, defaults.platform);
    let configurations = or_default(args.configurations, defaults.configuration);

    let resolver = Resolver::new(&workspace.store);
    let results: Vec<(String, BuildResult<BuildPlan>)> = match &args.target {
        Some(target) => platforms
            .iter()
            .flat_map(|&p| configurations.iter().map(move |&c| (p, c)))
            .map(|(p, c)| {
                let label = format!("{} {}/{}", target, p, c);
                (label, resolver.resolve_target(target, p, c))
            })
            .collect(),
        None => {
            let contexts = matrix(&defaults, &platforms, &configurations);
            let plans = resolver.resolve_all(&contexts);
            contexts
                .iter()
                .map(ToString::to_string)
                .zip(plans)
                .collect()
        }
    };

    let failed = results.iter().filter(|(_, r)| r.is_err()).count();

    if args.json {
        let mut entries = Vec::with_capacity(results.len());
        for (label, result) in &results {
            entries.push(match result {
                Ok(plan) => serde_json::json!({
                    "context": label,
                    "ok": true,
                    "modules": plan.len(),
                    "fingerprint": plan.fingerprint().context("Failed to fingerprint plan")?,
                }),
                Err(e) => serde_json::json!({
                    "context": label,
                    "ok": false,
                    "error": e.to_string(),
                }),
            });
        }
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for (label, result) in &results {
            match result {
                Ok(plan) => println!("{} {}  {} modules", "ok  ".green(), label, plan.len()),
                Err(e) => println!("{} {}  {}", "FAIL".red().bold(), label, e),
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} contexts failed to resolve", failed, results.len());
    }
    if !args.json {
        println!("\nAll {} contexts resolved", results.len());
    }
    Ok(())
}

fn or_default<T: Copy>(values: Vec<T>, default: T) -> Vec<T> {
    if values.is_empty() {
        vec![default]
    } else {
        values
    }
}

/// Every platform/configuration pair, keeping the default target type and toggles
fn matrix(
    base: &BuildContext,
    platforms: &[Platform],
    configurations: &[Configuration],
) -> Vec<BuildContext> {
    let mut contexts = Vec::with_capacity(platforms.len() * configurations.len());
    for &platform in platforms {
        for &configuration in configurations {
            let mut ctx = base.clone();
            ctx.platform = platform;
            ctx.configuration = configuration;
            contexts.push(ctx);
        }
    }
    contexts
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_build::TargetType;

    #[test]
    fn test_matrix_order() {
        let base = BuildContext::new(Platform::Win64, Configuration::Development, TargetType::Editor)
            .with_toggle("WITH_STEAM");
        let contexts = matrix(
            &base,
            &[Platform::Win64, Platform::Linux],
            &[Configuration::Debug, Configuration::Shipping],
        );

        let labels: Vec<String> = contexts.iter().map(ToString::to_string).collect();
        assert_eq!(
            labels,
            vec![
                "Win64/Editor/Debug [WITH_STEAM]",
                "Win64/Editor/Shipping [WITH_STEAM]",
                "Linux/Editor/Debug [WITH_STEAM]",
                "Linux/Editor/Shipping [WITH_STEAM]",
            ]
        );
    }

    #[test]
    fn test_or_default() {
        assert_eq!(or_default(vec![], Platform::Mac), vec![Platform::Mac]);
        assert_eq!(
            or_default(vec![Platform::Linux], Platform::Mac),
            vec![Platform::Linux]
        );
    }
}
