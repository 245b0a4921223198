//! Plan command - resolve and print a build plan

use super::{ContextArgs, Workspace};
use anyhow::{bail, Context, Result};
use colored::Colorize;
use strata_build::{BuildPlan, Resolver};

/// Run the plan command
pub fn run(
    workspace: &Workspace,
    context: &ContextArgs,
    target: Option<&str>,
    json: bool,
) -> Result<()> {
    let plan = resolve(workspace, context, target)?;

    if json {
        println!("{}", plan.to_json().context("Failed to serialize plan")?);
    } else {
        print_plan(&plan)?;
    }

    Ok(())
}

/// Resolve the whole store, or one target, under the requested context
pub fn resolve(
    workspace: &Workspace,
    context: &ContextArgs,
    target: Option<&str>,
) -> Result<BuildPlan> {
    let ctx = workspace.context(context)?;
    let resolver = Resolver::new(&workspace.store);

    let plan = match target {
        Some(name) => {
            if context.target_type.is_some() || !context.toggles.is_empty() {
                bail!("--target-type and --toggle come from the target and cannot be combined with --target");
            }
            resolver
                .resolve_target(name, ctx.platform, ctx.configuration)
                .with_context(|| format!("Failed to resolve target '{}'", name))?
        }
        None => resolver
            .resolve(&ctx)
            .with_context(|| format!("Failed to resolve {}", ctx))?,
    };

    Ok(plan)
}

fn print_plan(plan: &BuildPlan) -> Result<()> {
    let mut header = format!("Build plan for {}", plan.context);
    if let Some(target) = &plan.target {
        header.push_str(&format!(" (target {})", target));
    }
    println!("{}", header.bold());

    let width = plan.len().to_string().len();
    for (i, module) in plan.modules.iter().enumerate() {
        let mut line = format!("  {:>width$}. {}", i + 1, module.name.green(), width = width);
        if let Some(cycle) = &module.cycle_unit {
            line.push_str(&format!("  {}", format!("[cycle: {}]", cycle.join(", ")).yellow()));
        }
        println!("{}", line);
    }

    if !plan.parallel_groups.is_empty() {
        println!("\n{}", "Parallel groups:".bold());
        for (i, group) in plan.parallel_groups.iter().enumerate() {
            println!("  {}: {}", i + 1, group.join(", "));
        }
    }

    for module in &plan.modules {
        for missing in &module.unresolved_dynamic {
            println!(
                "{} {}: dynamic dependency '{}' is not available",
                "warning:".yellow().bold(),
                module.name,
                missing
            );
        }
    }

    let summary = &plan.summary;
    println!(
        "\n{} modules, {} static edges, {} dynamic edges ({} unresolved), {} cycle units",
        summary.modules,
        summary.static_edges,
        summary.dynamic_edges,
        summary.unresolved_dynamic,
        summary.cycle_units.len()
    );
    println!(
        "Fingerprint: {}",
        plan.fingerprint().context("Failed to fingerprint plan")?
    );

    Ok(())
}
