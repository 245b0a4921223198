//! Explain command - show where a module's include paths and definitions come from

use super::{plan, ContextArgs, Workspace};
use anyhow::{bail, Result};
use colored::Colorize;
use strata_build::{name_key, reduce, BuildContext, BuildError, DependencyKind, PlannedModule};

/// Entries contributed by one source
#[derive(Debug, PartialEq)]
pub struct Source {
    pub label: String,
    pub include_paths: Vec<String>,
    pub definitions: Vec<String>,
}

/// Resolved entries not yet attributed to a source
struct Attribution {
    include_paths: Vec<String>,
    definitions: Vec<String>,
    sources: Vec<Source>,
}

impl Attribution {
    fn new(module: &PlannedModule) -> Self {
        Self {
            include_paths: module.include_paths.clone(),
            definitions: module.definitions.clone(),
            sources: Vec::new(),
        }
    }

    fn claim(&mut self, label: String, include_paths: &[String], definitions: &[String]) {
        let include_paths = take_matching(&mut self.include_paths, include_paths);
        let definitions = take_matching(&mut self.definitions, definitions);
        if !include_paths.is_empty() || !definitions.is_empty() {
            self.sources.push(Source {
                label,
                include_paths,
                definitions,
            });
        }
    }

    fn finish(mut self) -> Vec<Source> {
        let include_paths = std::mem::take(&mut self.include_paths);
        let definitions = std::mem::take(&mut self.definitions);
        self.claim("other".to_string(), &include_paths, &definitions);
        self.sources
    }
}

fn take_matching(remaining: &mut Vec<String>, candidates: &[String]) -> Vec<String> {
    let (taken, kept) = std::mem::take(remaining)
        .into_iter()
        .partition(|e| candidates.contains(e));
    *remaining = kept;
    taken
}

/// Run the explain command
pub fn run(workspace: &Workspace, name: &str, context: &ContextArgs, json: bool) -> Result<()> {
    let build_plan = plan::resolve(workspace, context, None)?;
    let ctx = &build_plan.context;

    let Some(module) = build_plan.module(name) else {
        if workspace.store.contains(name) {
            bail!("Module '{}' is not available in {}", name, ctx);
        }
        return Err(BuildError::unknown_module(name).into());
    };

    let sources = attribute(workspace, &build_plan.modules, module, ctx)?;

    if json {
        let sources: Vec<_> = sources
            .iter()
            .map(|s| {
                serde_json::json!({
                    "from": s.label,
                    "include_paths": s.include_paths,
                    "definitions": s.definitions,
                })
            })
            .collect();
        let output = serde_json::json!({
            "module": module.name,
            "context": ctx.to_string(),
            "include_paths": module.include_paths,
            "definitions": module.definitions,
            "exported_include_paths": module.exported_include_paths,
            "exported_definitions": module.exported_definitions,
            "cycle_unit": module.cycle_unit,
            "sources": sources,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{} in {}", module.name.bold(), ctx);
    if let Some(cycle) = &module.cycle_unit {
        println!("  compiled with cycle: {}", cycle.join(", ").yellow());
    }
    for kind in DependencyKind::ALL {
        let deps = module.dependencies_of(kind);
        if !deps.is_empty() {
            println!("  {} dependencies: {}", kind, deps.join(", "));
        }
    }
    if !module.unresolved_dynamic.is_empty() {
        println!(
            "  {} {}",
            "unavailable dynamic:".yellow(),
            module.unresolved_dynamic.join(", ")
        );
    }

    for source in &sources {
        println!("\n  from {}", source.label.cyan());
        for path in &source.include_paths {
            println!("    -I {}", path);
        }
        for definition in &source.definitions {
            println!("    -D {}", definition);
        }
    }

    if !module.exported_include_paths.is_empty() || !module.exported_definitions.is_empty() {
        println!("\n  {}", "exports".bold());
        for path in &module.exported_include_paths {
            println!("    -I {}", path);
        }
        for definition in &module.exported_definitions {
            println!("    -D {}", definition);
        }
    }

    Ok(())
}

/// Group a module's resolved entries by the module that contributes them
///
/// Sources are tried in the order the entries are resolved: the module
/// itself, its cycle peers, then each member's dependencies.
pub fn attribute(
    workspace: &Workspace,
    planned: &[PlannedModule],
    module: &PlannedModule,
    ctx: &BuildContext,
) -> Result<Vec<Source>> {
    let find = |name: &str| planned.iter().find(|m| name_key(&m.name) == name_key(name));
    let members = module
        .cycle_unit
        .clone()
        .unwrap_or_else(|| vec![module.name.clone()]);
    let mut attribution = Attribution::new(module);

    let own = reduce(workspace.store.lookup(&module.name)?, ctx)?;
    attribution.claim(
        "own declaration".to_string(),
        &[own.public_include_paths, own.private_include_paths].concat(),
        &[own.public_definitions, own.private_definitions].concat(),
    );

    for peer in members.iter().filter(|m| **m != module.name) {
        let peer_module = reduce(workspace.store.lookup(peer)?, ctx)?;
        attribution.claim(
            format!("cycle peer {}", peer),
            &[peer_module.public_include_paths, peer_module.private_include_paths].concat(),
            &[peer_module.public_definitions, peer_module.private_definitions].concat(),
        );
    }

    for member in &members {
        let Some(planned_member) = find(member.as_str()) else {
            continue;
        };
        for dep in planned_member.dependencies_of(DependencyKind::Public) {
            if members.contains(dep) {
                continue;
            }
            if let Some(dep_module) = find(dep.as_str()) {
                attribution.claim(
                    format!("public dependency {}", dep),
                    &dep_module.exported_include_paths,
                    &dep_module.exported_definitions,
                );
            }
        }
        for dep in planned_member.dependencies_of(DependencyKind::Private) {
            if members.contains(dep) {
                continue;
            }
            let dep_module = reduce(workspace.store.lookup(dep)?, ctx)?;
            attribution.claim(
                format!("private dependency {}", dep),
                &dep_module.public_include_paths,
                &dep_module.public_definitions,
            );
        }
    }

    Ok(attribution.finish())
}
