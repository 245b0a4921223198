//! Targets command - list declared targets

use super::Workspace;
use anyhow::Result;
use colored::Colorize;

/// Run the targets command
pub fn run(workspace: &Workspace, json: bool) -> Result<()> {
    let targets = workspace.store.targets();

    if json {
        println!("{}", serde_json::to_string_pretty(targets)?);
        return Ok(());
    }

    if targets.is_empty() {
        println!("No targets declared");
        return Ok(());
    }

    for target in targets {
        println!(
            "{} ({})  modules: {}",
            target.name.bold(),
            target.target_type,
            target.modules.join(", ")
        );
        if !target.toggles.is_empty() {
            let toggles: Vec<&str> = target.toggles.iter().map(String::as_str).collect();
            println!("    toggles: {}", toggles.join(", "));
        }
        if !target.definitions.is_empty() {
            println!("    definitions: {}", target.definitions.join(", "));
        }
    }

    Ok(())
}
