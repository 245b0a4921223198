//! Include-path and definition visibility
//!
//! Walks units in compile order. Each unit keeps two sets per entry type:
//! what it exports (own public entries plus everything its Public
//! dependencies export) and what it compiles with (own public and private
//! entries, plus the exports of Public dependencies, plus only the own
//! public entries of Private dependencies). Dynamic dependencies add
//! nothing. Members of a cycle unit share both sets.
use crate::context::BuildContext;
use crate::declaration::DependencyKind;
use crate::planner::OrderedGraph;
use crate::plan::{BuildPlan, PlanSummary, PlannedModule};
use crate::reduce::ConcreteModule;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Insertion-ordered set of entries
#[derive(Debug, Default)]
struct OrderedEntries {
    items: Vec<String>,
    seen: HashSet<String>,
}

impl OrderedEntries {
    fn extend<'a>(&mut self, entries: impl IntoIterator<Item = &'a String>) {
        for entry in entries {
            if self.seen.insert(entry.clone()) {
                self.items.push(entry.clone());
            }
        }
    }
}

/// Selects one entry type (include paths or definitions) from a module
struct EntryKind {
    public: fn(&ConcreteModule) -> &[String],
    private: fn(&ConcreteModule) -> &[String],
}

const INCLUDES: EntryKind = EntryKind {
    public: public_includes,
    private: private_includes,
};

const DEFINITIONS: EntryKind = EntryKind {
    public: public_definitions,
    private: private_definitions,
};

fn public_includes(module: &ConcreteModule) -> &[String] {
    &module.public_include_paths
}

fn private_includes(module: &ConcreteModule) -> &[String] {
    &module.private_include_paths
}

fn public_definitions(module: &ConcreteModule) -> &[String] {
    &module.public_definitions
}

fn private_definitions(module: &ConcreteModule) -> &[String] {
    &module.private_definitions
}

/// Per-unit exported and resolved sets for one entry type
struct UnitSets {
    exported: Vec<Vec<String>>,
    resolved: Vec<Vec<String>>,
}

/// Annotate an ordered graph with visibility and produce the plan
pub fn propagate(ordered: &OrderedGraph, ctx: &BuildContext) -> BuildPlan {
    let includes = propagate_entries(ordered, &INCLUDES);
    let definitions = propagate_entries(ordered, &DEFINITIONS);
    let graph = ordered.graph();
    let cycle_units = ordered.cycle_units();

    let mut modules = Vec::with_capacity(graph.len());
    for (unit, members) in ordered.units().iter().enumerate() {
        let cycle_unit = ordered.is_cycle(unit).then(|| {
            members
                .iter()
                .map(|&m| graph.modules()[m].name.clone())
                .collect::<Vec<_>>()
        });

        for &index in members {
            let module = &graph.modules()[index];
            let mut dependencies: BTreeMap<DependencyKind, Vec<String>> = BTreeMap::new();
            let mut unresolved_dynamic = Vec::new();

            for edge in graph.edges_from(index) {
                if edge.resolved {
                    dependencies
                        .entry(edge.kind)
                        .or_default()
                        .push(edge.to.clone());
                } else {
                    unresolved_dynamic.push(edge.to.clone());
                }
            }

            modules.push(PlannedModule {
                name: module.name.clone(),
                include_paths: includes.resolved[unit].clone(),
                definitions: definitions.resolved[unit].clone(),
                exported_include_paths: includes.exported[unit].clone(),
                exported_definitions: definitions.exported[unit].clone(),
                dependencies,
                unresolved_dynamic,
                policy: module.policy,
                cycle_unit: cycle_unit.clone(),
            });
        }
    }

    let summary = PlanSummary {
        modules: modules.len(),
        static_edges: graph
            .edges()
            .iter()
            .filter(|e| e.kind.is_static() && e.resolved)
            .count(),
        dynamic_edges: graph
            .edges()
            .iter()
            .filter(|e| e.kind == DependencyKind::Dynamic)
            .count(),
        cycle_units,
        unresolved_dynamic: graph.edges().iter().filter(|e| !e.resolved).count(),
    };

    debug!(
        modules = summary.modules,
        cycles = summary.cycle_units.len(),
        "visibility propagated"
    );

    BuildPlan {
        context: ctx.clone(),
        target: None,
        global_definitions: ctx.global_definitions(),
        modules,
        parallel_groups: ordered.parallel_groups(),
        summary,
    }
}

fn propagate_entries(ordered: &OrderedGraph, kind: &EntryKind) -> UnitSets {
    let graph = ordered.graph();
    let modules = graph.modules();
    let units = ordered.units();
    let mut exported: Vec<Vec<String>> = Vec::with_capacity(units.len());
    let mut resolved: Vec<Vec<String>> = Vec::with_capacity(units.len());

    for (unit, members) in units.iter().enumerate() {
        let mut exports = OrderedEntries::default();
        let mut compiles = OrderedEntries::default();

        for &m in members {
            exports.extend((kind.public)(&modules[m]));
            compiles.extend((kind.public)(&modules[m]));
            compiles.extend((kind.private)(&modules[m]));
        }

        for &m in members {
            for (dep, dep_kind) in graph.static_dependencies(m) {
                let dep_unit = ordered.unit_of(dep);
                if dep_unit == unit {
                    continue;
                }
                match dep_kind {
                    DependencyKind::Public => {
                        exports.extend(&exported[dep_unit]);
                        compiles.extend(&exported[dep_unit]);
                    }
                    DependencyKind::Private => {
                        compiles.extend((kind.public)(&modules[dep]));
                    }
                    DependencyKind::Dynamic => {}
                }
            }
        }

        exported.push(exports.items);
        resolved.push(compiles.items);
    }

    UnitSets { exported, resolved }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Configuration, Platform};
    use crate::declaration::ModuleDeclaration;
    use crate::graph::DependencyGraph;
    use crate::planner::plan;
    use crate::reduce::reduce;
    use crate::targets::TargetType;
    use pretty_assertions::assert_eq;

    fn ctx() -> BuildContext {
        BuildContext::new(Platform::Win64, Configuration::Development, TargetType::Game)
    }

    fn build(decls: Vec<ModuleDeclaration>) -> BuildPlan {
        let ctx = ctx();
        let modules = decls.iter().map(|d| reduce(d, &ctx).unwrap()).collect();
        let ordered = plan(DependencyGraph::build(modules).unwrap()).unwrap();
        propagate(&ordered, &ctx)
    }

    #[test]
    fn test_public_chain_is_transitive() {
        let plan = build(vec![
            ModuleDeclaration::new("Core").with_public_include("Core/Public"),
            ModuleDeclaration::new("Engine")
                .with_public_dependency("Core")
                .with_public_include("Engine/Public")
                .with_private_include("Engine/Private"),
            ModuleDeclaration::new("Game").with_public_dependency("Engine"),
        ]);

        assert_eq!(
            plan.module("Game").unwrap().include_paths,
            vec!["Engine/Public", "Core/Public"]
        );
        assert_eq!(
            plan.module("Engine").unwrap().include_paths,
            vec!["Engine/Public", "Engine/Private", "Core/Public"]
        );
        assert_eq!(
            plan.module("Engine").unwrap().exported_include_paths,
            vec!["Engine/Public", "Core/Public"]
        );
    }

    #[test]
    fn test_private_dependency_is_a_firewall() {
        let plan = build(vec![
            ModuleDeclaration::new("C").with_public_definition("C_API=1"),
            ModuleDeclaration::new("B")
                .with_private_dependency("C")
                .with_public_definition("B_API=1"),
            ModuleDeclaration::new("A").with_public_dependency("B"),
        ]);

        let b = plan.module("B").unwrap();
        assert_eq!(b.definitions, vec!["B_API=1", "C_API=1"]);
        assert_eq!(b.exported_definitions, vec!["B_API=1"]);

        let a = plan.module("A").unwrap();
        assert_eq!(a.definitions, vec!["B_API=1"]);
    }

    #[test]
    fn test_private_dependency_sees_only_own_public_entries() {
        let plan = build(vec![
            ModuleDeclaration::new("Base").with_public_include("Base/Public"),
            ModuleDeclaration::new("Mid")
                .with_public_dependency("Base")
                .with_public_include("Mid/Public"),
            ModuleDeclaration::new("Top").with_private_dependency("Mid"),
        ]);
        assert_eq!(plan.module("Top").unwrap().include_paths, vec!["Mid/Public"]);
    }

    #[test]
    fn test_dynamic_dependency_contributes_nothing() {
        let plan = build(vec![
            ModuleDeclaration::new("Plugin").with_public_include("Plugin/Public"),
            ModuleDeclaration::new("Host")
                .with_dynamic_dependency("Plugin")
                .with_dynamic_dependency("Missing"),
        ]);
        let host = plan.module("Host").unwrap();
        assert!(host.include_paths.is_empty());
        assert_eq!(host.dependencies_of(DependencyKind::Dynamic), ["Plugin".to_string()]);
        assert_eq!(host.unresolved_dynamic, vec!["Missing"]);
        assert_eq!(plan.summary.unresolved_dynamic, 1);
        assert_eq!(plan.summary.dynamic_edges, 2);
        assert_eq!(plan.summary.static_edges, 0);
    }

    #[test]
    fn test_cycle_members_share_sets() {
        let plan = build(vec![
            ModuleDeclaration::new("Base").with_public_include("Base/Public"),
            ModuleDeclaration::new("A")
                .with_public_dependency("B")
                .with_public_include("A/Public")
                .with_private_include("A/Private")
                .with_circular_override("B"),
            ModuleDeclaration::new("B")
                .with_private_dependency("A")
                .with_public_dependency("Base")
                .with_public_include("B/Public")
                .with_circular_override("A"),
        ]);

        let a = plan.module("A").unwrap();
        let b = plan.module("B").unwrap();
        assert_eq!(a.include_paths, b.include_paths);
        assert_eq!(a.exported_include_paths, b.exported_include_paths);
        assert_eq!(
            a.include_paths,
            vec!["A/Public", "A/Private", "B/Public", "Base/Public"]
        );
        assert_eq!(a.cycle_unit, Some(vec!["A".to_string(), "B".to_string()]));
        assert_eq!(plan.module("Base").unwrap().cycle_unit, None);
        assert_eq!(plan.summary.cycle_units.len(), 1);
    }

    #[test]
    fn test_global_definitions_come_from_context() {
        let plan = build(vec![ModuleDeclaration::new("Core")]);
        assert_eq!(plan.global_definitions, ctx().global_definitions());
        assert!(plan.module("Core").unwrap().definitions.is_empty());
    }
}
