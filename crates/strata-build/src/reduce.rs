//! Reduce declarations to concrete modules for one build context
use crate::context::BuildContext;
use crate::declaration::{
    name_key, DependencyKind, DependencyRef, ModuleDeclaration, ModuleEntries,
};
use crate::error::BuildResult;
use crate::policy::ResolvedPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{trace, warn};

/// A declaration with every conditional applied for one context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcreteModule {
    pub name: String,
    /// One entry per referenced module, strongest kind kept
    pub dependencies: Vec<DependencyRef>,
    pub public_include_paths: Vec<String>,
    pub private_include_paths: Vec<String>,
    pub public_definitions: Vec<String>,
    pub private_definitions: Vec<String>,
    pub policy: ResolvedPolicy,
    pub circular_overrides: Vec<String>,
}

impl ConcreteModule {
    /// Dependency names of one kind, in declaration order
    pub fn dependencies_of(&self, kind: DependencyKind) -> impl Iterator<Item = &str> {
        self.dependencies
            .iter()
            .filter(move |d| d.kind == kind)
            .map(|d| d.name.as_str())
    }

    pub fn allows_cycle_with(&self, module: &str) -> bool {
        let key = name_key(module);
        self.circular_overrides.iter().any(|m| name_key(m) == key)
    }
}

/// Whether a declaration exists in `ctx` at all
pub fn is_available(declaration: &ModuleDeclaration, ctx: &BuildContext) -> BuildResult<bool> {
    match &declaration.available_when {
        Some(condition) => condition.evaluate(ctx),
        None => Ok(true),
    }
}

/// Apply every fragment whose condition holds in `ctx`
///
/// Fragment entries are merged by set union, in fragment order, after the
/// unconditional entries. A name listed under several dependency kinds
/// collapses to its strongest kind at the position it first appeared.
pub fn reduce(declaration: &ModuleDeclaration, ctx: &BuildContext) -> BuildResult<ConcreteModule> {
    let mut merged = declaration.entries.clone();
    let mut policy = declaration.policy.clone();

    for fragment in &declaration.fragments {
        if fragment.condition.evaluate(ctx)? {
            trace!(module = %declaration.name, condition = %fragment.condition, "fragment applies");
            merge_entries(&mut merged, &fragment.entries);
            policy.merge_with_override(&fragment.policy);
        }
    }

    Ok(ConcreteModule {
        name: declaration.name.clone(),
        dependencies: collapse_dependencies(&declaration.name, &merged.dependencies),
        public_include_paths: unique(&merged.public_include_paths),
        private_include_paths: unique(&merged.private_include_paths),
        public_definitions: unique(&merged.public_definitions),
        private_definitions: unique(&merged.private_definitions),
        policy: policy.resolve(ctx),
        circular_overrides: declaration.circular_overrides.clone(),
    })
}

fn merge_entries(base: &mut ModuleEntries, extra: &ModuleEntries) {
    base.dependencies.extend(extra.dependencies.iter().cloned());
    base.public_include_paths
        .extend(extra.public_include_paths.iter().cloned());
    base.private_include_paths
        .extend(extra.private_include_paths.iter().cloned());
    base.public_definitions
        .extend(extra.public_definitions.iter().cloned());
    base.private_definitions
        .extend(extra.private_definitions.iter().cloned());
}

fn collapse_dependencies(module: &str, dependencies: &[DependencyRef]) -> Vec<DependencyRef> {
    let mut collapsed: Vec<DependencyRef> = Vec::with_capacity(dependencies.len());
    let mut positions: HashMap<String, usize> = HashMap::new();

    for dep in dependencies {
        match positions.get(&name_key(&dep.name)) {
            Some(&index) => {
                let existing = &mut collapsed[index];
                if existing.kind != dep.kind
                    && (existing.kind == DependencyKind::Dynamic || dep.kind == DependencyKind::Dynamic)
                {
                    warn!(
                        module,
                        dependency = %existing.name,
                        "dependency declared both dynamic and static; keeping {}",
                        existing.kind.max(dep.kind)
                    );
                }
                existing.kind = existing.kind.max(dep.kind);
            }
            None => {
                positions.insert(name_key(&dep.name), collapsed.len());
                collapsed.push(dep.clone());
            }
        }
    }

    collapsed
}

fn unique(items: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}
