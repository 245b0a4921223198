//! Typed dependency graph over the concrete modules of one build context
use crate::declaration::{name_key, DependencyKind};
use crate::error::{BuildError, BuildResult};
use crate::reduce::ConcreteModule;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// A dependency between two modules
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    /// Dependent module
    pub from: String,
    /// Dependency, under its declared name when resolved
    pub to: String,
    pub kind: DependencyKind,
    /// False only for dynamic dependencies on modules absent from the context
    pub resolved: bool,
}

/// Concrete modules plus their edges
///
/// Modules keep the order they were given in, which callers use as
/// declaration order.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    modules: Vec<ConcreteModule>,
    index: HashMap<String, usize>,
    edges: Vec<DependencyEdge>,
    /// Per module, indices into `edges`
    outgoing: Vec<Vec<usize>>,
}

impl DependencyGraph {
    /// Build the graph, checking that every static dependency resolves
    pub fn build(modules: Vec<ConcreteModule>) -> BuildResult<Self> {
        let mut index = HashMap::with_capacity(modules.len());
        for (i, module) in modules.iter().enumerate() {
            if index.insert(name_key(&module.name), i).is_some() {
                return Err(BuildError::duplicate_module(module.name.clone()));
            }
        }

        let mut modules = modules;
        let mut edges = Vec::new();
        let mut outgoing = vec![Vec::new(); modules.len()];

        for i in 0..modules.len() {
            let from = modules[i].name.clone();
            let mut canonical = Vec::with_capacity(modules[i].dependencies.len());

            for dep in &modules[i].dependencies {
                let edge = match index.get(&name_key(&dep.name)) {
                    Some(&target) => DependencyEdge {
                        from: from.clone(),
                        to: modules[target].name.clone(),
                        kind: dep.kind,
                        resolved: true,
                    },
                    None if dep.kind.is_static() => {
                        return Err(BuildError::unresolved(from, dep.name.clone()));
                    }
                    None => {
                        warn!(module = %from, dependency = %dep.name, "dynamic dependency is not available in this context");
                        DependencyEdge {
                            from: from.clone(),
                            to: dep.name.clone(),
                            kind: dep.kind,
                            resolved: false,
                        }
                    }
                };

                trace!(from = %edge.from, to = %edge.to, kind = %edge.kind, "edge");
                canonical.push(edge.to.clone());
                outgoing[i].push(edges.len());
                edges.push(edge);
            }

            for (dep, name) in modules[i].dependencies.iter_mut().zip(canonical) {
                dep.name = name;
            }
        }

        debug!(modules = modules.len(), edges = edges.len(), "dependency graph built");

        Ok(Self {
            modules,
            index,
            edges,
            outgoing,
        })
    }

    /// All modules in declaration order
    pub fn modules(&self) -> &[ConcreteModule] {
        &self.modules
    }

    /// Get a module by name (case-insensitive)
    pub fn module(&self, name: &str) -> Option<&ConcreteModule> {
        self.index_of(name).map(|i| &self.modules[i])
    }

    /// Declaration index of a module
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(&name_key(name)).copied()
    }

    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    /// Edges leaving module `index`, in declaration order
    pub fn edges_from(&self, index: usize) -> impl Iterator<Item = &DependencyEdge> {
        self.outgoing[index].iter().map(move |&e| &self.edges[e])
    }

    /// Resolved Public and Private dependencies of module `index`, as
    /// `(dependency index, kind)` pairs in declaration order
    pub fn static_dependencies(&self, index: usize) -> Vec<(usize, DependencyKind)> {
        self.edges_from(index)
            .filter(|e| e.kind.is_static() && e.resolved)
            .filter_map(|e| self.index_of(&e.to).map(|to| (to, e.kind)))
            .collect()
    }

    /// Whether both modules authorize a cycle with each other
    pub fn mutually_authorized(&self, a: usize, b: usize) -> bool {
        let (a, b) = (&self.modules[a], &self.modules[b]);
        a.allows_cycle_with(&b.name) && b.allows_cycle_with(&a.name)
    }

    /// Get module count
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if graph is empty
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{BuildContext, Configuration, Platform};
    use crate::declaration::ModuleDeclaration;
    use crate::reduce::reduce;
    use crate::targets::TargetType;

    fn concrete(decls: Vec<ModuleDeclaration>) -> Vec<ConcreteModule> {
        let ctx = BuildContext::new(Platform::Win64, Configuration::Development, TargetType::Game);
        decls.iter().map(|d| reduce(d, &ctx).unwrap()).collect()
    }

    #[test]
    fn test_build_resolves_case_insensitively() {
        let graph = DependencyGraph::build(concrete(vec![
            ModuleDeclaration::new("Core"),
            ModuleDeclaration::new("Engine").with_public_dependency("core"),
        ]))
        .unwrap();

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.edges().len(), 1);
        assert_eq!(graph.edges()[0].to, "Core");
        assert!(graph.edges()[0].resolved);
        assert_eq!(graph.module("ENGINE").unwrap().dependencies[0].name, "Core");
        assert_eq!(graph.static_dependencies(1), vec![(0, DependencyKind::Public)]);
    }

    #[test]
    fn test_missing_static_dependency() {
        let err = DependencyGraph::build(concrete(vec![
            ModuleDeclaration::new("Game").with_private_dependency("Physics"),
        ]))
        .unwrap_err();
        assert_eq!(err, BuildError::unresolved("Game", "Physics"));
    }

    #[test]
    fn test_missing_dynamic_dependency_is_unresolved_edge() {
        let graph = DependencyGraph::build(concrete(vec![
            ModuleDeclaration::new("Game").with_dynamic_dependency("OnlineSubsystem"),
        ]))
        .unwrap();
        let edge = &graph.edges()[0];
        assert_eq!(edge.kind, DependencyKind::Dynamic);
        assert!(!edge.resolved);
        assert!(graph.static_dependencies(0).is_empty());
    }

    #[test]
    fn test_duplicate_concrete_module() {
        let err = DependencyGraph::build(concrete(vec![
            ModuleDeclaration::new("Core"),
            ModuleDeclaration::new("CORE"),
        ]))
        .unwrap_err();
        assert_eq!(err, BuildError::duplicate_module("CORE"));
    }

    #[test]
    fn test_cycles_are_accepted_here() {
        let graph = DependencyGraph::build(concrete(vec![
            ModuleDeclaration::new("A").with_public_dependency("B"),
            ModuleDeclaration::new("B").with_public_dependency("A"),
        ]))
        .unwrap();
        assert_eq!(graph.edges().len(), 2);
        assert!(!graph.mutually_authorized(0, 1));
    }

    #[test]
    fn test_mutual_authorization() {
        let graph = DependencyGraph::build(concrete(vec![
            ModuleDeclaration::new("A").with_circular_override("B"),
            ModuleDeclaration::new("B").with_circular_override("a"),
            ModuleDeclaration::new("C").with_circular_override("A"),
        ]))
        .unwrap();
        assert!(graph.mutually_authorized(0, 1));
        assert!(!graph.mutually_authorized(0, 2));
    }
}
