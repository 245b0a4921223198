//! The build plan handed to toolchain collaborators
use crate::context::BuildContext;
use crate::declaration::{name_key, DependencyKind};
use crate::policy::ResolvedPolicy;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// One module in the plan, ready to compile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedModule {
    pub name: String,
    /// Include paths the module compiles with
    pub include_paths: Vec<String>,
    /// Definitions the module compiles with
    pub definitions: Vec<String>,
    /// Include paths re-exported to dependents
    pub exported_include_paths: Vec<String>,
    /// Definitions re-exported to dependents
    pub exported_definitions: Vec<String>,
    /// Direct dependencies by kind, declaration order
    pub dependencies: BTreeMap<DependencyKind, Vec<String>>,
    /// Dynamic dependencies not available in this context
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved_dynamic: Vec<String>,
    pub policy: ResolvedPolicy,
    /// Members of the dependency cycle this module is compiled with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle_unit: Option<Vec<String>>,
}

impl PlannedModule {
    /// Direct dependencies of one kind
    pub fn dependencies_of(&self, kind: DependencyKind) -> &[String] {
        self.dependencies.get(&kind).map_or(&[], Vec::as_slice)
    }
}

/// Plan statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    /// Number of modules in the plan
    pub modules: usize,
    /// Number of resolved Public and Private edges
    pub static_edges: usize,
    /// Number of Dynamic edges, resolved or not
    pub dynamic_edges: usize,
    /// Members of every contracted cycle, in compile order
    pub cycle_units: Vec<Vec<String>>,
    /// Number of Dynamic edges to modules absent from the context
    pub unresolved_dynamic: usize,
}

/// Deterministic build plan for one context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPlan {
    pub context: BuildContext,
    /// Target this plan was resolved for, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Definitions every module compiles with
    pub global_definitions: Vec<String>,
    /// Modules in compile order
    pub modules: Vec<PlannedModule>,
    /// Levels of modules that can compile concurrently
    pub parallel_groups: Vec<Vec<String>>,
    pub summary: PlanSummary,
}

impl BuildPlan {
    /// Get a module by name (case-insensitive)
    pub fn module(&self, name: &str) -> Option<&PlannedModule> {
        self.position(name).map(|i| &self.modules[i])
    }

    /// Position of a module in compile order
    pub fn position(&self, name: &str) -> Option<usize> {
        let key = name_key(name);
        self.modules.iter().position(|m| name_key(&m.name) == key)
    }

    /// Module names in compile order
    pub fn order(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// SHA-256 of the compact JSON form, hex encoded
    ///
    /// Equal declarations and contexts always give equal fingerprints.
    pub fn fingerprint(&self) -> serde_json::Result<String> {
        let bytes = serde_json::to_vec(self)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Configuration, Platform};
    use crate::policy::PchUsage;
    use crate::targets::TargetType;

    fn planned(name: &str) -> PlannedModule {
        PlannedModule {
            name: name.to_string(),
            include_paths: Vec::new(),
            definitions: Vec::new(),
            exported_include_paths: Vec::new(),
            exported_definitions: Vec::new(),
            dependencies: BTreeMap::new(),
            unresolved_dynamic: Vec::new(),
            policy: ResolvedPolicy {
                pch_usage: PchUsage::UseExplicitOrSharedPchs,
                use_rtti: false,
                enable_exceptions: false,
                optimize: true,
                precompile: true,
            },
            cycle_unit: None,
        }
    }

    fn plan() -> BuildPlan {
        let mut game = planned("Game");
        game.dependencies
            .insert(DependencyKind::Public, vec!["Core".to_string()]);
        BuildPlan {
            context: BuildContext::new(Platform::Win64, Configuration::Development, TargetType::Game),
            target: None,
            global_definitions: Vec::new(),
            modules: vec![planned("Core"), game],
            parallel_groups: vec![vec!["Core".to_string()], vec!["Game".to_string()]],
            summary: PlanSummary {
                modules: 2,
                static_edges: 1,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_module_lookup() {
        let plan = plan();
        assert_eq!(plan.position("game"), Some(1));
        assert_eq!(plan.module("CORE").unwrap().name, "Core");
        assert!(plan.module("Physics").is_none());
        assert_eq!(plan.order(), vec!["Core", "Game"]);
        assert_eq!(
            plan.module("Game").unwrap().dependencies_of(DependencyKind::Public),
            ["Core".to_string()]
        );
        assert!(plan
            .module("Game")
            .unwrap()
            .dependencies_of(DependencyKind::Private)
            .is_empty());
    }

    #[test]
    fn test_json_uses_lowercase_kinds() {
        let json = plan().to_json().unwrap();
        assert!(json.contains("\"public\""));
        assert!(!json.contains("\"cycle_unit\""));
        let back: BuildPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plan());
    }

    #[test]
    fn test_fingerprint_is_stable_and_sensitive() {
        let a = plan().fingerprint().unwrap();
        assert_eq!(a.len(), 64);
        assert_eq!(a, plan().fingerprint().unwrap());

        let mut changed = plan();
        changed.modules[0].definitions.push("X=1".to_string());
        assert_ne!(a, changed.fingerprint().unwrap());
    }
}
