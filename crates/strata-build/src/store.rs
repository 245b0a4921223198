//! Declaration store
//!
//! Holds every module and target declaration for a project. Lookups are
//! case-insensitive; iteration follows registration order, which is the
//! declaration order the planner reports cycles in.
use crate::declaration::{name_key, ModuleDeclaration};
use crate::error::{BuildError, BuildResult};
use crate::targets::TargetDeclaration;
use std::collections::HashMap;
use tracing::trace;

/// Registry of module and target declarations
#[derive(Debug, Clone, Default)]
pub struct DeclarationStore {
    modules: Vec<ModuleDeclaration>,
    module_index: HashMap<String, usize>,
    targets: Vec<TargetDeclaration>,
    target_index: HashMap<String, usize>,
}

impl DeclarationStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module declaration
    pub fn register(&mut self, declaration: ModuleDeclaration) -> BuildResult<()> {
        declaration.validate()?;

        let key = declaration.key();
        if let Some(&existing) = self.module_index.get(&key) {
            return Err(BuildError::duplicate_module(
                self.modules[existing].name.clone(),
            ));
        }

        trace!(module = %declaration.name, "registered module");
        self.module_index.insert(key, self.modules.len());
        self.modules.push(declaration);
        Ok(())
    }

    /// Register every declaration, stopping at the first failure
    pub fn register_all(
        &mut self,
        declarations: impl IntoIterator<Item = ModuleDeclaration>,
    ) -> BuildResult<()> {
        for declaration in declarations {
            self.register(declaration)?;
        }
        Ok(())
    }

    /// Look up a module by name (case-insensitive)
    pub fn lookup(&self, name: &str) -> BuildResult<&ModuleDeclaration> {
        self.module_index
            .get(&name_key(name))
            .map(|&index| &self.modules[index])
            .ok_or_else(|| BuildError::unknown_module(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.module_index.contains_key(&name_key(name))
    }

    /// Position of a module in registration order
    pub fn declaration_index(&self, name: &str) -> Option<usize> {
        self.module_index.get(&name_key(name)).copied()
    }

    /// All module declarations in registration order
    pub fn iter(&self) -> impl Iterator<Item = &ModuleDeclaration> {
        self.modules.iter()
    }

    /// Number of registered modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Register a target declaration
    pub fn register_target(&mut self, target: TargetDeclaration) -> BuildResult<()> {
        target.validate().map_err(BuildError::InvalidTarget)?;

        let key = name_key(&target.name);
        if self.target_index.contains_key(&key) {
            return Err(BuildError::DuplicateTarget { name: target.name });
        }

        trace!(target = %target.name, "registered target");
        self.target_index.insert(key, self.targets.len());
        self.targets.push(target);
        Ok(())
    }

    /// Look up a target by name (case-insensitive)
    pub fn lookup_target(&self, name: &str) -> BuildResult<&TargetDeclaration> {
        self.target_index
            .get(&name_key(name))
            .map(|&index| &self.targets[index])
            .ok_or_else(|| BuildError::UnknownTarget {
                name: name.to_string(),
            })
    }

    /// All target declarations in registration order
    pub fn targets(&self) -> &[TargetDeclaration] {
        &self.targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targets::TargetType;

    fn store_with(names: &[&str]) -> DeclarationStore {
        let mut store = DeclarationStore::new();
        for name in names {
            store.register(ModuleDeclaration::new(*name)).unwrap();
        }
        store
    }

    #[test]
    fn test_register_and_lookup() {
        let store = store_with(&["Core", "Engine"]);
        assert_eq!(store.len(), 2);
        assert!(!store.is_empty());
        assert_eq!(store.lookup("engine").unwrap().name, "Engine");
        assert!(store.contains("CORE"));
    }

    #[test]
    fn test_duplicate_is_case_insensitive() {
        let mut store = store_with(&["Core"]);
        let err = store.register(ModuleDeclaration::new("core")).unwrap_err();
        assert_eq!(err, BuildError::duplicate_module("Core"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_lookup_unknown() {
        let store = store_with(&["Core"]);
        assert_eq!(
            store.lookup("Physics").unwrap_err(),
            BuildError::unknown_module("Physics")
        );
    }

    #[test]
    fn test_iteration_follows_registration_order() {
        let store = store_with(&["Zeta", "Alpha", "Mid"]);
        let names: Vec<_> = store.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mid"]);
        assert_eq!(store.declaration_index("alpha"), Some(1));
    }

    #[test]
    fn test_dangling_references_are_accepted() {
        let mut store = DeclarationStore::new();
        let decl = ModuleDeclaration::new("Game").with_public_dependency("DoesNotExist");
        assert!(store.register(decl).is_ok());
    }

    #[test]
    fn test_targets() {
        let mut store = DeclarationStore::new();
        let target = TargetDeclaration::new("MyGame", TargetType::Game).with_module("Launch");
        store.register_target(target.clone()).unwrap();

        assert_eq!(store.lookup_target("mygame").unwrap(), &target);
        assert!(matches!(
            store.register_target(target),
            Err(BuildError::DuplicateTarget { .. })
        ));
        assert!(matches!(
            store.lookup_target("Other"),
            Err(BuildError::UnknownTarget { .. })
        ));
        assert!(matches!(
            store.register_target(TargetDeclaration::new("Empty", TargetType::Game)),
            Err(BuildError::InvalidTarget(_))
        ));
        assert_eq!(store.targets().len(), 1);
    }
}
