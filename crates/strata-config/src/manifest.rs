//! Module descriptors (`*.module.toml`)
//!
//! One descriptor declares one module:
//!
//! ```toml
//! [module]
//! name = "Engine"
//! public_dependencies = ["Core"]
//! private_dependencies = ["RenderCore"]
//! public_include_paths = ["Public"]
//! available_when = "group=Desktop"
//!
//! [module.policy]
//! pch_usage = "no_shared_pchs"
//!
//! [[when]]
//! condition = "platform=Linux && config!=Shipping"
//! private_dependencies = ["LinuxCommon"]
//! ```
//!
//! Include paths are relative to the descriptor's directory.

use crate::{read_toml, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use strata_build::{
    BuildResult, CompilePolicy, ConditionalFragment, DependencyKind, ModuleDeclaration,
    ModuleEntries, PolicyOverride, Predicate,
};

/// File name suffix that marks a module descriptor
pub const DESCRIPTOR_SUFFIX: &str = ".module.toml";

/// A parsed module descriptor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ModuleManifest {
    pub module: ModuleSection,

    /// Conditional fragments, applied in file order
    #[serde(default, rename = "when")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fragments: Vec<FragmentSection>,
}

/// The `[module]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ModuleSection {
    pub name: String,
    #[serde(default)]
    pub public_dependencies: Vec<String>,
    #[serde(default)]
    pub private_dependencies: Vec<String>,
    #[serde(default)]
    pub dynamic_dependencies: Vec<String>,
    #[serde(default)]
    pub public_include_paths: Vec<String>,
    #[serde(default)]
    pub private_include_paths: Vec<String>,
    #[serde(default)]
    pub public_definitions: Vec<String>,
    #[serde(default)]
    pub private_definitions: Vec<String>,
    /// Modules this one may form a cycle with
    #[serde(default)]
    pub circular_overrides: Vec<String>,
    /// Condition under which the module exists at all
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_when: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<CompilePolicy>,
}

/// A `[[when]]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FragmentSection {
    /// Predicate in textual form
    pub condition: String,
    #[serde(default)]
    pub public_dependencies: Vec<String>,
    #[serde(default)]
    pub private_dependencies: Vec<String>,
    #[serde(default)]
    pub dynamic_dependencies: Vec<String>,
    #[serde(default)]
    pub public_include_paths: Vec<String>,
    #[serde(default)]
    pub private_include_paths: Vec<String>,
    #[serde(default)]
    pub public_definitions: Vec<String>,
    #[serde(default)]
    pub private_definitions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<PolicyOverride>,
}

/// Borrowed view of the entry lists both tables share
struct EntryLists<'a> {
    public_dependencies: &'a [String],
    private_dependencies: &'a [String],
    dynamic_dependencies: &'a [String],
    public_include_paths: &'a [String],
    private_include_paths: &'a [String],
    public_definitions: &'a [String],
    private_definitions: &'a [String],
}

impl EntryLists<'_> {
    fn to_entries(&self, base: &Path) -> ModuleEntries {
        let mut entries = ModuleEntries::default();
        for (names, kind) in [
            (self.public_dependencies, DependencyKind::Public),
            (self.private_dependencies, DependencyKind::Private),
            (self.dynamic_dependencies, DependencyKind::Dynamic),
        ] {
            for name in names {
                entries.add_dependency(name, kind);
            }
        }
        entries.public_include_paths = relative_paths(base, self.public_include_paths);
        entries.private_include_paths = relative_paths(base, self.private_include_paths);
        entries.public_definitions = self.public_definitions.to_vec();
        entries.private_definitions = self.private_definitions.to_vec();
        entries
    }
}

fn relative_paths(base: &Path, paths: &[String]) -> Vec<String> {
    paths
        .iter()
        .map(|p| base.join(p).to_string_lossy().replace('\\', "/"))
        .collect()
}

impl ModuleManifest {
    /// Load a descriptor from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        read_toml(path)
    }

    /// Module name
    pub fn name(&self) -> &str {
        &self.module.name
    }

    /// Convert to a module declaration
    ///
    /// `base` is the descriptor's directory relative to the project root;
    /// include paths are joined onto it.
    pub fn to_declaration(&self, base: &Path) -> BuildResult<ModuleDeclaration> {
        let module = &self.module;
        let mut declaration = ModuleDeclaration::new(&module.name);
        declaration.entries = EntryLists {
            public_dependencies: &module.public_dependencies,
            private_dependencies: &module.private_dependencies,
            dynamic_dependencies: &module.dynamic_dependencies,
            public_include_paths: &module.public_include_paths,
            private_include_paths: &module.private_include_paths,
            public_definitions: &module.public_definitions,
            private_definitions: &module.private_definitions,
        }
        .to_entries(base);
        declaration.circular_overrides = module.circular_overrides.clone();

        if let Some(policy) = &module.policy {
            declaration = declaration.with_policy(policy.clone());
        }
        if let Some(condition) = &module.available_when {
            declaration = declaration.with_availability(Predicate::parse(condition)?);
        }

        for fragment in &self.fragments {
            let mut conditional = ConditionalFragment::new(Predicate::parse(&fragment.condition)?);
            conditional.entries = EntryLists {
                public_dependencies: &fragment.public_dependencies,
                private_dependencies: &fragment.private_dependencies,
                dynamic_dependencies: &fragment.dynamic_dependencies,
                public_include_paths: &fragment.public_include_paths,
                private_include_paths: &fragment.private_include_paths,
                public_definitions: &fragment.public_definitions,
                private_definitions: &fragment.private_definitions,
            }
            .to_entries(base);
            if let Some(policy) = &fragment.policy {
                conditional = conditional.with_policy(policy.clone());
            }
            declaration = declaration.with_fragment(conditional);
        }

        declaration.validate()?;
        Ok(declaration)
    }
}
