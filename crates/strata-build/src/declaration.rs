//! Module declarations as loaded, before any build context is applied
use crate::condition::Predicate;
use crate::error::{BuildError, BuildResult};
use crate::policy::{CompilePolicy, PolicyOverride};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Case-folded form of a module or target name
///
/// Every case-insensitive name comparison goes through this key.
pub fn name_key(name: &str) -> String {
    name.to_lowercase()
}

/// How a module depends on another
///
/// Ordered by strength, so the derived `Ord` picks the kind to keep when
/// one name is listed under several kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// Loaded at runtime; no ordering or visibility
    Dynamic,
    /// Compile-before, with the dependency's public entries visible only to this module
    Private,
    /// Compile-before, re-exported to every dependent
    Public,
}

impl DependencyKind {
    pub const ALL: [DependencyKind; 3] = [Self::Public, Self::Private, Self::Dynamic];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Dynamic => "dynamic",
            Self::Private => "private",
            Self::Public => "public",
        }
    }

    /// Whether edges of this kind constrain compile order
    pub fn is_static(&self) -> bool {
        !matches!(self, Self::Dynamic)
    }
}

impl FromStr for DependencyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown dependency kind '{}'", s))
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named reference to another module
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyRef {
    pub name: String,
    pub kind: DependencyKind,
}

impl DependencyRef {
    pub fn new(name: impl Into<String>, kind: DependencyKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Dependencies, include paths and definitions a declaration (or one of
/// its fragments) contributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleEntries {
    /// Dependency references in declaration order, all kinds interleaved
    #[serde(default)]
    pub dependencies: Vec<DependencyRef>,
    #[serde(default)]
    pub public_include_paths: Vec<String>,
    #[serde(default)]
    pub private_include_paths: Vec<String>,
    #[serde(default)]
    pub public_definitions: Vec<String>,
    #[serde(default)]
    pub private_definitions: Vec<String>,
}

impl ModuleEntries {
    pub fn add_dependency(&mut self, name: impl Into<String>, kind: DependencyKind) {
        self.dependencies.push(DependencyRef::new(name, kind));
    }

    /// Dependency names of one kind, in declaration order
    pub fn dependencies_of(&self, kind: DependencyKind) -> impl Iterator<Item = &str> {
        self.dependencies
            .iter()
            .filter(move |d| d.kind == kind)
            .map(|d| d.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
            && self.public_include_paths.is_empty()
            && self.private_include_paths.is_empty()
            && self.public_definitions.is_empty()
            && self.private_definitions.is_empty()
    }
}

/// Entries and policy overrides that apply only when a predicate holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalFragment {
    pub condition: Predicate,
    pub entries: ModuleEntries,
    pub policy: PolicyOverride,
}

impl ConditionalFragment {
    pub fn new(condition: Predicate) -> Self {
        Self {
            condition,
            entries: ModuleEntries::default(),
            policy: PolicyOverride::default(),
        }
    }

    pub fn with_public_dependency(mut self, name: impl Into<String>) -> Self {
        self.entries.add_dependency(name, DependencyKind::Public);
        self
    }

    pub fn with_private_dependency(mut self, name: impl Into<String>) -> Self {
        self.entries.add_dependency(name, DependencyKind::Private);
        self
    }

    pub fn with_dynamic_dependency(mut self, name: impl Into<String>) -> Self {
        self.entries.add_dependency(name, DependencyKind::Dynamic);
        self
    }

    pub fn with_public_include(mut self, path: impl Into<String>) -> Self {
        self.entries.public_include_paths.push(path.into());
        self
    }

    pub fn with_private_include(mut self, path: impl Into<String>) -> Self {
        self.entries.private_include_paths.push(path.into());
        self
    }

    pub fn with_public_definition(mut self, definition: impl Into<String>) -> Self {
        self.entries.public_definitions.push(definition.into());
        self
    }

    pub fn with_private_definition(mut self, definition: impl Into<String>) -> Self {
        self.entries.private_definitions.push(definition.into());
        self
    }

    /// Set the policy fields this fragment overrides
    pub fn with_policy(mut self, policy: PolicyOverride) -> Self {
        self.policy = policy;
        self
    }
}

/// A module as declared: unconditional entries, conditional fragments,
/// policy and circular-override authorizations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDeclaration {
    /// Module name, unique case-insensitively
    pub name: String,
    /// Unconditional entries
    pub entries: ModuleEntries,
    /// Conditional fragments, applied in order
    pub fragments: Vec<ConditionalFragment>,
    pub policy: CompilePolicy,
    /// Modules this one may form a dependency cycle with
    pub circular_overrides: Vec<String>,
    /// When set, the module exists only in contexts where this holds
    pub available_when: Option<Predicate>,
}

impl ModuleDeclaration {
    /// Create a declaration with no entries
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: ModuleEntries::default(),
            fragments: Vec::new(),
            policy: CompilePolicy::default(),
            circular_overrides: Vec::new(),
            available_when: None,
        }
    }

    pub fn with_public_dependency(mut self, name: impl Into<String>) -> Self {
        self.entries.add_dependency(name, DependencyKind::Public);
        self
    }

    pub fn with_private_dependency(mut self, name: impl Into<String>) -> Self {
        self.entries.add_dependency(name, DependencyKind::Private);
        self
    }

    pub fn with_dynamic_dependency(mut self, name: impl Into<String>) -> Self {
        self.entries.add_dependency(name, DependencyKind::Dynamic);
        self
    }

    pub fn with_public_include(mut self, path: impl Into<String>) -> Self {
        self.entries.public_include_paths.push(path.into());
        self
    }

    pub fn with_private_include(mut self, path: impl Into<String>) -> Self {
        self.entries.private_include_paths.push(path.into());
        self
    }

    pub fn with_public_definition(mut self, definition: impl Into<String>) -> Self {
        self.entries.public_definitions.push(definition.into());
        self
    }

    pub fn with_private_definition(mut self, definition: impl Into<String>) -> Self {
        self.entries.private_definitions.push(definition.into());
        self
    }

    pub fn with_fragment(mut self, fragment: ConditionalFragment) -> Self {
        self.fragments.push(fragment);
        self
    }

    pub fn with_policy(mut self, policy: CompilePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Authorize a cycle with `module`; the other side must authorize it too
    pub fn with_circular_override(mut self, module: impl Into<String>) -> Self {
        self.circular_overrides.push(module.into());
        self
    }

    /// Restrict the module to contexts where `condition` holds
    pub fn with_availability(mut self, condition: Predicate) -> Self {
        self.available_when = Some(condition);
        self
    }

    /// Lowercased name used for case-insensitive lookups
    pub fn key(&self) -> String {
        name_key(&self.name)
    }

    /// Whether this module authorizes a cycle with `module`
    pub fn allows_cycle_with(&self, module: &str) -> bool {
        let key = name_key(module);
        self.circular_overrides.iter().any(|m| name_key(m) == key)
    }

    /// Check the declaration's own shape
    ///
    /// Names and every condition, whether or not it would be evaluated in a
    /// given context; references to other modules are checked when the
    /// graph is built for a context.
    pub fn validate(&self) -> BuildResult<()> {
        let invalid = |reason: String| BuildError::InvalidDeclaration {
            module: self.name.clone(),
            reason,
        };

        if self.name.trim().is_empty() {
            return Err(invalid("module name cannot be empty".to_string()));
        }
        if self.name.chars().any(char::is_whitespace) {
            return Err(invalid("module name cannot contain whitespace".to_string()));
        }

        let all_entries =
            std::iter::once(&self.entries).chain(self.fragments.iter().map(|f| &f.entries));
        for entries in all_entries {
            if let Some(dep) = entries.dependencies.iter().find(|d| d.name.trim().is_empty()) {
                return Err(invalid(format!("empty {} dependency name", dep.kind)));
            }
        }

        if self.circular_overrides.iter().any(|m| m.trim().is_empty()) {
            return Err(invalid("empty circular override name".to_string()));
        }

        if let Some(condition) = &self.available_when {
            condition.validate()?;
        }
        self.fragments
            .iter()
            .try_for_each(|fragment| fragment.condition.validate())
    }
}
