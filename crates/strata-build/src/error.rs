//! Resolver error types
//!
//! Every variant names the module(s) or target involved so the declarations
//! can be corrected without knowing anything about resolver internals.
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Module '{name}' is declared more than once (names are case-insensitive)")]
    DuplicateModule { name: String },

    #[error("Module not found: {name}")]
    UnknownModule { name: String },

    #[error("Invalid condition '{fragment}': {reason}")]
    InvalidCondition { fragment: String, reason: String },

    #[error("Module '{module}' depends on '{missing}', which is not declared for this build context")]
    UnresolvedDependency { module: String, missing: String },

    #[error("Circular dependency without mutual circular override between: {}", modules.join(", "))]
    UnauthorizedCycle { modules: Vec<String> },

    #[error("Target '{name}' is declared more than once")]
    DuplicateTarget { name: String },

    #[error("Target not found: {name}")]
    UnknownTarget { name: String },

    #[error("Invalid target configuration: {0}")]
    InvalidTarget(String),

    #[error("Invalid declaration for module '{module}': {reason}")]
    InvalidDeclaration { module: String, reason: String },
}

impl BuildError {
    /// Create a duplicate module error
    pub fn duplicate_module(name: impl Into<String>) -> Self {
        Self::DuplicateModule { name: name.into() }
    }

    /// Create a module not found error
    pub fn unknown_module(name: impl Into<String>) -> Self {
        Self::UnknownModule { name: name.into() }
    }

    /// Create an invalid condition error
    pub fn invalid_condition(fragment: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidCondition {
            fragment: fragment.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an unresolved dependency error
    pub fn unresolved(module: impl Into<String>, missing: impl Into<String>) -> Self {
        Self::UnresolvedDependency {
            module: module.into(),
            missing: missing.into(),
        }
    }

    /// Create an unauthorized cycle error
    pub fn unauthorized_cycle(modules: Vec<String>) -> Self {
        Self::UnauthorizedCycle { modules }
    }

    /// Names of the modules this error implicates
    pub fn modules(&self) -> Vec<&str> {
        match self {
            Self::DuplicateModule { name } | Self::UnknownModule { name } => vec![name.as_str()],
            Self::UnresolvedDependency { module, missing } => {
                vec![module.as_str(), missing.as_str()]
            }
            Self::UnauthorizedCycle { modules } => modules.iter().map(String::as_str).collect(),
            Self::InvalidDeclaration { module, .. } => vec![module.as_str()],
            Self::InvalidCondition { .. }
            | Self::DuplicateTarget { .. }
            | Self::UnknownTarget { .. }
            | Self::InvalidTarget(_) => Vec::new(),
        }
    }
}
