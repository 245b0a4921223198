/// Target types and top-level target declarations
use crate::context::{AxisParseError, BuildContext, Configuration, Platform};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Kind of top-level build product
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TargetType {
    /// Cooked monolithic game executable
    Game,
    /// Uncooked modular editor
    Editor,
    /// Game executable without server code
    Client,
    /// Game server without client code
    Server,
    /// Standalone program
    Program,
}

impl TargetType {
    pub const ALL: [TargetType; 5] = [
        Self::Game,
        Self::Editor,
        Self::Client,
        Self::Server,
        Self::Program,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Game => "Game",
            Self::Editor => "Editor",
            Self::Client => "Client",
            Self::Server => "Server",
            Self::Program => "Program",
        }
    }

    /// Whether this target includes editor code
    pub fn is_editor(&self) -> bool {
        matches!(self, Self::Editor)
    }

    /// Whether this target compiles server code
    pub fn has_server_code(&self) -> bool {
        !matches!(self, Self::Client)
    }

    /// Whether this is one of the game-flavoured target types
    pub fn is_game(&self) -> bool {
        matches!(self, Self::Game | Self::Client | Self::Server)
    }
}

impl FromStr for TargetType {
    type Err = AxisParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AxisParseError::new("target type", s))
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A top-level build product: entry modules plus the target type they build as
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDeclaration {
    /// Target name
    pub name: String,
    /// Target type
    pub target_type: TargetType,
    /// Entry modules; everything they reach is part of the target
    pub modules: Vec<String>,
    /// Extra global definitions for every module in the target
    #[serde(default)]
    pub definitions: Vec<String>,
    /// Toggles enabled whenever this target is resolved
    #[serde(default)]
    pub toggles: BTreeSet<String>,
}

impl TargetDeclaration {
    /// Create a new target declaration
    pub fn new(name: impl Into<String>, target_type: TargetType) -> Self {
        Self {
            name: name.into(),
            target_type,
            modules: Vec::new(),
            definitions: Vec::new(),
            toggles: BTreeSet::new(),
        }
    }

    /// Add an entry module
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.modules.push(module.into());
        self
    }

    /// Set the entry modules
    pub fn with_modules(mut self, modules: Vec<String>) -> Self {
        self.modules = modules;
        self
    }

    /// Add a global definition
    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definitions.push(definition.into());
        self
    }

    /// Enable a toggle for this target
    pub fn with_toggle(mut self, toggle: impl Into<String>) -> Self {
        self.toggles.insert(toggle.into());
        self
    }

    /// Build the context this target resolves in
    pub fn context(&self, platform: Platform, configuration: Configuration) -> BuildContext {
        BuildContext::new(platform, configuration, self.target_type)
            .with_toggles(self.toggles.iter().cloned())
    }

    /// Validate the target declaration
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Target name cannot be empty".to_string());
        }

        if self.modules.is_empty() {
            return Err(format!(
                "{} target '{}' has no entry modules",
                self.target_type, self.name
            ));
        }

        if let Some(empty) = self.modules.iter().position(|m| m.trim().is_empty()) {
            return Err(format!(
                "Target '{}' has an empty module name at position {}",
                self.name, empty
            ));
        }

        Ok(())
    }
}
