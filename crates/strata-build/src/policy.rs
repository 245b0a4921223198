//! Per-module compilation policy
//!
//! A module declares a [`CompilePolicy`]; fragments may override individual
//! fields with a [`PolicyOverride`]. Reduction resolves the policy against a
//! build context into a [`ResolvedPolicy`] with no context-dependent values
//! left. Policies never combine across dependency edges.

use crate::context::BuildContext;
use crate::targets::TargetType;
use serde::{Deserialize, Serialize};

/// Precompiled header usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PchUsage {
    /// Let the build decide (resolves to `UseExplicitOrSharedPchs`)
    Default,
    /// Use a shared PCH from a dependency
    UseSharedPchs,
    /// Only the module's own private PCH, if any
    NoSharedPchs,
    /// Private PCH if set, shared PCH otherwise
    UseExplicitOrSharedPchs,
}

#[allow(clippy::derivable_impls)]
impl Default for PchUsage {
    fn default() -> Self {
        Self::Default
    }
}

/// When optimization is enabled for a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizeCode {
    Never,
    Always,
    /// Optimize unless the configuration is a debug one (default)
    InNonDebugBuilds,
    InShippingBuildsOnly,
}

#[allow(clippy::derivable_impls)]
impl Default for OptimizeCode {
    fn default() -> Self {
        Self::InNonDebugBuilds
    }
}

/// Which target types a module is precompiled for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecompileTargets {
    /// Never precompiled
    None,
    /// Precompiled for every target type
    Default,
    /// Game, Client and Server targets
    Game,
    /// Editor targets
    Editor,
    /// Every target type
    Any,
}

#[allow(clippy::derivable_impls)]
impl Default for PrecompileTargets {
    fn default() -> Self {
        Self::Default
    }
}

impl PrecompileTargets {
    /// Whether a module with this setting is precompiled for `target_type`
    pub fn includes(&self, target_type: TargetType) -> bool {
        match self {
            Self::None => false,
            Self::Default | Self::Any => true,
            Self::Game => target_type.is_game(),
            Self::Editor => target_type.is_editor(),
        }
    }
}

/// Declared compilation policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilePolicy {
    #[serde(default)]
    pub pch_usage: PchUsage,
    #[serde(default)]
    pub use_rtti: bool,
    #[serde(default)]
    pub enable_exceptions: bool,
    #[serde(default)]
    pub optimize: OptimizeCode,
    #[serde(default)]
    pub precompile_for: PrecompileTargets,
}

impl CompilePolicy {
    /// Apply the fields an override sets
    pub fn merge_with_override(&mut self, policy: &PolicyOverride) {
        if let Some(pch) = policy.pch_usage {
            self.pch_usage = pch;
        }
        if let Some(rtti) = policy.use_rtti {
            self.use_rtti = rtti;
        }
        if let Some(exceptions) = policy.enable_exceptions {
            self.enable_exceptions = exceptions;
        }
        if let Some(optimize) = policy.optimize {
            self.optimize = optimize;
        }
        if let Some(precompile) = policy.precompile_for {
            self.precompile_for = precompile;
        }
    }

    /// Resolve against a build context
    pub fn resolve(&self, ctx: &BuildContext) -> ResolvedPolicy {
        let pch_usage = match self.pch_usage {
            PchUsage::Default => PchUsage::UseExplicitOrSharedPchs,
            other => other,
        };

        let optimize = match self.optimize {
            OptimizeCode::Never => false,
            OptimizeCode::Always => true,
            OptimizeCode::InNonDebugBuilds => !ctx.configuration.is_debug(),
            OptimizeCode::InShippingBuildsOnly => {
                ctx.configuration == crate::context::Configuration::Shipping
            }
        };

        ResolvedPolicy {
            pch_usage,
            use_rtti: self.use_rtti,
            enable_exceptions: self.enable_exceptions,
            optimize,
            precompile: self.precompile_for.includes(ctx.target_type),
        }
    }
}

/// Policy fields a conditional fragment overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pch_usage: Option<PchUsage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_rtti: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_exceptions: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimize: Option<OptimizeCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precompile_for: Option<PrecompileTargets>,
}

impl PolicyOverride {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Context-free policy a module is compiled with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPolicy {
    pub pch_usage: PchUsage,
    pub use_rtti: bool,
    pub enable_exceptions: bool,
    pub optimize: bool,
    pub precompile: bool,
}
