//! Strata build-plan resolver
//!
//! Turns a collection of module declarations into a deterministic build
//! plan for one (platform, configuration, target type) context:
//! - Declaration store with case-insensitive lookups
//! - Condition evaluation and reduction to concrete modules
//! - Typed dependency graph (Public, Private, Dynamic)
//! - Cycle detection with mutual circular overrides, and compile ordering
//! - Include-path and definition visibility propagation

pub mod condition;
pub mod context;
pub mod declaration;
pub mod error;
pub mod graph;
pub mod plan;
pub mod planner;
pub mod policy;
pub mod reduce;
pub mod resolver;
pub mod store;
pub mod targets;
pub mod visibility;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export main types
pub use condition::{Axis, AxisTest, Predicate};
pub use context::{AxisParseError, BuildContext, Configuration, Platform, PlatformGroup};
pub use declaration::{
    name_key, ConditionalFragment, DependencyKind, DependencyRef, ModuleDeclaration,
    ModuleEntries,
};
pub use error::{BuildError, BuildResult};
pub use graph::{DependencyEdge, DependencyGraph};
pub use plan::{BuildPlan, PlanSummary, PlannedModule};
pub use planner::OrderedGraph;
pub use policy::{
    CompilePolicy, OptimizeCode, PchUsage, PolicyOverride, PrecompileTargets, ResolvedPolicy,
};
pub use reduce::{is_available, reduce, ConcreteModule};
pub use resolver::Resolver;
pub use store::DeclarationStore;
pub use targets::{TargetDeclaration, TargetType};
pub use visibility::propagate;
