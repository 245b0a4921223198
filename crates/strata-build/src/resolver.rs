//! Resolution pipeline
//!
//! declarations -> concrete modules -> dependency graph -> ordered graph ->
//! build plan, for one build context at a time.
use crate::context::{BuildContext, Configuration, Platform};
use crate::declaration::ModuleDeclaration;
use crate::error::{BuildError, BuildResult};
use crate::graph::DependencyGraph;
use crate::plan::BuildPlan;
use crate::planner::plan;
use crate::reduce::{is_available, reduce, ConcreteModule};
use crate::store::DeclarationStore;
use crate::visibility::propagate;
use rayon::prelude::*;
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, info, info_span};

/// Resolves build plans from a declaration store
///
/// The store is only read, so one resolver can serve many contexts at once.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    store: &'a DeclarationStore,
}

impl<'a> Resolver<'a> {
    pub fn new(store: &'a DeclarationStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &'a DeclarationStore {
        self.store
    }

    /// Plan every module available in `ctx`
    pub fn resolve(&self, ctx: &BuildContext) -> BuildResult<BuildPlan> {
        let span = info_span!("resolve", context = %ctx);
        let _enter = span.enter();

        let mut modules = Vec::with_capacity(self.store.len());
        for declaration in self.store.iter() {
            if let Some(module) = self.concrete(declaration, ctx)? {
                modules.push(module);
            }
        }
        debug!(
            declared = self.store.len(),
            available = modules.len(),
            "declarations reduced"
        );

        let plan = self.plan_modules(ctx, modules)?;
        info!(modules = plan.len(), "build plan resolved");
        Ok(plan)
    }

    /// Plan only what a target's entry modules reach
    pub fn resolve_target(
        &self,
        name: &str,
        platform: Platform,
        configuration: Configuration,
    ) -> BuildResult<BuildPlan> {
        let target = self.store.lookup_target(name)?;
        let ctx = target.context(platform, configuration);

        let span = info_span!("resolve_target", target = %target.name, context = %ctx);
        let _enter = span.enter();

        // Keyed by declaration index so the graph sees declaration order
        let mut reached: BTreeMap<usize, ConcreteModule> = BTreeMap::new();
        let mut queue = VecDeque::new();

        for entry in &target.modules {
            let declaration = self.store.lookup(entry)?;
            if !is_available(declaration, &ctx)? {
                return Err(BuildError::unresolved(target.name.clone(), declaration.name.clone()));
            }
            queue.push_back(declaration.name.clone());
        }

        while let Some(name) = queue.pop_front() {
            let Some(index) = self.store.declaration_index(&name) else {
                continue;
            };
            if reached.contains_key(&index) {
                continue;
            }
            let declaration = self.store.lookup(&name)?;
            let Some(module) = self.concrete(declaration, &ctx)? else {
                continue;
            };

            queue.extend(
                module
                    .dependencies
                    .iter()
                    .filter(|d| self.store.contains(&d.name))
                    .map(|d| d.name.clone()),
            );
            reached.insert(index, module);
        }

        debug!(
            entry_modules = target.modules.len(),
            reached = reached.len(),
            "target modules reduced"
        );

        let mut plan = self.plan_modules(&ctx, reached.into_values().collect())?;
        plan.target = Some(target.name.clone());
        plan.global_definitions
            .extend(target.definitions.iter().cloned());
        info!(modules = plan.len(), "target plan resolved");
        Ok(plan)
    }

    /// Resolve several contexts in parallel, one result per context in input order
    pub fn resolve_all(&self, contexts: &[BuildContext]) -> Vec<BuildResult<BuildPlan>> {
        contexts.par_iter().map(|ctx| self.resolve(ctx)).collect()
    }

    fn concrete(
        &self,
        declaration: &ModuleDeclaration,
        ctx: &BuildContext,
    ) -> BuildResult<Option<ConcreteModule>> {
        if !is_available(declaration, ctx)? {
            debug!(module = %declaration.name, "not available in this context");
            return Ok(None);
        }
        reduce(declaration, ctx).map(Some)
    }

    fn plan_modules(
        &self,
        ctx: &BuildContext,
        modules: Vec<ConcreteModule>,
    ) -> BuildResult<BuildPlan> {
        let graph = DependencyGraph::build(modules)?;
        let ordered = plan(graph)?;
        Ok(propagate(&ordered, ctx))
    }
}
