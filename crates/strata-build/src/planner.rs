//! Cycle resolution and compile ordering
//!
//! Strongly connected components of the Public+Private subgraph are found
//! with an iterative Tarjan pass. A component with more than one member (or
//! a single member depending on itself) is only allowed when every pair of
//! members authorizes the cycle from both sides, and every member that
//! depends on itself lists itself as an override. Authorized components are
//! contracted into one unit and the resulting DAG is ordered with Kahn's
//! algorithm, ties broken by the unit's smallest member name.
use crate::declaration::name_key;
use crate::error::{BuildError, BuildResult};
use crate::graph::DependencyGraph;
use crate::reduce::ConcreteModule;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use tracing::{debug, warn};

/// A dependency graph with a compile order
#[derive(Debug, Clone)]
pub struct OrderedGraph {
    graph: DependencyGraph,
    /// Units in compile order; members by declaration index, ascending
    units: Vec<Vec<usize>>,
    /// Per unit, the units it depends on (positions in `units`)
    unit_dependencies: Vec<Vec<usize>>,
    /// Per unit, whether it is a dependency cycle
    cyclic: Vec<bool>,
    /// Per module, its unit position
    unit_of: Vec<usize>,
}

impl OrderedGraph {
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Units in compile order, as declaration indices
    pub fn units(&self) -> &[Vec<usize>] {
        &self.units
    }

    /// Position of the unit containing module `index`
    pub fn unit_of(&self, index: usize) -> usize {
        self.unit_of[index]
    }

    /// Units that unit `unit` depends on
    pub fn unit_dependencies(&self, unit: usize) -> &[usize] {
        &self.unit_dependencies[unit]
    }

    /// Whether unit `unit` is a contracted dependency cycle
    pub fn is_cycle(&self, unit: usize) -> bool {
        self.cyclic[unit]
    }

    /// Modules in compile order
    pub fn modules(&self) -> impl Iterator<Item = &ConcreteModule> {
        self.units
            .iter()
            .flatten()
            .map(move |&i| &self.graph.modules()[i])
    }

    /// Module names in compile order
    pub fn order(&self) -> Vec<&str> {
        self.modules().map(|m| m.name.as_str()).collect()
    }

    /// Member names of every cycle unit, in compile order
    pub fn cycle_units(&self) -> Vec<Vec<String>> {
        self.units
            .iter()
            .zip(&self.cyclic)
            .filter(|(_, cyclic)| **cyclic)
            .map(|(members, _)| self.names(members))
            .collect()
    }

    /// Group modules into levels that can be compiled concurrently
    ///
    /// Every unit lands one level after the deepest unit it depends on.
    /// Levels are sorted by name; members of a cycle unit stay adjacent.
    pub fn parallel_groups(&self) -> Vec<Vec<String>> {
        let mut level = vec![0usize; self.units.len()];
        for unit in 0..self.units.len() {
            level[unit] = self.unit_dependencies[unit]
                .iter()
                .map(|&dep| level[dep] + 1)
                .max()
                .unwrap_or(0);
        }

        let depth = level.iter().max().map_or(0, |max| max + 1);
        let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); depth];
        for (unit, &l) in level.iter().enumerate() {
            buckets[l].push(unit);
        }

        buckets
            .into_iter()
            .map(|mut units| {
                units.sort_by_key(|&u| self.unit_key(u));
                units
                    .into_iter()
                    .flat_map(|u| self.names(&self.units[u]))
                    .collect()
            })
            .collect()
    }

    fn names(&self, members: &[usize]) -> Vec<String> {
        members
            .iter()
            .map(|&i| self.graph.modules()[i].name.clone())
            .collect()
    }

    fn unit_key(&self, unit: usize) -> (String, String) {
        smallest_name(&self.graph, &self.units[unit])
    }
}

/// Order a dependency graph, rejecting unauthorized cycles
pub fn plan(graph: DependencyGraph) -> BuildResult<OrderedGraph> {
    let n = graph.len();
    let adjacency: Vec<Vec<usize>> = (0..n)
        .map(|i| {
            graph
                .static_dependencies(i)
                .into_iter()
                .map(|(to, _)| to)
                .collect()
        })
        .collect();

    let components = strongly_connected(&adjacency);
    debug!(components = components.len(), "strongly connected components found");

    let mut component_of = vec![0usize; n];
    for (c, members) in components.iter().enumerate() {
        for &m in members {
            component_of[m] = c;
        }
    }

    let cyclic: Vec<bool> = components
        .iter()
        .map(|members| members.len() > 1 || adjacency[members[0]].contains(&members[0]))
        .collect();

    check_authorized(&graph, &adjacency, &components, &cyclic)?;
    warn_one_sided_overrides(&graph, &component_of);

    // Contracted DAG: an edge from each dependency unit to its dependents
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); components.len()];
    let mut dependencies: Vec<Vec<usize>> = vec![Vec::new(); components.len()];
    let mut seen = HashSet::new();
    for (from, deps) in adjacency.iter().enumerate() {
        for &to in deps {
            let (cf, ct) = (component_of[from], component_of[to]);
            if cf != ct && seen.insert((ct, cf)) {
                dependents[ct].push(cf);
                dependencies[cf].push(ct);
            }
        }
    }

    let mut in_degree: Vec<usize> = dependencies.iter().map(Vec::len).collect();
    let keys: Vec<(String, String)> = components
        .iter()
        .map(|members| smallest_name(&graph, members))
        .collect();

    let mut ready: BinaryHeap<Reverse<(&str, &str, usize)>> = BinaryHeap::new();
    for (c, &degree) in in_degree.iter().enumerate() {
        if degree == 0 {
            ready.push(Reverse((keys[c].0.as_str(), keys[c].1.as_str(), c)));
        }
    }

    let mut sorted = Vec::with_capacity(components.len());
    while let Some(Reverse((_, _, c))) = ready.pop() {
        sorted.push(c);
        for &dependent in &dependents[c] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                let key = &keys[dependent];
                ready.push(Reverse((key.0.as_str(), key.1.as_str(), dependent)));
            }
        }
    }

    let mut position = vec![0usize; components.len()];
    for (p, &c) in sorted.iter().enumerate() {
        position[c] = p;
    }

    let units: Vec<Vec<usize>> = sorted.iter().map(|&c| components[c].clone()).collect();
    let unit_dependencies = sorted
        .iter()
        .map(|&c| dependencies[c].iter().map(|&d| position[d]).collect())
        .collect();
    let unit_cyclic = sorted.iter().map(|&c| cyclic[c]).collect();
    let unit_of = component_of.iter().map(|&c| position[c]).collect();

    debug!(units = units.len(), "compile order computed");

    Ok(OrderedGraph {
        graph,
        units,
        unit_dependencies,
        cyclic: unit_cyclic,
        unit_of,
    })
}

/// Iterative Tarjan; each component's members come back sorted ascending
fn strongly_connected(adjacency: &[Vec<usize>]) -> Vec<Vec<usize>> {
    const UNVISITED: usize = usize::MAX;

    let n = adjacency.len();
    let mut index = vec![UNVISITED; n];
    let mut lowlink = vec![0usize; n];
    let mut on_stack = vec![false; n];
    let mut stack = Vec::new();
    let mut components = Vec::new();
    let mut next = 0usize;
    // (node, next child position)
    let mut call: Vec<(usize, usize)> = Vec::new();

    for root in 0..n {
        if index[root] != UNVISITED {
            continue;
        }

        index[root] = next;
        lowlink[root] = next;
        next += 1;
        stack.push(root);
        on_stack[root] = true;
        call.push((root, 0));

        while let Some(&(v, child)) = call.last() {
            if let Some(&w) = adjacency[v].get(child) {
                let top = call.len() - 1;
                call[top].1 += 1;

                if index[w] == UNVISITED {
                    index[w] = next;
                    lowlink[w] = next;
                    next += 1;
                    stack.push(w);
                    on_stack[w] = true;
                    call.push((w, 0));
                } else if on_stack[w] {
                    lowlink[v] = lowlink[v].min(index[w]);
                }
                continue;
            }

            call.pop();
            if let Some(&(parent, _)) = call.last() {
                lowlink[parent] = lowlink[parent].min(lowlink[v]);
            }

            if lowlink[v] == index[v] {
                let mut component = Vec::new();
                while let Some(w) = stack.pop() {
                    on_stack[w] = false;
                    component.push(w);
                    if w == v {
                        break;
                    }
                }
                component.sort_unstable();
                components.push(component);
            }
        }
    }

    components
}

fn check_authorized(
    graph: &DependencyGraph,
    adjacency: &[Vec<usize>],
    components: &[Vec<usize>],
    cyclic: &[bool],
) -> BuildResult<()> {
    let unauthorized = components
        .iter()
        .zip(cyclic)
        .filter(|(_, cyclic)| **cyclic)
        .map(|(members, _)| members)
        .filter(|members| !is_authorized(graph, adjacency, members))
        .min_by_key(|members| members[0]);

    match unauthorized {
        Some(members) => Err(BuildError::unauthorized_cycle(
            members
                .iter()
                .map(|&m| graph.modules()[m].name.clone())
                .collect(),
        )),
        None => Ok(()),
    }
}

fn is_authorized(graph: &DependencyGraph, adjacency: &[Vec<usize>], members: &[usize]) -> bool {
    let self_loops_allowed = members
        .iter()
        .filter(|&&m| adjacency[m].contains(&m))
        .all(|&m| {
            let module = &graph.modules()[m];
            module.allows_cycle_with(&module.name)
        });

    self_loops_allowed
        && members.iter().enumerate().all(|(i, &a)| {
            members[i + 1..]
                .iter()
                .all(|&b| graph.mutually_authorized(a, b))
        })
}

fn warn_one_sided_overrides(graph: &DependencyGraph, component_of: &[usize]) {
    for (i, module) in graph.modules().iter().enumerate() {
        for other in &module.circular_overrides {
            let Some(j) = graph.index_of(other) else {
                continue;
            };
            if i != j && component_of[i] != component_of[j] && !graph.mutually_authorized(i, j) {
                warn!(
                    module = %module.name,
                    other = %graph.modules()[j].name,
                    "one-sided circular override is not used"
                );
            }
        }
    }
}

fn smallest_name(graph: &DependencyGraph, members: &[usize]) -> (String, String) {
    members
        .iter()
        .map(|&m| {
            let name = &graph.modules()[m].name;
            (name_key(name), name.clone())
        })
        .min()
        .unwrap_or_default()
}
