//! Dependency ordering
//!
//! Computes a build order over an arbitrary node type and detects cycles.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Cycle found while ordering, as the path that closes on itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle<N> {
    pub path: Vec<N>,
}

/// Dependency graph over build nodes
///
/// Nodes keep insertion order so the computed order is deterministic.
#[derive(Debug)]
pub struct DependencyGraph<N> {
    /// Adjacency list: node -> dependencies
    edges: HashMap<N, Vec<N>>,
    /// All known nodes, in insertion order
    nodes: Vec<N>,
    known: HashSet<N>,
}

impl<N> Default for DependencyGraph<N> {
    fn default() -> Self {
        Self {
            edges: HashMap::new(),
            nodes: Vec::new(),
            known: HashSet::new(),
        }
    }
}

impl<N: Clone + Eq + Hash> DependencyGraph<N> {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    fn add_node(&mut self, node: &N) {
        if self.known.insert(node.clone()) {
            self.nodes.push(node.clone());
        }
    }

    /// Add a node and its dependencies
    ///
    /// Adding the same node twice replaces its dependency list.
    pub fn add_node_with_dependencies(&mut self, node: N, dependencies: Vec<N>) {
        self.add_node(&node);
        for dep in &dependencies {
            self.add_node(dep);
        }
        self.edges.insert(node, dependencies);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Compute topological sort (build order)
    ///
    /// Returns nodes in order such that dependencies come before dependents.
    /// The depth-first walk keeps its own stack, so long dependency chains do
    /// not grow the call stack.
    pub fn topological_sort(&self) -> Result<Vec<N>, Cycle<N>> {
        let mut visited = HashSet::new();
        let mut result = Vec::with_capacity(self.nodes.len());

        for node in &self.nodes {
            if !visited.contains(node) {
                self.visit(node, &mut visited, &mut result)?;
            }
        }

        Ok(result)
    }

    fn visit(
        &self,
        start: &N,
        visited: &mut HashSet<N>,
        result: &mut Vec<N>,
    ) -> Result<(), Cycle<N>> {
        // Nodes on the current path, each with the index of its next dependency
        let mut path: Vec<(N, usize)> = vec![(start.clone(), 0)];
        let mut temp_visited = HashSet::from([start.clone()]);

        while let Some((node, next)) = path.last_mut() {
            let dep = self.edges.get(&*node).and_then(|deps| deps.get(*next)).cloned();
            *next += 1;

            match dep {
                Some(dep) if temp_visited.contains(&dep) => {
                    // Back edge: the cycle is the part of the path starting at `dep`
                    let from = path.iter().position(|(n, _)| *n == dep).unwrap_or(0);
                    let mut cycle: Vec<N> = path[from..].iter().map(|(n, _)| n.clone()).collect();
                    cycle.push(dep);
                    return Err(Cycle { path: cycle });
                }
                Some(dep) if visited.contains(&dep) => {}
                Some(dep) => {
                    temp_visited.insert(dep.clone());
                    path.push((dep, 0));
                }
                None => {
                    if let Some((done, _)) = path.pop() {
                        temp_visited.remove(&done);
                        visited.insert(done.clone());
                        result.push(done);
                    }
                }
            }
        }

        Ok(())
    }

    /// Check if the graph has any cycles
    pub fn has_cycle(&self) -> bool {
        self.topological_sort().is_err()
    }
}
