//! Service dependency graph built from normalized `depends_on` edges.
//!
//! The renderer only needs the edges, but a real compose tree can declare
//! surprising things — including dependency cycles, which docker compose
//! itself rejects. [`ServiceGraph`] wraps a petgraph digraph to detect those
//! and to produce a start order for services; cycles among services are
//! reported, not fatal, since the graph is still drawable.

pub mod dot;

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use tracing::warn;

use crate::compose::{DependencyEdge, MergedService};

/// Directed graph of services; an edge points from a service to the
/// service it depends on.
pub struct ServiceGraph {
    graph: DiGraph<String, Option<String>>,
    node_map: HashMap<String, NodeIndex>,
}

impl ServiceGraph {
    /// Build the graph from the normalized service set and its dependency
    /// edges.
    ///
    /// Every service gets a node even without edges, so isolated services
    /// still appear in the start order. Edges referencing undeclared
    /// services add implicit nodes (the original files may describe
    /// services resolved elsewhere).
    pub fn build(services: &[MergedService], edges: &[DependencyEdge]) -> Self {
        let mut graph = Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        };

        for service in services {
            graph.ensure_node(&service.name);
        }
        for edge in edges {
            let from = graph.ensure_node(&edge.service);
            let to = graph.ensure_node(&edge.depends_on);
            graph.graph.add_edge(from, to, edge.condition.clone());
        }

        graph
    }

    fn ensure_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&index) = self.node_map.get(name) {
            index
        } else {
            let index = self.graph.add_node(name.to_string());
            self.node_map.insert(name.to_string(), index);
            index
        }
    }

    /// Strongly connected components with more than one member — the
    /// dependency cycles, as service name groups.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|&n| self.graph.contains_edge(n, n))
            })
            .map(|component| {
                component
                    .into_iter()
                    .map(|index| self.graph[index].clone())
                    .collect()
            })
            .collect()
    }

    /// Services ordered so that every dependency comes before its
    /// dependents, or `None` when cycles make that impossible.
    pub fn start_order(&self) -> Option<Vec<String>> {
        let order = toposort(&self.graph, None).ok()?;
        Some(
            order
                .into_iter()
                .rev()
                .map(|index| self.graph[index].clone())
                .collect(),
        )
    }

    /// Log a warning for every dependency cycle found.
    pub fn warn_on_cycles(&self) {
        for cycle in self.cycles() {
            warn!(services = ?cycle, "dependency cycle between services");
        }
    }
}
