//! petgraph-based directed graph over node names.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use super::types::Document;

/// Vertices are named nodes (first occurrence of each name); edges are the links whose
/// endpoints both resolve, weighted by their position in `links`.
pub struct PipelineGraph {
    pub graph: DiGraph<String, usize>,
    pub node_indices: HashMap<String, NodeIndex>,
}

impl PipelineGraph {
    pub fn build(document: &Document) -> Self {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();

        for node in document.nodes.entries() {
            let Some(name) = node.name() else { continue };
            if node_indices.contains_key(name) {
                continue;
            }
            let idx = graph.add_node(name.to_string());
            node_indices.insert(name.to_string(), idx);
        }

        for link in document.links.entries() {
            let (Some(from), Some(to)) = (link.from(), link.to()) else {
                continue;
            };
            if let (Some(&s), Some(&t)) = (node_indices.get(from), node_indices.get(to)) {
                graph.add_edge(s, t, link.index);
            }
        }

        PipelineGraph {
            graph,
            node_indices,
        }
    }

    /// Vertices in document order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.graph.node_indices().map(|idx| self.graph[idx].as_str())
    }

    /// Outgoing neighbours of `idx` in link order.
    pub fn successor_indices(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (*e.weight(), e.target()))
            .collect();
        edges.sort_by_key(|(link_index, _)| *link_index);
        edges.into_iter().map(|(_, target)| target).collect()
    }

    pub fn successors(&self, name: &str) -> Vec<&str> {
        let Some(&idx) = self.node_indices.get(name) else {
            return vec![];
        };
        self.successor_indices(idx)
            .into_iter()
            .map(|n| self.graph[n].as_str())
            .collect()
    }

    pub fn incoming_count(&self, name: &str) -> usize {
        self.node_indices
            .get(name)
            .map(|&idx| self.graph.edges_directed(idx, Direction::Incoming).count())
            .unwrap_or(0)
    }

    pub fn outgoing_count(&self, name: &str) -> usize {
        self.node_indices
            .get(name)
            .map(|&idx| self.graph.edges_directed(idx, Direction::Outgoing).count())
            .unwrap_or(0)
    }

    /// True when `to` is reachable from `from` along links.
    pub fn has_path(&self, from: &str, to: &str) -> bool {
        match (self.node_indices.get(from), self.node_indices.get(to)) {
            (Some(&s), Some(&t)) => has_path_connecting(&self.graph, s, t, None),
            _ => false,
        }
    }
}
