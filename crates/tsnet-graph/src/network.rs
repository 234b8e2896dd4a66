//! The network value every builder returns.

use petgraph::algo::connected_components;
use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::{Directed, EdgeType, Undirected};
use serde::{Deserialize, Serialize};

/// One edge by zero-based node index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Source node.
    pub source: usize,
    /// Target node.
    pub target: usize,
    /// Edge weight; `None` for unweighted networks.
    pub weight: Option<f64>,
}

/// Nodes with string identifiers and optionally weighted edges.
///
/// Wraps a petgraph [`Graph`]; unweighted edges are stored with weight 1.
#[derive(Debug, Clone)]
pub struct Network<Ty: EdgeType = Undirected> {
    graph: Graph<String, f64, Ty>,
    weighted: bool,
}

/// A directed network.
pub type DirectedNetwork = Network<Directed>;

impl<Ty: EdgeType> Network<Ty> {
    pub(crate) fn with_nodes(labels: Vec<String>, weighted: bool) -> Self {
        let mut graph = Graph::with_capacity(labels.len(), 0);
        for label in labels {
            graph.add_node(label);
        }
        Self { graph, weighted }
    }

    pub(crate) fn add_edge(&mut self, source: usize, target: usize, weight: f64) {
        let weight = if self.weighted { weight } else { 1.0 };
        self.graph
            .add_edge(NodeIndex::new(source), NodeIndex::new(target), weight);
    }

    /// Return the number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return the number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Return true if edges are directed.
    #[must_use]
    pub fn is_directed(&self) -> bool {
        Ty::is_directed()
    }

    /// Return true if edges carry weights.
    #[must_use]
    pub fn is_weighted(&self) -> bool {
        self.weighted
    }

    /// Node identifiers in node order.
    #[must_use]
    pub fn node_names(&self) -> Vec<&str> {
        self.graph.node_weights().map(String::as_str).collect()
    }

    /// Edges in insertion order.
    #[must_use]
    pub fn edges(&self) -> Vec<Edge> {
        self.graph
            .edge_references()
            .map(|e| Edge {
                source: e.source().index(),
                target: e.target().index(),
                weight: self.weighted.then_some(*e.weight()),
            })
            .collect()
    }

    /// Return true if an edge joins `source` to `target` (either way when undirected).
    #[must_use]
    pub fn has_edge(&self, source: usize, target: usize) -> bool {
        let n = self.node_count();
        source < n
            && target < n
            && self
                .graph
                .contains_edge(NodeIndex::new(source), NodeIndex::new(target))
    }

    /// Weight of the edge `source -> target`, if present.
    #[must_use]
    pub fn edge_weight(&self, source: usize, target: usize) -> Option<f64> {
        let n = self.node_count();
        if source >= n || target >= n {
            return None;
        }
        self.graph
            .find_edge(NodeIndex::new(source), NodeIndex::new(target))
            .and_then(|e| self.graph.edge_weight(e).copied())
    }

    /// Number of edges incident to `node`, counting both directions.
    ///
    /// # Panics
    ///
    /// Panics if `node >= node_count()`.
    #[must_use]
    pub fn degree(&self, node: usize) -> usize {
        assert!(node < self.node_count(), "node {node} out of bounds");
        self.graph.neighbors_undirected(NodeIndex::new(node)).count()
    }

    /// Edges present over edges possible, ignoring self-loops.
    #[must_use]
    pub fn density(&self) -> f64 {
        let n = self.node_count() as f64;
        if n < 2.0 {
            return 0.0;
        }
        let possible = if Ty::is_directed() { n * (n - 1.0) } else { n * (n - 1.0) / 2.0 };
        self.edge_count() as f64 / possible
    }

    /// Number of (weakly) connected components.
    #[must_use]
    pub fn connected_components(&self) -> usize {
        connected_components(&self.graph)
    }

    /// The underlying petgraph graph.
    #[must_use]
    pub fn graph(&self) -> &Graph<String, f64, Ty> {
        &self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n: usize) -> Vec<String> {
        (1..=n).map(|i| i.to_string()).collect()
    }

    #[test]
    fn unweighted_edges_report_no_weight() {
        let mut net: Network = Network::with_nodes(labels(3), false);
        net.add_edge(0, 1, 0.3);
        assert_eq!(net.edges(), vec![Edge { source: 0, target: 1, weight: None }]);
        assert_eq!(net.edge_weight(1, 0), Some(1.0));
    }

    #[test]
    fn undirected_degree_and_density() {
        let mut net: Network = Network::with_nodes(labels(4), true);
        net.add_edge(0, 1, 0.5);
        net.add_edge(1, 2, 0.5);
        assert_eq!(net.degree(1), 2);
        assert_eq!(net.degree(3), 0);
        assert!((net.density() - 2.0 / 6.0).abs() < 1e-12);
        assert_eq!(net.connected_components(), 2);
        assert!(net.has_edge(2, 1));
        assert!(!net.is_directed());
    }

    #[test]
    fn directed_edges_keep_orientation() {
        let mut net: DirectedNetwork = Network::with_nodes(labels(2), true);
        net.add_edge(0, 1, 2.0);
        assert!(net.has_edge(0, 1));
        assert!(!net.has_edge(1, 0));
        assert_eq!(net.degree(1), 1);
        assert!((net.density() - 0.5).abs() < 1e-12);
        assert!(net.is_directed());
    }

    #[test]
    fn node_names_in_order() {
        let net: Network = Network::with_nodes(vec!["a".into(), "b".into()], false);
        assert_eq!(net.node_names(), vec!["a", "b"]);
        assert_eq!(net.density(), 0.0);
    }
}
