use std::collections::BTreeSet;

use petgraph::algo::{has_path_connecting, toposort};
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::Dfs;
use petgraph::Direction;

/// A Hasse diagram: an acyclic digraph whose edges run from smaller to
/// greater nodes.
///
/// Nodes live in the graph's arena and are addressed by their index, so all
/// iteration is deterministic in insertion order. Parallel edges are
/// refused; `W` is the optional edge payload.
#[derive(Debug, Clone)]
pub struct Lattice<N, W = ()> {
    graph: DiGraph<N, W>,
}

impl<N, W> Default for Lattice<N, W> {
    fn default() -> Self {
        Self {
            graph: DiGraph::new(),
        }
    }
}

impl<N, W> Lattice<N, W> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn add_node(&mut self, node: N) -> NodeIndex {
        self.graph.add_node(node)
    }

    /// Add an edge unless it already exists. Returns whether it was added.
    pub fn add_edge(&mut self, source: NodeIndex, target: NodeIndex, weight: W) -> bool {
        if self.graph.find_edge(source, target).is_some() {
            return false;
        }
        self.graph.add_edge(source, target, weight);
        true
    }

    pub fn has_edge(&self, source: NodeIndex, target: NodeIndex) -> bool {
        self.graph.find_edge(source, target).is_some()
    }

    pub fn node(&self, idx: NodeIndex) -> &N {
        &self.graph[idx]
    }

    pub fn node_mut(&mut self, idx: NodeIndex) -> &mut N {
        &mut self.graph[idx]
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> {
        self.graph.node_indices()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.graph.node_indices().map(|idx| &self.graph[idx])
    }

    /// First node carrying the given payload, scanning in index order.
    pub fn find_node(&self, payload: &N) -> Option<NodeIndex>
    where
        N: PartialEq,
    {
        self.graph
            .node_indices()
            .find(|&idx| &self.graph[idx] == payload)
    }

    /// Edge endpoints as `(source, target)` pairs, in edge insertion order.
    pub fn edge_pairs(&self) -> Vec<(NodeIndex, NodeIndex)> {
        self.graph
            .edge_indices()
            .filter_map(|edge| self.graph.edge_endpoints(edge))
            .collect()
    }

    pub fn edge_indices(&self) -> impl Iterator<Item = EdgeIndex> {
        self.graph.edge_indices()
    }

    pub fn edge_endpoints(&self, edge: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(edge)
    }

    pub fn edge_weight(&self, edge: EdgeIndex) -> Option<&W> {
        self.graph.edge_weight(edge)
    }

    pub fn edge_weight_mut(&mut self, edge: EdgeIndex) -> Option<&mut W> {
        self.graph.edge_weight_mut(edge)
    }

    pub fn predecessors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut nodes: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Incoming)
            .collect();
        nodes.sort();
        nodes
    }

    pub fn successors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut nodes: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .collect();
        nodes.sort();
        nodes
    }

    /// Nodes without predecessors, in index order.
    pub fn sources(&self) -> Vec<NodeIndex> {
        let mut nodes: Vec<NodeIndex> = self.graph.externals(Direction::Incoming).collect();
        nodes.sort();
        nodes
    }

    /// Nodes without successors, in index order.
    pub fn wells(&self) -> Vec<NodeIndex> {
        let mut nodes: Vec<NodeIndex> = self.graph.externals(Direction::Outgoing).collect();
        nodes.sort();
        nodes
    }

    /// The unique minimum, when there is exactly one source.
    pub fn bottom(&self) -> Option<NodeIndex> {
        match self.sources().as_slice() {
            [single] => Some(*single),
            _ => None,
        }
    }

    /// The unique maximum, when there is exactly one well.
    pub fn top(&self) -> Option<NodeIndex> {
        match self.wells().as_slice() {
            [single] => Some(*single),
            _ => None,
        }
    }

    /// Nodes with exactly one immediate predecessor.
    pub fn join_irreducibles(&self) -> BTreeSet<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .count()
                    == 1
            })
            .collect()
    }

    /// Nodes with exactly one immediate successor.
    pub fn meet_irreducibles(&self) -> BTreeSet<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Outgoing)
                    .count()
                    == 1
            })
            .collect()
    }

    pub fn is_acyclic(&self) -> bool {
        toposort(&self.graph, None).is_ok()
    }

    /// A topological order of the nodes, `None` on a cyclic graph.
    pub fn topological_order(&self) -> Option<Vec<NodeIndex>> {
        toposort(&self.graph, None).ok()
    }

    /// Add an edge for every reachable pair.
    pub fn transitive_closure(&mut self)
    where
        W: Default,
    {
        let mut reachable: Vec<(NodeIndex, NodeIndex)> = Vec::new();
        for start in self.graph.node_indices() {
            let mut dfs = Dfs::new(&self.graph, start);
            while let Some(found) = dfs.next(&self.graph) {
                if found != start {
                    reachable.push((start, found));
                }
            }
        }
        for (source, target) in reachable {
            if self.graph.find_edge(source, target).is_none() {
                self.graph.add_edge(source, target, W::default());
            }
        }
    }

    /// Remove every edge subsumed by a longer path. The graph must be
    /// acyclic for the result to be the unique transitive reduction.
    pub fn transitive_reduction(&mut self) {
        let mut redundant: Vec<EdgeIndex> = Vec::new();
        for edge in self.graph.edge_indices() {
            let Some((source, target)) = self.graph.edge_endpoints(edge) else {
                continue;
            };
            let subsumed = self
                .graph
                .neighbors_directed(source, Direction::Outgoing)
                .any(|mid| {
                    mid != target && has_path_connecting(&self.graph, mid, target, None)
                });
            if subsumed {
                redundant.push(edge);
            }
        }
        redundant.sort();
        for edge in redundant.into_iter().rev() {
            self.graph.remove_edge(edge);
        }
    }

    /// Serialisation delegated to the graph library.
    pub fn to_dot(&self) -> String
    where
        N: std::fmt::Debug,
        W: std::fmt::Debug,
    {
        format!("{:?}", Dot::with_config(&self.graph, &[Config::EdgeNoLabel]))
    }

    pub fn graph(&self) -> &DiGraph<N, W> {
        &self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A diamond: bottom -> left/right -> top.
    fn diamond() -> (Lattice<&'static str>, [NodeIndex; 4]) {
        let mut lattice = Lattice::new();
        let bottom = lattice.add_node("bottom");
        let left = lattice.add_node("left");
        let right = lattice.add_node("right");
        let top = lattice.add_node("top");
        lattice.add_edge(bottom, left, ());
        lattice.add_edge(bottom, right, ());
        lattice.add_edge(left, top, ());
        lattice.add_edge(right, top, ());
        (lattice, [bottom, left, right, top])
    }

    #[test]
    fn parallel_edges_are_refused() {
        let mut lattice: Lattice<u8> = Lattice::new();
        let a = lattice.add_node(0);
        let b = lattice.add_node(1);
        assert!(lattice.add_edge(a, b, ()));
        assert!(!lattice.add_edge(a, b, ()));
        assert_eq!(lattice.edge_count(), 1);
    }

    #[test]
    fn top_and_bottom_of_a_diamond() {
        let (lattice, [bottom, _, _, top]) = diamond();
        assert_eq!(lattice.bottom(), Some(bottom));
        assert_eq!(lattice.top(), Some(top));
    }

    #[test]
    fn irreducibles_of_a_diamond() {
        let (lattice, [_, left, right, _]) = diamond();
        let expected: BTreeSet<NodeIndex> = [left, right].into();
        assert_eq!(lattice.join_irreducibles(), expected);
        assert_eq!(lattice.meet_irreducibles(), expected);
    }

    #[test]
    fn closure_then_reduction_restores_the_diamond() {
        let (mut lattice, [bottom, _, _, top]) = diamond();
        lattice.transitive_closure();
        assert!(lattice.has_edge(bottom, top));
        assert_eq!(lattice.edge_count(), 5);
        lattice.transitive_reduction();
        assert!(!lattice.has_edge(bottom, top));
        assert_eq!(lattice.edge_count(), 4);
    }

    #[test]
    fn topological_order_respects_edges() {
        let (lattice, [bottom, left, right, top]) = diamond();
        let order = lattice.topological_order().unwrap();
        let position = |needle: NodeIndex| order.iter().position(|&idx| idx == needle).unwrap();
        assert!(position(bottom) < position(left));
        assert!(position(bottom) < position(right));
        assert!(position(left) < position(top));
        assert!(position(right) < position(top));
    }

    #[test]
    fn cycles_have_no_topological_order() {
        let mut lattice: Lattice<u8> = Lattice::new();
        let a = lattice.add_node(0);
        let b = lattice.add_node(1);
        lattice.add_edge(a, b, ());
        lattice.add_edge(b, a, ());
        assert!(!lattice.is_acyclic());
        assert!(lattice.topological_order().is_none());
    }
}
