use std::collections::{BTreeMap, BTreeSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::element::Element;

/// The generator sets attached to one dependency edge.
///
/// A member `W` of the valuation of an edge `u -> v` witnesses that `u` lies
/// in the closure of `W + v` but not in the closure of `W` alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Valuation<E: Element>(BTreeSet<BTreeSet<E>>);

impl<E: Element> Valuation<E> {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, witness: &BTreeSet<E>) -> bool {
        self.0.contains(witness)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BTreeSet<E>> {
        self.0.iter()
    }

    /// Record a witness as-is.
    pub fn insert(&mut self, witness: BTreeSet<E>) {
        self.0.insert(witness);
    }

    /// Record a witness, keeping only inclusion-minimal members: strict
    /// supersets of the newcomer are dropped, and the newcomer itself is
    /// dropped again when an existing member is strictly contained in it.
    pub fn insert_minimal(&mut self, witness: BTreeSet<E>) {
        self.0.insert(witness.clone());
        let snapshot: Vec<BTreeSet<E>> = self.0.iter().cloned().collect();
        for member in snapshot {
            if member == witness {
                continue;
            }
            if member.is_superset(&witness) {
                self.0.remove(&member);
            } else if member.is_subset(&witness) {
                self.0.remove(&witness);
            }
        }
    }
}

/// A directed graph over ground-set elements whose edges carry valuations.
///
/// Node identity is the element value; iteration follows node insertion
/// order, which in turn follows the ground set's total order.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph<E: Element> {
    graph: DiGraph<E, Valuation<E>>,
    index: BTreeMap<E, NodeIndex>,
}

impl<E: Element> DependencyGraph<E> {
    pub fn new(ground: impl IntoIterator<Item = E>) -> Self {
        let mut graph = DiGraph::new();
        let mut index = BTreeMap::new();
        for e in ground {
            if !index.contains_key(&e) {
                let idx = graph.add_node(e.clone());
                index.insert(e, idx);
            }
        }
        Self { graph, index }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains_node(&self, e: &E) -> bool {
        self.index.contains_key(e)
    }

    pub fn node_index(&self, e: &E) -> Option<NodeIndex> {
        self.index.get(e).copied()
    }

    pub fn element(&self, idx: NodeIndex) -> &E {
        &self.graph[idx]
    }

    /// The valuation of the edge `from -> to`, when both nodes and the edge
    /// exist.
    pub fn valuation(&self, from: &E, to: &E) -> Option<&Valuation<E>> {
        let (a, b) = (self.node_index(from)?, self.node_index(to)?);
        let edge = self.graph.find_edge(a, b)?;
        self.graph.edge_weight(edge)
    }

    /// The valuation of the edge `from -> to`, creating an empty edge first
    /// when it does not exist yet. Both elements must be nodes.
    pub fn valuation_mut(&mut self, from: &E, to: &E) -> Option<&mut Valuation<E>> {
        let (a, b) = (self.node_index(from)?, self.node_index(to)?);
        let edge = match self.graph.find_edge(a, b) {
            Some(edge) => edge,
            None => self.graph.add_edge(a, b, Valuation::new()),
        };
        self.graph.edge_weight_mut(edge)
    }

    /// Edges in deterministic order, as `(source, target, valuation)`.
    pub fn edges(&self) -> impl Iterator<Item = (&E, &E, &Valuation<E>)> {
        self.graph.edge_references().map(|edge| {
            (
                &self.graph[edge.source()],
                &self.graph[edge.target()],
                edge.weight(),
            )
        })
    }

    pub fn graph(&self) -> &DiGraph<E, Valuation<E>> {
        &self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(elements: &str) -> BTreeSet<char> {
        elements.chars().collect()
    }

    #[test]
    fn insert_minimal_keeps_an_antichain() {
        let mut valuation = Valuation::new();
        valuation.insert_minimal(set("ab"));
        valuation.insert_minimal(set("abc"));
        assert_eq!(valuation.len(), 1);
        assert!(valuation.contains(&set("ab")));

        valuation.insert_minimal(set("a"));
        assert_eq!(valuation.len(), 1);
        assert!(valuation.contains(&set("a")));

        valuation.insert_minimal(set("bc"));
        assert_eq!(valuation.len(), 2);
        assert!(valuation.contains(&set("a")));
        assert!(valuation.contains(&set("bc")));
    }

    #[test]
    fn plain_insert_accumulates() {
        let mut valuation = Valuation::new();
        valuation.insert(set("ab"));
        valuation.insert(set("abc"));
        assert_eq!(valuation.len(), 2);
    }

    #[test]
    fn valuation_mut_creates_the_edge_once() {
        let mut graph = DependencyGraph::new("abc".chars());
        graph
            .valuation_mut(&'a', &'b')
            .unwrap()
            .insert_minimal(set("c"));
        graph
            .valuation_mut(&'a', &'b')
            .unwrap()
            .insert_minimal(set("c"));
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.valuation(&'a', &'b').unwrap().len(), 1);
        assert!(graph.valuation(&'b', &'a').is_none());
    }
}
