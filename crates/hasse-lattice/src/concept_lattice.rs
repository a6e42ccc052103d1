use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::{condensation, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use petgraph::Direction;

use hasse_core::{ClosureSystem, DependencyGraph, Element};

use crate::concept::Concept;
use crate::lattice::Lattice;

/// Edge payload of a concept lattice: the intent difference of the two
/// endpoints, once the edge valuation has been computed.
pub type EdgeSets<E> = Option<BTreeSet<E>>;

/// Node payload of a reduced lattice: the first element of the reduced
/// intent or extent, both of them for doubly irreducible concepts, or a
/// fresh anonymous tag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Reduced<E: Element> {
    Element(E),
    Pair(E, E),
    Anonymous(u32),
}

/// The Hasse diagram of a closed-set lattice, plus the dependency graph
/// accumulated while generating it.
///
/// Nodes always carry concepts; edges run from smaller to greater closed
/// sets. Generation with [`ConceptLattice::diagram_lattice`] is Bordat's
/// algorithm: successors of a closed set are read off the strongly connected
/// components of a dependency subgraph, and each discovery step valuates the
/// shared dependency graph, so that minimal generators and the canonical
/// direct basis are encoded in it when generation finishes.
#[derive(Debug, Clone)]
pub struct ConceptLattice<E: Element> {
    lattice: Lattice<Concept<E>, EdgeSets<E>>,
    dependency: Option<DependencyGraph<E>>,
}

impl<E: Element> Default for ConceptLattice<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Element> ConceptLattice<E> {
    pub fn new() -> Self {
        Self {
            lattice: Lattice::new(),
            dependency: None,
        }
    }

    pub fn node_count(&self) -> usize {
        self.lattice.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.lattice.edge_count()
    }

    pub fn add_concept(&mut self, concept: Concept<E>) -> NodeIndex {
        self.lattice.add_node(concept)
    }

    pub fn add_edge(&mut self, source: NodeIndex, target: NodeIndex) -> bool {
        self.lattice.add_edge(source, target, None)
    }

    pub fn concept(&self, idx: NodeIndex) -> &Concept<E> {
        self.lattice.node(idx)
    }

    /// The node holding exactly this concept, if any.
    pub fn find_concept(&self, concept: &Concept<E>) -> Option<NodeIndex> {
        self.lattice.find_node(concept)
    }

    /// The node whose intent is exactly `intent`, scanning in index order.
    pub fn find_by_intent(&self, intent: &BTreeSet<E>) -> Option<NodeIndex> {
        self.lattice
            .node_indices()
            .find(|&idx| self.lattice.node(idx).intent() == Some(intent))
    }

    /// The intents present in the lattice, as a set of closed sets.
    pub fn intents(&self) -> BTreeSet<BTreeSet<E>> {
        self.lattice
            .nodes()
            .filter_map(|concept| concept.intent().cloned())
            .collect()
    }

    /// Edges as `(source intent, target intent)` pairs.
    pub fn edge_intent_pairs(&self) -> BTreeSet<(BTreeSet<E>, BTreeSet<E>)> {
        self.lattice
            .edge_pairs()
            .into_iter()
            .filter_map(|(source, target)| {
                Some((
                    self.lattice.node(source).intent()?.clone(),
                    self.lattice.node(target).intent()?.clone(),
                ))
            })
            .collect()
    }

    pub fn contains_all_intents(&self) -> bool {
        self.lattice.nodes().all(Concept::has_intent)
    }

    pub fn contains_all_extents(&self) -> bool {
        self.lattice.nodes().all(Concept::has_extent)
    }

    /// Drop every intent.
    pub fn strip_intents(&mut self) {
        for idx in self.lattice.node_indices().collect::<Vec<_>>() {
            self.lattice.node_mut(idx).set_intent(None);
        }
    }

    /// Drop every extent.
    pub fn strip_extents(&mut self) {
        for idx in self.lattice.node_indices().collect::<Vec<_>>() {
            self.lattice.node_mut(idx).set_extent(None);
        }
    }

    pub fn bottom(&self) -> Option<NodeIndex> {
        self.lattice.bottom()
    }

    pub fn top(&self) -> Option<NodeIndex> {
        self.lattice.top()
    }

    pub fn lattice(&self) -> &Lattice<Concept<E>, EdgeSets<E>> {
        &self.lattice
    }

    pub fn dependency_graph(&self) -> Option<&DependencyGraph<E>> {
        self.dependency.as_ref()
    }

    pub fn to_dot(&self) -> String {
        self.lattice.to_dot()
    }

    // ------------------------------------------------------------------
    // Generation
    // ------------------------------------------------------------------

    /// The Hasse diagram of the closed-set lattice of a closure system, by
    /// recursive Bordat expansion from the bottom closed set.
    pub fn diagram_lattice<C>(system: &C) -> Self
    where
        C: ClosureSystem<Elem = E>,
    {
        let mut result = Self::new();
        result.dependency = Some(DependencyGraph::new(system.ground_set().iter().cloned()));
        let bottom = Concept::with_intent(system.closure(&BTreeSet::new()));
        let bottom_idx = result.lattice.add_node(bottom);
        result.expand(bottom_idx, system);
        result
    }

    fn expand<C>(&mut self, node: NodeIndex, system: &C)
    where
        C: ClosureSystem<Elem = E>,
    {
        for intent in self.immediate_successors(node, system) {
            match self.find_by_intent(&intent) {
                Some(existing) => {
                    self.lattice.add_edge(node, existing, None);
                }
                None => {
                    let created = self.lattice.add_node(Concept::with_intent(intent));
                    self.lattice.add_edge(node, created, None);
                    self.expand(created, system);
                }
            }
        }
    }

    /// The immediate successors of a node's closed set, per Bordat: one per
    /// strongly connected component without incoming dependency edges in the
    /// step's dependency subgraph.
    ///
    /// Every dependency discovered here is recorded in the shared dependency
    /// graph, tagged with the step valuation and pruned to inclusion-minimal
    /// witnesses.
    pub fn immediate_successors<C>(&mut self, node: NodeIndex, system: &C) -> Vec<BTreeSet<E>>
    where
        C: ClosureSystem<Elem = E>,
    {
        let intent: BTreeSet<E> = self
            .lattice
            .node(node)
            .intent()
            .cloned()
            .unwrap_or_default();
        let new_val = step_valuation(system, &intent);
        let outside: Vec<E> = system.ground_set().difference(&intent).cloned().collect();

        let dependency = self
            .dependency
            .get_or_insert_with(|| DependencyGraph::new(system.ground_set().iter().cloned()));

        // the dependency relation of this step only: u depends on v when
        // u falls into the closure of the intent extended with v
        let mut delta: DiGraph<E, ()> = DiGraph::new();
        let mut delta_index: BTreeMap<E, NodeIndex> = BTreeMap::new();
        for e in &outside {
            delta_index.insert(e.clone(), delta.add_node(e.clone()));
        }
        for u in &outside {
            for v in &outside {
                if u == v {
                    continue;
                }
                let mut probe = intent.clone();
                probe.insert(v.clone());
                if system.closure(&probe).contains(u) {
                    if let Some(valuation) = dependency.valuation_mut(u, v) {
                        valuation.insert_minimal(new_val.clone());
                    }
                    delta.add_edge(delta_index[u], delta_index[v], ());
                }
            }
        }

        let condensed = condensation(delta, true);
        let mut successors = Vec::new();
        for component in condensed.node_indices() {
            if condensed
                .neighbors_directed(component, Direction::Incoming)
                .next()
                .is_some()
            {
                continue;
            }
            let mut successor = intent.clone();
            successor.extend(condensed[component].iter().cloned());
            successors.push(successor);
        }
        successors.sort();
        successors
    }

    /// The transitively closed closed-set lattice: every closure from the
    /// Next Closure enumeration, ordered by strict intent inclusion.
    pub fn complete_lattice<C>(system: &C) -> Self
    where
        C: ClosureSystem<Elem = E>,
    {
        let mut result = Self::new();
        let indices: Vec<NodeIndex> = system
            .all_closures()
            .into_iter()
            .map(|closed| result.lattice.add_node(Concept::with_intent(closed)))
            .collect();
        let mut edges = Vec::new();
        for &source in &indices {
            for &target in &indices {
                if source == target {
                    continue;
                }
                let (Some(small), Some(large)) = (
                    result.lattice.node(source).intent(),
                    result.lattice.node(target).intent(),
                ) else {
                    continue;
                };
                if small.len() < large.len() && small.is_subset(large) {
                    edges.push((source, target));
                }
            }
        }
        for (source, target) in edges {
            result.lattice.add_edge(source, target, None);
        }
        result
    }

    /// The lattice of ideals of a directed acyclic graph, by doubling along
    /// a topological order. Returns `None` on a cyclic input.
    pub fn ideal_lattice(dag: &DiGraph<E, ()>) -> Option<Self> {
        let order = toposort(dag, None).ok()?;

        // ancestors accumulate along the topological order
        let mut ancestors: BTreeMap<NodeIndex, BTreeSet<E>> = BTreeMap::new();
        for &x in &order {
            let mut acc = BTreeSet::new();
            for pred in dag.neighbors_directed(x, Direction::Incoming) {
                acc.insert(dag[pred].clone());
                if let Some(above) = ancestors.get(&pred) {
                    acc.extend(above.iter().cloned());
                }
            }
            ancestors.insert(x, acc);
        }

        let mut result = Self::new();
        result.lattice.add_node(Concept::with_intent(BTreeSet::new()));
        for &x in &order {
            let Some(required) = ancestors.get(&x) else {
                continue;
            };
            let mut grown: BTreeSet<BTreeSet<E>> = BTreeSet::new();
            for idx in result.lattice.node_indices().collect::<Vec<_>>() {
                let Some(ideal) = result.lattice.node(idx).intent() else {
                    continue;
                };
                if required.is_subset(ideal) {
                    let mut bigger = ideal.clone();
                    bigger.insert(dag[x].clone());
                    grown.insert(bigger);
                }
            }
            for ideal in grown {
                if result.find_by_intent(&ideal).is_none() {
                    result.lattice.add_node(Concept::with_intent(ideal));
                }
            }
        }

        let indices: Vec<NodeIndex> = result.lattice.node_indices().collect();
        let mut edges = Vec::new();
        for &source in &indices {
            for &target in &indices {
                if source == target {
                    continue;
                }
                let (Some(small), Some(large)) = (
                    result.lattice.node(source).intent(),
                    result.lattice.node(target).intent(),
                ) else {
                    continue;
                };
                if small.len() < large.len() && small.is_subset(large) {
                    edges.push((source, target));
                }
            }
        }
        for (source, target) in edges {
            result.lattice.add_edge(source, target, None);
        }
        result.lattice.transitive_reduction();
        Some(result)
    }

    // ------------------------------------------------------------------
    // Filtering and reductions
    // ------------------------------------------------------------------

    /// The sub-lattice of concepts whose extent covers at least `threshold`
    /// of the bottom extent. Induced edges are kept, the original top is
    /// added back as a sentinel when filtered out, and every newly exposed
    /// well is connected to it.
    pub fn iceberg(&self, threshold: f64) -> Self {
        let mut result = Self::new();
        let Some(bottom) = self.lattice.bottom() else {
            return result;
        };
        let Some(base) = self.lattice.node(bottom).extent() else {
            return result;
        };
        if base.is_empty() {
            return result;
        }
        let card = base.len() as f64;

        let mut kept: BTreeMap<NodeIndex, NodeIndex> = BTreeMap::new();
        for idx in self.lattice.node_indices() {
            let concept = self.lattice.node(idx);
            let Some(extent) = concept.extent() else {
                continue;
            };
            if extent.len() as f64 / card >= threshold {
                kept.insert(idx, result.lattice.add_node(concept.clone()));
            }
        }
        for (source, target) in self.lattice.edge_pairs() {
            if let (Some(&new_source), Some(&new_target)) = (kept.get(&source), kept.get(&target))
            {
                result.lattice.add_edge(new_source, new_target, None);
            }
        }

        let Some(top) = self.lattice.top() else {
            return result;
        };
        let sentinel = match kept.get(&top) {
            Some(&mapped) => mapped,
            None => result.lattice.add_node(self.lattice.node(top).clone()),
        };
        for well in result.lattice.wells() {
            if well != sentinel {
                result.lattice.add_edge(well, sentinel, None);
            }
        }
        result
    }

    /// Subtract from every intent the intents of its predecessors, walking
    /// in reverse topological order, then from every extent the extents of
    /// its successors, walking forward. Returns whether anything applied.
    pub fn make_inclusion_reduction(&mut self) -> bool {
        let has_intents = self.contains_all_intents();
        let has_extents = self.contains_all_extents();
        if !has_intents && !has_extents {
            return false;
        }
        let Some(order) = self.lattice.topological_order() else {
            return false;
        };
        if has_intents {
            for &idx in order.iter().rev() {
                let subtract: BTreeSet<E> = self
                    .lattice
                    .predecessors(idx)
                    .into_iter()
                    .filter_map(|pred| self.lattice.node(pred).intent().cloned())
                    .flatten()
                    .collect();
                if let Some(intent) = self.lattice.node_mut(idx).intent_mut() {
                    intent.retain(|e| !subtract.contains(e));
                }
            }
        }
        if has_extents {
            for &idx in order.iter() {
                let subtract: BTreeSet<E> = self
                    .lattice
                    .successors(idx)
                    .into_iter()
                    .filter_map(|succ| self.lattice.node(succ).extent().cloned())
                    .flatten()
                    .collect();
                if let Some(extent) = self.lattice.node_mut(idx).extent_mut() {
                    extent.retain(|e| !subtract.contains(e));
                }
            }
        }
        true
    }

    /// Inclusion reduction, then clear the intent of every non-join-
    /// irreducible concept and the extent of every non-meet-irreducible one.
    pub fn make_irreducibles_reduction(&mut self) -> bool {
        if self.make_inclusion_reduction() {
            let join_irr = self.lattice.join_irreducibles();
            let meet_irr = self.lattice.meet_irreducibles();
            for idx in self.lattice.node_indices().collect::<Vec<_>>() {
                let keep_intent = join_irr.contains(&idx);
                let keep_extent = meet_irr.contains(&idx);
                let concept = self.lattice.node_mut(idx);
                if let Some(intent) = concept.intent_mut() {
                    if !intent.is_empty() && !keep_intent {
                        intent.clear();
                    }
                }
                if let Some(extent) = concept.extent_mut() {
                    if !extent.is_empty() && !keep_extent {
                        extent.clear();
                    }
                }
            }
        }
        true
    }

    /// Tag every unvaluated edge with the intent difference of its
    /// endpoints.
    pub fn make_edge_valuation(&mut self) -> bool {
        if !self.contains_all_intents() {
            return false;
        }
        for edge in self.lattice.edge_indices().collect::<Vec<_>>() {
            let Some((source, target)) = self.lattice.edge_endpoints(edge) else {
                continue;
            };
            if self.lattice.edge_weight(edge).is_some_and(|w| w.is_some()) {
                continue;
            }
            let difference: Option<BTreeSet<E>> = match (
                self.lattice.node(source).intent(),
                self.lattice.node(target).intent(),
            ) {
                (Some(small), Some(large)) => {
                    Some(large.difference(small).cloned().collect())
                }
                _ => None,
            };
            if let (Some(weight), Some(difference)) =
                (self.lattice.edge_weight_mut(edge), difference)
            {
                *weight = Some(difference);
            }
        }
        true
    }

    /// A lattice whose nodes carry the first element of each reduced intent
    /// for join irreducibles, and fresh anonymous tags elsewhere. `None`
    /// when some intent is absent.
    pub fn get_join_reduction(&self) -> Option<Lattice<Reduced<E>>> {
        if !self.contains_all_intents() {
            return None;
        }
        let mut reduced = self.clone();
        reduced.make_irreducibles_reduction();
        let join_irr = reduced.lattice.join_irreducibles();
        Some(reduced.reduce_nodes(|concept, idx, fresh| {
            match concept.intent() {
                Some(intent) if join_irr.contains(&idx) && !intent.is_empty() => {
                    intent.iter().next().cloned().map(Reduced::Element)
                }
                _ => None,
            }
            .unwrap_or_else(|| Reduced::Anonymous(fresh))
        }))
    }

    /// A lattice whose nodes carry the first element of each reduced extent
    /// for meet irreducibles, and fresh anonymous tags elsewhere. `None`
    /// when some extent is absent.
    pub fn get_meet_reduction(&self) -> Option<Lattice<Reduced<E>>> {
        if !self.contains_all_extents() {
            return None;
        }
        let mut reduced = self.clone();
        reduced.make_irreducibles_reduction();
        let meet_irr = reduced.lattice.meet_irreducibles();
        Some(reduced.reduce_nodes(|concept, idx, fresh| {
            match concept.extent() {
                Some(extent) if meet_irr.contains(&idx) && !extent.is_empty() => {
                    extent.iter().next().cloned().map(Reduced::Element)
                }
                _ => None,
            }
            .unwrap_or_else(|| Reduced::Anonymous(fresh))
        }))
    }

    /// A lattice carrying the first reduced intent element on join
    /// irreducibles, the first reduced extent element on meet irreducibles,
    /// both on doubly irreducible concepts, and anonymous tags elsewhere.
    pub fn get_irreducibles_reduction(&self) -> Lattice<Reduced<E>> {
        let mut reduced = self.clone();
        reduced.make_irreducibles_reduction();
        let join_irr = reduced.lattice.join_irreducibles();
        let meet_irr = reduced.lattice.meet_irreducibles();
        reduced.reduce_nodes(|concept, idx, fresh| {
            let join_elem = concept
                .intent()
                .filter(|intent| join_irr.contains(&idx) && !intent.is_empty())
                .and_then(|intent| intent.iter().next().cloned());
            let meet_elem = concept
                .extent()
                .filter(|extent| meet_irr.contains(&idx) && !extent.is_empty())
                .and_then(|extent| extent.iter().next().cloned());
            match (join_elem, meet_elem) {
                (Some(a), Some(b)) => Reduced::Pair(a, b),
                (Some(a), None) => Reduced::Element(a),
                (None, Some(b)) => Reduced::Element(b),
                (None, None) => Reduced::Anonymous(fresh),
            }
        })
    }

    fn reduce_nodes(
        &self,
        mut payload: impl FnMut(&Concept<E>, NodeIndex, u32) -> Reduced<E>,
    ) -> Lattice<Reduced<E>> {
        let mut result = Lattice::new();
        let mut fresh = 0u32;
        let mut map: BTreeMap<NodeIndex, NodeIndex> = BTreeMap::new();
        for idx in self.lattice.node_indices() {
            let reduced = payload(self.lattice.node(idx), idx, fresh);
            if matches!(reduced, Reduced::Anonymous(_)) {
                fresh += 1;
            }
            map.insert(idx, result.add_node(reduced));
        }
        for (source, target) in self.lattice.edge_pairs() {
            if let (Some(&new_source), Some(&new_target)) = (map.get(&source), map.get(&target)) {
                result.add_edge(new_source, new_target, ());
            }
        }
        result
    }
}

/// The valuation tagged on every dependency discovered while expanding a
/// closed set: the set itself, minus every element lying in a strongly
/// connected component of the precedence graph strictly below a component
/// containing one of its elements.
fn step_valuation<C>(system: &C, intent: &BTreeSet<C::Elem>) -> BTreeSet<C::Elem>
where
    C: ClosureSystem,
{
    let condensed = condensation(system.precedence_graph(), true);
    let mut component_of: BTreeMap<C::Elem, NodeIndex> = BTreeMap::new();
    for idx in condensed.node_indices() {
        for e in &condensed[idx] {
            component_of.insert(e.clone(), idx);
        }
    }
    let mut new_val = intent.clone();
    for x in intent {
        let Some(&home) = component_of.get(x) else {
            continue;
        };
        let mut dfs = Dfs::new(&condensed, home);
        while let Some(component) = dfs.next(&condensed) {
            if component == home {
                continue;
            }
            for e in &condensed[component] {
                new_val.remove(e);
            }
        }
    }
    new_val
}
