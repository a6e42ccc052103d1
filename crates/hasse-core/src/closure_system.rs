use std::collections::{BTreeMap, BTreeSet};

use petgraph::graph::DiGraph;

use crate::element::Element;

/// Capability contract for closure systems.
///
/// A closure system exposes a totally ordered ground set and a closure
/// operator over its subsets. Everything else here is derived from those two
/// operations, so alternative implementations (rule systems, formal
/// contexts, ...) get enumeration, precedence and reducibility for free.
pub trait ClosureSystem {
    type Elem: Element;

    /// The ground set, in its total order.
    fn ground_set(&self) -> &BTreeSet<Self::Elem>;

    /// The smallest closed superset of `x`.
    fn closure(&self, x: &BTreeSet<Self::Elem>) -> BTreeSet<Self::Elem>;

    /// Every closed set exactly once, in lectic order, by Ganter's Next
    /// Closure enumeration.
    fn all_closures(&self) -> Vec<BTreeSet<Self::Elem>> {
        let ground: Vec<Self::Elem> = self.ground_set().iter().cloned().collect();
        let mut current = self.closure(&BTreeSet::new());
        let mut closures = vec![current.clone()];
        while current.len() < ground.len() {
            let mut successor = None;
            for i in (0..ground.len()).rev() {
                let e = &ground[i];
                if current.contains(e) {
                    continue;
                }
                let mut seed: BTreeSet<Self::Elem> =
                    current.iter().filter(|x| *x < e).cloned().collect();
                seed.insert(e.clone());
                let closed = self.closure(&seed);
                // lectic validity: nothing below e may appear that was not
                // already below e in the current closed set
                if closed.iter().all(|x| !(x < e) || current.contains(x)) {
                    successor = Some(closed);
                    break;
                }
            }
            match successor {
                Some(next) => {
                    closures.push(next.clone());
                    current = next;
                }
                None => break,
            }
        }
        closures
    }

    /// The precedence graph: one node per element, and an edge `a -> b`
    /// whenever `b` belongs to `closure({a})` without being `a`.
    ///
    /// The graph is cyclic exactly when the system is not reduced, so
    /// consumers must contract strongly connected components rather than
    /// topologically sort it.
    fn precedence_graph(&self) -> DiGraph<Self::Elem, ()> {
        let mut graph = DiGraph::new();
        let mut index = BTreeMap::new();
        for e in self.ground_set() {
            index.insert(e.clone(), graph.add_node(e.clone()));
        }
        for a in self.ground_set() {
            let singleton: BTreeSet<Self::Elem> = std::iter::once(a.clone()).collect();
            for b in self.closure(&singleton) {
                if &b != a {
                    graph.add_edge(index[a], index[&b], ());
                }
            }
        }
        graph
    }

    /// Elements closure-equivalent to a subset of the others, mapped to one
    /// such equivalence class.
    ///
    /// Elements already classified as reducible are excluded from later
    /// classes, so the surviving elements always regenerate the removed
    /// ones. A mutually equivalent set of single elements is preferred as
    /// the class; failing that, the rest of the element's closure qualifies
    /// when it regenerates the element.
    fn reducible_elements(&self) -> BTreeMap<Self::Elem, BTreeSet<Self::Elem>> {
        let mut reduced: BTreeMap<Self::Elem, BTreeSet<Self::Elem>> = BTreeMap::new();
        for e in self.ground_set() {
            let singleton: BTreeSet<Self::Elem> = std::iter::once(e.clone()).collect();
            let e_closure = self.closure(&singleton);

            let mut class = BTreeSet::new();
            for x in &e_closure {
                if x == e || reduced.contains_key(x) {
                    continue;
                }
                let other: BTreeSet<Self::Elem> = std::iter::once(x.clone()).collect();
                if self.closure(&other).contains(e) {
                    class.insert(x.clone());
                }
            }
            if !class.is_empty() {
                reduced.insert(e.clone(), class);
                continue;
            }

            let rest: BTreeSet<Self::Elem> = e_closure
                .iter()
                .filter(|x| *x != e && !reduced.contains_key(*x))
                .cloned()
                .collect();
            if self.closure(&rest).contains(e) {
                reduced.insert(e.clone(), rest);
            }
        }
        reduced
    }
}
