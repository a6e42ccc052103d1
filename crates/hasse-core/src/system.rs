use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::closure_system::ClosureSystem;
use crate::dependency::DependencyGraph;
use crate::element::Element;
use crate::rule::{compact_token, Rule};

/// An implicational system: a totally ordered ground set together with a
/// totally ordered set of rules over it.
///
/// The system is a closure system, and additionally supports the classical
/// basis rewrites (proper, unary, compact, right-maximal, left-minimal,
/// direct, minimum, canonical basis, canonical direct basis). Every rewrite
/// preserves the closure operator and reports the rule-count delta
/// `before - after`.
///
/// Invariants kept by the mutation API:
/// - no duplicate rules,
/// - every rule mentions only ground-set elements,
/// - deleting an element removes it from all rules and drops rules whose
///   conclusion empties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImplicationalSystem<E: Element> {
    ground: BTreeSet<E>,
    sigma: BTreeSet<Rule<E>>,
}

impl<E: Element> ImplicationalSystem<E> {
    pub fn new() -> Self {
        Self {
            ground: BTreeSet::new(),
            sigma: BTreeSet::new(),
        }
    }

    /// Build a system from rules, with the ground set inferred as the union
    /// of every rule's elements.
    pub fn from_rules(rules: impl IntoIterator<Item = Rule<E>>) -> Self {
        let sigma: BTreeSet<Rule<E>> = rules.into_iter().collect();
        let mut ground = BTreeSet::new();
        for rule in &sigma {
            ground.extend(rule.elements().cloned());
        }
        Self { ground, sigma }
    }

    pub fn ground_set(&self) -> &BTreeSet<E> {
        &self.ground
    }

    pub fn rules(&self) -> &BTreeSet<Rule<E>> {
        &self.sigma
    }

    pub fn size_elements(&self) -> usize {
        self.ground.len()
    }

    pub fn size_rules(&self) -> usize {
        self.sigma.len()
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Insert an element into the ground set. Returns whether it was new.
    pub fn add_element(&mut self, e: E) -> bool {
        self.ground.insert(e)
    }

    /// Insert several elements. Returns whether every one of them was new.
    pub fn add_all_elements(&mut self, elements: impl IntoIterator<Item = E>) -> bool {
        let mut all_new = true;
        for e in elements {
            if !self.ground.insert(e) {
                all_new = false;
            }
        }
        all_new
    }

    /// Remove an element from the ground set and from both halves of every
    /// rule; rules whose conclusion empties are dropped. Returns whether the
    /// element was present.
    pub fn delete_element(&mut self, e: &E) -> bool {
        if !self.ground.remove(e) {
            return false;
        }
        let snapshot = self.sigma.clone();
        for rule in &snapshot {
            if !rule.premise().contains(e) && !rule.conclusion().contains(e) {
                continue;
            }
            let mut premise = rule.premise().clone();
            let mut conclusion = rule.conclusion().clone();
            premise.remove(e);
            conclusion.remove(e);
            if conclusion.is_empty() {
                self.remove_rule(rule);
            } else {
                self.replace_rule(rule, Rule::from_sets(premise, conclusion));
            }
        }
        true
    }

    /// Whether the ground set contains every element of the rule.
    pub fn check_rule_elements(&self, rule: &Rule<E>) -> bool {
        rule.elements().all(|e| self.ground.contains(e))
    }

    pub fn contains_rule(&self, rule: &Rule<E>) -> bool {
        self.sigma.contains(rule)
    }

    /// Insert a rule when it is new and mentions only ground-set elements.
    pub fn add_rule(&mut self, rule: Rule<E>) -> bool {
        if self.contains_rule(&rule) || !self.check_rule_elements(&rule) {
            return false;
        }
        self.sigma.insert(rule)
    }

    pub fn remove_rule(&mut self, rule: &Rule<E>) -> bool {
        self.sigma.remove(rule)
    }

    /// Remove `old` and insert `new`, as a pair.
    pub fn replace_rule(&mut self, old: &Rule<E>, new: Rule<E>) -> bool {
        self.remove_rule(old) && self.add_rule(new)
    }

    // ------------------------------------------------------------------
    // Closure
    // ------------------------------------------------------------------

    /// The smallest superset of `x` closed under the rules.
    ///
    /// A rule fires when its premise is contained in the working set or is
    /// empty; passes repeat until a full pass adds nothing. One pass
    /// suffices on a direct system.
    pub fn closure(&self, x: &BTreeSet<E>) -> BTreeSet<E> {
        let mut closed = x.clone();
        loop {
            let before = closed.len();
            for rule in &self.sigma {
                if rule.premise().is_empty() || rule.premise().is_subset(&closed) {
                    closed.extend(rule.conclusion().iter().cloned());
                }
            }
            if closed.len() == before {
                return closed;
            }
        }
    }

    // ------------------------------------------------------------------
    // Property predicates
    // ------------------------------------------------------------------

    /// No conclusion element appears in its own premise.
    pub fn is_proper(&self) -> bool {
        self.sigma
            .iter()
            .all(|rule| rule.conclusion().is_disjoint(rule.premise()))
    }

    /// Every conclusion is a singleton.
    pub fn is_unary(&self) -> bool {
        self.sigma.iter().all(|rule| rule.conclusion().len() == 1)
    }

    /// No two distinct rules share a premise.
    pub fn is_compact(&self) -> bool {
        let premises: BTreeSet<&BTreeSet<E>> =
            self.sigma.iter().map(|rule| rule.premise()).collect();
        premises.len() == self.sigma.len()
    }

    /// Every conclusion is a closed set.
    pub fn is_right_maximal(&self) -> bool {
        self.sigma
            .iter()
            .all(|rule| self.closure(rule.conclusion()).is_subset(rule.conclusion()))
    }

    /// No rule's premise strictly contains another premise with the same
    /// conclusion.
    pub fn is_left_minimal(&self) -> bool {
        for r1 in &self.sigma {
            for r2 in &self.sigma {
                if r1 != r2
                    && r1.premise().is_subset(r2.premise())
                    && r1.conclusion() == r2.conclusion()
                {
                    return false;
                }
            }
        }
        true
    }

    /// Every closure is reached by a single pass over the rules.
    pub fn is_direct(&self) -> bool {
        for r1 in &self.sigma {
            let mut one_pass = r1.premise().clone();
            for r2 in &self.sigma {
                if r2.premise().is_subset(r1.premise()) {
                    one_pass.extend(r2.conclusion().iter().cloned());
                }
            }
            if one_pass != self.closure(r1.premise()) {
                return false;
            }
        }
        true
    }

    /// No rule is redundant: removing any rule changes some closure.
    pub fn is_minimum(&self) -> bool {
        let mut tmp = self.clone();
        tmp.make_right_maximal();
        for rule in &self.sigma {
            let mut epsilon = tmp.clone();
            epsilon.remove_rule(rule);
            if epsilon.closure(rule.premise()) == self.closure(rule.premise()) {
                return false;
            }
        }
        true
    }

    /// Structural equality with the canonical direct basis of the system.
    pub fn is_canonical_direct_basis(&self) -> bool {
        let mut basis = self.clone();
        basis.make_canonical_direct_basis();
        self.is_included_in(&basis) && basis.is_included_in(self)
    }

    /// Structural equality with the canonical basis of the system.
    pub fn is_canonical_basis(&self) -> bool {
        let mut basis = self.clone();
        basis.make_canonical_basis();
        self.is_included_in(&basis) && basis.is_included_in(self)
    }

    /// Rule-set inclusion, compared on the proper unary forms of both sides.
    pub fn is_included_in(&self, other: &Self) -> bool {
        let mut lhs = self.clone();
        lhs.make_proper();
        lhs.make_unary();
        let mut rhs = other.clone();
        rhs.make_proper();
        rhs.make_unary();
        lhs.sigma.is_subset(&rhs.sigma)
    }

    /// Whether no element is closure-equivalent to a subset of the others.
    pub fn is_reduced(&self) -> bool {
        let mut tmp = self.clone();
        tmp.reduction().is_empty()
    }

    // ------------------------------------------------------------------
    // Rewrites
    //
    // Each rewrite copies sigma, iterates the snapshot and mutates the live
    // rule set through the add/remove API, so a partially rewritten system
    // is never observable.
    // ------------------------------------------------------------------

    /// Delete from every conclusion the elements already in the premise;
    /// rules whose conclusion empties are dropped.
    pub fn make_proper(&mut self) -> isize {
        let snapshot = self.sigma.clone();
        let before = snapshot.len() as isize;
        for rule in &snapshot {
            let conclusion: BTreeSet<E> = rule
                .conclusion()
                .difference(rule.premise())
                .cloned()
                .collect();
            if &conclusion == rule.conclusion() {
                continue;
            }
            if conclusion.is_empty() {
                self.remove_rule(rule);
            } else {
                self.replace_rule(rule, Rule::from_sets(rule.premise().clone(), conclusion));
            }
        }
        before - self.sigma.len() as isize
    }

    /// Split every rule with a non-singleton conclusion into one rule per
    /// conclusion element.
    pub fn make_unary(&mut self) -> isize {
        let snapshot = self.sigma.clone();
        let before = snapshot.len() as isize;
        for rule in &snapshot {
            if rule.conclusion().len() > 1 {
                self.remove_rule(rule);
                for c in rule.conclusion() {
                    self.add_rule(Rule::from_sets(
                        rule.premise().clone(),
                        std::iter::once(c.clone()).collect(),
                    ));
                }
            }
        }
        before - self.sigma.len() as isize
    }

    /// Merge rules sharing a premise into one rule whose conclusion is the
    /// union of theirs, rebuilding the rule set.
    pub fn make_compact(&mut self) -> isize {
        let before = self.sigma.len() as isize;
        let mut grouped: BTreeMap<BTreeSet<E>, BTreeSet<E>> = BTreeMap::new();
        for rule in &self.sigma {
            grouped
                .entry(rule.premise().clone())
                .or_default()
                .extend(rule.conclusion().iter().cloned());
        }
        self.sigma = grouped
            .into_iter()
            .map(|(premise, conclusion)| Rule::from_sets(premise, conclusion))
            .collect();
        before - self.sigma.len() as isize
    }

    /// Compact, then replace every conclusion by the closure of its premise.
    pub fn make_right_maximal(&mut self) -> isize {
        let before = self.size_rules() as isize;
        self.make_compact();
        let snapshot = self.sigma.clone();
        for rule in &snapshot {
            let closed = self.closure(rule.premise());
            if &closed != rule.conclusion() {
                self.replace_rule(rule, Rule::from_sets(rule.premise().clone(), closed));
            }
        }
        before - self.size_rules() as isize
    }

    /// Unary form first; among rules with equal conclusions, drop those whose
    /// premise contains another premise; compact to finish.
    pub fn make_left_minimal(&mut self) -> isize {
        self.make_unary();
        let snapshot = self.sigma.clone();
        let before = snapshot.len() as isize;
        for r1 in &snapshot {
            for r2 in &snapshot {
                if r1 != r2
                    && r1.premise().is_subset(r2.premise())
                    && r1.conclusion() == r2.conclusion()
                {
                    self.remove_rule(r2);
                }
            }
        }
        self.make_compact();
        before - self.sigma.len() as isize
    }

    /// Saturate the rule set so that every closure is reached in one pass.
    ///
    /// After the unary proper form, pairs of rules derive new ones until a
    /// full pass adds nothing; the iteration count is exponential in the
    /// worst case.
    pub fn make_direct(&mut self) -> isize {
        self.make_unary();
        self.make_proper();
        let before = self.size_rules() as isize;
        loop {
            let snapshot = self.sigma.clone();
            for r1 in &snapshot {
                for r2 in &snapshot {
                    if r1 == r2 || r2.conclusion().is_subset(r1.premise()) {
                        continue;
                    }
                    let mut derived: BTreeSet<E> = r2
                        .premise()
                        .difference(r1.conclusion())
                        .cloned()
                        .collect();
                    derived.extend(r1.premise().iter().cloned());
                    if !r2.premise().is_subset(&derived) {
                        self.add_rule(Rule::from_sets(derived, r2.conclusion().clone()));
                    }
                }
            }
            if self.size_rules() == snapshot.len() {
                break;
            }
        }
        self.make_compact();
        before - self.size_rules() as isize
    }

    /// Right-maximal form, then drop every rule whose removal leaves the
    /// closure of its premise unchanged.
    pub fn make_minimum(&mut self) -> isize {
        self.make_right_maximal();
        let snapshot = self.sigma.clone();
        let before = snapshot.len() as isize;
        for rule in &snapshot {
            let mut epsilon = self.clone();
            epsilon.remove_rule(rule);
            if epsilon.closure(rule.premise()) == self.closure(rule.premise()) {
                self.remove_rule(rule);
            }
        }
        before - self.size_rules() as isize
    }

    /// Replace the system by its canonical direct basis.
    pub fn make_canonical_direct_basis(&mut self) -> isize {
        let before = self.size_rules() as isize;
        self.make_proper();
        self.make_left_minimal();
        self.make_direct();
        self.make_left_minimal();
        self.make_compact();
        before - self.size_rules() as isize
    }

    /// Replace the system by its canonical (Duquenne-Guigues) basis: minimum
    /// form, premises saturated against the remaining rules, proper form.
    pub fn make_canonical_basis(&mut self) -> isize {
        self.make_minimum();
        let snapshot = self.sigma.clone();
        let before = snapshot.len() as isize;
        for rule in &snapshot {
            let mut epsilon = self.clone();
            epsilon.remove_rule(rule);
            let saturated = Rule::from_sets(
                epsilon.closure(rule.premise()),
                rule.conclusion().clone(),
            );
            if &saturated != rule {
                self.replace_rule(rule, saturated);
            }
        }
        self.make_proper();
        before - self.size_rules() as isize
    }

    // ------------------------------------------------------------------
    // Reduction
    // ------------------------------------------------------------------

    /// Remove every reducible element, rewriting rules through the
    /// equivalence classes and dropping rules whose conclusions become
    /// always true. Returns the removed elements with their classes.
    pub fn reduction(&mut self) -> BTreeMap<E, BTreeSet<E>> {
        let reducible = self.reducible_elements();
        let truth = self.closure(&BTreeSet::new());
        for (x, class) in &reducible {
            let snapshot = self.sigma.clone();
            for rule in &snapshot {
                let mut premise = rule.premise().clone();
                let mut conclusion = rule.conclusion().clone();
                let mut modified = false;
                if premise.remove(x) {
                    premise.extend(class.iter().cloned());
                    modified = true;
                }
                if conclusion.remove(x) {
                    conclusion.extend(class.iter().cloned());
                    modified = true;
                }
                if modified {
                    if conclusion.is_subset(&truth) {
                        self.remove_rule(rule);
                    } else {
                        self.replace_rule(rule, Rule::from_sets(premise, conclusion));
                    }
                } else if rule.conclusion().is_subset(&truth) {
                    self.remove_rule(rule);
                }
            }
            self.delete_element(x);
        }
        reducible
    }

    // ------------------------------------------------------------------
    // Graphs
    // ------------------------------------------------------------------

    /// The representative graph of the unary form: a rule `P + b -> a`
    /// contributes an edge `a -> b` valued by `P`, so an edge collects one
    /// witness per rule producing it.
    pub fn representative_graph(&self) -> DependencyGraph<E> {
        let mut unary = self.clone();
        unary.make_unary();
        let mut graph = DependencyGraph::new(unary.ground.iter().cloned());
        for rule in &unary.sigma {
            let Some(a) = rule.conclusion().iter().next() else {
                continue;
            };
            for b in rule.premise() {
                let mut witness = rule.premise().clone();
                witness.remove(b);
                if let Some(valuation) = graph.valuation_mut(a, b) {
                    valuation.insert(witness);
                }
            }
        }
        graph
    }

    /// The dependency graph: the representative graph of the canonical
    /// direct basis. Encodes at once the minimal generators and the
    /// canonical direct basis.
    pub fn dependency_graph(&self) -> DependencyGraph<E> {
        let mut basis = self.clone();
        basis.make_canonical_direct_basis();
        basis.make_unary();
        basis.representative_graph()
    }
}

impl<E: Element> ClosureSystem for ImplicationalSystem<E> {
    type Elem = E;

    fn ground_set(&self) -> &BTreeSet<E> {
        ImplicationalSystem::ground_set(self)
    }

    fn closure(&self, x: &BTreeSet<E>) -> BTreeSet<E> {
        ImplicationalSystem::closure(self, x)
    }
}

impl<E: Element + fmt::Display> fmt::Display for ImplicationalSystem<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for e in &self.ground {
            write!(f, "{} ", compact_token(e))?;
        }
        writeln!(f)?;
        for rule in &self.sigma {
            writeln!(f, "{rule}")?;
        }
        Ok(())
    }
}
