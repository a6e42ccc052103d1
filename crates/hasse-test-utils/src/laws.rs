//! Assertion helpers for verifying closure-operator laws.
//!
//! These check properties over every subset of a system's ground set and
//! collect all violations into a single report, so you can see every failing
//! law at once rather than fixing them one at a time. Enumeration is
//! exponential in the ground set, so keep test instances small.
//!
//! # Example
//!
//! ```
//! use hasse_core::{ImplicationalSystem, Rule};
//! use hasse_test_utils::laws::assert_closure_laws;
//!
//! let mut is = ImplicationalSystem::new();
//! is.add_all_elements("abc".chars());
//! is.add_rule(Rule::new("ab".chars(), "c".chars()));
//! assert_closure_laws(&is);
//! ```

use std::collections::BTreeSet;
use std::fmt::Write;

use hasse_core::{ClosureSystem, Element, ImplicationalSystem};

/// Collect violations into a `Vec<String>`, then panic with a combined
/// report if any were found.
fn report(violations: Vec<String>) {
    if violations.is_empty() {
        return;
    }
    let mut msg = format!("{} closure law violation(s):\n", violations.len());
    for (i, v) in violations.iter().enumerate() {
        let _ = writeln!(msg, "  {}. {}", i + 1, v);
    }
    panic!("{msg}");
}

/// Every subset of `ground`, in lexicographic order of the bit patterns.
pub fn power_set<E: Element>(ground: &BTreeSet<E>) -> Vec<BTreeSet<E>> {
    let elements: Vec<&E> = ground.iter().collect();
    let mut subsets = Vec::with_capacity(1 << elements.len());
    for mask in 0u64..(1u64 << elements.len()) {
        let subset: BTreeSet<E> = elements
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, e)| (*e).clone())
            .collect();
        subsets.push(subset);
    }
    subsets
}

/// Check that a closure operator is extensive, monotone and idempotent over
/// every subset of its ground set.
///
/// Specifically, for every subset `X` and pair `X ⊆ Y`:
/// - **Extensive**: `X ⊆ closure(X)`
/// - **Monotone**: `closure(X) ⊆ closure(Y)`
/// - **Idempotent**: `closure(closure(X)) == closure(X)`
pub fn assert_closure_laws<C: ClosureSystem>(system: &C) {
    let mut violations = Vec::new();
    let subsets = power_set(system.ground_set());
    for x in &subsets {
        let closed = system.closure(x);
        if !x.is_subset(&closed) {
            violations.push(format!("closure not extensive on {x:?}"));
        }
        if system.closure(&closed) != closed {
            violations.push(format!("closure not idempotent on {x:?}"));
        }
    }
    for x in &subsets {
        for y in &subsets {
            if x.is_subset(y) && !system.closure(x).is_subset(&system.closure(y)) {
                violations.push(format!(
                    "closure not monotone: closure({x:?}) is not within closure({y:?})"
                ));
            }
        }
    }
    report(violations);
}

/// Check that two closure systems define the same closure operator: equal
/// ground sets, and equal closures on every subset.
pub fn assert_same_closure_operator<C, D>(lhs: &C, rhs: &D)
where
    C: ClosureSystem,
    D: ClosureSystem<Elem = C::Elem>,
{
    let mut violations = Vec::new();
    if lhs.ground_set() != rhs.ground_set() {
        violations.push(format!(
            "ground sets differ: {:?} vs {:?}",
            lhs.ground_set(),
            rhs.ground_set()
        ));
    } else {
        for x in power_set(lhs.ground_set()) {
            let left = lhs.closure(&x);
            let right = rhs.closure(&x);
            if left != right {
                violations.push(format!(
                    "closures of {x:?} differ: {left:?} vs {right:?}"
                ));
            }
        }
    }
    report(violations);
}

/// Check that a rewrite preserves the closure operator of a system.
///
/// # Example
///
/// ```
/// use hasse_core::{ImplicationalSystem, Rule};
/// use hasse_test_utils::laws::assert_rewrite_preserves_closures;
///
/// let mut is = ImplicationalSystem::new();
/// is.add_all_elements("abc".chars());
/// is.add_rule(Rule::new("a".chars(), "bc".chars()));
/// assert_rewrite_preserves_closures(&is, ImplicationalSystem::make_unary);
/// ```
pub fn assert_rewrite_preserves_closures<E: Element>(
    system: &ImplicationalSystem<E>,
    rewrite: impl Fn(&mut ImplicationalSystem<E>) -> isize,
) {
    let mut rewritten = system.clone();
    rewrite(&mut rewritten);
    assert_same_closure_operator(system, &rewritten);
}

/// Check that applying a rewrite twice yields the same system as applying
/// it once, structurally.
pub fn assert_rewrite_idempotent<E: Element>(
    system: &ImplicationalSystem<E>,
    rewrite: impl Fn(&mut ImplicationalSystem<E>) -> isize,
) {
    let mut once = system.clone();
    rewrite(&mut once);
    let mut twice = once.clone();
    rewrite(&mut twice);
    if once != twice {
        panic!("rewrite is not idempotent:\n  once:  {once:?}\n  twice: {twice:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hasse_core::Rule;

    #[test]
    fn power_set_has_the_right_cardinality() {
        let ground: BTreeSet<char> = "abc".chars().collect();
        let subsets = power_set(&ground);
        assert_eq!(subsets.len(), 8);
        let distinct: BTreeSet<_> = subsets.into_iter().collect();
        assert_eq!(distinct.len(), 8);
    }

    #[test]
    fn laws_hold_for_a_small_system() {
        let mut is = ImplicationalSystem::new();
        is.add_all_elements("abcd".chars());
        is.add_rule(Rule::new("ab".chars(), "c".chars()));
        is.add_rule(Rule::new("c".chars(), "d".chars()));
        assert_closure_laws(&is);
        assert_rewrite_preserves_closures(&is, ImplicationalSystem::make_canonical_basis);
        assert_rewrite_idempotent(&is, ImplicationalSystem::make_canonical_direct_basis);
    }

    #[test]
    #[should_panic(expected = "closures of")]
    fn different_operators_are_reported() {
        let mut lhs = ImplicationalSystem::new();
        lhs.add_all_elements("ab".chars());
        lhs.add_rule(Rule::new("a".chars(), "b".chars()));
        let mut rhs = ImplicationalSystem::new();
        rhs.add_all_elements("ab".chars());
        assert_same_closure_operator(&lhs, &rhs);
    }
}
