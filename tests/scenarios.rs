use std::collections::BTreeSet;

use hasse::prelude::*;
use hasse_test_utils::{
    assert_closure_laws, assert_rewrite_idempotent, assert_rewrite_preserves_closures,
    random_system,
};

fn set(elements: &str) -> BTreeSet<char> {
    elements.chars().collect()
}

fn rule(premise: &str, conclusion: &str) -> Rule<char> {
    Rule::new(premise.chars(), conclusion.chars())
}

fn system(ground: &str, rules: &[(&str, &str)]) -> ImplicationalSystem<char> {
    let mut is = ImplicationalSystem::new();
    is.add_all_elements(ground.chars());
    for (premise, conclusion) in rules {
        assert!(is.add_rule(rule(premise, conclusion)));
    }
    is
}

fn unary_rules(is: &ImplicationalSystem<char>) -> BTreeSet<Rule<char>> {
    let mut unary = is.clone();
    unary.make_unary();
    unary.rules().clone()
}

#[test]
fn two_step_chain_of_rules() {
    let is = system("abcde", &[("ab", "cd"), ("cd", "e")]);
    assert_eq!(is.closure(&set("ab")), set("abcde"));
    assert_eq!(is.closure(&set("c")), set("c"));
    assert_eq!(is.closure(&set("cd")), set("cde"));

    let mut unary = is.clone();
    let delta = unary.make_unary();
    assert_eq!(delta, -1);
    assert_eq!(
        unary.rules(),
        &[rule("ab", "c"), rule("ab", "d"), rule("cd", "e")].into()
    );

    let mut basis = is.clone();
    basis.make_canonical_direct_basis();
    assert_eq!(
        unary_rules(&basis),
        [
            rule("ab", "c"),
            rule("ab", "d"),
            rule("ab", "e"),
            rule("cd", "e")
        ]
        .into()
    );
    assert!(basis.is_direct());
    assert!(basis.is_canonical_direct_basis());
}

#[test]
fn transitive_chain_and_its_lattice() {
    let is = system("abc", &[("a", "b"), ("b", "c")]);

    let lattice = ConceptLattice::diagram_lattice(&is);
    assert_eq!(lattice.node_count(), 4);
    assert_eq!(
        lattice.intents(),
        [set(""), set("c"), set("bc"), set("abc")].into()
    );

    assert!(!is.is_direct());
    let mut direct = is.clone();
    direct.make_direct();
    assert_eq!(
        unary_rules(&direct),
        [rule("a", "b"), rule("a", "c"), rule("b", "c")].into()
    );
    assert!(direct.is_direct());
}

#[test]
fn improper_rule_becomes_proper() {
    let mut is = system("ab", &[("a", "ab")]);
    assert!(!is.is_proper());
    let delta = is.make_proper();
    assert_eq!(delta, 0);
    assert_eq!(is.rules(), &[rule("a", "b")].into());
    assert!(is.is_proper());
}

#[test]
fn empty_rule_set_yields_the_power_set_lattice() {
    let is = system("abc", &[]);
    let lattice = ConceptLattice::diagram_lattice(&is);
    assert_eq!(lattice.node_count(), 8);
    let bottom = lattice.bottom().unwrap();
    let top = lattice.top().unwrap();
    assert_eq!(lattice.concept(bottom).intent(), Some(&set("")));
    assert_eq!(lattice.concept(top).intent(), Some(&set("abc")));
}

#[test]
fn unconditional_rules_raise_the_bottom() {
    let is = system("ab", &[("", "a")]);
    assert_eq!(is.closure(&set("")), set("a"));

    let lattice = ConceptLattice::diagram_lattice(&is);
    let bottom = lattice.bottom().unwrap();
    assert_eq!(lattice.concept(bottom).intent(), Some(&set("a")));
}

#[test]
fn equivalent_elements_reduce_away() {
    let mut is = system("abc", &[("a", "b"), ("b", "a"), ("a", "c")]);
    let removed = is.reduction();
    assert_eq!(removed.len(), 1);
    let (element, class) = removed.iter().next().unwrap();
    assert_eq!(*element, 'a');
    assert_eq!(class, &set("b"));

    // closures agree on the surviving ground set
    assert_eq!(is.ground_set(), &set("bc"));
    assert_eq!(is.closure(&set("b")), set("bc"));
    assert_eq!(is.closure(&set("c")), set("c"));
}

// ----------------------------------------------------------------------
// Universal properties over random instances
// ----------------------------------------------------------------------

type Rewrite = fn(&mut ImplicationalSystem<u32>) -> isize;

const REWRITES: &[(&str, Rewrite)] = &[
    ("make_proper", ImplicationalSystem::make_proper),
    ("make_unary", ImplicationalSystem::make_unary),
    ("make_compact", ImplicationalSystem::make_compact),
    ("make_right_maximal", ImplicationalSystem::make_right_maximal),
    ("make_left_minimal", ImplicationalSystem::make_left_minimal),
    ("make_direct", ImplicationalSystem::make_direct),
    ("make_minimum", ImplicationalSystem::make_minimum),
    (
        "make_canonical_direct_basis",
        ImplicationalSystem::make_canonical_direct_basis,
    ),
    (
        "make_canonical_basis",
        ImplicationalSystem::make_canonical_basis,
    ),
];

#[test]
fn random_systems_satisfy_the_closure_laws() {
    for seed in 0..8 {
        assert_closure_laws(&random_system(seed, 6, 5));
    }
}

#[test]
fn rewrites_preserve_closures_on_random_systems() {
    for seed in 0..5 {
        let is = random_system(seed, 5, 4);
        for (_, rewrite) in REWRITES {
            assert_rewrite_preserves_closures(&is, rewrite);
        }
    }
}

#[test]
fn rewrites_are_idempotent_on_random_systems() {
    for seed in 0..5 {
        let is = random_system(seed, 5, 4);
        for (_, rewrite) in REWRITES {
            assert_rewrite_idempotent(&is, rewrite);
        }
    }
}

#[test]
fn canonical_forms_agree_across_presentations() {
    for seed in 0..5 {
        let is = random_system(seed, 5, 4);
        // a different presentation of the same closure operator
        let mut other = is.clone();
        other.make_right_maximal();

        let mut lhs = is.clone();
        lhs.make_canonical_basis();
        let mut rhs = other.clone();
        rhs.make_canonical_basis();
        assert_eq!(lhs, rhs, "canonical bases differ (seed {seed})");

        let mut lhs = is.clone();
        lhs.make_canonical_direct_basis();
        let mut rhs = other;
        rhs.make_canonical_direct_basis();
        assert_eq!(lhs, rhs, "canonical direct bases differ (seed {seed})");
    }
}

#[test]
fn diagram_nodes_are_exactly_the_closures() {
    for seed in 0..5 {
        let is = random_system(seed, 5, 4);
        let diagram = ConceptLattice::diagram_lattice(&is);
        let enumerated: BTreeSet<BTreeSet<u32>> = is.all_closures().into_iter().collect();
        assert_eq!(diagram.intents(), enumerated, "seed {seed}");
    }
}

#[test]
fn round_trip_through_the_text_format() {
    let is = system("abcde", &[("ab", "cd"), ("cd", "e"), ("", "a")]);
    let mut buffer = Vec::new();
    hasse::write_to(&is, &mut buffer).unwrap();
    let again: ImplicationalSystem<char> =
        hasse::read_from(std::io::Cursor::new(buffer.as_slice())).unwrap();
    assert_eq!(is, again);
}
