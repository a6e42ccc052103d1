use std::collections::BTreeSet;
use std::fmt;

use crate::element::Element;

/// An implication `premise -> conclusion` over some ground set.
///
/// Both halves are ordered sets. Equality is structural and the total order
/// is lexicographic on the premise, then the conclusion, which keeps rule
/// iteration deterministic everywhere.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rule<E: Element> {
    premise: BTreeSet<E>,
    conclusion: BTreeSet<E>,
}

impl<E: Element> Rule<E> {
    pub fn new(
        premise: impl IntoIterator<Item = E>,
        conclusion: impl IntoIterator<Item = E>,
    ) -> Self {
        Self {
            premise: premise.into_iter().collect(),
            conclusion: conclusion.into_iter().collect(),
        }
    }

    /// Build a rule directly from already-ordered halves.
    pub fn from_sets(premise: BTreeSet<E>, conclusion: BTreeSet<E>) -> Self {
        Self {
            premise,
            conclusion,
        }
    }

    pub fn premise(&self) -> &BTreeSet<E> {
        &self.premise
    }

    pub fn conclusion(&self) -> &BTreeSet<E> {
        &self.conclusion
    }

    /// All elements mentioned by the rule, premise first.
    pub fn elements(&self) -> impl Iterator<Item = &E> {
        self.premise.iter().chain(self.conclusion.iter())
    }
}

impl<E: Element + fmt::Display> fmt::Display for Rule<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for e in &self.premise {
            write!(f, "{} ", compact_token(e))?;
        }
        write!(f, "->")?;
        for e in &self.conclusion {
            write!(f, " {}", compact_token(e))?;
        }
        Ok(())
    }
}

/// Render an element with any internal whitespace removed, so that the
/// line-oriented text format stays tokenisable.
pub(crate) fn compact_token<E: fmt::Display>(e: &E) -> String {
    e.to_string().split_whitespace().collect()
}

/// A rule mined from data, carrying its support and confidence in `[0, 1]`.
#[derive(Debug, Clone)]
pub struct AssociationRule<E: Element> {
    rule: Rule<E>,
    support: f64,
    confidence: f64,
}

impl<E: Element> AssociationRule<E> {
    pub fn new(rule: Rule<E>, support: f64, confidence: f64) -> Self {
        Self {
            rule,
            support,
            confidence,
        }
    }

    pub fn rule(&self) -> &Rule<E> {
        &self.rule
    }

    pub fn support(&self) -> f64 {
        self.support
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

impl<E: Element> PartialEq for AssociationRule<E> {
    fn eq(&self, other: &Self) -> bool {
        self.rule == other.rule
            && self.support.to_bits() == other.support.to_bits()
            && self.confidence.to_bits() == other.confidence.to_bits()
    }
}

impl<E: Element> Eq for AssociationRule<E> {}

impl<E: Element> PartialOrd for AssociationRule<E> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<E: Element> Ord for AssociationRule<E> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rule
            .cmp(&other.rule)
            .then(self.support.total_cmp(&other.support))
            .then(self.confidence.total_cmp(&other.confidence))
    }
}

impl<E: Element> std::hash::Hash for AssociationRule<E> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.rule.hash(state);
        self.support.to_bits().hash(state);
        self.confidence.to_bits().hash(state);
    }
}

/// Merge association rules sharing a premise, a support and a confidence into
/// a single rule whose conclusion is the union of theirs.
///
/// Returns the rule-count delta `before - after`.
pub fn make_compact_association<E: Element>(rules: &mut BTreeSet<AssociationRule<E>>) -> isize {
    use std::collections::BTreeMap;

    let before = rules.len() as isize;
    let mut grouped: BTreeMap<(BTreeSet<E>, u64, u64), BTreeSet<E>> = BTreeMap::new();
    for ar in rules.iter() {
        grouped
            .entry((
                ar.rule.premise().clone(),
                ar.support.to_bits(),
                ar.confidence.to_bits(),
            ))
            .or_default()
            .extend(ar.rule.conclusion().iter().cloned());
    }
    *rules = grouped
        .into_iter()
        .map(|((premise, support, confidence), conclusion)| {
            AssociationRule::new(
                Rule::from_sets(premise, conclusion),
                f64::from_bits(support),
                f64::from_bits(confidence),
            )
        })
        .collect();
    before - rules.len() as isize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(premise: &str, conclusion: &str) -> Rule<char> {
        Rule::new(premise.chars(), conclusion.chars())
    }

    #[test]
    fn rules_order_by_premise_then_conclusion() {
        let ab_c = rule("ab", "c");
        let ab_d = rule("ab", "d");
        let b_a = rule("b", "a");
        assert!(ab_c < ab_d);
        assert!(ab_c < b_a);

        let mut sorted = BTreeSet::new();
        sorted.insert(b_a.clone());
        sorted.insert(ab_d.clone());
        sorted.insert(ab_c.clone());
        let order: Vec<_> = sorted.into_iter().collect();
        assert_eq!(order, vec![ab_c, ab_d, b_a]);
    }

    #[test]
    fn duplicate_rules_collapse_in_sets() {
        let mut rules = BTreeSet::new();
        assert!(rules.insert(rule("ab", "cd")));
        assert!(!rules.insert(rule("ab", "cd")));
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn display_is_token_oriented() {
        let r: Rule<String> = Rule::new(
            ["a b".to_string(), "c".to_string()],
            ["d e f".to_string()],
        );
        assert_eq!(r.to_string(), "ab c -> def");
    }

    #[test]
    fn empty_premise_display() {
        assert_eq!(rule("", "a").to_string(), "-> a");
    }

    #[test]
    fn association_compaction_requires_matching_measures() {
        let mut rules = BTreeSet::new();
        rules.insert(AssociationRule::new(rule("a", "b"), 0.5, 0.9));
        rules.insert(AssociationRule::new(rule("a", "c"), 0.5, 0.9));
        rules.insert(AssociationRule::new(rule("a", "d"), 0.25, 0.9));

        let delta = make_compact_association(&mut rules);
        assert_eq!(delta, 1);
        assert_eq!(rules.len(), 2);
        let merged: Vec<_> = rules.iter().collect();
        assert_eq!(merged[0].rule(), &rule("a", "bc"));
        assert_eq!(merged[1].rule(), &rule("a", "d"));
    }
}
