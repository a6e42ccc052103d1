//! Implicational systems and concept lattices.
//!
//! A facade over the workspace crates: `hasse-core` provides rules, closure
//! operators and the basis normalisation rewrites; `hasse-lattice` builds
//! closed-set lattices from any closure system and operates on them.

pub use hasse_core::{
    make_compact_association, read_from, write_to, AssociationRule, ClosureSystem,
    DependencyGraph, Element, Format, ImplicationalSystem, IoRegistry, ParseError, Rule,
    SaveError, Valuation,
};
pub use hasse_lattice::{Concept, ConceptLattice, EdgeSets, Lattice, Reduced};

pub mod prelude {
    pub use hasse_core::{ClosureSystem, Element, ImplicationalSystem, Rule};
    pub use hasse_lattice::{Concept, ConceptLattice, Lattice};
}
