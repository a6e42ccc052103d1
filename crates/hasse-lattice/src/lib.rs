//! Concept lattices over closure systems: Bordat diagram generation with
//! concurrent dependency-graph valuation, complete and ideal lattices,
//! icebergs, and the classical reductions.

mod concept;
mod concept_lattice;
mod lattice;

pub use concept::Concept;
pub use concept_lattice::{ConceptLattice, EdgeSets, Reduced};
pub use lattice::Lattice;
