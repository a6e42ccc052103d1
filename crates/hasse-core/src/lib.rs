//! Implicational systems over a finite ground set: closure operators, basis
//! normalisation rewrites, and the closure-system capability that concept
//! lattice generation builds on.

mod closure_system;
mod dependency;
mod element;
mod error;
mod io;
mod rule;
mod system;

pub use closure_system::ClosureSystem;
pub use dependency::{DependencyGraph, Valuation};
pub use element::Element;
pub use error::{ParseError, SaveError};
pub use io::{read_from, write_to, Format, IoRegistry};
pub use rule::{make_compact_association, AssociationRule, Rule};
pub use system::ImplicationalSystem;
