//! Test utilities for closure systems: law assertion helpers and seeded
//! random instance generators.

pub mod laws;
pub mod random;

pub use laws::{
    assert_closure_laws, assert_rewrite_idempotent, assert_rewrite_preserves_closures,
    assert_same_closure_operator, power_set,
};
pub use random::random_system;
