/// Bound satisfied by every ground-set member.
///
/// Equality and the total order come from the element type itself; hashing is
/// by value. Any comparable, clonable, hashable type qualifies through the
/// blanket impl, so downstream signatures can carry a single bound.
pub trait Element: Ord + Clone + std::hash::Hash + std::fmt::Debug {}

impl<T: Ord + Clone + std::hash::Hash + std::fmt::Debug> Element for T {}
