mod arena;
mod compare;
mod error;
mod iter;
mod set;

pub use arena::{Direction, TreeStats};
pub use compare::{Comparator, NaturalOrder, ReverseOrder};
pub use error::TreapError;
pub use iter::Iter;
pub use set::{DEFAULT_SEED, DescendingSet, TreapSet};

/// Navigable ordered set interface, implemented by [`TreapSet`] and its
/// reverse view [`DescendingSet`].
///
/// - Elements are unique under the set's comparator.
/// - `add`/`remove` report whether the set changed; only a change invalidates
///   outstanding iterators.
/// - `lower`/`higher` are strict, `floor`/`ceiling` include an equal element.
/// - "first", "lower", etc. are relative to the view's own order.
pub trait NavigableSet {
    type Item;
    type Iter: Iterator<Item = Result<Self::Item, TreapError>>;
    type Reversed: NavigableSet<Item = Self::Item>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, value: &Self::Item) -> bool;

    fn add(&self, value: Self::Item) -> bool;

    fn remove(&self, value: &Self::Item) -> bool;

    fn clear(&self);

    fn first(&self) -> Result<Self::Item, TreapError>;

    fn last(&self) -> Result<Self::Item, TreapError>;

    fn lower(&self, value: &Self::Item) -> Option<Self::Item>;

    fn floor(&self, value: &Self::Item) -> Option<Self::Item>;

    fn ceiling(&self, value: &Self::Item) -> Option<Self::Item>;

    fn higher(&self, value: &Self::Item) -> Option<Self::Item>;

    fn iter(&self) -> Self::Iter;

    fn descending_iter(&self) -> Self::Iter;

    /// Live reverse-order view over the same storage.
    fn descending_set(&self) -> Self::Reversed;

    /// Snapshot of the elements in this view's order.
    fn to_vec(&self) -> Vec<Self::Item> {
        self.iter().map_while(Result::ok).collect()
    }
}
