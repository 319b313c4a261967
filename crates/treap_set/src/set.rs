use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::NavigableSet;
use crate::arena::{Direction, NIL, Tree, TreeStats};
use crate::compare::{Comparator, NaturalOrder};
use crate::error::TreapError;
use crate::iter::Iter;

/// Seed used by [`TreapSet::new`] and [`TreapSet::with_comparator`].
pub const DEFAULT_SEED: u64 = 0x5EED_7EA9_2026;

/// Storage shared by every view and iterator of one set.
pub(crate) type Shared<T, C> = Rc<RefCell<Tree<T, C>>>;

/// Ordered set of unique elements backed by a treap.
///
/// A `TreapSet` is a handle: cloning it, or asking for its
/// [`descending_set`](NavigableSet::descending_set), yields another handle to
/// the same storage, and a change made through one is seen by all of them.
/// Handles are `!Send`; share a set across threads only behind your own
/// synchronisation around a set built on that thread.
///
/// The comparator runs while the storage is borrowed, so it must not call
/// back into the set it orders.
///
/// Nodes are addressed by `u32`, so a set holds at most `u32::MAX` elements;
/// inserting beyond that panics.
pub struct TreapSet<T, C = NaturalOrder> {
    tree: Shared<T, C>,
}

/// Reverse-order view over a [`TreapSet`].
pub struct DescendingSet<T, C = NaturalOrder> {
    tree: Shared<T, C>,
}

impl<T: Ord> TreapSet<T> {
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_comparator_and_seed(NaturalOrder, seed)
    }
}

impl<T: Ord> Default for TreapSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C: Comparator<T>> TreapSet<T, C> {
    pub fn with_comparator(cmp: C) -> Self {
        Self::with_comparator_and_seed(cmp, DEFAULT_SEED)
    }

    pub fn with_comparator_and_seed(cmp: C, seed: u64) -> Self {
        Self {
            tree: Rc::new(RefCell::new(Tree::new(cmp, seed))),
        }
    }

    /// Check the structural invariants of the underlying treap.
    pub fn validate(&self) -> Result<TreeStats, TreapError> {
        self.tree.borrow().validate()
    }
}

impl<T, C> TreapSet<T, C> {
    /// Whether `other` is a handle to the same storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.tree, &other.tree)
    }

    /// Runs `f` with the set's comparator.
    pub fn with_comparator_ref<R>(&self, f: impl FnOnce(&C) -> R) -> R {
        f(self.tree.borrow().comparator())
    }
}

impl<T, C> DescendingSet<T, C> {
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.tree, &other.tree)
    }
}

impl<T, C> Clone for TreapSet<T, C> {
    fn clone(&self) -> Self {
        Self {
            tree: Rc::clone(&self.tree),
        }
    }
}

impl<T, C> Clone for DescendingSet<T, C> {
    fn clone(&self) -> Self {
        Self {
            tree: Rc::clone(&self.tree),
        }
    }
}

fn end<T: Clone, C>(tree: &Shared<T, C>, direction: Direction) -> Result<T, TreapError> {
    let tree = tree.borrow();
    tree.get(tree.front(direction))
        .cloned()
        .ok_or(TreapError::NoSuchElement)
}

fn add<T, C: Comparator<T>>(tree: &Shared<T, C>, value: T) -> bool {
    tree.borrow_mut().insert(value)
}

fn remove<T, C: Comparator<T>>(tree: &Shared<T, C>, value: &T) -> bool {
    tree.borrow_mut().remove(value)
}

fn clear<T, C>(tree: &Shared<T, C>) {
    if tree.borrow_mut().clear() {
        log::trace!("clear: version={}", tree.borrow().version());
    }
}

impl<T: Clone, C: Comparator<T>> NavigableSet for TreapSet<T, C> {
    type Item = T;
    type Iter = Iter<T, C>;
    type Reversed = DescendingSet<T, C>;

    fn len(&self) -> usize {
        self.tree.borrow().len()
    }

    fn contains(&self, value: &T) -> bool {
        self.tree.borrow().find(value) != NIL
    }

    fn add(&self, value: T) -> bool {
        add(&self.tree, value)
    }

    fn remove(&self, value: &T) -> bool {
        remove(&self.tree, value)
    }

    fn clear(&self) {
        clear(&self.tree)
    }

    fn first(&self) -> Result<T, TreapError> {
        end(&self.tree, Direction::Ascending)
    }

    fn last(&self) -> Result<T, TreapError> {
        end(&self.tree, Direction::Descending)
    }

    fn lower(&self, value: &T) -> Option<T> {
        let tree = self.tree.borrow();
        tree.get(tree.lower(value)).cloned()
    }

    fn floor(&self, value: &T) -> Option<T> {
        let tree = self.tree.borrow();
        tree.get(tree.floor(value)).cloned()
    }

    fn ceiling(&self, value: &T) -> Option<T> {
        let tree = self.tree.borrow();
        tree.get(tree.ceiling(value)).cloned()
    }

    fn higher(&self, value: &T) -> Option<T> {
        let tree = self.tree.borrow();
        tree.get(tree.higher(value)).cloned()
    }

    fn iter(&self) -> Iter<T, C> {
        Iter::new(&self.tree, Direction::Ascending)
    }

    fn descending_iter(&self) -> Iter<T, C> {
        Iter::new(&self.tree, Direction::Descending)
    }

    fn descending_set(&self) -> DescendingSet<T, C> {
        DescendingSet {
            tree: Rc::clone(&self.tree),
        }
    }
}

impl<T: Clone, C: Comparator<T>> NavigableSet for DescendingSet<T, C> {
    type Item = T;
    type Iter = Iter<T, C>;
    type Reversed = TreapSet<T, C>;

    fn len(&self) -> usize {
        self.tree.borrow().len()
    }

    fn contains(&self, value: &T) -> bool {
        self.tree.borrow().find(value) != NIL
    }

    fn add(&self, value: T) -> bool {
        add(&self.tree, value)
    }

    fn remove(&self, value: &T) -> bool {
        remove(&self.tree, value)
    }

    fn clear(&self) {
        clear(&self.tree)
    }

    fn first(&self) -> Result<T, TreapError> {
        end(&self.tree, Direction::Descending)
    }

    fn last(&self) -> Result<T, TreapError> {
        end(&self.tree, Direction::Ascending)
    }

    fn lower(&self, value: &T) -> Option<T> {
        let tree = self.tree.borrow();
        tree.get(tree.higher(value)).cloned()
    }

    fn floor(&self, value: &T) -> Option<T> {
        let tree = self.tree.borrow();
        tree.get(tree.ceiling(value)).cloned()
    }

    fn ceiling(&self, value: &T) -> Option<T> {
        let tree = self.tree.borrow();
        tree.get(tree.floor(value)).cloned()
    }

    fn higher(&self, value: &T) -> Option<T> {
        let tree = self.tree.borrow();
        tree.get(tree.lower(value)).cloned()
    }

    fn iter(&self) -> Iter<T, C> {
        Iter::new(&self.tree, Direction::Descending)
    }

    fn descending_iter(&self) -> Iter<T, C> {
        Iter::new(&self.tree, Direction::Ascending)
    }

    fn descending_set(&self) -> TreapSet<T, C> {
        TreapSet {
            tree: Rc::clone(&self.tree),
        }
    }
}

impl<T: Ord> FromIterator<T> for TreapSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<T, C: Comparator<T>> Extend<T> for TreapSet<T, C> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.tree.borrow_mut().insert(value);
        }
    }
}

fn fmt_walk<T: fmt::Debug, C>(
    tree: &Shared<T, C>,
    direction: Direction,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    f.debug_set().entries(tree.borrow().walk(direction)).finish()
}

impl<T: fmt::Debug, C> fmt::Debug for TreapSet<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_walk(&self.tree, Direction::Ascending, f)
    }
}

impl<T: fmt::Debug, C> fmt::Debug for DescendingSet<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_walk(&self.tree, Direction::Descending, f)
    }
}
