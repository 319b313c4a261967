use std::iter::FusedIterator;
use std::rc::Rc;

use crate::arena::{Direction, Id, NIL, Tree};
use crate::error::TreapError;
use crate::set::Shared;

/// Fail-fast cursor over a set in one direction.
///
/// The cursor remembers the set's version when it was created. Once the set
/// is structurally modified (through any view) every further call to
/// [`has_next`](Iter::has_next) or [`try_next`](Iter::try_next) reports
/// [`TreapError::ConcurrentModification`].
///
/// As a [`std::iter::Iterator`] it yields `Ok` elements, then either ends or
/// yields a single `Err` for a stale cursor and ends.
pub struct Iter<T, C> {
    tree: Shared<T, C>,
    cursor: Id,
    version: u64,
    direction: Direction,
    fused: bool,
}

impl<T, C> Iter<T, C> {
    pub(crate) fn new(tree: &Shared<T, C>, direction: Direction) -> Self {
        let (cursor, version) = {
            let t = tree.borrow();
            (t.front(direction), t.version())
        };
        Self {
            tree: Rc::clone(tree),
            cursor,
            version,
            direction,
            fused: false,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    fn check(&self, tree: &Tree<T, C>) -> Result<(), TreapError> {
        let found = tree.version();
        if found != self.version {
            log::debug!(
                "stale iterator: created at version {}, set is at {}",
                self.version,
                found
            );
            return Err(TreapError::ConcurrentModification {
                expected: self.version,
                found,
            });
        }
        Ok(())
    }

    pub fn has_next(&self) -> Result<bool, TreapError> {
        self.check(&self.tree.borrow())?;
        Ok(self.cursor != NIL)
    }
}

impl<T: Clone, C> Iter<T, C> {
    /// Return the element under the cursor and advance.
    pub fn try_next(&mut self) -> Result<T, TreapError> {
        let tree = self.tree.borrow();
        self.check(&tree)?;
        if self.cursor == NIL {
            return Err(TreapError::NoSuchElement);
        }
        let value = tree.value(self.cursor).clone();
        let next = tree.step(self.cursor, self.direction);
        drop(tree);
        self.cursor = next;
        Ok(value)
    }
}

impl<T: Clone, C> Iterator for Iter<T, C> {
    type Item = Result<T, TreapError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fused {
            return None;
        }
        match self.try_next() {
            Ok(value) => Some(Ok(value)),
            Err(TreapError::NoSuchElement) => {
                self.fused = true;
                None
            }
            Err(err) => {
                self.fused = true;
                Some(Err(err))
            }
        }
    }
}

impl<T: Clone, C> FusedIterator for Iter<T, C> {}
