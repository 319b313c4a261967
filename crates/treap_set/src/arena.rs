use std::cmp::Ordering;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::compare::Comparator;
use crate::error::TreapError;

pub(crate) type Id = u32;
pub(crate) const NIL: Id = Id::MAX;

#[inline(always)]
fn idx(x: Id) -> usize {
    x as usize
}

/// Which child slot of its parent a node occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
    Root,
}

/// Walk order over the in-order sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Clone, Debug)]
struct Node<T> {
    value: T,
    prio: u32,
    size: u32,
    left: Id,
    right: Id,
    parent: Id,
    side: Side,
}

impl<T> Node<T> {
    fn new(value: T, prio: u32) -> Self {
        Self {
            value,
            prio,
            size: 1,
            left: NIL,
            right: NIL,
            parent: NIL,
            side: Side::Root,
        }
    }
}

/// Split boundary: either a borrowed key or a node of the tree itself.
enum Pivot<'a, T> {
    Key(&'a T),
    Node(Id),
}

impl<T> Clone for Pivot<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Pivot<'_, T> {}

/// Shape summary returned by [`TreapSet::validate`](crate::TreapSet::validate).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeStats {
    pub len: usize,
    pub height: usize,
}

/// Arena-backed treap with parent links.
///
/// `left`/`right` own their subtrees, `parent` is a plain back-reference.
/// Every live node is reachable from `root`, so the arena holds exactly
/// `len()` nodes.
pub(crate) struct Tree<T, C> {
    nodes: Vec<Node<T>>,
    root: Id,
    version: u64,
    cmp: C,
    rng: StdRng,
}

impl<T, C> Tree<T, C> {
    pub(crate) fn new(cmp: C, seed: u64) -> Self {
        Self {
            nodes: Vec::new(),
            root: NIL,
            version: 0,
            cmp,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    #[inline(always)]
    fn node(&self, x: Id) -> &Node<T> {
        debug_assert!(x != NIL);
        &self.nodes[idx(x)]
    }

    #[inline(always)]
    fn node_mut(&mut self, x: Id) -> &mut Node<T> {
        debug_assert!(x != NIL);
        &mut self.nodes[idx(x)]
    }

    #[inline(always)]
    fn size(&self, x: Id) -> u32 {
        if x == NIL { 0 } else { self.node(x).size }
    }

    pub(crate) fn len(&self) -> usize {
        self.size(self.root) as usize
    }

    pub(crate) fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn comparator(&self) -> &C {
        &self.cmp
    }

    pub(crate) fn value(&self, x: Id) -> &T {
        &self.node(x).value
    }

    pub(crate) fn get(&self, x: Id) -> Option<&T> {
        (x != NIL).then(|| &self.node(x).value)
    }

    /// Recompute `size` of `x` and point its children back at it.
    fn pull(&mut self, x: Id) {
        let (left, right) = {
            let n = self.node(x);
            (n.left, n.right)
        };
        if left != NIL {
            let l = self.node_mut(left);
            l.parent = x;
            l.side = Side::Left;
        }
        if right != NIL {
            let r = self.node_mut(right);
            r.parent = x;
            r.side = Side::Right;
        }
        let size = 1 + self.size(left) + self.size(right);
        self.node_mut(x).size = size;
    }

    fn detach(&mut self, x: Id) {
        if x != NIL {
            let n = self.node_mut(x);
            n.parent = NIL;
            n.side = Side::Root;
        }
    }

    /// Join two treaps; every element of `a` must order before every element
    /// of `b`. The root with the strictly higher priority wins, ties go to `b`.
    fn merge(&mut self, a: Id, b: Id) -> Id {
        if a == NIL {
            return b;
        }
        if b == NIL {
            return a;
        }
        if self.node(a).prio > self.node(b).prio {
            let right = self.node(a).right;
            let merged = self.merge(right, b);
            self.node_mut(a).right = merged;
            self.pull(a);
            self.detach(a);
            a
        } else {
            let left = self.node(b).left;
            let merged = self.merge(a, left);
            self.node_mut(b).left = merged;
            self.pull(b);
            self.detach(b);
            b
        }
    }

    fn release(&mut self, x: Id) -> Option<T> {
        let last = self.nodes.len().checked_sub(1)? as Id;
        if x != last {
            // Move the last slot into `x` and repoint its neighbours.
            let (left, right, parent, side) = {
                let n = self.node(last);
                (n.left, n.right, n.parent, n.side)
            };
            if left != NIL {
                self.node_mut(left).parent = x;
            }
            if right != NIL {
                self.node_mut(right).parent = x;
            }
            match side {
                Side::Left => self.node_mut(parent).left = x,
                Side::Right => self.node_mut(parent).right = x,
                Side::Root => {
                    if self.root == last {
                        self.root = x;
                    }
                }
            }
            self.nodes.swap(idx(x), idx(last));
        }
        self.nodes.pop().map(|node| node.value)
    }

    pub(crate) fn clear(&mut self) -> bool {
        if self.root == NIL {
            return false;
        }
        self.nodes.clear();
        self.root = NIL;
        self.version += 1;
        true
    }

    fn leftmost(&self, mut x: Id) -> Id {
        while x != NIL && self.node(x).left != NIL {
            x = self.node(x).left;
        }
        x
    }

    fn rightmost(&self, mut x: Id) -> Id {
        while x != NIL && self.node(x).right != NIL {
            x = self.node(x).right;
        }
        x
    }

    /// First node in `direction`, `NIL` if empty.
    pub(crate) fn front(&self, direction: Direction) -> Id {
        match direction {
            Direction::Ascending => self.leftmost(self.root),
            Direction::Descending => self.rightmost(self.root),
        }
    }

    fn successor(&self, x: Id) -> Id {
        let right = self.node(x).right;
        if right != NIL {
            return self.leftmost(right);
        }
        let mut x = x;
        while self.node(x).side == Side::Right {
            x = self.node(x).parent;
        }
        self.node(x).parent
    }

    fn predecessor(&self, x: Id) -> Id {
        let left = self.node(x).left;
        if left != NIL {
            return self.rightmost(left);
        }
        let mut x = x;
        while self.node(x).side == Side::Left {
            x = self.node(x).parent;
        }
        self.node(x).parent
    }

    /// Neighbour of `x` in `direction`, `NIL` past the end.
    pub(crate) fn step(&self, x: Id, direction: Direction) -> Id {
        match direction {
            Direction::Ascending => self.successor(x),
            Direction::Descending => self.predecessor(x),
        }
    }

    /// Borrowing walk, used for formatting and validation.
    pub(crate) fn walk(&self, direction: Direction) -> Walk<'_, T, C> {
        Walk {
            tree: self,
            cursor: self.front(direction),
            direction,
        }
    }
}

impl<T, C: Comparator<T>> Tree<T, C> {
    #[inline]
    fn cmp_at(&self, x: Id, key: &T) -> Ordering {
        self.cmp.compare(&self.node(x).value, key)
    }

    #[inline]
    fn before(&self, x: Id, pivot: Pivot<'_, T>) -> bool {
        let ord = match pivot {
            Pivot::Key(key) => self.cmp_at(x, key),
            Pivot::Node(p) => self.cmp.compare(&self.node(x).value, &self.node(p).value),
        };
        ord == Ordering::Less
    }

    /// Split into (`< pivot`, `>= pivot`). Both returned roots are detached.
    fn split(&mut self, root: Id, pivot: Pivot<'_, T>) -> (Id, Id) {
        if root == NIL {
            return (NIL, NIL);
        }
        if self.before(root, pivot) {
            let right = self.node(root).right;
            let (lt, ge) = self.split(right, pivot);
            self.node_mut(root).right = lt;
            self.pull(root);
            self.detach(root);
            (root, ge)
        } else {
            let left = self.node(root).left;
            let (lt, ge) = self.split(left, pivot);
            self.node_mut(root).left = ge;
            self.pull(root);
            self.detach(root);
            (lt, root)
        }
    }

    pub(crate) fn find(&self, key: &T) -> Id {
        let mut cur = self.root;
        while cur != NIL {
            match self.cmp_at(cur, key) {
                Ordering::Less => cur = self.node(cur).right,
                Ordering::Greater => cur = self.node(cur).left,
                Ordering::Equal => return cur,
            }
        }
        NIL
    }

    /// Greatest node strictly less than `key`.
    pub(crate) fn lower(&self, key: &T) -> Id {
        let mut cur = self.root;
        let mut candidate = NIL;
        while cur != NIL {
            if self.cmp_at(cur, key) == Ordering::Less {
                candidate = cur;
                cur = self.node(cur).right;
            } else {
                cur = self.node(cur).left;
            }
        }
        candidate
    }

    /// Least node strictly greater than `key`.
    pub(crate) fn higher(&self, key: &T) -> Id {
        let mut cur = self.root;
        let mut candidate = NIL;
        while cur != NIL {
            if self.cmp_at(cur, key) == Ordering::Greater {
                candidate = cur;
                cur = self.node(cur).left;
            } else {
                cur = self.node(cur).right;
            }
        }
        candidate
    }

    pub(crate) fn floor(&self, key: &T) -> Id {
        match self.find(key) {
            NIL => self.lower(key),
            found => found,
        }
    }

    pub(crate) fn ceiling(&self, key: &T) -> Id {
        match self.find(key) {
            NIL => self.higher(key),
            found => found,
        }
    }

    pub(crate) fn insert(&mut self, value: T) -> bool {
        if self.find(&value) != NIL {
            return false;
        }
        assert!(self.nodes.len() < NIL as usize, "treap capacity exceeded");
        let (lt, ge) = self.split(self.root, Pivot::Key(&value));
        let prio = self.rng.random::<u32>();
        let id = self.nodes.len() as Id;
        self.nodes.push(Node::new(value, prio));
        let left = self.merge(lt, id);
        self.root = self.merge(left, ge);
        self.version += 1;
        log::trace!("insert: len={} version={}", self.len(), self.version);
        true
    }

    pub(crate) fn remove(&mut self, key: &T) -> bool {
        let target = self.find(key);
        if target == NIL {
            return false;
        }
        // The successor must be found before the first split reshapes the tree.
        let next = self.higher(key);
        let (lt, ge) = self.split(self.root, Pivot::Key(key));
        self.root = if next == NIL {
            debug_assert_eq!(ge, target);
            lt
        } else {
            let (only, rest) = self.split(ge, Pivot::Node(next));
            debug_assert_eq!(only, target);
            self.merge(lt, rest)
        };
        let removed = self.release(target).is_some();
        self.version += 1;
        log::trace!("remove: len={} version={}", self.len(), self.version);
        removed
    }

    /// Check every structural invariant: strict in-order ordering, heap order
    /// on priorities, subtree sizes, parent links and arena reachability.
    pub(crate) fn validate(&self) -> Result<TreeStats, TreapError> {
        let (reachable, height) = self.check_subtree(self.root, NIL, Side::Root, 0)?;
        if reachable != self.nodes.len() {
            return Err(TreapError::LostNodes {
                stored: self.nodes.len(),
                reachable,
            });
        }

        // Links are sound from here on, so the threaded walk terminates.
        let mut prev: Option<&T> = None;
        for (position, value) in self.walk(Direction::Ascending).enumerate() {
            if let Some(prev) = prev {
                if self.cmp.compare(prev, value) != Ordering::Less {
                    return Err(TreapError::SortError { position });
                }
            }
            prev = Some(value);
        }
        Ok(TreeStats {
            len: reachable,
            height,
        })
    }

    fn check_subtree(
        &self,
        x: Id,
        parent: Id,
        side: Side,
        offset: usize,
    ) -> Result<(usize, usize), TreapError> {
        if x == NIL {
            return Ok((0, 0));
        }
        let node = self.node(x);
        let (left_len, left_height) = self.check_subtree(node.left, x, Side::Left, offset)?;
        let position = offset + left_len;
        if node.parent != parent || node.side != side {
            return Err(TreapError::BrokenParentLink { position });
        }
        for child in [node.left, node.right] {
            if child != NIL && self.node(child).prio > node.prio {
                return Err(TreapError::HeapViolation { position });
            }
        }
        let (right_len, right_height) =
            self.check_subtree(node.right, x, Side::Right, position + 1)?;
        let actual = 1 + left_len + right_len;
        if node.size as usize != actual {
            return Err(TreapError::SizeMismatch {
                node_size: node.size as usize,
                actual,
            });
        }
        Ok((actual, 1 + left_height.max(right_height)))
    }
}

pub(crate) struct Walk<'a, T, C> {
    tree: &'a Tree<T, C>,
    cursor: Id,
    direction: Direction,
}

impl<'a, T, C> Iterator for Walk<'a, T, C> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }
        let tree = self.tree;
        let value = tree.value(self.cursor);
        self.cursor = tree.step(self.cursor, self.direction);
        Some(value)
    }
}
