use thiserror::Error;

/// Errors surfaced by [`TreapSet`](crate::TreapSet), its descending view and
/// their iterators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreapError {
    /// `first`/`last` on an empty set, or advancing an exhausted iterator.
    #[error("no such element")]
    NoSuchElement,
    /// The set was structurally modified after the iterator was created.
    /// An iterator that reports this once keeps reporting it.
    #[error("set was modified during iteration (expected version {expected}, found {found})")]
    ConcurrentModification { expected: u64, found: u64 },

    /// In-order walk produced an element not strictly greater than its
    /// predecessor, at the given position.
    #[error("elements out of order at position {position}")]
    SortError { position: usize },
    /// A child carries a higher priority than its parent.
    #[error("heap order violated below element at position {position}")]
    HeapViolation { position: usize },
    /// Stored subtree size disagrees with the counted one.
    #[error("subtree size mismatch: stored {node_size}, counted {actual}")]
    SizeMismatch { node_size: usize, actual: usize },
    /// A child's parent link or side tag does not point back at its parent.
    #[error("parent link of element at position {position} is inconsistent")]
    BrokenParentLink { position: usize },
    /// Arena holds nodes the root cannot reach.
    #[error("{stored} nodes stored but only {reachable} reachable from the root")]
    LostNodes { stored: usize, reachable: usize },
}
