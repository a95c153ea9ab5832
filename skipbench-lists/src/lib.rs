//! Concurrent ordered-set implementations based on the skip list
//!
//! This crate implements one ordered-set contract over four skip-list
//! variants with very different concurrency disciplines:
//!
//! - [`SeqSkipList`]: single-threaded reference implementation, the oracle
//!   for the others
//! - [`CoarseSkipList`]: one global mutex around the sequential algorithm
//! - [`FineSkipList`]: optimistic lock-free search with per-node locking,
//!   lazy linking and two-phase (mark, then unlink) removal
//! - [`LockFreeSkipList`]: atomic next-pointer updates with per-node
//!   read/write latches and validation-and-retry
//!
//! All variants store at most one node per key (set semantics), reject
//! out-of-range keys on insert, and are linearizable: every completed
//! operation takes effect at a single instant between its invocation and
//! response.
//!
//! # Example
//!
//! ```
//! use skipbench_core::KeyRange;
//! use skipbench_lists::{ConcurrentSet, FineSkipList};
//!
//! let list = FineSkipList::new(4, 0.5, KeyRange::new(0, 99), 42);
//! assert!(list.add(7, b"payload".to_vec()));
//! assert!(list.contains(7));
//! assert_eq!(list.remove(7), Some(b"payload".to_vec()));
//! assert!(!list.contains(7));
//! ```

pub mod coarse;
pub mod fine;
pub mod lockfree;
pub mod rng;
pub mod seq;

pub use coarse::CoarseSkipList;
pub use fine::FineSkipList;
pub use lockfree::{FindMode, LockFreeSkipList};
pub use rng::{Lcg48, UniqueKeys};
pub use seq::SeqSkipList;

use skipbench_core::{Key, Value};

/// The ordered-set contract shared by the thread-safe variants
///
/// The sequential list keeps a `&mut self` API of the same shape; the
/// benchmark harness drives it through a dedicated single-threaded path.
pub trait ConcurrentSet: Send + Sync {
    /// Inserts `key`; returns `false` for duplicates and out-of-range keys
    fn add(&self, key: Key, value: Value) -> bool;

    /// Whether `key` is currently a member of the set
    fn contains(&self, key: Key) -> bool;

    /// Removes `key`, returning its stored value if it was present
    fn remove(&self, key: Key) -> Option<Value>;

    /// Number of live entries
    fn len(&self) -> usize;

    /// Whether the set is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Node key with sentinel endpoints
///
/// `Head` compares below every real key and `Tail` above, so sentinel
/// handling falls out of the derived ordering instead of special cases in
/// every traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum NodeKey {
    Head,
    Key(Key),
    Tail,
}
