//! Coarse-grained skip list: one global mutex around the sequential
//! algorithm
//!
//! Every public operation takes the lock, runs the sequential code, and
//! releases. Fairness is whatever the mutex provides; the linearization
//! point is any instant inside the critical section, and no operation ever
//! retries.

use parking_lot::Mutex;
use skipbench_core::{Key, KeyRange, Value};

use crate::seq::SeqSkipList;
use crate::ConcurrentSet;

/// Thread-safe skip list guarded by a single [`Mutex`]
///
/// # Example
///
/// ```
/// use skipbench_core::KeyRange;
/// use skipbench_lists::{CoarseSkipList, ConcurrentSet};
///
/// let list = CoarseSkipList::new(4, 0.5, KeyRange::new(0, 99), 1);
/// assert!(list.add(3, Vec::new()));
/// assert!(list.contains(3));
/// ```
pub struct CoarseSkipList {
    inner: Mutex<SeqSkipList>,
}

impl CoarseSkipList {
    /// Creates an empty list with `levels` layers and promotion
    /// probability `prob`
    pub fn new(levels: usize, prob: f64, keyrange: KeyRange, seed: u64) -> Self {
        Self {
            inner: Mutex::new(SeqSkipList::new(levels, prob, keyrange, seed)),
        }
    }

    /// Panics if the multilevel structure violates its invariants
    pub fn check_invariants(&self) {
        self.inner.lock().check_invariants();
    }
}

impl ConcurrentSet for CoarseSkipList {
    fn add(&self, key: Key, value: Value) -> bool {
        self.inner.lock().add(key, value)
    }

    fn contains(&self, key: Key) -> bool {
        self.inner.lock().contains(key)
    }

    fn remove(&self, key: Key) -> Option<Value> {
        self.inner.lock().remove(key)
    }

    fn len(&self) -> usize {
        self.inner.lock().len()
    }
}
