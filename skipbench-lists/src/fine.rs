//! Fine-grained skip list: optimistic search plus per-node locking
//!
//! The lazy-linking pattern: searches take no locks at all, writers lock
//! only the handful of predecessors they are about to re-point, and
//! removal happens in two phases. A node is logically present exactly when
//! `fully_linked && !marked`; setting `marked` under the victim's lock is
//! the linearization point of a successful remove, and the physical unlink
//! happens afterwards, top level first, so no searcher can observe a node
//! at level `i` that is missing at level `i - 1`.
//!
//! Predecessor locks are taken in ascending level order. Duplicate
//! predecessors across adjacent levels are deduplicated before locking, so
//! a plain mutex suffices where a reentrant one would otherwise be needed.
//! Unlinked nodes are retired through `crossbeam::epoch`, which keeps them
//! alive until every optimistic searcher that could still reach them has
//! moved on.

use crossbeam::epoch::{self, Atomic, Guard, Owned, Shared};
use crossbeam::utils::Backoff;
use parking_lot::{Mutex, MutexGuard};
use skipbench_core::{Key, KeyRange, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::rng::Lcg48;
use crate::{ConcurrentSet, NodeKey};

struct Node {
    key: NodeKey,
    value: Value,
    top_layer: usize,
    next: Vec<Atomic<Node>>,
    lock: Mutex<()>,
    fully_linked: AtomicBool,
    marked: AtomicBool,
}

impl Node {
    fn new(key: NodeKey, value: Value, top_layer: usize) -> Self {
        Self {
            key,
            value,
            top_layer,
            next: (0..=top_layer).map(|_| Atomic::null()).collect(),
            lock: Mutex::new(()),
            fully_linked: AtomicBool::new(false),
            marked: AtomicBool::new(false),
        }
    }

    fn sentinel(key: NodeKey, levels: usize) -> Self {
        let node = Self::new(key, Vec::new(), levels - 1);
        node.fully_linked.store(true, Ordering::Relaxed);
        node
    }
}

/// Thread-safe skip list with optimistic search and per-node locks
///
/// # Example
///
/// ```
/// use skipbench_core::KeyRange;
/// use skipbench_lists::{ConcurrentSet, FineSkipList};
///
/// let list = FineSkipList::new(4, 0.5, KeyRange::new(0, 99), 7);
/// assert!(list.add(42, Vec::new()));
/// assert!(list.contains(42));
/// assert!(list.remove(42).is_some());
/// ```
pub struct FineSkipList {
    head: Box<Node>,
    tail: Box<Node>,
    levels: usize,
    prob: f64,
    keyrange: KeyRange,
    rng: Mutex<Lcg48>,
    len: AtomicUsize,
}

impl FineSkipList {
    /// Creates an empty list with `levels` layers and promotion
    /// probability `prob`
    pub fn new(levels: usize, prob: f64, keyrange: KeyRange, seed: u64) -> Self {
        debug_assert!(levels >= 1);
        let head = Box::new(Node::sentinel(NodeKey::Head, levels));
        let tail = Box::new(Node::sentinel(NodeKey::Tail, levels));
        let tail_ptr = Shared::from(&*tail as *const Node);
        for level in 0..levels {
            head.next[level].store(tail_ptr, Ordering::Relaxed);
        }
        Self {
            head,
            tail,
            levels,
            prob,
            keyrange,
            rng: Mutex::new(Lcg48::from_seed_value(seed)),
            len: AtomicUsize::new(0),
        }
    }

    fn head_ptr<'g>(&self) -> Shared<'g, Node> {
        Shared::from(&*self.head as *const Node)
    }

    fn tail_ptr<'g>(&self) -> Shared<'g, Node> {
        Shared::from(&*self.tail as *const Node)
    }

    fn random_top_layer(&self) -> usize {
        let mut rng = self.rng.lock();
        let mut layer = 0;
        while layer + 1 < self.levels && rng.next_f64() <= self.prob {
            layer += 1;
        }
        layer
    }

    /// Lock-free search recording the neighbours of `key` at every level;
    /// returns the highest level at which `key` itself was observed
    fn find_neighbours<'g>(
        &self,
        key: NodeKey,
        preds: &mut [Shared<'g, Node>],
        succs: &mut [Shared<'g, Node>],
        guard: &'g Guard,
    ) -> Option<usize> {
        let mut lfound = None;
        let mut pred = self.head_ptr();
        for level in (0..self.levels).rev() {
            let mut curr = unsafe { pred.deref() }.next[level].load(Ordering::Acquire, guard);
            loop {
                let curr_ref = unsafe { curr.deref() };
                if curr_ref.key < key {
                    pred = curr;
                    curr = curr_ref.next[level].load(Ordering::Acquire, guard);
                } else {
                    break;
                }
            }
            preds[level] = pred;
            succs[level] = curr;
            if lfound.is_none() && unsafe { curr.deref() }.key == key {
                lfound = Some(level);
            }
        }
        lfound
    }

    /// Panics if the multilevel structure violates its invariants
    ///
    /// Meant for tests at quiescence; concurrent writers make the asserts
    /// meaningless.
    pub fn check_invariants(&self) {
        let guard = &epoch::pin();
        let tail = self.tail_ptr();
        let mut below: Vec<Shared<'_, Node>> = Vec::new();
        let mut marked_seen = false;
        for level in (0..self.levels).rev() {
            let mut chain = Vec::new();
            let mut curr = self.head.next[level].load(Ordering::Acquire, guard);
            let mut last_key = None;
            while curr != tail {
                let node = unsafe { curr.deref() };
                if let Some(prev) = last_key {
                    assert!(prev < node.key, "level {level} is not strictly sorted");
                }
                last_key = Some(node.key);
                marked_seen |= node.marked.load(Ordering::Acquire);
                chain.push(curr);
                curr = node.next[level].load(Ordering::Acquire, guard);
            }
            if level + 1 < self.levels {
                for node in &below {
                    assert!(
                        chain.contains(node),
                        "node present at level {} but missing at level {level}",
                        level + 1
                    );
                }
            }
            below = chain;
        }
        if !marked_seen {
            assert_eq!(below.len(), self.len(), "level 0 disagrees with len()");
        }
    }

    #[cfg(test)]
    fn mark_for_test(&self, key: Key) -> bool {
        let guard = &epoch::pin();
        let mut preds = vec![Shared::null(); self.levels];
        let mut succs = vec![Shared::null(); self.levels];
        match self.find_neighbours(NodeKey::Key(key), &mut preds, &mut succs, guard) {
            Some(level) => {
                let node = unsafe { succs[level].deref() };
                let _lock = node.lock.lock();
                node.marked.store(true, Ordering::Release);
                true
            }
            None => false,
        }
    }
}

impl ConcurrentSet for FineSkipList {
    fn add(&self, key: Key, value: Value) -> bool {
        if !self.keyrange.contains(key) {
            return false;
        }
        let node_key = NodeKey::Key(key);
        let top_layer = self.random_top_layer();
        let guard = &epoch::pin();
        let mut preds = vec![Shared::null(); self.levels];
        let mut succs = vec![Shared::null(); self.levels];

        loop {
            if let Some(lfound) = self.find_neighbours(node_key, &mut preds, &mut succs, guard) {
                let found = unsafe { succs[lfound].deref() };
                if !found.marked.load(Ordering::Acquire) {
                    // An in-flight insert of the same key wins; wait until
                    // it is visible before reporting the duplicate.
                    let backoff = Backoff::new();
                    while !found.fully_linked.load(Ordering::Acquire) {
                        backoff.snooze();
                    }
                    return false;
                }
                // Marked victim still in the way; retry once it is gone.
                continue;
            }

            let mut locks: Vec<MutexGuard<'_, ()>> = Vec::with_capacity(top_layer + 1);
            let mut last_locked: Shared<'_, Node> = Shared::null();
            let mut valid = true;
            for level in 0..=top_layer {
                let pred = preds[level];
                let succ = succs[level];
                if pred != last_locked {
                    locks.push(unsafe { pred.deref() }.lock.lock());
                    last_locked = pred;
                }
                let pred_ref = unsafe { pred.deref() };
                let succ_ref = unsafe { succ.deref() };
                valid = !pred_ref.marked.load(Ordering::Acquire)
                    && !succ_ref.marked.load(Ordering::Acquire)
                    && pred_ref.next[level].load(Ordering::Acquire, guard) == succ;
                if !valid {
                    break;
                }
            }
            if !valid {
                drop(locks);
                continue;
            }

            let new_node = Owned::new(Node::new(node_key, value, top_layer));
            for level in 0..=top_layer {
                new_node.next[level].store(succs[level], Ordering::Relaxed);
            }
            let new_node = new_node.into_shared(guard);
            // Splice bottom-up; the node only becomes logically present
            // with the fully_linked store below.
            for level in 0..=top_layer {
                unsafe { preds[level].deref() }.next[level].store(new_node, Ordering::Release);
            }
            unsafe { new_node.deref() }
                .fully_linked
                .store(true, Ordering::Release);
            self.len.fetch_add(1, Ordering::Relaxed);
            return true;
        }
    }

    fn contains(&self, key: Key) -> bool {
        let guard = &epoch::pin();
        let mut preds = vec![Shared::null(); self.levels];
        let mut succs = vec![Shared::null(); self.levels];
        match self.find_neighbours(NodeKey::Key(key), &mut preds, &mut succs, guard) {
            Some(lfound) => {
                let found = unsafe { succs[lfound].deref() };
                found.fully_linked.load(Ordering::Acquire) && !found.marked.load(Ordering::Acquire)
            }
            None => false,
        }
    }

    fn remove(&self, key: Key) -> Option<Value> {
        if !self.keyrange.contains(key) {
            return None;
        }
        let node_key = NodeKey::Key(key);
        let guard = &epoch::pin();
        let mut preds = vec![Shared::null(); self.levels];
        let mut succs = vec![Shared::null(); self.levels];

        let mut victim: Shared<'_, Node> = Shared::null();
        let mut victim_lock: Option<MutexGuard<'_, ()>> = None;
        let mut top_layer = 0;
        loop {
            let lfound = self.find_neighbours(node_key, &mut preds, &mut succs, guard);
            if victim_lock.is_none() {
                let lfound = lfound?;
                victim = succs[lfound];
                let victim_ref = unsafe { victim.deref() };
                // A node whose observed level is below its own top layer
                // is still being inserted; report it absent.
                if !victim_ref.fully_linked.load(Ordering::Acquire)
                    || victim_ref.marked.load(Ordering::Acquire)
                    || victim_ref.top_layer != lfound
                {
                    return None;
                }
                let lock = victim_ref.lock.lock();
                if victim_ref.marked.load(Ordering::Acquire) {
                    return None;
                }
                // Logical deletion; the node is no longer a member.
                victim_ref.marked.store(true, Ordering::Release);
                top_layer = victim_ref.top_layer;
                victim_lock = Some(lock);
            }

            let mut locks: Vec<MutexGuard<'_, ()>> = Vec::with_capacity(top_layer + 1);
            let mut last_locked: Shared<'_, Node> = Shared::null();
            let mut valid = true;
            for level in 0..=top_layer {
                let pred = preds[level];
                if pred != last_locked {
                    locks.push(unsafe { pred.deref() }.lock.lock());
                    last_locked = pred;
                }
                let pred_ref = unsafe { pred.deref() };
                valid = !pred_ref.marked.load(Ordering::Acquire)
                    && pred_ref.next[level].load(Ordering::Acquire, guard) == victim;
                if !valid {
                    break;
                }
            }
            if !valid {
                drop(locks);
                continue;
            }

            // Unlink from the top level down so a node never appears at
            // level i while already gone from level i - 1.
            let victim_ref = unsafe { victim.deref() };
            for level in (0..=top_layer).rev() {
                let succ = victim_ref.next[level].load(Ordering::Acquire, guard);
                unsafe { preds[level].deref() }.next[level].store(succ, Ordering::Release);
            }
            let value = victim_ref.value.clone();
            drop(victim_lock);
            drop(locks);
            self.len.fetch_sub(1, Ordering::Relaxed);
            unsafe { guard.defer_destroy(victim) };
            return Some(value);
        }
    }

    fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }
}

impl Drop for FineSkipList {
    fn drop(&mut self) {
        let guard = &epoch::pin();
        let tail = self.tail_ptr();
        let mut curr = self.head.next[0].load(Ordering::Acquire, guard);
        while curr != tail {
            let next = unsafe { curr.deref() }.next[0].load(Ordering::Acquire, guard);
            unsafe { guard.defer_destroy(curr) };
            curr = next;
        }
    }
}
