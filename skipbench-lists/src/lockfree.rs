//! Lock-free skip list: atomic next-pointer updates with per-node latches
//!
//! Every structural step is a compare-and-swap on a predecessor's forward
//! pointer, staged behind two small per-node devices:
//!
//! - `accessing_next`, a packed reader/writer latch (one writer bit-field
//!   in the upper bits, a reader count below) that keeps a node's forward
//!   pointers consistent while they are read or swung;
//! - `being_modified`, a one-writer token claimed on every distinct
//!   predecessor before its pointer may change, with validation and retry
//!   when the neighbourhood moved underneath the claimant.
//!
//! An insert becomes visible with the level-0 CAS; an erase becomes
//! invisible with the `removed` store. Between the `removed` store and the
//! physical unlink the node still routes traversals but no longer counts
//! as a member.
//!
//! The list is lock-free at the list level: every retry is caused by an
//! observable forward step of some other thread, even though the per-node
//! write latches briefly block conflicting operations on the same node.
//!
//! Retired nodes are reclaimed through `crossbeam::epoch`. Classic
//! formulations of this algorithm pin individual nodes with a reference
//! count; an epoch guard pins the same observations wholesale and defers
//! destruction until no reader from before the unlink remains, which is
//! the identical contract (unlinked at every level, token released, no
//! live observer).

use crossbeam::epoch::{self, Atomic, Guard, Owned, Shared};
use crossbeam::utils::Backoff;
use parking_lot::Mutex;
use skipbench_core::{Key, KeyRange, Value};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use crate::rng::Lcg48;
use crate::{ConcurrentSet, NodeKey};

const WRITER_MASK: u32 = 0xfff0_0000;
const WRITER_UNIT: u32 = 0x0010_0000;
const READER_MASK: u32 = 0x000f_ffff;

/// Search mode for [`LockFreeSkipList::find`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindMode {
    /// Largest key strictly below the query
    Less,
    /// Largest key at or below the query
    LessOrEqual,
    /// The query key itself
    Equal,
    /// Smallest key at or above the query
    GreaterOrEqual,
    /// Smallest key strictly above the query
    Greater,
}

impl FindMode {
    fn accepts_equal(self) -> bool {
        matches!(
            self,
            FindMode::LessOrEqual | FindMode::Equal | FindMode::GreaterOrEqual
        )
    }
}

struct Node {
    key: NodeKey,
    value: Value,
    top_layer: usize,
    next: Vec<Atomic<Node>>,
    fully_linked: AtomicBool,
    being_modified: AtomicBool,
    removed: AtomicBool,
    accessing_next: AtomicU32,
}

impl Node {
    /// A fresh node is born with its write latch held; the latch drops
    /// only once the insert has published every forward pointer.
    fn new(key: NodeKey, value: Value, top_layer: usize) -> Self {
        Self {
            key,
            value,
            top_layer,
            next: (0..=top_layer).map(|_| Atomic::null()).collect(),
            fully_linked: AtomicBool::new(false),
            being_modified: AtomicBool::new(false),
            removed: AtomicBool::new(false),
            accessing_next: AtomicU32::new(WRITER_UNIT),
        }
    }

    fn sentinel(key: NodeKey, levels: usize) -> Self {
        let node = Self::new(key, Vec::new(), levels - 1);
        node.fully_linked.store(true, Ordering::Relaxed);
        node.accessing_next.store(0, Ordering::Relaxed);
        node
    }

    fn is_valid(&self) -> bool {
        self.fully_linked.load(Ordering::Acquire)
    }

    fn read_latch(&self) {
        let backoff = Backoff::new();
        loop {
            while self.accessing_next.load(Ordering::Acquire) & WRITER_MASK != 0 {
                backoff.snooze();
            }
            self.accessing_next.fetch_add(1, Ordering::AcqRel);
            if self.accessing_next.load(Ordering::Acquire) & WRITER_MASK == 0 {
                return;
            }
            self.accessing_next.fetch_sub(1, Ordering::AcqRel);
        }
    }

    fn read_unlatch(&self) {
        self.accessing_next.fetch_sub(1, Ordering::AcqRel);
    }

    fn write_latch(&self) {
        let backoff = Backoff::new();
        loop {
            while self.accessing_next.load(Ordering::Acquire) & WRITER_MASK != 0 {
                backoff.snooze();
            }
            if self.accessing_next.fetch_add(WRITER_UNIT, Ordering::AcqRel) & WRITER_MASK == 0 {
                // Writer bit claimed; wait for the readers to drain.
                while self.accessing_next.load(Ordering::Acquire) & READER_MASK != 0 {
                    backoff.snooze();
                }
                return;
            }
            self.accessing_next.fetch_sub(WRITER_UNIT, Ordering::AcqRel);
        }
    }

    fn write_unlatch(&self) {
        self.accessing_next.fetch_sub(WRITER_UNIT, Ordering::AcqRel);
    }
}

enum Attempt {
    Linked,
    Duplicate,
    Retry,
}

enum EraseOutcome {
    Erased(Value),
    Busy,
    Gone,
}

/// Thread-safe skip list built on atomic pointer updates
///
/// # Example
///
/// ```
/// use skipbench_core::KeyRange;
/// use skipbench_lists::{ConcurrentSet, FindMode, LockFreeSkipList};
///
/// let list = LockFreeSkipList::new(8, 0.5, KeyRange::new(0, 99), 11);
/// assert!(list.add(10, Vec::new()));
/// assert!(list.add(20, Vec::new()));
/// assert_eq!(list.find(15, FindMode::GreaterOrEqual).map(|(k, _)| k), Some(20));
/// assert_eq!(list.find(15, FindMode::Less).map(|(k, _)| k), Some(10));
/// ```
pub struct LockFreeSkipList {
    head: Box<Node>,
    tail: Box<Node>,
    levels: usize,
    prob: f64,
    keyrange: KeyRange,
    rng: Mutex<Lcg48>,
    total_nodes: AtomicUsize,
    layer_entries: Vec<AtomicUsize>,
    top_layer_hint: AtomicUsize,
}

impl LockFreeSkipList {
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
            total_nodes: AtomicUsize::new(0),
            layer_entries: (0..levels).map(|_| AtomicUsize::new(0)).collect(),
            top_layer_hint: AtomicUsize::new(0),
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

    /// Successor of `cur` at `layer`, read under `cur`'s reader latch
    ///
    /// Hops over `skip` (an erase victim) and over nodes that are not
    /// fully linked; the second return reports whether `skip` was passed.
    /// Returns `None` when `cur` itself is no longer linked, in which case
    /// the caller restarts its traversal from the top.
    fn next_internal<'g>(
        &self,
        cur: Shared<'g, Node>,
        layer: usize,
        skip: Shared<'g, Node>,
        guard: &'g Guard,
    ) -> Option<(Shared<'g, Node>, bool)> {
        let cur_ref = unsafe { cur.deref() };
        cur_ref.read_latch();
        if !cur_ref.is_valid() {
            cur_ref.read_unlatch();
            return None;
        }
        let mut next = cur_ref.next[layer].load(Ordering::Acquire, guard);
        cur_ref.read_unlatch();

        let mut passed_skip = false;
        while next == skip || !unsafe { next.deref() }.is_valid() {
            if next == skip {
                passed_skip = true;
            }
            // An unlinked hop keeps its frozen forward pointers, which
            // still land on the list spine.
            let hop = unsafe { next.deref() };
            hop.read_latch();
            let after = hop.next[layer].load(Ordering::Acquire, guard);
            hop.read_unlatch();
            next = after;
        }
        Some((next, passed_skip))
    }

    /// Releases the one-writer tokens held on `prevs[start..=top]`,
    /// skipping predecessors shared with the layer above
    fn release_tokens(&self, prevs: &[Shared<'_, Node>], start: usize, top: usize) {
        for level in start..=top {
            if level >= prevs.len() {
                break;
            }
            if level < top && prevs[level] == prevs[level + 1] {
                continue;
            }
            let pred = unsafe { prevs[level].deref() };
            if pred
                .being_modified
                .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                log::error!("modification token at layer {level} was not held");
            }
        }
    }

    fn refresh_top_layer_hint(&self) {
        for level in (0..self.levels).rev() {
            if self.layer_entries[level].load(Ordering::Relaxed) > 0 {
                self.top_layer_hint.store(level, Ordering::Relaxed);
                return;
            }
        }
        self.top_layer_hint.store(0, Ordering::Relaxed);
    }

    fn try_insert<'g>(
        &self,
        node: Shared<'g, Node>,
        top_layer: usize,
        guard: &'g Guard,
    ) -> Attempt {
        let node_ref = unsafe { node.deref() };
        let mut prevs: Vec<Shared<'_, Node>> = vec![Shared::null(); top_layer + 1];
        let mut cur = self.head_ptr();

        let start_level = self.top_layer_hint.load(Ordering::Relaxed).max(top_layer);
        for level in (0..=start_level).rev() {
            loop {
                let Some((next, _)) = self.next_internal(cur, level, Shared::null(), guard) else {
                    self.release_tokens(&prevs, level + 1, top_layer);
                    return Attempt::Retry;
                };
                let next_ref = unsafe { next.deref() };
                if node_ref.key > next_ref.key {
                    cur = next;
                    continue;
                }
                if node_ref.key == next_ref.key {
                    self.release_tokens(&prevs, level + 1, top_layer);
                    return Attempt::Duplicate;
                }

                if level <= top_layer {
                    prevs[level] = cur;

                    // Claim the predecessor's token unless the layer above
                    // already holds the same node.
                    let cur_ref = unsafe { cur.deref() };
                    let mut locked_from = level + 1;
                    let mut failed = false;
                    if level < top_layer && prevs[level] == prevs[level + 1] {
                        // Token already held via the upper layer.
                    } else if cur_ref
                        .being_modified
                        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        locked_from = level;
                    } else {
                        failed = true;
                    }
                    if !failed && !(cur_ref.is_valid() && next_ref.is_valid()) {
                        failed = true;
                    }
                    if failed {
                        self.release_tokens(&prevs, locked_from, top_layer);
                        return Attempt::Retry;
                    }

                    node_ref.next[level].store(next, Ordering::Release);

                    // The claim is only good if the pointer has not moved
                    // since we captured it.
                    let recheck = self.next_internal(cur, level, Shared::null(), guard);
                    match recheck {
                        Some((again, _)) if again == next => {}
                        _ => {
                            self.release_tokens(&prevs, level, top_layer);
                            return Attempt::Retry;
                        }
                    }
                }

                if level > 0 {
                    break;
                }

                self.finalize_insert(node, top_layer, &prevs, guard);
                return Attempt::Linked;
            }
        }
        Attempt::Retry
    }

    fn finalize_insert<'g>(
        &self,
        node: Shared<'g, Node>,
        top_layer: usize,
        prevs: &[Shared<'g, Node>],
        guard: &'g Guard,
    ) {
        let node_ref = unsafe { node.deref() };
        for level in 0..=top_layer {
            let pred = unsafe { prevs[level].deref() };
            pred.write_latch();
            let expected = node_ref.next[level].load(Ordering::Acquire, guard);
            if pred.next[level]
                .compare_exchange(expected, node, Ordering::AcqRel, Ordering::Acquire, guard)
                .is_err()
            {
                log::error!("insert: pointer moved at layer {level} under a held token");
            }
            pred.write_unlatch();
        }
        node_ref.fully_linked.store(true, Ordering::Release);
        node_ref.write_unlatch();

        self.total_nodes.fetch_add(1, Ordering::Relaxed);
        self.layer_entries[top_layer].fetch_add(1, Ordering::Relaxed);
        self.refresh_top_layer_hint();
        self.release_tokens(prevs, 0, top_layer);
    }

    fn find_node<'g>(
        &self,
        query: NodeKey,
        mode: FindMode,
        guard: &'g Guard,
    ) -> Option<Shared<'g, Node>> {
        let backoff = Backoff::new();
        'retry: loop {
            let mut cur = self.head_ptr();
            let start_level = self.top_layer_hint.load(Ordering::Relaxed);
            for level in (0..=start_level).rev() {
                loop {
                    let Some((next, _)) = self.next_internal(cur, level, Shared::null(), guard)
                    else {
                        backoff.snooze();
                        continue 'retry;
                    };
                    let next_ref = unsafe { next.deref() };
                    if query > next_ref.key {
                        cur = next;
                        continue;
                    }
                    if mode.accepts_equal() && query == next_ref.key {
                        if !next_ref.removed.load(Ordering::Acquire) {
                            return Some(next);
                        }
                        // A logically deleted match is invisible.
                        match mode {
                            FindMode::Equal => return None,
                            FindMode::GreaterOrEqual => {
                                cur = next;
                                continue;
                            }
                            _ => {}
                        }
                    }
                    if level > 0 {
                        break;
                    }
                    return match mode {
                        FindMode::Less | FindMode::LessOrEqual => {
                            (cur != self.head_ptr()).then_some(cur)
                        }
                        FindMode::Greater | FindMode::GreaterOrEqual => {
                            (next != self.tail_ptr()).then_some(next)
                        }
                        FindMode::Equal => None,
                    };
                }
            }
            return None;
        }
    }

    fn erase_node<'g>(&self, node: Shared<'g, Node>, guard: &'g Guard) -> EraseOutcome {
        let node_ref = unsafe { node.deref() };
        if node_ref.removed.load(Ordering::Acquire) {
            return EraseOutcome::Gone;
        }
        if node_ref
            .being_modified
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return EraseOutcome::Busy;
        }
        // From this store on, finders treat the node as absent.
        node_ref.removed.store(true, Ordering::Release);

        let top_layer = node_ref.top_layer;
        let mut prevs: Vec<Shared<'_, Node>> = vec![Shared::null(); top_layer + 1];
        let mut nexts: Vec<Shared<'_, Node>> = vec![Shared::null(); top_layer + 1];
        let backoff = Backoff::new();

        'retry: loop {
            if !node_ref.is_valid() {
                // A competing erase finished the unlink already.
                node_ref.removed.store(false, Ordering::Release);
                node_ref.being_modified.store(false, Ordering::Release);
                return EraseOutcome::Gone;
            }

            let start_level = self.top_layer_hint.load(Ordering::Relaxed).max(top_layer);
            let mut cur = self.head_ptr();
            for level in (0..=start_level).rev() {
                loop {
                    let Some((next, passed)) = self.next_internal(cur, level, node, guard) else {
                        self.release_tokens(&prevs, level + 1, top_layer);
                        backoff.snooze();
                        continue 'retry;
                    };
                    let next_ref = unsafe { next.deref() };

                    // Unlike insert, the exact link pointing at the victim
                    // is required, so keep moving until it was passed.
                    if node_ref.key > next_ref.key || (level <= top_layer && !passed) {
                        if next == self.tail_ptr() {
                            self.release_tokens(&prevs, level + 1, top_layer);
                            backoff.snooze();
                            continue 'retry;
                        }
                        cur = next;
                        continue;
                    }

                    if level <= top_layer {
                        prevs[level] = cur;
                        nexts[level] = next;

                        let cur_ref = unsafe { cur.deref() };
                        let mut locked_from = level + 1;
                        let mut failed = false;
                        if level < top_layer && prevs[level] == prevs[level + 1] {
                            // Token already held via the upper layer.
                        } else if cur_ref
                            .being_modified
                            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                            .is_ok()
                        {
                            locked_from = level;
                        } else {
                            failed = true;
                        }
                        if !failed && !(cur_ref.is_valid() && next_ref.is_valid()) {
                            failed = true;
                        }
                        if failed {
                            self.release_tokens(&prevs, locked_from, top_layer);
                            backoff.snooze();
                            continue 'retry;
                        }

                        let recheck = self.next_internal(cur, level, node, guard);
                        match recheck {
                            Some((again, _)) if again == next => {}
                            _ => {
                                self.release_tokens(&prevs, level, top_layer);
                                backoff.snooze();
                                continue 'retry;
                            }
                        }
                    }
                    break;
                }
            }

            // Freeze the victim, then swing every predecessor past it.
            node_ref.write_latch();
            node_ref.fully_linked.store(false, Ordering::Release);
            node_ref.write_unlatch();

            for level in 0..=top_layer {
                let pred = unsafe { prevs[level].deref() };
                pred.write_latch();
                if pred.next[level]
                    .compare_exchange(
                        node,
                        nexts[level],
                        Ordering::AcqRel,
                        Ordering::Acquire,
                        guard,
                    )
                    .is_err()
                {
                    log::error!("erase: pointer moved at layer {level} under a held token");
                }
                pred.write_unlatch();
            }

            self.total_nodes.fetch_sub(1, Ordering::Relaxed);
            self.layer_entries[top_layer].fetch_sub(1, Ordering::Relaxed);
            self.refresh_top_layer_hint();
            self.release_tokens(&prevs, 0, top_layer);
            node_ref.being_modified.store(false, Ordering::Release);

            let value = node_ref.value.clone();
            unsafe { guard.defer_destroy(node) };
            return EraseOutcome::Erased(value);
        }
    }

    /// Looks up `key` under the given [`FindMode`], returning the matched
    /// entry's key and a copy of its value
    pub fn find(&self, key: Key, mode: FindMode) -> Option<(Key, Value)> {
        let guard = &epoch::pin();
        let node = self.find_node(NodeKey::Key(key), mode, guard)?;
        let node_ref = unsafe { node.deref() };
        match node_ref.key {
            NodeKey::Key(found) => Some((found, node_ref.value.clone())),
            _ => None,
        }
    }

    /// Panics if the multilevel structure violates its invariants
    ///
    /// Meant for tests at quiescence; concurrent writers make the asserts
    /// meaningless.
    pub fn check_invariants(&self) {
        let guard = &epoch::pin();
        let tail = self.tail_ptr();
        let mut below: Vec<Shared<'_, Node>> = Vec::new();
        let mut removed_seen = false;
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
                removed_seen |= node.removed.load(Ordering::Acquire);
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
        if !removed_seen {
            assert_eq!(below.len(), self.len(), "level 0 disagrees with len()");
        }
    }
}

impl ConcurrentSet for LockFreeSkipList {
    fn add(&self, key: Key, value: Value) -> bool {
        if !self.keyrange.contains(key) {
            return false;
        }
        let top_layer = self.random_top_layer();
        let guard = &epoch::pin();
        let node = Owned::new(Node::new(NodeKey::Key(key), value, top_layer)).into_shared(guard);
        let backoff = Backoff::new();
        loop {
            match self.try_insert(node, top_layer, guard) {
                Attempt::Linked => return true,
                Attempt::Duplicate => {
                    // Never published, so it can be reclaimed on the spot.
                    drop(unsafe { node.into_owned() });
                    return false;
                }
                Attempt::Retry => backoff.snooze(),
            }
        }
    }

    fn contains(&self, key: Key) -> bool {
        let guard = &epoch::pin();
        self.find_node(NodeKey::Key(key), FindMode::Equal, guard)
            .is_some()
    }

    fn remove(&self, key: Key) -> Option<Value> {
        if !self.keyrange.contains(key) {
            return None;
        }
        let guard = &epoch::pin();
        let node = self.find_node(NodeKey::Key(key), FindMode::Equal, guard)?;
        let backoff = Backoff::new();
        loop {
            match self.erase_node(node, guard) {
                EraseOutcome::Erased(value) => return Some(value),
                EraseOutcome::Busy => backoff.snooze(),
                EraseOutcome::Gone => return None,
            }
        }
    }

    fn len(&self) -> usize {
        self.total_nodes.load(Ordering::Relaxed)
    }
}

impl Drop for LockFreeSkipList {
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn list(range: (Key, Key)) -> LockFreeSkipList {
        LockFreeSkipList::new(8, 0.5, KeyRange::new(range.0, range.1), 12345)
    }

    #[test]
    fn set_laws_hold() {
        let list = list((0, 9));
        assert!(list.add(5, Vec::new()));
        assert!(!list.add(5, Vec::new()));
        assert_eq!(list.remove(5), Some(Vec::new()));
        assert_eq!(list.remove(5), None);
        assert!(!list.contains(5));
    }

    #[test]
    fn rejects_keys_outside_the_range() {
        let list = list((0, 9));
        assert!(!list.add(-1, Vec::new()));
        assert!(!list.add(10, Vec::new()));
        assert!(list.add(0, Vec::new()));
        assert!(list.add(9, Vec::new()));
    }

    #[test]
    fn find_modes_bracket_the_query() {
        let list = list((0, 99));
        for key in [10, 20, 30] {
            assert!(list.add(key, key.to_le_bytes().to_vec()));
        }

        assert_eq!(list.find(20, FindMode::Equal).map(|(k, _)| k), Some(20));
        assert_eq!(list.find(15, FindMode::Equal), None);
        assert_eq!(list.find(20, FindMode::Less).map(|(k, _)| k), Some(10));
        assert_eq!(list.find(15, FindMode::LessOrEqual).map(|(k, _)| k), Some(10));
        assert_eq!(list.find(20, FindMode::LessOrEqual).map(|(k, _)| k), Some(20));
        assert_eq!(list.find(20, FindMode::Greater).map(|(k, _)| k), Some(30));
        assert_eq!(list.find(25, FindMode::GreaterOrEqual).map(|(k, _)| k), Some(30));
        assert_eq!(list.find(9, FindMode::Less), None);
        assert_eq!(list.find(31, FindMode::Greater), None);
    }

    #[test]
    fn remove_returns_the_stored_value() {
        let list = list((0, 99));
        assert!(list.add(7, b"seven".to_vec()));
        assert_eq!(list.remove(7), Some(b"seven".to_vec()));
        assert_eq!(list.remove(7), None);
    }

    #[test]
    fn layer_accounting_tracks_membership() {
        let list = list((0, 999));
        for key in 0..500 {
            assert!(list.add(key, Vec::new()));
        }
        assert_eq!(list.len(), 500);
        let counted: usize = list
            .layer_entries
            .iter()
            .map(|entries| entries.load(Ordering::Relaxed))
            .sum();
        assert_eq!(counted, 500);
        for key in 0..500 {
            assert!(list.remove(key).is_some());
        }
        assert_eq!(list.len(), 0);
        list.check_invariants();
    }

    #[test]
    fn concurrent_disjoint_inserts_all_land() {
        let list = Arc::new(LockFreeSkipList::new(8, 0.5, KeyRange::new(0, 9999), 3));
        let mut handles = Vec::new();
        for thread_id in 0..8i64 {
            let list = Arc::clone(&list);
            handles.push(thread::spawn(move || {
                for offset in 0..500 {
                    assert!(list.add(thread_id * 500 + offset, Vec::new()));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(list.len(), 4000);
        for key in 0..4000 {
            assert!(list.contains(key));
        }
        list.check_invariants();
    }

    #[test]
    fn contending_adds_of_one_key_admit_exactly_one() {
        for _ in 0..20 {
            let list = Arc::new(LockFreeSkipList::new(4, 0.5, KeyRange::new(0, 9), 5));
            let mut handles = Vec::new();
            for _ in 0..8 {
                let list = Arc::clone(&list);
                handles.push(thread::spawn(move || list.add(3, Vec::new())));
            }
            let winners = handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .filter(|&won| won)
                .count();
            assert_eq!(winners, 1);
            assert_eq!(list.len(), 1);
        }
    }

    #[test]
    fn concurrent_add_remove_same_keys_stays_consistent() {
        let list = Arc::new(LockFreeSkipList::new(4, 0.5, KeyRange::new(0, 63), 9));
        let mut handles = Vec::new();
        for thread_id in 0..4u64 {
            let list = Arc::clone(&list);
            handles.push(thread::spawn(move || {
                let mut rng = Lcg48::from_seed_value(100 + thread_id);
                for _ in 0..20_000 {
                    let key = rng.next_below(64) as Key;
                    if rng.next_f64() < 0.5 {
                        list.add(key, Vec::new());
                    } else {
                        list.remove(key);
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        list.check_invariants();
        let live = (0..64).filter(|&k| list.contains(k)).count();
        assert_eq!(live, list.len());
    }
}
