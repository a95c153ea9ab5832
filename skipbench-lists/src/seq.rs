//! Sequential skip list, the single-threaded reference implementation
//!
//! Nodes live in an index arena (`Vec` of slots plus a free list) and link
//! to each other by slot index, so the multilevel pointer graph needs no
//! raw pointers at all. Slot 0 is the permanent head sentinel.
//!
//! A node's linked levels always form a contiguous prefix `{0, ..., top}`:
//! level 0 is unconditional and each further level is granted while an
//! independent draw stays at or below the promotion probability.

use skipbench_core::{Key, KeyRange, Value};
use std::collections::HashSet;

use crate::rng::Lcg48;

const HEAD: usize = 0;

struct SeqNode {
    key: Key,
    value: Value,
    forward: Vec<Option<usize>>,
}

/// Single-threaded skip list over an inclusive key range
///
/// Expected O(log n) `add` / `contains` / `remove`. Owns its own [`Lcg48`]
/// for promotion draws, so the shape of the list is reproducible from the
/// construction seed.
///
/// # Example
///
/// ```
/// use skipbench_core::KeyRange;
/// use skipbench_lists::SeqSkipList;
///
/// let mut list = SeqSkipList::new(4, 0.5, KeyRange::new(0, 9), 12345);
/// assert!(list.add(5, Vec::new()));
/// assert!(!list.add(5, Vec::new()));
/// assert!(list.contains(5));
/// assert_eq!(list.remove(5), Some(Vec::new()));
/// assert!(!list.contains(5));
/// ```
pub struct SeqSkipList {
    nodes: Vec<Option<SeqNode>>,
    free: Vec<usize>,
    levels: usize,
    prob: f64,
    keyrange: KeyRange,
    rng: Lcg48,
    len: usize,
}

impl SeqSkipList {
    /// Creates an empty list with `levels` layers and promotion
    /// probability `prob`
    pub fn new(levels: usize, prob: f64, keyrange: KeyRange, seed: u64) -> Self {
        debug_assert!(levels >= 1);
        let head = SeqNode {
            key: keyrange.min,
            value: Vec::new(),
            forward: vec![None; levels],
        };
        Self {
            nodes: vec![Some(head)],
            free: Vec::new(),
            levels,
            prob,
            keyrange,
            rng: Lcg48::from_seed_value(seed),
            len: 0,
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn node(&self, index: usize) -> &SeqNode {
        self.nodes[index].as_ref().expect("live arena slot")
    }

    fn node_mut(&mut self, index: usize) -> &mut SeqNode {
        self.nodes[index].as_mut().expect("live arena slot")
    }

    fn alloc(&mut self, node: SeqNode) -> usize {
        if let Some(slot) = self.free.pop() {
            self.nodes[slot] = Some(node);
            slot
        } else {
            self.nodes.push(Some(node));
            self.nodes.len() - 1
        }
    }

    /// Records the predecessor of `key` at every level; returns whether
    /// the level-0 successor carries `key` itself
    fn find_predecessors(&self, key: Key) -> (Vec<usize>, bool) {
        let mut preds = vec![HEAD; self.levels];
        let mut current = HEAD;
        for level in (0..self.levels).rev() {
            while let Some(next) = self.node(current).forward[level] {
                if self.node(next).key < key {
                    current = next;
                } else {
                    break;
                }
            }
            preds[level] = current;
        }
        let found = self.node(preds[0]).forward[0]
            .is_some_and(|next| self.node(next).key == key);
        (preds, found)
    }

    /// Whether `key` is a member
    pub fn contains(&self, key: Key) -> bool {
        self.find_predecessors(key).1
    }

    /// Inserts `key`; fails on duplicates and out-of-range keys
    pub fn add(&mut self, key: Key, value: Value) -> bool {
        if !self.keyrange.contains(key) {
            return false;
        }
        let (preds, found) = self.find_predecessors(key);
        if found {
            return false;
        }

        let index = self.alloc(SeqNode {
            key,
            value,
            forward: vec![None; self.levels],
        });

        // Level 0 is unconditional.
        let succ = self.node(preds[0]).forward[0];
        self.node_mut(index).forward[0] = succ;
        self.node_mut(preds[0]).forward[0] = Some(index);

        // Promote while the die allows; the first failed draw ends the
        // prefix of linked levels.
        for level in 1..self.levels {
            if self.rng.next_f64() > self.prob {
                break;
            }
            let succ = self.node(preds[level]).forward[level];
            self.node_mut(index).forward[level] = succ;
            self.node_mut(preds[level]).forward[level] = Some(index);
        }

        self.len += 1;
        true
    }

    /// Removes `key`, returning its value if it was present
    pub fn remove(&mut self, key: Key) -> Option<Value> {
        let (preds, found) = self.find_predecessors(key);
        if !found {
            return None;
        }
        let target = self.node(preds[0]).forward[0]?;

        for level in 0..self.levels {
            if self.node(preds[level]).forward[level] == Some(target) {
                let succ = self.node(target).forward[level];
                self.node_mut(preds[level]).forward[level] = succ;
            }
        }

        let node = self.nodes[target].take()?;
        self.free.push(target);
        self.len -= 1;
        Some(node.value)
    }

    /// Panics if the multilevel structure violates its invariants
    ///
    /// Checks per-level sortedness, the containment of every level in the
    /// one below, key uniqueness, and the entry count.
    pub fn check_invariants(&self) {
        let mut below: HashSet<usize> = HashSet::new();
        for level in (0..self.levels).rev() {
            let mut chain = Vec::new();
            let mut current = self.node(HEAD).forward[level];
            let mut last_key = None;
            while let Some(index) = current {
                let node = self.node(index);
                if let Some(prev) = last_key {
                    assert!(prev < node.key, "level {level} is not strictly sorted");
                }
                last_key = Some(node.key);
                chain.push(index);
                current = node.forward[level];
            }
            if level + 1 < self.levels {
                for index in &below {
                    assert!(
                        chain.contains(index),
                        "node present at level {} but missing at level {level}",
                        level + 1
                    );
                }
            }
            below = chain.into_iter().collect();
        }
        assert_eq!(below.len(), self.len, "level 0 disagrees with len()");
    }
}
