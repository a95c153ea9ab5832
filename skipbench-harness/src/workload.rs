//! Per-worker workload generation: key ranges, key choosers, and the
//! operation die

use skipbench_core::{Key, KeyOverlap, KeyRange, OperationsMix, SelectionStrategy};
use skipbench_lists::{Lcg48, UniqueKeys};

/// The operation a worker performs next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Add,
    Contains,
    Remove,
}

/// Draws the next operation from the configured mix
pub fn next_op(mix: &OperationsMix, rng: &mut Lcg48) -> OpKind {
    let die = rng.next_f64();
    if die < mix.insert_p {
        OpKind::Add
    } else if die < mix.insert_p + mix.contain_p {
        OpKind::Contains
    } else {
        OpKind::Remove
    }
}

/// The slice of the key range worker `tid` operates on
///
/// `Common` hands every worker the whole range. `Disjoint` splits the
/// inclusive key span into contiguous partitions of equal size, with the
/// remainder going to the last worker.
pub fn thread_key_range(
    range: KeyRange,
    overlap: KeyOverlap,
    tid: usize,
    num_threads: usize,
) -> KeyRange {
    match overlap {
        KeyOverlap::Common => range,
        KeyOverlap::Disjoint => {
            let per_thread = (range.key_count() / num_threads as u64).max(1);
            let min = range.min.saturating_add((per_thread * tid as u64) as Key);
            let max = if tid + 1 == num_threads {
                range.max
            } else {
                min.saturating_add(per_thread as Key - 1)
            };
            KeyRange::new(min.min(range.max), max.min(range.max))
        }
    }
}

enum KeySource {
    Random,
    Unique(UniqueKeys),
    Successive { cursor: Key },
}

/// Stateful per-worker key selection
///
/// `Successive` starts its cursor `n_prefill` keys past the partition
/// minimum, so a fully prefilled partition is revisited from its first
/// key on the first draw after wrap-around.
pub struct KeyChooser {
    range: KeyRange,
    source: KeySource,
}

impl KeyChooser {
    /// Creates the chooser for one worker's range
    pub fn new(strategy: SelectionStrategy, range: KeyRange, n_prefill: usize) -> Self {
        let source = match strategy {
            SelectionStrategy::Random => KeySource::Random,
            SelectionStrategy::Unique => {
                KeySource::Unique(UniqueKeys::new(range.key_count() as usize))
            }
            SelectionStrategy::Successive => KeySource::Successive {
                cursor: range.min.saturating_add(n_prefill as Key),
            },
        };
        Self { range, source }
    }

    /// The next key to operate on
    pub fn next(&mut self, rng: &mut Lcg48) -> Key {
        match &mut self.source {
            KeySource::Random => self.range.min + rng.next_below(self.range.key_count()) as Key,
            KeySource::Unique(keys) => self.range.min + keys.next(rng),
            KeySource::Successive { cursor } => {
                *cursor = cursor.saturating_add(1);
                if *cursor > self.range.max {
                    *cursor = self.range.min;
                }
                *cursor
            }
        }
    }
}
