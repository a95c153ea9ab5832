//! End-to-end scenarios across all four variants
//!
//! Short timed runs keep the suite fast; the asserted properties do not
//! depend on how many operations fit into the interval.

use skipbench_core::{Key, KeyOverlap, KeyRange, OperationsMix, SelectionStrategy, Variant};
use skipbench_harness::workload::{next_op, thread_key_range, KeyChooser, OpKind};
use skipbench_harness::{run, BenchmarkConfig};
use skipbench_lists::{
    CoarseSkipList, ConcurrentSet, FineSkipList, Lcg48, LockFreeSkipList, SeqSkipList, UniqueKeys,
};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn concurrent_variants(
    levels: usize,
    prob: f64,
    range: KeyRange,
    seed: u64,
) -> Vec<(&'static str, Arc<dyn ConcurrentSet>)> {
    vec![
        (
            "coarse",
            Arc::new(CoarseSkipList::new(levels, prob, range, seed)) as Arc<dyn ConcurrentSet>,
        ),
        (
            "fine",
            Arc::new(FineSkipList::new(levels, prob, range, seed)) as Arc<dyn ConcurrentSet>,
        ),
        (
            "lockfree",
            Arc::new(LockFreeSkipList::new(levels, prob, range, seed)) as Arc<dyn ConcurrentSet>,
        ),
    ]
}

/// Scenario: 4 workers on disjoint 25-key partitions of [0, 99], unique
/// key selection, mix (0.25 insert, 0.50 contains), 50 prefilled keys.
///
/// Each worker can shift its partition's membership by at most its 25
/// keys, and the final membership must equal prefill plus the per-key net
/// of successful adds and removes.
#[test]
fn disjoint_unique_partitions_bound_membership_change() {
    const RANGE: KeyRange = KeyRange { min: 0, max: 99 };
    const THREADS: usize = 4;
    let mix = OperationsMix::new(0.25, 0.50);

    for (name, list) in concurrent_variants(4, 0.5, RANGE, 7) {
        // Prefill 50 distinct keys, remembering which ones.
        let mut prefilled = [false; 100];
        let mut rng = Lcg48::from_seed_value(8);
        let mut keys = UniqueKeys::new(100);
        for _ in 0..50 {
            let key = keys.next(&mut rng);
            assert!(list.add(key, Vec::new()), "{name}: prefill duplicate");
            prefilled[key as usize] = true;
        }

        let tally: Arc<Vec<AtomicI64>> = Arc::new((0..100).map(|_| AtomicI64::new(0)).collect());
        let mut net_bounds = Vec::new();
        thread::scope(|scope| {
            let handles: Vec<_> = (0..THREADS)
                .map(|tid| {
                    let list = Arc::clone(&list);
                    let tally = Arc::clone(&tally);
                    scope.spawn(move || {
                        let mut rng = Lcg48::from_seed_value(7 + tid as u64);
                        let part = thread_key_range(RANGE, KeyOverlap::Disjoint, tid, THREADS);
                        let mut chooser = KeyChooser::new(SelectionStrategy::Unique, part, 50);
                        let mut adds = 0i64;
                        let mut removes = 0i64;
                        let deadline = Instant::now() + Duration::from_secs(1);
                        while Instant::now() < deadline {
                            let key = chooser.next(&mut rng);
                            assert!(part.contains(key));
                            match next_op(&mix, &mut rng) {
                                OpKind::Add => {
                                    if list.add(key, Vec::new()) {
                                        adds += 1;
                                        tally[key as usize].fetch_add(1, Ordering::Relaxed);
                                    }
                                }
                                OpKind::Contains => {
                                    list.contains(key);
                                }
                                OpKind::Remove => {
                                    if list.remove(key).is_some() {
                                        removes += 1;
                                        tally[key as usize].fetch_sub(1, Ordering::Relaxed);
                                    }
                                }
                            }
                        }
                        adds - removes
                    })
                })
                .collect();
            for handle in handles {
                net_bounds.push(handle.join().unwrap());
            }
        });

        // A partition holds 25 keys, so no worker can shift membership by
        // more than that.
        for net in net_bounds {
            assert!(net.abs() <= 25, "{name}: net membership change {net}");
        }

        for key in 0..100usize {
            let expected = i64::from(prefilled[key]) + tally[key].load(Ordering::Relaxed);
            assert!(
                expected == 0 || expected == 1,
                "{name}: key {key} has impossible membership {expected}"
            );
            assert_eq!(
                list.contains(key as Key),
                expected == 1,
                "{name}: post-run scan disagrees at key {key}"
            );
        }
    }
}

/// Scenario: an all-insert mix never attempts a contains or a remove.
#[test]
fn all_insert_mix_attempts_nothing_else() {
    for variant in [Variant::Seq, Variant::Coarse, Variant::Fine, Variant::LockFree] {
        let config = BenchmarkConfig {
            variant,
            num_threads: 8,
            time_interval_s: 2,
            n_prefill: 0,
            op_mix: OperationsMix::new(1.0, 0.0),
            strategy: SelectionStrategy::Random,
            overlap: KeyOverlap::Common,
            seed: 99,
            keyrange: KeyRange::new(0, 9_999),
            levels: 8,
            prob: 0.5,
        };
        let result = run(&config).unwrap();
        let c = result.counters;
        assert_eq!(c.successful_contains, 0, "{variant:?}");
        assert_eq!(c.failed_contains, 0, "{variant:?}");
        assert_eq!(c.successful_removes, 0, "{variant:?}");
        assert_eq!(c.failed_removes, 0, "{variant:?}");
        assert!(c.total() > 0, "{variant:?}: no operations ran");
        assert_eq!(c.total(), c.successful_adds + c.failed_adds, "{variant:?}");
    }
}

/// Scenario: successive scans over a fully prefilled range always hit.
#[test]
fn successive_scan_of_prefilled_range_never_misses() {
    for variant in [Variant::Seq, Variant::Coarse, Variant::Fine, Variant::LockFree] {
        let config = BenchmarkConfig {
            variant,
            num_threads: 1,
            time_interval_s: 1,
            n_prefill: 16,
            op_mix: OperationsMix::new(0.0, 1.0),
            strategy: SelectionStrategy::Successive,
            overlap: KeyOverlap::Common,
            seed: 5,
            keyrange: KeyRange::new(0, 15),
            levels: 4,
            prob: 0.5,
        };
        let result = run(&config).unwrap();
        let c = result.counters;
        assert_eq!(c.failed_contains, 0, "{variant:?}: a contains missed");
        assert!(c.successful_contains > 0, "{variant:?}");
        assert_eq!(c.successful_adds + c.failed_adds, 0, "{variant:?}");
        assert_eq!(c.successful_removes + c.failed_removes, 0, "{variant:?}");
    }
}

/// Scenario: the add/add/remove/remove/contains law sequence on every
/// variant.
#[test]
fn law_sequence_holds_on_every_variant() {
    let range = KeyRange::new(0, 9);

    let mut seq = SeqSkipList::new(4, 0.5, range, 1);
    assert!(seq.add(5, Vec::new()));
    assert!(!seq.add(5, Vec::new()));
    assert!(seq.remove(5).is_some());
    assert!(seq.remove(5).is_none());
    assert!(!seq.contains(5));

    for (name, list) in concurrent_variants(4, 0.5, range, 1) {
        assert!(list.add(5, Vec::new()), "{name}");
        assert!(!list.add(5, Vec::new()), "{name}");
        assert!(list.remove(5).is_some(), "{name}");
        assert!(list.remove(5).is_none(), "{name}");
        assert!(!list.contains(5), "{name}");
    }
}

/// Scenario: 16 threads hammer the lock-free list with a half add, half
/// remove mix; the final membership must match the per-key tally of
/// successful operations.
#[test]
fn lockfree_membership_matches_operation_tally() {
    const RANGE: KeyRange = KeyRange { min: 0, max: 99 };
    let list = Arc::new(LockFreeSkipList::new(8, 0.5, RANGE, 42));
    let tally: Arc<Vec<AtomicI64>> = Arc::new((0..100).map(|_| AtomicI64::new(0)).collect());
    let mix = OperationsMix::new(0.5, 0.0);

    thread::scope(|scope| {
        for tid in 0..16u64 {
            let list = Arc::clone(&list);
            let tally = Arc::clone(&tally);
            scope.spawn(move || {
                let mut rng = Lcg48::from_seed_value(42 + tid);
                let mut chooser = KeyChooser::new(SelectionStrategy::Random, RANGE, 0);
                let deadline = Instant::now() + Duration::from_secs(1);
                while Instant::now() < deadline {
                    let key = chooser.next(&mut rng);
                    match next_op(&mix, &mut rng) {
                        OpKind::Add => {
                            if list.add(key, Vec::new()) {
                                tally[key as usize].fetch_add(1, Ordering::Relaxed);
                            }
                        }
                        OpKind::Contains => {
                            list.contains(key);
                        }
                        OpKind::Remove => {
                            if list.remove(key).is_some() {
                                tally[key as usize].fetch_sub(1, Ordering::Relaxed);
                            }
                        }
                    }
                }
            });
        }
    });

    let mut live = 0;
    for key in 0..100usize {
        let net = tally[key].load(Ordering::Relaxed);
        assert!(net == 0 || net == 1, "key {key} has net tally {net}");
        assert_eq!(list.contains(key as Key), net == 1, "audit failed at key {key}");
        live += net as usize;
    }
    assert_eq!(list.len(), live);
    list.check_invariants();
}

/// Non-binding performance sanity; run with `cargo test -- --ignored`.
#[test]
#[ignore]
fn throughput_ordering_sanity() {
    let base = BenchmarkConfig {
        num_threads: 4,
        time_interval_s: 2,
        n_prefill: 5_000,
        op_mix: OperationsMix::new(0.05, 0.90),
        strategy: SelectionStrategy::Random,
        overlap: KeyOverlap::Common,
        seed: 1,
        keyrange: KeyRange::new(0, 9_999),
        levels: 8,
        prob: 0.5,
        variant: Variant::Coarse,
    };

    let coarse = run(&base).unwrap().throughput();
    let fine = run(&BenchmarkConfig {
        variant: Variant::Fine,
        ..base.clone()
    })
    .unwrap()
    .throughput();
    let lockfree = run(&BenchmarkConfig {
        variant: Variant::LockFree,
        ..base
    })
    .unwrap()
    .throughput();

    println!("coarse {coarse:.0} ops/s, fine {fine:.0} ops/s, lockfree {lockfree:.0} ops/s");
    assert!(fine > coarse);
    assert!(lockfree >= fine * 0.5);
}
