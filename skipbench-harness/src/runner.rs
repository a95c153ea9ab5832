//! Benchmark execution: prefill, worker loops, and aggregation

use log::{debug, warn};
use skipbench_core::{Result, SelectionStrategy, Variant};
use skipbench_lists::{
    CoarseSkipList, ConcurrentSet, FineSkipList, Lcg48, LockFreeSkipList, SeqSkipList, UniqueKeys,
};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::BenchmarkConfig;
use crate::result::{BenchmarkResult, OpCounters};
use crate::workload::{next_op, thread_key_range, KeyChooser, OpKind};

/// Runs one benchmark described by `config`
///
/// Fails only on an invalid configuration; once the run starts it always
/// completes the interval and returns its counters.
pub fn run(config: &BenchmarkConfig) -> Result<BenchmarkResult> {
    config.validate()?;
    debug!(
        "benchmark: variant {:?}, {} threads, {} s, prefill {}, mix ({}, {}), \
         strategy {:?}, overlap {:?}, seed {}, range [{}, {}], levels {}, prob {}",
        config.variant,
        config.num_threads,
        config.time_interval_s,
        config.n_prefill,
        config.op_mix.insert_p,
        config.op_mix.contain_p,
        config.strategy,
        config.overlap,
        config.seed,
        config.keyrange.min,
        config.keyrange.max,
        config.levels,
        config.prob,
    );

    let result = match config.variant {
        Variant::Seq => run_sequential(config),
        Variant::Coarse => run_parallel(
            config,
            Arc::new(CoarseSkipList::new(
                config.levels,
                config.prob,
                config.keyrange,
                config.seed,
            )),
        ),
        Variant::Fine => run_parallel(
            config,
            Arc::new(FineSkipList::new(
                config.levels,
                config.prob,
                config.keyrange,
                config.seed,
            )),
        ),
        Variant::LockFree => run_parallel(
            config,
            Arc::new(LockFreeSkipList::new(
                config.levels,
                config.prob,
                config.keyrange,
                config.seed,
            )),
        ),
    };
    Ok(result)
}

/// Dedicated single-threaded path for the sequential list
///
/// With the `Unique` strategy the prefill consumes the head of the same
/// permutation the measurement loop then continues.
fn run_sequential(config: &BenchmarkConfig) -> BenchmarkResult {
    if config.num_threads > 1 {
        warn!(
            "sequential variant runs on one thread; ignoring num_threads = {}",
            config.num_threads
        );
    }

    let mut list = SeqSkipList::new(config.levels, config.prob, config.keyrange, config.seed);
    let mut rng = Lcg48::from_seed_value(config.seed.wrapping_add(1));
    let mut chooser = KeyChooser::new(config.strategy, config.keyrange, config.n_prefill);

    match config.strategy {
        SelectionStrategy::Unique => {
            for _ in 0..config.n_prefill {
                list.add(chooser.next(&mut rng), Vec::new());
            }
        }
        SelectionStrategy::Random => {
            let mut keys = UniqueKeys::new(config.keyrange.key_count() as usize);
            for _ in 0..config.n_prefill {
                list.add(config.keyrange.min + keys.next(&mut rng), Vec::new());
            }
        }
        SelectionStrategy::Successive => {
            for offset in 0..config.n_prefill {
                list.add(config.keyrange.min + offset as i64, Vec::new());
            }
        }
    }

    let mut counters = OpCounters::default();
    let mut busy = Duration::ZERO;
    let deadline = Instant::now() + Duration::from_secs(config.time_interval_s);
    while Instant::now() < deadline {
        let key = chooser.next(&mut rng);
        match next_op(&config.op_mix, &mut rng) {
            OpKind::Add => {
                let start = Instant::now();
                let ok = list.add(key, Vec::new());
                busy += start.elapsed();
                counters.record_add(ok);
            }
            OpKind::Contains => {
                let start = Instant::now();
                let ok = list.contains(key);
                busy += start.elapsed();
                counters.record_contains(ok);
            }
            OpKind::Remove => {
                let start = Instant::now();
                let ok = list.remove(key).is_some();
                busy += start.elapsed();
                counters.record_remove(ok);
            }
        }
    }

    BenchmarkResult {
        elapsed_seconds: busy.as_secs_f64(),
        counters,
    }
}

/// Deterministically inserts `n_prefill` keys before the workers start
fn prefill(list: &dyn ConcurrentSet, config: &BenchmarkConfig) {
    let mut rng = Lcg48::from_seed_value(config.seed.wrapping_add(1));
    match config.strategy {
        SelectionStrategy::Random | SelectionStrategy::Unique => {
            let mut keys = UniqueKeys::new(config.keyrange.key_count() as usize);
            for _ in 0..config.n_prefill {
                list.add(config.keyrange.min + keys.next(&mut rng), Vec::new());
            }
        }
        SelectionStrategy::Successive => {
            for offset in 0..config.n_prefill {
                list.add(config.keyrange.min + offset as i64, Vec::new());
            }
        }
    }
}

fn run_parallel(config: &BenchmarkConfig, list: Arc<dyn ConcurrentSet>) -> BenchmarkResult {
    prefill(&*list, config);

    let mut counters = OpCounters::default();
    let mut elapsed = Duration::ZERO;
    thread::scope(|scope| {
        let handles: Vec<_> = (0..config.num_threads)
            .map(|tid| {
                let list = Arc::clone(&list);
                scope.spawn(move || worker(&*list, config, tid))
            })
            .collect();
        for handle in handles {
            match handle.join() {
                Ok((thread_counters, busy)) => {
                    counters.merge(&thread_counters);
                    elapsed = elapsed.max(busy);
                }
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
    });

    BenchmarkResult {
        elapsed_seconds: elapsed.as_secs_f64(),
        counters,
    }
}

fn worker(
    list: &dyn ConcurrentSet,
    config: &BenchmarkConfig,
    tid: usize,
) -> (OpCounters, Duration) {
    let mut rng = Lcg48::from_seed_value(config.seed.wrapping_add(tid as u64));
    let range = thread_key_range(config.keyrange, config.overlap, tid, config.num_threads);
    let mut chooser = KeyChooser::new(config.strategy, range, config.n_prefill);

    let mut counters = OpCounters::default();
    let mut busy = Duration::ZERO;
    let deadline = Instant::now() + Duration::from_secs(config.time_interval_s);
    while Instant::now() < deadline {
        let key = chooser.next(&mut rng);
        match next_op(&config.op_mix, &mut rng) {
            OpKind::Add => {
                let start = Instant::now();
                let ok = list.add(key, Vec::new());
                busy += start.elapsed();
                counters.record_add(ok);
            }
            OpKind::Contains => {
                let start = Instant::now();
                let ok = list.contains(key);
                busy += start.elapsed();
                counters.record_contains(ok);
            }
            OpKind::Remove => {
                let start = Instant::now();
                let ok = list.remove(key).is_some();
                busy += start.elapsed();
                counters.record_remove(ok);
            }
        }
    }
    (counters, busy)
}
