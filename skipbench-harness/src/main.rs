//! Thin command-line front-end for the benchmark harness
//!
//! Maps flags onto a [`BenchmarkConfig`], runs it, and prints one line per
//! counter plus the throughput. Exits non-zero on an invalid
//! configuration.

use clap::{Parser, ValueEnum};
use skipbench_core::{KeyOverlap, KeyRange, OperationsMix, SelectionStrategy, Variant};
use skipbench_harness::{run, BenchmarkConfig};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VariantArg {
    Seq,
    Coarse,
    Fine,
    LockFree,
}

impl From<VariantArg> for Variant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Seq => Variant::Seq,
            VariantArg::Coarse => Variant::Coarse,
            VariantArg::Fine => Variant::Fine,
            VariantArg::LockFree => Variant::LockFree,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    Random,
    Unique,
    Successive,
}

impl From<StrategyArg> for SelectionStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Random => SelectionStrategy::Random,
            StrategyArg::Unique => SelectionStrategy::Unique,
            StrategyArg::Successive => SelectionStrategy::Successive,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OverlapArg {
    Common,
    Disjoint,
}

impl From<OverlapArg> for KeyOverlap {
    fn from(arg: OverlapArg) -> Self {
        match arg {
            OverlapArg::Common => KeyOverlap::Common,
            OverlapArg::Disjoint => KeyOverlap::Disjoint,
        }
    }
}

/// Throughput benchmark for a family of concurrent skip lists
#[derive(Debug, Parser)]
#[command(name = "skipbench", version)]
struct Args {
    /// Which implementation to stress
    #[arg(long, value_enum, default_value = "fine")]
    variant: VariantArg,

    /// Worker thread count
    #[arg(long, default_value_t = 4)]
    threads: usize,

    /// Measurement duration in seconds
    #[arg(long, default_value_t = 5)]
    time: u64,

    /// Keys inserted before the measurement starts
    #[arg(long, default_value_t = 10_000)]
    prefill: usize,

    /// Probability of an insert
    #[arg(long, default_value_t = 0.1)]
    insert_p: f64,

    /// Probability of a contains; the remainder of the mix is deletes
    #[arg(long, default_value_t = 0.8)]
    contain_p: f64,

    /// Key selection strategy
    #[arg(long, value_enum, default_value = "unique")]
    strategy: StrategyArg,

    /// Key range partitioning across workers
    #[arg(long, value_enum, default_value = "common")]
    overlap: OverlapArg,

    /// Base RNG seed
    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Smallest legal key
    #[arg(long, default_value_t = 0)]
    key_min: i64,

    /// Largest legal key
    #[arg(long, default_value_t = 100_000)]
    key_max: i64,

    /// Maximum level count of the list
    #[arg(long, default_value_t = 4)]
    levels: usize,

    /// Per-level promotion probability
    #[arg(long, default_value_t = 0.5)]
    prob: f64,
}

impl From<Args> for BenchmarkConfig {
    fn from(args: Args) -> Self {
        Self {
            variant: args.variant.into(),
            num_threads: args.threads,
            time_interval_s: args.time,
            n_prefill: args.prefill,
            op_mix: OperationsMix::new(args.insert_p, args.contain_p),
            strategy: args.strategy.into(),
            overlap: args.overlap.into(),
            seed: args.seed,
            keyrange: KeyRange::new(args.key_min, args.key_max),
            levels: args.levels,
            prob: args.prob,
        }
    }
}

fn main() {
    env_logger::init();
    let config = BenchmarkConfig::from(Args::parse());
    match run(&config) {
        Ok(result) => print!("{result}"),
        Err(error) => {
            eprintln!("Error: {error}");
            std::process::exit(1);
        }
    }
}
