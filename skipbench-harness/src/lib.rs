//! Multi-threaded throughput harness for the skip-list variants
//!
//! The harness consumes a [`BenchmarkConfig`], builds one list instance of
//! the selected variant, prefills it deterministically, stresses it from
//! `num_threads` workers under the configured operation mix, and returns a
//! [`BenchmarkResult`] with the six success/failure counters and the
//! elapsed operation time.
//!
//! # Architecture
//!
//! ```text
//! BenchmarkConfig ─► validate ─► prefill (seed + 1)
//!                                   │
//!                          worker 0 (seed + 0) ─┐
//!                          worker 1 (seed + 1) ─┼─► reduce counters,
//!                          ...                  │   max elapsed time
//!                          worker T-1           ─┘
//! ```
//!
//! Each worker owns its RNG, its key chooser, and its counters; the list is
//! the only shared state. Command-line parsing and result printing live in
//! the thin `skipbench` binary, not here.
//!
//! # Example
//!
//! ```no_run
//! use skipbench_harness::{run, BenchmarkConfig};
//!
//! let config = BenchmarkConfig::default();
//! let result = run(&config)?;
//! println!("{result}");
//! # Ok::<(), skipbench_core::Error>(())
//! ```

pub mod config;
pub mod result;
pub mod runner;
pub mod workload;

pub use config::BenchmarkConfig;
pub use result::{BenchmarkResult, OpCounters};
pub use runner::run;
