//! Benchmark result types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Success and failure counts per operation kind
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpCounters {
    /// Adds that inserted a new key
    pub successful_adds: u64,
    /// Adds rejected as duplicate or out of range
    pub failed_adds: u64,
    /// Contains that found their key
    pub successful_contains: u64,
    /// Contains that missed
    pub failed_contains: u64,
    /// Removes that took a key out
    pub successful_removes: u64,
    /// Removes of absent keys
    pub failed_removes: u64,
}

impl OpCounters {
    /// Total number of operations attempted
    pub fn total(&self) -> u64 {
        self.successful_adds
            + self.failed_adds
            + self.successful_contains
            + self.failed_contains
            + self.successful_removes
            + self.failed_removes
    }

    /// Adds another thread's counters into this one
    pub fn merge(&mut self, other: &OpCounters) {
        self.successful_adds += other.successful_adds;
        self.failed_adds += other.failed_adds;
        self.successful_contains += other.successful_contains;
        self.failed_contains += other.failed_contains;
        self.successful_removes += other.successful_removes;
        self.failed_removes += other.failed_removes;
    }

    pub(crate) fn record_add(&mut self, succeeded: bool) {
        if succeeded {
            self.successful_adds += 1;
        } else {
            self.failed_adds += 1;
        }
    }

    pub(crate) fn record_contains(&mut self, succeeded: bool) {
        if succeeded {
            self.successful_contains += 1;
        } else {
            self.failed_contains += 1;
        }
    }

    pub(crate) fn record_remove(&mut self, succeeded: bool) {
        if succeeded {
            self.successful_removes += 1;
        } else {
            self.failed_removes += 1;
        }
    }
}

/// Outcome of one benchmark run
///
/// `elapsed_seconds` is the maximum of the per-thread operation times,
/// which under a work-conserving schedule approximates wall time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Maximum per-thread total operation time, in seconds
    pub elapsed_seconds: f64,
    /// Aggregated counters across all threads
    pub counters: OpCounters,
}

impl BenchmarkResult {
    /// Operations per second over the reported elapsed time
    pub fn throughput(&self) -> f64 {
        if self.elapsed_seconds > 0.0 {
            self.counters.total() as f64 / self.elapsed_seconds
        } else {
            0.0
        }
    }
}

impl fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.counters;
        writeln!(f, "Total time: {:.2} seconds", self.elapsed_seconds)?;
        writeln!(f, "Total operations: {}", c.total())?;
        writeln!(
            f,
            "Insertions: {} successful / {} attempted",
            c.successful_adds,
            c.successful_adds + c.failed_adds
        )?;
        writeln!(
            f,
            "Deletions: {} successful / {} attempted",
            c.successful_removes,
            c.successful_removes + c.failed_removes
        )?;
        writeln!(
            f,
            "Contains: {} successful / {} attempted",
            c.successful_contains,
            c.successful_contains + c.failed_contains
        )?;
        writeln!(f, "Throughput: {:.3e} ops/sec", self.throughput())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_and_total_add_up() {
        let mut a = OpCounters {
            successful_adds: 1,
            failed_adds: 2,
            successful_contains: 3,
            failed_contains: 4,
            successful_removes: 5,
            failed_removes: 6,
        };
        let b = a;
        a.merge(&b);
        assert_eq!(a.total(), 42);
        assert_eq!(a.successful_removes, 10);
    }

    #[test]
    fn throughput_handles_zero_elapsed_time() {
        let result = BenchmarkResult {
            elapsed_seconds: 0.0,
            counters: OpCounters::default(),
        };
        assert_eq!(result.throughput(), 0.0);
    }

    #[test]
    fn display_mentions_every_counter() {
        let result = BenchmarkResult {
            elapsed_seconds: 1.5,
            counters: OpCounters {
                successful_adds: 10,
                failed_adds: 1,
                successful_contains: 20,
                failed_contains: 2,
                successful_removes: 30,
                failed_removes: 3,
            },
        };
        let text = result.to_string();
        assert!(text.contains("Insertions: 10 successful / 11 attempted"));
        assert!(text.contains("Deletions: 30 successful / 33 attempted"));
        assert!(text.contains("Contains: 20 successful / 22 attempted"));
        assert!(text.contains("Throughput"));
    }
}
