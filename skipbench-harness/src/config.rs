//! Configuration for the benchmark harness

use serde::{Deserialize, Serialize};
use skipbench_core::{
    Error, KeyOverlap, KeyRange, OperationsMix, Result, SelectionStrategy, Variant,
};

/// Maximum level count any list may be configured with
pub const MAX_LEVELS: usize = 32;

/// All tunable parameters of one benchmark run
///
/// A configuration is inert data; [`validate`](BenchmarkConfig::validate)
/// decides whether a run may start, and nothing runs partially on an
/// invalid configuration.
///
/// # Example
///
/// ```
/// use skipbench_core::{KeyRange, OperationsMix, Variant};
/// use skipbench_harness::BenchmarkConfig;
///
/// let config = BenchmarkConfig {
///     variant: Variant::LockFree,
///     num_threads: 8,
///     time_interval_s: 2,
///     keyrange: KeyRange::new(0, 9_999),
///     op_mix: OperationsMix::new(0.2, 0.6),
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Which implementation to stress
    pub variant: Variant,

    /// Worker count; the sequential variant always runs on one thread
    pub num_threads: usize,

    /// Measurement duration in seconds
    pub time_interval_s: u64,

    /// Distinct keys inserted before the measurement starts
    pub n_prefill: usize,

    /// Insert and contains probabilities; the remainder is deletes
    pub op_mix: OperationsMix,

    /// How workers pick their next key
    pub strategy: SelectionStrategy,

    /// Whether workers share the key range or get disjoint partitions
    pub overlap: KeyOverlap,

    /// Base RNG seed; worker `t` seeds from `seed + t`, prefill from
    /// `seed + 1`
    pub seed: u64,

    /// Inclusive key range handed to the list
    pub keyrange: KeyRange,

    /// Maximum level count of the list, `1..=32`
    pub levels: usize,

    /// Per-level promotion probability, in `(0, 1)` exclusive
    pub prob: f64,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            variant: Variant::Fine,
            num_threads: 4,
            time_interval_s: 5,
            n_prefill: 10_000,
            op_mix: OperationsMix::new(0.1, 0.8),
            strategy: SelectionStrategy::Unique,
            overlap: KeyOverlap::Common,
            seed: 12345,
            keyrange: KeyRange::new(0, 100_000),
            levels: 4,
            prob: 0.5,
        }
    }
}

impl BenchmarkConfig {
    /// Rejects configurations the harness must not run
    pub fn validate(&self) -> Result<()> {
        let mix = &self.op_mix;
        if !(0.0..=1.0).contains(&mix.insert_p) || !(0.0..=1.0).contains(&mix.contain_p) {
            return Err(Error::InvalidConfiguration(format!(
                "operation probabilities must lie in [0, 1], got insert_p = {}, contain_p = {}",
                mix.insert_p, mix.contain_p
            )));
        }
        if mix.insert_p + mix.contain_p > 1.0 {
            return Err(Error::InvalidConfiguration(format!(
                "insert_p + contain_p = {} exceeds 1",
                mix.insert_p + mix.contain_p
            )));
        }
        if self.keyrange.max <= self.keyrange.min {
            return Err(Error::InvalidConfiguration(format!(
                "empty key range [{}, {}]",
                self.keyrange.min, self.keyrange.max
            )));
        }
        if self.levels == 0 || self.levels > MAX_LEVELS {
            return Err(Error::InvalidConfiguration(format!(
                "levels must lie in 1..={MAX_LEVELS}, got {}",
                self.levels
            )));
        }
        if !(self.prob > 0.0 && self.prob < 1.0) {
            return Err(Error::InvalidConfiguration(format!(
                "promotion probability must lie in (0, 1), got {}",
                self.prob
            )));
        }
        if self.num_threads == 0 {
            return Err(Error::InvalidConfiguration(
                "at least one worker thread is required".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(BenchmarkConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_probabilities_outside_unit_interval() {
        let mut config = BenchmarkConfig::default();
        config.op_mix = OperationsMix::new(-0.1, 0.5);
        assert!(config.validate().is_err());
        config.op_mix = OperationsMix::new(0.5, 1.1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_probabilities_summing_over_one() {
        let mut config = BenchmarkConfig::default();
        config.op_mix = OperationsMix::new(0.7, 0.7);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_key_range() {
        let mut config = BenchmarkConfig::default();
        config.keyrange = KeyRange::new(5, 5);
        assert!(config.validate().is_err());
        config.keyrange = KeyRange::new(5, 4);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_degenerate_levels_probability_and_threads() {
        let mut config = BenchmarkConfig::default();
        config.levels = 0;
        assert!(config.validate().is_err());

        config = BenchmarkConfig::default();
        config.levels = 33;
        assert!(config.validate().is_err());

        config = BenchmarkConfig::default();
        config.prob = 0.0;
        assert!(config.validate().is_err());

        config = BenchmarkConfig::default();
        config.prob = 1.0;
        assert!(config.validate().is_err());

        config = BenchmarkConfig::default();
        config.num_threads = 0;
        assert!(config.validate().is_err());
    }
}
