//! Error types for skipbench
//!
//! This module defines the error types used throughout skipbench.
//!
//! Data-path misses are deliberately *not* errors: a duplicate `add`, a
//! `remove` of an absent key, or an out-of-range `add` all surface as
//! `bool`/`Option` results and end up in the failed-operation counters.

use thiserror::Error;

/// The main error type for skipbench operations
#[derive(Error, Debug)]
pub enum Error {
    /// The benchmark configuration is inconsistent and no run was started
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// A specialized Result type for skipbench operations
pub type Result<T> = std::result::Result<T, Error>;
