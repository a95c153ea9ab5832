//! Core types and traits for skipbench
//!
//! This crate contains the fundamental types and error handling shared by
//! the skip-list implementations and the benchmark harness. It provides:
//!
//! - Common error types with [`Error`] and [`Result`]
//! - Basic data types like [`Key`], [`Value`], and [`KeyRange`]
//! - The benchmark vocabulary: [`Variant`], [`SelectionStrategy`],
//!   [`KeyOverlap`], and [`OperationsMix`]
//!
//! # Example
//!
//! ```
//! use skipbench_core::{Key, KeyRange, Variant};
//!
//! let range = KeyRange::new(0, 99);
//! assert!(range.contains(42));
//! assert_eq!(range.key_count(), 100);
//! let variant = Variant::LockFree;
//! assert_ne!(variant, Variant::Seq);
//! ```

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
