//! Benchmark support crate for treesum.
//!
//! Provides synthetic tree generators and parameter types used by the
//! Criterion benchmarks of graph planning and batched aggregation.

pub mod error;
pub mod params;
pub mod source;
