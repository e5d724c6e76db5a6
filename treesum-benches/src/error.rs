//! Benchmark setup error type.
//!
//! Lets setup functions propagate failures with `?` instead of panicking
//! before Criterion starts measuring.

use treesum_core::TreeSumError;

/// Errors that may occur during benchmark setup.
#[derive(Debug, thiserror::Error)]
pub enum BenchSetupError {
    /// Graph construction, planning or aggregation failed.
    #[error("treesum operation failed: {0}")]
    Core(#[from] TreeSumError),
    /// A generator was asked for a tree too small to have a leaf.
    #[error("a tree needs at least two nodes, got {node_count}")]
    TooFewNodes {
        /// Requested node count.
        node_count: usize,
    },
}
