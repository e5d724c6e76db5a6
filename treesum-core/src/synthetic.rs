//! Seeded random scenario batches.

use rand::{Rng, SeedableRng, rngs::SmallRng};

use crate::{Graph, ValueBatch};

/// Builds a `scenarios × node_count` batch whose leaf columns hold uniform
/// samples from `[0, 1)` and whose other columns are zero.
///
/// The same `seed` always yields the same batch. Samples are drawn scenario
/// by scenario, leaves in ascending order.
///
/// # Examples
/// ```
/// use treesum_core::{networks::network_one, random_leaf_values};
///
/// let graph = network_one().graph()?;
/// let values = random_leaf_values(&graph, 8, 42);
/// assert_eq!(values.shape(), (8, 10));
/// assert_eq!(values.column(9), Some(&[0.0; 8][..]));
/// assert_eq!(values, random_leaf_values(&graph, 8, 42));
/// # Ok::<(), treesum_core::TreeSumError>(())
/// ```
#[must_use]
pub fn random_leaf_values(graph: &Graph, scenarios: usize, seed: u64) -> ValueBatch {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut batch = ValueBatch::zeros(scenarios, graph.node_count());
    for row in 0..scenarios {
        for &leaf in graph.leaves() {
            batch.set(row, leaf, rng.r#gen::<f64>());
        }
    }
    batch
}
