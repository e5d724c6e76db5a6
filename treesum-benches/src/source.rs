//! Synthetic trees for benchmarks.
//!
//! Generators return core [`Graph`]s built from edge lists, so large trees
//! never materialise a dense adjacency matrix.

use rand::{Rng, SeedableRng, rngs::SmallRng};
use treesum_core::Graph;

use crate::error::BenchSetupError;

/// Shape of a generated tree.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TreeShape {
    /// Every node attaches to a uniformly chosen earlier node.
    Random,
    /// A single path; the deepest possible tree.
    Chain,
    /// Every leaf attaches to the root; the shallowest possible tree.
    Star,
}

impl TreeShape {
    /// Returns a short label for benchmark identifiers.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Chain => "chain",
            Self::Star => "star",
        }
    }
}

/// Builds a tree of `node_count` nodes rooted at node 0.
///
/// Leaves are the non-root nodes without children.
///
/// # Errors
/// Returns [`BenchSetupError::TooFewNodes`] when `node_count < 2`, and
/// propagates graph construction failures.
pub fn generate_tree(
    shape: TreeShape,
    node_count: usize,
    seed: u64,
) -> Result<Graph, BenchSetupError> {
    if node_count < 2 {
        return Err(BenchSetupError::TooFewNodes { node_count });
    }
    let mut rng = SmallRng::seed_from_u64(seed);
    let edges: Vec<(usize, usize)> = (1..node_count)
        .map(|node| {
            let parent = match shape {
                TreeShape::Random => rng.gen_range(0..node),
                TreeShape::Chain => node - 1,
                TreeShape::Star => 0,
            };
            (parent, node)
        })
        .collect();

    let mut has_child = vec![false; node_count];
    for &(parent, _) in &edges {
        if let Some(slot) = has_child.get_mut(parent) {
            *slot = true;
        }
    }
    let leaves = (1..node_count).filter(|&node| !has_child.get(node).copied().unwrap_or(false));

    Ok(Graph::from_edges(node_count, edges, leaves, [0])?)
}
