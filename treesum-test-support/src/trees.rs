//! Tree fixtures and a brute-force aggregation oracle.
//!
//! Fixtures are plain data (edge lists, leaf lists, a root index) so that
//! every crate can turn them into its own graph type. The oracle computes
//! each node's value as the sum of the leaves in its subtree by walking from
//! every leaf up to the root, which shares no code path with a post-order
//! traversal.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng, rngs::SmallRng, seq::SliceRandom};

/// An undirected tree with designated leaves and root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeFixture {
    /// Number of nodes.
    pub node_count: usize,
    /// Undirected edges.
    pub edges: Vec<(usize, usize)>,
    /// Non-root nodes of degree one, ascending.
    pub leaves: Vec<usize>,
    /// Root node.
    pub root: usize,
}

impl TreeFixture {
    /// Generates a random labelled tree with `node_count` nodes (at least
    /// two).
    ///
    /// Every node after the first attaches to a uniformly chosen earlier
    /// node, then labels are shuffled so the root is not always node 0.
    ///
    /// # Examples
    /// ```
    /// use treesum_test_support::trees::TreeFixture;
    ///
    /// let tree = TreeFixture::random(12, 7);
    /// assert_eq!(tree.edges.len(), 11);
    /// assert!(!tree.leaves.contains(&tree.root));
    /// assert_eq!(tree, TreeFixture::random(12, 7));
    /// ```
    #[must_use]
    pub fn random(node_count: usize, seed: u64) -> Self {
        let node_count = node_count.max(2);
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut labels: Vec<usize> = (0..node_count).collect();
        labels.shuffle(&mut rng);

        let edges = (1..node_count)
            .map(|order| {
                let parent = rng.gen_range(0..order);
                (label(&labels, parent), label(&labels, order))
            })
            .collect();
        Self::from_edges(node_count, edges, label(&labels, 0))
    }

    /// A path `0 - 1 - ... - (node_count - 1)` rooted at 0 with the far end
    /// as its only leaf.
    #[must_use]
    pub fn chain(node_count: usize) -> Self {
        let node_count = node_count.max(2);
        let edges = (1..node_count).map(|node| (node - 1, node)).collect();
        Self::from_edges(node_count, edges, 0)
    }

    /// A root (node 0) with `leaf_count` leaves attached directly.
    #[must_use]
    pub fn star(leaf_count: usize) -> Self {
        let leaf_count = leaf_count.max(1);
        let edges = (1..=leaf_count).map(|leaf| (0, leaf)).collect();
        Self::from_edges(leaf_count + 1, edges, 0)
    }

    fn from_edges(node_count: usize, edges: Vec<(usize, usize)>, root: usize) -> Self {
        let mut degree = vec![0_usize; node_count];
        for &(left, right) in &edges {
            degree[left] += 1;
            degree[right] += 1;
        }
        let leaves = (0..node_count)
            .filter(|&node| node != root && degree[node] == 1)
            .collect();
        Self {
            node_count,
            edges,
            leaves,
            root,
        }
    }

    /// Returns a symmetric 0/1 adjacency matrix.
    #[must_use]
    pub fn adjacency(&self) -> Vec<Vec<u8>> {
        let mut rows = vec![vec![0_u8; self.node_count]; self.node_count];
        for &(left, right) in &self.edges {
            rows[left][right] = 1;
            rows[right][left] = 1;
        }
        rows
    }

    /// Returns each node's parent on the path to the root (`None` for the
    /// root).
    #[must_use]
    pub fn parents(&self) -> Vec<Option<usize>> {
        let mut neighbours = vec![Vec::new(); self.node_count];
        for &(left, right) in &self.edges {
            neighbours[left].push(right);
            neighbours[right].push(left);
        }
        let mut parents = vec![None; self.node_count];
        let mut seen = vec![false; self.node_count];
        let mut queue = VecDeque::from([self.root]);
        seen[self.root] = true;
        while let Some(node) = queue.pop_front() {
            for &next in &neighbours[node] {
                if !seen[next] {
                    seen[next] = true;
                    parents[next] = Some(node);
                    queue.push_back(next);
                }
            }
        }
        parents
    }

    /// Row-major scenarios with leaf values from `seed` and `fill` in every
    /// other column.
    ///
    /// Leaf values are small integers so sums are exact in `f64` regardless
    /// of addition order.
    #[must_use]
    pub fn integer_scenarios(&self, scenarios: usize, seed: u64, fill: f64) -> Vec<Vec<f64>> {
        let mut rng = SmallRng::seed_from_u64(seed);
        (0..scenarios)
            .map(|_| {
                let mut row = vec![fill; self.node_count];
                for &leaf in &self.leaves {
                    row[leaf] = f64::from(rng.gen_range(-1000_i32..=1000));
                }
                row
            })
            .collect()
    }

    /// Brute-force expected output: leaf columns copied, every other node
    /// set to the sum of the leaves below it.
    #[must_use]
    pub fn expected_sums(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        let parents = self.parents();
        rows.iter()
            .map(|row| {
                let mut out = vec![0.0; self.node_count];
                for &leaf in &self.leaves {
                    let value = row[leaf];
                    out[leaf] = value;
                    let mut cursor = parents[leaf];
                    while let Some(node) = cursor {
                        out[node] += value;
                        cursor = parents[node];
                    }
                }
                out
            })
            .collect()
    }
}

fn label(labels: &[usize], order: usize) -> usize {
    labels[order]
}
