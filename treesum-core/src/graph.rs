//! Graph model for rooted tree networks.
//!
//! A [`Graph`] is a passive description of the network: the node count, an
//! unweighted adjacency relation stored as per-node neighbour lists, the leaf
//! (source) nodes and the sink nodes. It never changes after construction.

use std::collections::BTreeSet;

use tracing::debug;

use crate::{Result, error::TreeSumError};

/// Immutable rooted network description.
///
/// Neighbour lists are kept in a compressed layout (`offsets` into a shared
/// `targets` buffer) and sorted ascending, so [`Graph::neighbours`] is stable
/// across calls.
///
/// # Examples
/// ```
/// use treesum_core::Graph;
///
/// let adjacency = [
///     [0_u8, 1, 0],
///     [1, 0, 1],
///     [0, 1, 0],
/// ];
/// let graph = Graph::from_adjacency(&adjacency, [0], [2])?;
/// assert_eq!(graph.node_count(), 3);
/// assert_eq!(graph.neighbours(1)?, &[0, 2]);
/// assert!(graph.is_leaf(0));
/// assert_eq!(graph.root()?, 2);
/// # Ok::<(), treesum_core::TreeSumError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Graph {
    offsets: Vec<usize>,
    targets: Vec<usize>,
    leaf_mask: Vec<bool>,
    leaves: Vec<usize>,
    sinks: Vec<usize>,
}

impl Graph {
    /// Builds a graph from an n×n adjacency matrix.
    ///
    /// Any entry that differs from `T::default()` is an edge, so `u8`, `i32`,
    /// `f64` and `bool` matrices all work. Row `i` lists the neighbours of
    /// node `i`; the matrix is expected to be symmetric but this is not
    /// checked.
    ///
    /// # Errors
    /// Returns [`TreeSumError::NonSquareAdjacency`] when a row length differs
    /// from the number of rows and [`TreeSumError::NodeOutOfRange`] when a
    /// leaf or sink index is not a node of the matrix.
    pub fn from_adjacency<R, T>(
        rows: &[R],
        nodes_start: impl IntoIterator<Item = usize>,
        nodes_end: impl IntoIterator<Item = usize>,
    ) -> Result<Self>
    where
        R: AsRef<[T]>,
        T: Copy + Default + PartialEq,
    {
        let node_count = rows.len();
        let absent = T::default();
        let mut offsets = Vec::with_capacity(node_count.saturating_add(1));
        let mut targets = Vec::new();
        offsets.push(0);
        for (row, entries) in rows.iter().enumerate() {
            let entries = entries.as_ref();
            if entries.len() != node_count {
                return Err(TreeSumError::NonSquareAdjacency {
                    row,
                    len: entries.len(),
                    expected: node_count,
                });
            }
            targets.extend(
                entries
                    .iter()
                    .enumerate()
                    .filter(|(_, entry)| **entry != absent)
                    .map(|(column, _)| column),
            );
            offsets.push(targets.len());
        }
        Self::assemble(offsets, targets, nodes_start, nodes_end)
    }

    /// Builds a graph from undirected edge pairs.
    ///
    /// Each pair is inserted in both directions; duplicates collapse into a
    /// single edge.
    ///
    /// # Errors
    /// Returns [`TreeSumError::NodeOutOfRange`] when an edge endpoint, leaf or
    /// sink index is `>= node_count`.
    ///
    /// # Examples
    /// ```
    /// use treesum_core::Graph;
    ///
    /// let graph = Graph::from_edges(4, [(0, 2), (1, 2), (2, 3)], [0, 1], [3])?;
    /// assert_eq!(graph.edge_count(), 3);
    /// assert_eq!(graph.neighbours(2)?, &[0, 1, 3]);
    /// # Ok::<(), treesum_core::TreeSumError>(())
    /// ```
    pub fn from_edges(
        node_count: usize,
        edges: impl IntoIterator<Item = (usize, usize)>,
        nodes_start: impl IntoIterator<Item = usize>,
        nodes_end: impl IntoIterator<Item = usize>,
    ) -> Result<Self> {
        let mut adjacency = vec![BTreeSet::new(); node_count];
        for (left, right) in edges {
            for node in [left, right] {
                if node >= node_count {
                    return Err(TreeSumError::NodeOutOfRange { node, node_count });
                }
            }
            if let Some(set) = adjacency.get_mut(left) {
                set.insert(right);
            }
            if let Some(set) = adjacency.get_mut(right) {
                set.insert(left);
            }
        }

        let mut offsets = Vec::with_capacity(node_count.saturating_add(1));
        let mut targets = Vec::new();
        offsets.push(0);
        for set in adjacency {
            targets.extend(set);
            offsets.push(targets.len());
        }
        Self::assemble(offsets, targets, nodes_start, nodes_end)
    }

    fn assemble(
        offsets: Vec<usize>,
        targets: Vec<usize>,
        nodes_start: impl IntoIterator<Item = usize>,
        nodes_end: impl IntoIterator<Item = usize>,
    ) -> Result<Self> {
        let node_count = offsets.len().saturating_sub(1);
        let leaves = collect_nodes(nodes_start, node_count)?;
        let sinks = collect_nodes(nodes_end, node_count)?;

        let mut leaf_mask = vec![false; node_count];
        for &leaf in &leaves {
            if let Some(slot) = leaf_mask.get_mut(leaf) {
                *slot = true;
            }
        }

        let graph = Self {
            offsets,
            targets,
            leaf_mask,
            leaves,
            sinks,
        };
        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            leaves = graph.leaves.len(),
            sinks = graph.sinks.len(),
            "graph constructed"
        );
        Ok(graph)
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.leaf_mask.len()
    }

    /// Returns the number of undirected edges, counting a self-loop once.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        let mut directed = 0_usize;
        let mut loops = 0_usize;
        for node in 0..self.node_count() {
            for &other in self.neighbours_of(node) {
                if other == node {
                    loops = loops.saturating_add(1);
                } else {
                    directed = directed.saturating_add(1);
                }
            }
        }
        (directed >> 1).saturating_add(loops)
    }

    /// Returns every node adjacent to `node`, in ascending index order.
    ///
    /// # Errors
    /// Returns [`TreeSumError::NodeOutOfRange`] when `node >= node_count()`.
    pub fn neighbours(&self, node: usize) -> Result<&[usize]> {
        if node >= self.node_count() {
            return Err(TreeSumError::NodeOutOfRange {
                node,
                node_count: self.node_count(),
            });
        }
        Ok(self.neighbours_of(node))
    }

    /// Neighbour lookup for indices already known to be in range.
    pub(crate) fn neighbours_of(&self, node: usize) -> &[usize] {
        let start = self.offsets.get(node).copied().unwrap_or_default();
        let end = self
            .offsets
            .get(node.saturating_add(1))
            .copied()
            .unwrap_or(start);
        self.targets.get(start..end).unwrap_or_default()
    }

    /// Returns `true` when `node` is one of the leaf (source) nodes.
    ///
    /// Out-of-range indices are not leaves.
    #[must_use]
    pub fn is_leaf(&self, node: usize) -> bool {
        self.leaf_mask.get(node).copied().unwrap_or(false)
    }

    /// Returns the leaf nodes in ascending order.
    #[must_use]
    pub fn leaves(&self) -> &[usize] {
        &self.leaves
    }

    /// Returns the sink nodes in ascending order.
    #[must_use]
    pub fn sinks(&self) -> &[usize] {
        &self.sinks
    }

    /// Returns the single root (sink) node.
    ///
    /// # Errors
    /// Returns [`TreeSumError::RootCount`] unless exactly one sink was
    /// configured, and [`TreeSumError::RootIsLeaf`] when that sink is also a
    /// leaf.
    pub fn root(&self) -> Result<usize> {
        let [root] = self.sinks.as_slice() else {
            return Err(TreeSumError::RootCount {
                found: self.sinks.len(),
            });
        };
        if self.is_leaf(*root) {
            return Err(TreeSumError::RootIsLeaf { node: *root });
        }
        Ok(*root)
    }
}

fn collect_nodes(nodes: impl IntoIterator<Item = usize>, node_count: usize) -> Result<Vec<usize>> {
    let unique: BTreeSet<usize> = nodes.into_iter().collect();
    if let Some(&node) = unique.iter().find(|&&node| node >= node_count) {
        return Err(TreeSumError::NodeOutOfRange { node, node_count });
    }
    Ok(unique.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn path_graph() -> Graph {
        Graph::from_adjacency(&[[0_u8, 1, 0], [1, 0, 1], [0, 1, 0]], [0], [2])
            .expect("path graph is valid")
    }

    #[test]
    fn neighbours_are_sorted_and_stable() {
        let graph = Graph::from_edges(4, [(3, 1), (1, 0), (2, 1)], [0, 2, 3], [1])
            .expect("star graph is valid");
        let first = graph.neighbours(1).expect("node 1 exists").to_vec();
        let second = graph.neighbours(1).expect("node 1 exists").to_vec();
        assert_eq!(first, vec![0, 2, 3]);
        assert_eq!(first, second);
    }

    #[test]
    fn adjacency_accepts_any_nonzero_entry() {
        let rows = vec![vec![0.0, 2.5], vec![-1.0, 0.0]];
        let graph = Graph::from_adjacency(&rows, [0], [1]).expect("matrix is square");
        assert_eq!(graph.neighbours(0).expect("node 0 exists"), &[1]);
        assert_eq!(graph.neighbours(1).expect("node 1 exists"), &[0]);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn boolean_adjacency_is_supported() {
        let rows = [[false, true], [true, false]];
        let graph = Graph::from_adjacency(&rows, [1], [0]).expect("matrix is square");
        assert_eq!(graph.root().expect("single root"), 0);
    }

    #[test]
    fn rejects_non_square_rows() {
        let rows = vec![vec![0_u8, 1], vec![1]];
        let err = Graph::from_adjacency(&rows, [0], [1]).expect_err("row 1 is short");
        assert_eq!(
            err,
            TreeSumError::NonSquareAdjacency {
                row: 1,
                len: 1,
                expected: 2
            }
        );
    }

    #[rstest]
    #[case::leaf(vec![5], vec![2])]
    #[case::sink(vec![0], vec![3])]
    fn rejects_out_of_range_node_sets(#[case] leaves: Vec<usize>, #[case] sinks: Vec<usize>) {
        let err = Graph::from_adjacency(&[[0_u8, 1, 0], [1, 0, 1], [0, 1, 0]], leaves, sinks)
            .expect_err("index outside the graph");
        assert!(matches!(
            err,
            TreeSumError::NodeOutOfRange { node_count: 3, .. }
        ));
    }

    #[test]
    fn rejects_out_of_range_edges() {
        let err = Graph::from_edges(2, [(0, 2)], [0], [1]).expect_err("node 2 is missing");
        assert_eq!(
            err,
            TreeSumError::NodeOutOfRange {
                node: 2,
                node_count: 2
            }
        );
    }

    #[test]
    fn neighbours_rejects_out_of_range_queries() {
        let err = path_graph().neighbours(3).expect_err("node 3 is missing");
        assert_eq!(
            err,
            TreeSumError::NodeOutOfRange {
                node: 3,
                node_count: 3
            }
        );
    }

    #[rstest]
    #[case::none(vec![], 0)]
    #[case::two(vec![1, 2], 2)]
    fn root_requires_exactly_one_sink(#[case] sinks: Vec<usize>, #[case] found: usize) {
        let graph = Graph::from_adjacency(&[[0_u8, 1, 0], [1, 0, 1], [0, 1, 0]], [0], sinks)
            .expect("indices are in range");
        assert_eq!(graph.root(), Err(TreeSumError::RootCount { found }));
    }

    #[test]
    fn duplicate_sinks_collapse_to_one_root() {
        let graph = Graph::from_adjacency(&[[0_u8, 1, 0], [1, 0, 1], [0, 1, 0]], [0], [2, 2])
            .expect("indices are in range");
        assert_eq!(graph.sinks(), &[2]);
        assert_eq!(graph.root(), Ok(2));
    }

    #[test]
    fn root_must_not_be_a_leaf() {
        let graph = Graph::from_adjacency(&[[0_u8, 1], [1, 0]], [0, 1], [1])
            .expect("indices are in range");
        assert_eq!(graph.root(), Err(TreeSumError::RootIsLeaf { node: 1 }));
    }

    #[test]
    fn leaf_queries() {
        let graph = path_graph();
        assert!(graph.is_leaf(0));
        assert!(!graph.is_leaf(1));
        assert!(!graph.is_leaf(42));
        assert_eq!(graph.leaves(), &[0]);
    }

    #[test]
    fn self_loops_count_once() {
        let graph = Graph::from_adjacency(&[[1_u8, 1], [1, 0]], [1], [0])
            .expect("matrix is square");
        assert_eq!(graph.neighbours(0).expect("node 0 exists"), &[0, 1]);
        assert_eq!(graph.edge_count(), 2);
    }
}
