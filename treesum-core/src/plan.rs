//! Depth-first traversal planning.
//!
//! Walking the graph from the root produces a [`TraversalPlan`]: the interior
//! nodes in post-order, each with the children it sums. The walk threads a
//! visited set through every step, so a node reached twice is reported as a
//! cycle and a node never reached is reported as unreachable instead of
//! recursing forever or leaving stale values behind.

use std::mem;

use crate::{Graph, Result, error::TreeSumError};

/// One interior node of the walked tree together with its children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanStep {
    node: usize,
    children: Vec<usize>,
}

impl PlanStep {
    /// Returns the node this step computes.
    #[must_use]
    #[rustfmt::skip]
    pub fn node(&self) -> usize { self.node }

    /// Returns the children whose columns are summed, in neighbour order.
    #[must_use]
    #[rustfmt::skip]
    pub fn children(&self) -> &[usize] { &self.children }
}

/// Post-order schedule for aggregating one graph.
///
/// A plan depends only on the graph, so it can be built once and applied to
/// any number of value batches with matching column counts.
///
/// # Examples
/// ```
/// use treesum_core::{AggregatorBuilder, Graph};
///
/// let graph = Graph::from_edges(4, [(0, 2), (1, 2), (2, 3)], [0, 1], [3])?;
/// let plan = AggregatorBuilder::new().build()?.plan(&graph)?;
/// let order: Vec<usize> = plan.steps().iter().map(|step| step.node()).collect();
/// assert_eq!(order, [2, 3]);
/// assert_eq!(plan.children(2), Some(&[0, 1][..]));
/// assert_eq!(plan.parent(2), Some(3));
/// assert_eq!(plan.depth(), 3);
/// # Ok::<(), treesum_core::TreeSumError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraversalPlan {
    root: usize,
    steps: Vec<PlanStep>,
    parents: Vec<Option<usize>>,
    step_index: Vec<Option<usize>>,
    depth: usize,
}

impl TraversalPlan {
    /// Returns the root the walk started from.
    #[must_use]
    #[rustfmt::skip]
    pub fn root(&self) -> usize { self.root }

    /// Returns the number of nodes of the planned graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.parents.len()
    }

    /// Returns the interior nodes in post-order (children before parents,
    /// root last).
    #[must_use]
    #[rustfmt::skip]
    pub fn steps(&self) -> &[PlanStep] { &self.steps }

    /// Returns the number of levels on the longest root-to-leaf path; a lone
    /// root has depth 1.
    #[must_use]
    #[rustfmt::skip]
    pub fn depth(&self) -> usize { self.depth }

    /// Returns the children of `node` in the walked tree.
    ///
    /// Leaves have no children. Returns `None` for out-of-range indices.
    #[must_use]
    pub fn children(&self, node: usize) -> Option<&[usize]> {
        match self.step_index.get(node)? {
            Some(index) => self.steps.get(*index).map(PlanStep::children),
            None => Some(&[]),
        }
    }

    /// Returns the node `node` was reached from; `None` for the root and for
    /// out-of-range indices.
    #[must_use]
    pub fn parent(&self, node: usize) -> Option<usize> {
        self.parents.get(node).copied().flatten()
    }

    /// Returns `true` when `node` keeps its input values during aggregation.
    #[must_use]
    pub fn is_leaf(&self, node: usize) -> bool {
        matches!(self.step_index.get(node), Some(None))
    }

    /// Sums child columns into each interior node's column, in post-order.
    ///
    /// `columns` holds one slice per node; every slice must have the same
    /// length. Leaf columns are never written.
    #[expect(
        clippy::float_arithmetic,
        reason = "aggregation is elementwise floating-point addition"
    )]
    pub(crate) fn apply(&self, columns: &mut [&mut [f64]]) {
        for step in &self.steps {
            let Some(slot) = columns.get_mut(step.node) else {
                continue;
            };
            let target = mem::take(slot);
            target.fill(0.0);
            for &child in &step.children {
                if let Some(source) = columns.get(child) {
                    for (sum, value) in target.iter_mut().zip(source.iter()) {
                        *sum += *value;
                    }
                }
            }
            if let Some(slot) = columns.get_mut(step.node) {
                *slot = target;
            }
        }
    }

    /// Plans with the call-stack recursion, failing once a path is longer
    /// than `max_depth` levels.
    pub(crate) fn recursive(graph: &Graph, max_depth: usize) -> Result<Self> {
        let root = graph.root()?;
        let mut walk = Walk::new(graph.node_count());
        walk.visit(graph, root, None, 1, max_depth)?;
        walk.finish(root)
    }

    /// Plans with an explicit stack of frames instead of recursion.
    pub(crate) fn worklist(graph: &Graph) -> Result<Self> {
        let root = graph.root()?;
        let mut walk = Walk::new(graph.node_count());
        let mut stack: Vec<Frame> = Vec::new();
        walk.open(graph, &mut stack, root, None)?;

        loop {
            let Some(frame) = stack.last_mut() else {
                break;
            };
            let neighbours = graph.neighbours_of(frame.node);
            let mut next = None;
            while let Some(&candidate) = neighbours.get(frame.cursor) {
                frame.cursor = frame.cursor.saturating_add(1);
                if Some(candidate) != frame.parent {
                    next = Some(candidate);
                    break;
                }
            }

            match next {
                Some(child) => {
                    frame.children.push(child);
                    let node = frame.node;
                    walk.open(graph, &mut stack, child, Some(node))?;
                }
                None => {
                    if let Some(done) = stack.pop() {
                        walk.push_step(done.node, done.children);
                    }
                }
            }
        }
        walk.finish(root)
    }
}

struct Frame {
    node: usize,
    parent: Option<usize>,
    cursor: usize,
    children: Vec<usize>,
}

struct Walk {
    visited: Vec<bool>,
    parents: Vec<Option<usize>>,
    step_index: Vec<Option<usize>>,
    steps: Vec<PlanStep>,
    depth: usize,
}

impl Walk {
    fn new(node_count: usize) -> Self {
        Self {
            visited: vec![false; node_count],
            parents: vec![None; node_count],
            step_index: vec![None; node_count],
            steps: Vec::new(),
            depth: 0,
        }
    }

    /// Marks `node` as reached at `level`; a second arrival is a cycle.
    fn enter(&mut self, node: usize, parent: Option<usize>, level: usize) -> Result<()> {
        let node_count = self.visited.len();
        let Some(seen) = self.visited.get_mut(node) else {
            return Err(TreeSumError::NodeOutOfRange { node, node_count });
        };
        if *seen {
            return Err(TreeSumError::CycleDetected { node });
        }
        *seen = true;
        if let Some(slot) = self.parents.get_mut(node) {
            *slot = parent;
        }
        self.depth = self.depth.max(level);
        Ok(())
    }

    fn visit(
        &mut self,
        graph: &Graph,
        node: usize,
        parent: Option<usize>,
        level: usize,
        max_depth: usize,
    ) -> Result<()> {
        if level > max_depth {
            return Err(TreeSumError::DepthLimitExceeded { limit: max_depth });
        }
        self.enter(node, parent, level)?;
        if graph.is_leaf(node) {
            return Ok(());
        }

        let neighbours = graph.neighbours_of(node);
        for &child in neighbours {
            if Some(child) != parent {
                self.visit(graph, child, Some(node), level.saturating_add(1), max_depth)?;
            }
        }
        let children = neighbours
            .iter()
            .copied()
            .filter(|&candidate| Some(candidate) != parent)
            .collect();
        self.push_step(node, children);
        Ok(())
    }

    /// Enters `node` and, unless it is a leaf, pushes a frame for its
    /// neighbours.
    fn open(
        &mut self,
        graph: &Graph,
        stack: &mut Vec<Frame>,
        node: usize,
        parent: Option<usize>,
    ) -> Result<()> {
        self.enter(node, parent, stack.len().saturating_add(1))?;
        if !graph.is_leaf(node) {
            stack.push(Frame {
                node,
                parent,
                cursor: 0,
                children: Vec::new(),
            });
        }
        Ok(())
    }

    fn push_step(&mut self, node: usize, children: Vec<usize>) {
        if let Some(slot) = self.step_index.get_mut(node) {
            *slot = Some(self.steps.len());
        }
        self.steps.push(PlanStep { node, children });
    }

    fn finish(self, root: usize) -> Result<TraversalPlan> {
        if let Some(node) = self.visited.iter().position(|seen| !seen) {
            return Err(TreeSumError::UnreachableNode { node });
        }
        Ok(TraversalPlan {
            root,
            steps: self.steps,
            parents: self.parents,
            step_index: self.step_index,
            depth: self.depth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    type Planner = fn(&Graph) -> Result<TraversalPlan>;

    fn recursive(graph: &Graph) -> Result<TraversalPlan> {
        TraversalPlan::recursive(graph, 64)
    }

    fn worklist(graph: &Graph) -> Result<TraversalPlan> {
        TraversalPlan::worklist(graph)
    }

    fn caterpillar() -> Graph {
        //   5
        //   |
        //   4 - 3
        //   |
        //   2
        //  / \
        // 0   1
        Graph::from_edges(6, [(0, 2), (1, 2), (2, 4), (3, 4), (4, 5)], [0, 1, 3], [5])
            .expect("edges are in range")
    }

    #[rstest]
    #[case::recursive(recursive as Planner)]
    #[case::worklist(worklist as Planner)]
    fn steps_are_post_order(#[case] planner: Planner) {
        let plan = planner(&caterpillar()).expect("caterpillar is a tree");
        let order: Vec<usize> = plan.steps().iter().map(PlanStep::node).collect();
        assert_eq!(order, vec![2, 4, 5]);
        assert_eq!(plan.children(4), Some(&[2, 3][..]));
        assert_eq!(plan.children(5), Some(&[4][..]));
        assert_eq!(plan.children(0), Some(&[][..]));
        assert_eq!(plan.children(6), None);
        assert_eq!(plan.parent(0), Some(2));
        assert_eq!(plan.parent(5), None);
        assert_eq!(plan.depth(), 4);
        assert!(plan.is_leaf(3));
        assert!(!plan.is_leaf(4));
        assert_eq!(plan.root(), 5);
        assert_eq!(plan.node_count(), 6);
    }

    #[test]
    fn strategies_agree_on_the_plan() {
        let graph = caterpillar();
        assert_eq!(recursive(&graph), worklist(&graph));
    }

    #[rstest]
    #[case::recursive(recursive as Planner)]
    #[case::worklist(worklist as Planner)]
    fn detects_cycles(#[case] planner: Planner) {
        // 0 - 1 - 2 - 0 with leaf 3 hanging off 2.
        let graph = Graph::from_edges(4, [(0, 1), (1, 2), (2, 0), (2, 3)], [3], [0])
            .expect("edges are in range");
        let err = planner(&graph).expect_err("triangle is not a tree");
        assert_eq!(err, TreeSumError::CycleDetected { node: 0 });
    }

    #[rstest]
    #[case::recursive(recursive as Planner)]
    #[case::worklist(worklist as Planner)]
    fn detects_self_loops(#[case] planner: Planner) {
        let graph = Graph::from_edges(2, [(0, 1), (1, 1)], [0], [1]).expect("edges are in range");
        let err = planner(&graph).expect_err("self-loop is not a tree edge");
        assert_eq!(err, TreeSumError::CycleDetected { node: 1 });
    }

    #[rstest]
    #[case::recursive(recursive as Planner)]
    #[case::worklist(worklist as Planner)]
    fn detects_unreachable_nodes(#[case] planner: Planner) {
        let graph = Graph::from_edges(4, [(0, 1), (2, 3)], [0, 3], [1]).expect("edges are in range");
        let err = planner(&graph).expect_err("nodes 2 and 3 are detached");
        assert_eq!(err, TreeSumError::UnreachableNode { node: 2 });
    }

    #[rstest]
    #[case::recursive(recursive as Planner)]
    #[case::worklist(worklist as Planner)]
    fn childless_interior_nodes_are_planned(#[case] planner: Planner) {
        let graph = Graph::from_edges(3, [(0, 1), (1, 2)], [0], [1]).expect("edges are in range");
        let plan = planner(&graph).expect("path is a tree");
        assert_eq!(plan.children(2), Some(&[][..]));
        assert!(!plan.is_leaf(2));
    }

    #[test]
    fn recursion_respects_the_depth_limit() {
        let graph = caterpillar();
        let err = TraversalPlan::recursive(&graph, 3).expect_err("depth 4 exceeds 3");
        assert_eq!(err, TreeSumError::DepthLimitExceeded { limit: 3 });
        assert!(TraversalPlan::recursive(&graph, 4).is_ok());
    }

    #[test]
    fn apply_sums_children_and_keeps_leaves() {
        let plan = worklist(&caterpillar()).expect("caterpillar is a tree");
        let mut data = [
            vec![1.0, 10.0],
            vec![2.0, 20.0],
            vec![-9.0, -9.0],
            vec![4.0, 40.0],
            vec![-9.0, -9.0],
            vec![-9.0, -9.0],
        ];
        let mut columns: Vec<&mut [f64]> = data.iter_mut().map(Vec::as_mut_slice).collect();
        plan.apply(&mut columns);
        assert_eq!(data[0], vec![1.0, 10.0]);
        assert_eq!(data[2], vec![3.0, 30.0]);
        assert_eq!(data[4], vec![7.0, 70.0]);
        assert_eq!(data[5], vec![7.0, 70.0]);
    }
}
