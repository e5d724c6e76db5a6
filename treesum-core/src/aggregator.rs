//! Traversal aggregation entry points.
//!
//! Exposes the strategy selection surface, the builder that validates it,
//! and the [`Aggregator`] that plans a graph and applies the plan to a
//! private copy of each value batch.

use std::num::NonZeroUsize;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::{Graph, Result, ValueBatch, error::TreeSumError, plan::TraversalPlan};

const DEFAULT_CHUNK_ROWS: usize = 4096;
const DEFAULT_MAX_DEPTH: usize = 1024;

/// Selects how the depth-first walk is driven.
///
/// Both strategies visit nodes in the same order, so they yield identical
/// plans and report the same error for the same malformed graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TraversalStrategy {
    /// Walk with the call stack, bounded by the configured maximum depth.
    Recursive,
    /// Walk with an explicit stack of frames; depth is only bounded by
    /// memory.
    #[default]
    Worklist,
}

/// Selects how a plan is applied to the scenario rows of a batch.
///
/// Every row is independent, so all strategies produce bit-identical output.
///
/// # Examples
/// ```
/// use treesum_core::ExecutionStrategy;
///
/// let strategy = ExecutionStrategy::default();
/// assert!(matches!(strategy, ExecutionStrategy::Auto));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// Run in parallel when the `parallel` feature is compiled in and the
    /// batch spans more than one chunk; otherwise run sequentially.
    #[default]
    Auto,
    /// Process all rows on the calling thread.
    Sequential,
    /// Split rows into chunks processed on the rayon thread pool.
    Parallel,
}

/// Configures and constructs [`Aggregator`] instances.
///
/// # Examples
/// ```
/// use treesum_core::{AggregatorBuilder, ExecutionStrategy, TraversalStrategy};
///
/// let aggregator = AggregatorBuilder::new()
///     .with_traversal(TraversalStrategy::Recursive)
///     .with_execution(ExecutionStrategy::Sequential)
///     .with_max_depth(128)
///     .build()?;
/// assert_eq!(aggregator.traversal(), TraversalStrategy::Recursive);
/// assert_eq!(aggregator.max_depth().get(), 128);
/// # Ok::<(), treesum_core::TreeSumError>(())
/// ```
#[derive(Debug, Clone)]
pub struct AggregatorBuilder {
    traversal: TraversalStrategy,
    execution: ExecutionStrategy,
    chunk_rows: usize,
    max_depth: usize,
}

impl Default for AggregatorBuilder {
    fn default() -> Self {
        Self {
            traversal: TraversalStrategy::default(),
            execution: ExecutionStrategy::default(),
            chunk_rows: DEFAULT_CHUNK_ROWS,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl AggregatorBuilder {
    /// Creates a builder populated with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the traversal strategy.
    #[must_use]
    pub fn with_traversal(mut self, traversal: TraversalStrategy) -> Self {
        self.traversal = traversal;
        self
    }

    /// Returns the configured traversal strategy.
    #[must_use]
    pub fn traversal(&self) -> TraversalStrategy {
        self.traversal
    }

    /// Sets the execution strategy.
    #[must_use]
    pub fn with_execution(mut self, execution: ExecutionStrategy) -> Self {
        self.execution = execution;
        self
    }

    /// Returns the configured execution strategy.
    #[must_use]
    pub fn execution(&self) -> ExecutionStrategy {
        self.execution
    }

    /// Overrides the number of scenario rows handled by one parallel task.
    #[must_use]
    pub fn with_chunk_rows(mut self, rows: usize) -> Self {
        self.chunk_rows = rows;
        self
    }

    /// Returns the configured chunk size.
    #[must_use]
    pub fn chunk_rows(&self) -> usize {
        self.chunk_rows
    }

    /// Overrides the maximum number of levels the recursive walk may descend.
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Returns the configured depth bound.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Validates the configuration and constructs an [`Aggregator`].
    ///
    /// # Errors
    /// Returns [`TreeSumError::InvalidChunkRows`] or
    /// [`TreeSumError::InvalidMaxDepth`] for zero sizes, and
    /// [`TreeSumError::BackendUnavailable`] when
    /// [`ExecutionStrategy::Parallel`] is requested without the `parallel`
    /// feature.
    pub fn build(self) -> Result<Aggregator> {
        let chunk_rows = NonZeroUsize::new(self.chunk_rows).ok_or(
            TreeSumError::InvalidChunkRows {
                got: self.chunk_rows,
            },
        )?;
        let max_depth = NonZeroUsize::new(self.max_depth).ok_or(TreeSumError::InvalidMaxDepth {
            got: self.max_depth,
        })?;
        if cfg!(not(feature = "parallel")) && self.execution == ExecutionStrategy::Parallel {
            return Err(TreeSumError::BackendUnavailable {
                requested: self.execution,
            });
        }

        Ok(Aggregator {
            traversal: self.traversal,
            execution: self.execution,
            chunk_rows,
            max_depth,
        })
    }
}

/// Computes every node's value as the sum of its children, for every
/// scenario of a batch.
///
/// # Examples
/// ```
/// use treesum_core::{Aggregator, Graph, ValueBatch};
///
/// //     3
/// //     |
/// //     2
/// //    / \
/// //   0   1
/// let graph = Graph::from_edges(4, [(0, 2), (1, 2), (2, 3)], [0, 1], [3])?;
/// let values = ValueBatch::from_rows(&[[1.0, 2.0, 0.0, 0.0], [5.0, 7.0, 0.0, 0.0]])?;
///
/// let out = Aggregator::default().aggregate(&graph, &values)?;
/// assert_eq!(out.column(3), Some(&[3.0, 12.0][..]));
/// assert_eq!(values.column(3), Some(&[0.0, 0.0][..]));
/// # Ok::<(), treesum_core::TreeSumError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Aggregator {
    traversal: TraversalStrategy,
    execution: ExecutionStrategy,
    chunk_rows: NonZeroUsize,
    max_depth: NonZeroUsize,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self {
            traversal: TraversalStrategy::default(),
            execution: ExecutionStrategy::default(),
            chunk_rows: NonZeroUsize::new(DEFAULT_CHUNK_ROWS).unwrap_or(NonZeroUsize::MIN),
            max_depth: NonZeroUsize::new(DEFAULT_MAX_DEPTH).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

impl Aggregator {
    /// Returns the traversal strategy.
    #[must_use]
    pub fn traversal(&self) -> TraversalStrategy {
        self.traversal
    }

    /// Returns the execution strategy.
    #[must_use]
    pub fn execution(&self) -> ExecutionStrategy {
        self.execution
    }

    /// Returns the number of rows per parallel chunk.
    #[must_use]
    pub fn chunk_rows(&self) -> NonZeroUsize {
        self.chunk_rows
    }

    /// Returns the recursion bound used by [`TraversalStrategy::Recursive`].
    #[must_use]
    pub fn max_depth(&self) -> NonZeroUsize {
        self.max_depth
    }

    /// Walks `graph` from its root and returns the post-order plan.
    ///
    /// # Errors
    /// Returns the root selection errors of [`Graph::root`] and the
    /// structural errors [`TreeSumError::CycleDetected`],
    /// [`TreeSumError::UnreachableNode`] and
    /// [`TreeSumError::DepthLimitExceeded`].
    #[instrument(
        name = "core.plan",
        err,
        skip(self, graph),
        fields(nodes = graph.node_count(), traversal = ?self.traversal),
    )]
    pub fn plan(&self, graph: &Graph) -> Result<TraversalPlan> {
        let plan = match self.traversal {
            TraversalStrategy::Recursive => TraversalPlan::recursive(graph, self.max_depth.get())?,
            TraversalStrategy::Worklist => TraversalPlan::worklist(graph)?,
        };
        debug!(
            root = plan.root(),
            interior = plan.steps().len(),
            depth = plan.depth(),
            "traversal planned"
        );
        Ok(plan)
    }

    /// Plans `graph` and aggregates `values_in` in one call.
    ///
    /// `values_in` is never modified; the result is a new batch of the same
    /// shape whose leaf columns equal the input and whose other columns hold
    /// the sum of their children.
    ///
    /// # Errors
    /// Returns [`TreeSumError::ColumnMismatch`] when the batch does not have
    /// one column per node, plus every error of [`Aggregator::plan`].
    #[instrument(
        name = "core.aggregate",
        err,
        skip(self, graph, values_in),
        fields(
            nodes = graph.node_count(),
            scenarios = values_in.rows(),
            traversal = ?self.traversal,
            execution = ?self.execution,
        ),
    )]
    pub fn aggregate(&self, graph: &Graph, values_in: &ValueBatch) -> Result<ValueBatch> {
        check_columns(graph.node_count(), values_in)?;
        let plan = self.plan(graph)?;
        self.aggregate_with_plan(&plan, values_in)
    }

    /// Applies a previously built plan to `values_in`.
    ///
    /// # Errors
    /// Returns [`TreeSumError::ColumnMismatch`] when the batch does not have
    /// one column per planned node.
    pub fn aggregate_with_plan(
        &self,
        plan: &TraversalPlan,
        values_in: &ValueBatch,
    ) -> Result<ValueBatch> {
        check_columns(plan.node_count(), values_in)?;
        let mut working = values_in.clone();
        if self.runs_in_parallel(working.rows()) {
            self.apply_parallel(plan, &mut working);
        } else {
            plan.apply(&mut working.columns_mut());
        }
        Ok(working)
    }

    fn runs_in_parallel(&self, rows: usize) -> bool {
        match self.execution {
            ExecutionStrategy::Sequential => false,
            ExecutionStrategy::Parallel => cfg!(feature = "parallel"),
            ExecutionStrategy::Auto => cfg!(feature = "parallel") && rows > self.chunk_rows.get(),
        }
    }

    #[cfg(feature = "parallel")]
    fn apply_parallel(&self, plan: &TraversalPlan, working: &mut ValueBatch) {
        let chunk_rows = self.chunk_rows.get();
        let chunk_count = working.rows().div_ceil(chunk_rows);
        let mut chunks: Vec<Vec<&mut [f64]>> = (0..chunk_count)
            .map(|_| Vec::with_capacity(plan.node_count()))
            .collect();
        for column in working.columns_mut() {
            for (chunk, piece) in chunks.iter_mut().zip(column.chunks_mut(chunk_rows)) {
                chunk.push(piece);
            }
        }
        chunks
            .into_par_iter()
            .for_each(|mut chunk| plan.apply(&mut chunk));
    }

    #[cfg(not(feature = "parallel"))]
    fn apply_parallel(&self, plan: &TraversalPlan, working: &mut ValueBatch) {
        plan.apply(&mut working.columns_mut());
    }
}

fn check_columns(node_count: usize, values: &ValueBatch) -> Result<()> {
    if values.columns() == node_count {
        Ok(())
    } else {
        Err(TreeSumError::ColumnMismatch {
            columns: values.columns(),
            node_count,
        })
    }
}

/// Aggregates `values_in` over `graph` with the default [`Aggregator`].
///
/// # Errors
/// See [`Aggregator::aggregate`].
///
/// # Examples
/// ```
/// use treesum_core::{Graph, ValueBatch, aggregate};
///
/// let graph = Graph::from_edges(3, [(0, 1), (1, 2)], [0], [2])?;
/// let out = aggregate(&graph, &ValueBatch::from_rows(&[[4.0, 0.0, 0.0]])?)?;
/// assert_eq!(out.row(0), Some(vec![4.0, 4.0, 4.0]));
/// # Ok::<(), treesum_core::TreeSumError>(())
/// ```
pub fn aggregate(graph: &Graph, values_in: &ValueBatch) -> Result<ValueBatch> {
    Aggregator::default().aggregate(graph, values_in)
}
