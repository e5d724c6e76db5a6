//! Treesum core library.
//!
//! Propagates values injected at the leaves of a rooted tree up to every
//! ancestor, for a whole batch of independent scenarios at once. Build a
//! [`Graph`] once, then call [`aggregate`] (or a configured [`Aggregator`])
//! per [`ValueBatch`].
#![cfg_attr(docsrs, feature(doc_cfg))]

mod aggregator;
mod batch;
mod error;
mod graph;
pub mod networks;
mod plan;
#[cfg(feature = "synthetic")]
mod synthetic;

pub use crate::{
    aggregator::{
        Aggregator, AggregatorBuilder, ExecutionStrategy, TraversalStrategy, aggregate,
    },
    batch::ValueBatch,
    error::{ErrorClass, Result, TreeSumError, TreeSumErrorCode},
    graph::Graph,
    plan::{PlanStep, TraversalPlan},
};

#[cfg(feature = "synthetic")]
#[cfg_attr(docsrs, doc(cfg(feature = "synthetic")))]
pub use crate::synthetic::random_leaf_values;
