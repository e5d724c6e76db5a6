//! Error types for the treesum core library.
//!
//! Defines the error enum exposed by the public API, its stable error codes,
//! the coarse classification used by callers to tell input mistakes from
//! topology problems, and a convenient result alias.

use std::fmt;

use thiserror::Error;

use crate::aggregator::ExecutionStrategy;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => ($code:expr, $class:ident)
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }

            /// Return the [`ErrorClass`] this code belongs to.
            #[must_use]
            pub const fn class(self) -> ErrorClass {
                match self {
                    $(Self::$CodeVariant => ErrorClass::$class,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// Coarse grouping of [`TreeSumError`] variants.
///
/// `Configuration` and `Shape` errors are the caller's inputs being wrong;
/// `Structural` errors mean the adjacency relation is not a tree rooted at
/// the configured sink.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorClass {
    /// Sink selection or aggregator settings are invalid.
    Configuration,
    /// Dimensions or node indices do not line up.
    Shape,
    /// The graph is not a tree reachable from the root.
    Structural,
}

impl ErrorClass {
    /// Returns a lowercase label suitable for log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Shape => "shape",
            Self::Structural => "structural",
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type produced when building graphs and batches or aggregating them.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum TreeSumError {
    /// The sink set must contain exactly one node.
    #[error("expected exactly one sink node, found {found}")]
    RootCount {
        /// Number of sink nodes configured on the graph.
        found: usize,
    },
    /// The sink node is also registered as a leaf.
    #[error("root node {node} is also a leaf")]
    RootIsLeaf {
        /// The offending node.
        node: usize,
    },
    /// The requested execution strategy is unavailable in the current build.
    #[error("the requested execution strategy {requested:?} is not available in this build")]
    BackendUnavailable {
        /// Strategy that could not be satisfied by the current build.
        requested: ExecutionStrategy,
    },
    /// Parallel chunks must hold at least one row.
    #[error("chunk_rows must be at least 1 (got {got})")]
    InvalidChunkRows {
        /// The invalid chunk size supplied by the caller.
        got: usize,
    },
    /// The recursion bound must allow at least the root.
    #[error("max_depth must be at least 1 (got {got})")]
    InvalidMaxDepth {
        /// The invalid depth bound supplied by the caller.
        got: usize,
    },
    /// An adjacency row has a different length than the number of rows.
    #[error("adjacency row {row} has length {len} but the matrix has {expected} rows")]
    NonSquareAdjacency {
        /// Index of the offending row.
        row: usize,
        /// Length of the offending row.
        len: usize,
        /// Number of rows, which every row length must match.
        expected: usize,
    },
    /// A node index lies outside `[0, node_count)`.
    #[error("node {node} is out of range for a graph with {node_count} nodes")]
    NodeOutOfRange {
        /// The out-of-range node index.
        node: usize,
        /// Number of nodes in the graph.
        node_count: usize,
    },
    /// The value batch does not have one column per graph node.
    #[error("value batch has {columns} columns but the graph has {node_count} nodes")]
    ColumnMismatch {
        /// Column count of the batch.
        columns: usize,
        /// Node count of the graph.
        node_count: usize,
    },
    /// A scenario row has a different length than the first row.
    #[error("scenario row {row} has length {len}, expected {expected}")]
    RaggedRows {
        /// Index of the offending row.
        row: usize,
        /// Length of the offending row.
        len: usize,
        /// Length of the first row.
        expected: usize,
    },
    /// A flat buffer does not match the requested batch shape.
    #[error("buffer has length {len} but the requested shape needs {expected} values")]
    BufferLength {
        /// Length of the supplied buffer.
        len: usize,
        /// `rows * columns` for the requested shape.
        expected: usize,
    },
    /// The walk reached a node twice, so the adjacency relation has a cycle.
    #[error("cycle detected: node {node} was reached twice")]
    CycleDetected {
        /// The node reached a second time.
        node: usize,
    },
    /// A node was never reached from the root.
    #[error("node {node} is not reachable from the root")]
    UnreachableNode {
        /// The lowest-indexed node left unvisited.
        node: usize,
    },
    /// The recursive walk went deeper than the configured bound.
    #[error("traversal exceeded the maximum depth of {limit}")]
    DepthLimitExceeded {
        /// The configured depth bound.
        limit: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`TreeSumError`] variants.
    enum TreeSumErrorCode for TreeSumError {
        /// The sink set must contain exactly one node.
        RootCount => RootCount { .. } => ("TREESUM_ROOT_COUNT", Configuration),
        /// The sink node is also registered as a leaf.
        RootIsLeaf => RootIsLeaf { .. } => ("TREESUM_ROOT_IS_LEAF", Configuration),
        /// The requested execution strategy is unavailable in the current build.
        BackendUnavailable => BackendUnavailable { .. } => ("TREESUM_BACKEND_UNAVAILABLE", Configuration),
        /// Parallel chunks must hold at least one row.
        InvalidChunkRows => InvalidChunkRows { .. } => ("TREESUM_INVALID_CHUNK_ROWS", Configuration),
        /// The recursion bound must allow at least the root.
        InvalidMaxDepth => InvalidMaxDepth { .. } => ("TREESUM_INVALID_MAX_DEPTH", Configuration),
        /// An adjacency row has a different length than the number of rows.
        NonSquareAdjacency => NonSquareAdjacency { .. } => ("TREESUM_NON_SQUARE_ADJACENCY", Shape),
        /// A node index lies outside the graph.
        NodeOutOfRange => NodeOutOfRange { .. } => ("TREESUM_NODE_OUT_OF_RANGE", Shape),
        /// The value batch does not have one column per graph node.
        ColumnMismatch => ColumnMismatch { .. } => ("TREESUM_COLUMN_MISMATCH", Shape),
        /// A scenario row has a different length than the first row.
        RaggedRows => RaggedRows { .. } => ("TREESUM_RAGGED_ROWS", Shape),
        /// A flat buffer does not match the requested batch shape.
        BufferLength => BufferLength { .. } => ("TREESUM_BUFFER_LENGTH", Shape),
        /// The adjacency relation has a cycle.
        CycleDetected => CycleDetected { .. } => ("TREESUM_CYCLE_DETECTED", Structural),
        /// A node was never reached from the root.
        UnreachableNode => UnreachableNode { .. } => ("TREESUM_UNREACHABLE_NODE", Structural),
        /// The recursive walk went deeper than the configured bound.
        DepthLimitExceeded => DepthLimitExceeded { .. } => ("TREESUM_DEPTH_LIMIT_EXCEEDED", Structural),
    }
}

impl TreeSumError {
    /// Returns the [`ErrorClass`] of this error.
    ///
    /// # Examples
    /// ```
    /// use treesum_core::{ErrorClass, TreeSumError};
    ///
    /// let err = TreeSumError::CycleDetected { node: 3 };
    /// assert_eq!(err.class(), ErrorClass::Structural);
    /// ```
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        self.code().class()
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, TreeSumError>;
