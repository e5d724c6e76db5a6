//! Reference networks.
//!
//! Two ten-node trees used throughout the tests, benchmarks and CLI. Their
//! adjacency matrices are kept verbatim so the matrix constructor is
//! exercised end to end.

use std::{fmt, str::FromStr};

use crate::{Graph, Result};

/// Identifies one of the bundled reference networks.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ReferenceNetworkId {
    /// See [`network_one`].
    One,
    /// See [`network_two`].
    Two,
}

impl ReferenceNetworkId {
    /// Returns the network described by this identifier.
    #[must_use]
    pub fn network(self) -> ReferenceNetwork {
        match self {
            Self::One => network_one(),
            Self::Two => network_two(),
        }
    }

    /// Returns the lowercase name of the network.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::One => "one",
            Self::Two => "two",
        }
    }
}

impl fmt::Display for ReferenceNetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown network name.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("unknown reference network `{name}`; expected `one` or `two`")]
pub struct UnknownNetwork {
    /// The name that failed to parse.
    pub name: String,
}

impl FromStr for ReferenceNetworkId {
    type Err = UnknownNetwork;

    fn from_str(raw: &str) -> core::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "one" | "1" => Ok(Self::One),
            "two" | "2" => Ok(Self::Two),
            other => Err(UnknownNetwork {
                name: other.to_owned(),
            }),
        }
    }
}

/// A bundled network: adjacency rows plus its leaf and sink sets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceNetwork {
    name: &'static str,
    adjacency: Vec<Vec<u8>>,
    nodes_start: Vec<usize>,
    nodes_end: Vec<usize>,
}

impl ReferenceNetwork {
    /// Returns the network name.
    #[must_use]
    #[rustfmt::skip]
    pub fn name(&self) -> &'static str { self.name }

    /// Returns the 0/1 adjacency rows.
    #[must_use]
    #[rustfmt::skip]
    pub fn adjacency(&self) -> &[Vec<u8>] { &self.adjacency }

    /// Returns the leaf nodes.
    #[must_use]
    #[rustfmt::skip]
    pub fn nodes_start(&self) -> &[usize] { &self.nodes_start }

    /// Returns the sink nodes.
    #[must_use]
    #[rustfmt::skip]
    pub fn nodes_end(&self) -> &[usize] { &self.nodes_end }

    /// Returns the number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Builds the [`Graph`] for this network.
    ///
    /// # Errors
    /// Propagates [`Graph::from_adjacency`] errors; the bundled networks are
    /// well formed, so this only fails if they were edited incorrectly.
    pub fn graph(&self) -> Result<Graph> {
        Graph::from_adjacency(
            &self.adjacency,
            self.nodes_start.iter().copied(),
            self.nodes_end.iter().copied(),
        )
    }
}

/// Ten nodes, root 9, leaves {0, 1, 2, 3}.
///
/// ```text
///           9
///           |
///           8
///           |
///   3 - 6 - 7
///           |
///           5
///           |
///           4
///         / | \
///        0  1  2
/// ```
#[must_use]
pub fn network_one() -> ReferenceNetwork {
    ReferenceNetwork {
        name: "one",
        adjacency: vec![
            //   0  1  2  3  4  5  6  7  8  9
            vec![0, 0, 0, 0, 1, 0, 0, 0, 0, 0], // 0
            vec![0, 0, 0, 0, 1, 0, 0, 0, 0, 0], // 1
            vec![0, 0, 0, 0, 1, 0, 0, 0, 0, 0], // 2
            vec![0, 0, 0, 0, 0, 0, 1, 0, 0, 0], // 3
            vec![1, 1, 1, 0, 0, 1, 0, 0, 0, 0], // 4
            vec![0, 0, 0, 0, 1, 0, 0, 1, 0, 0], // 5
            vec![0, 0, 0, 1, 0, 0, 0, 1, 0, 0], // 6
            vec![0, 0, 0, 0, 0, 1, 1, 0, 1, 0], // 7
            vec![0, 0, 0, 0, 0, 0, 0, 1, 0, 1], // 8
            vec![0, 0, 0, 0, 0, 0, 0, 0, 1, 0], // 9
        ],
        nodes_start: vec![0, 1, 2, 3],
        nodes_end: vec![9],
    }
}

/// Ten nodes, root 4, leaves {0, 1, 6, 9}.
///
/// ```text
///           4
///           |
///           5
///           |
///       8 - 7 - 9
///       |   |
///       6   3
///           |
///           2
///         / |
///        0  1
/// ```
#[must_use]
pub fn network_two() -> ReferenceNetwork {
    ReferenceNetwork {
        name: "two",
        adjacency: vec![
            //   0  1  2  3  4  5  6  7  8  9
            vec![0, 0, 1, 0, 0, 0, 0, 0, 0, 0], // 0
            vec![0, 0, 1, 0, 0, 0, 0, 0, 0, 0], // 1
            vec![1, 1, 0, 1, 0, 0, 0, 0, 0, 0], // 2
            vec![0, 0, 1, 0, 0, 0, 0, 1, 0, 0], // 3
            vec![0, 0, 0, 0, 0, 1, 0, 0, 0, 0], // 4
            vec![0, 0, 0, 0, 1, 0, 0, 1, 0, 0], // 5
            vec![0, 0, 0, 0, 0, 0, 0, 0, 1, 0], // 6
            vec![0, 0, 0, 1, 0, 1, 0, 0, 1, 1], // 7
            vec![0, 0, 0, 0, 0, 0, 1, 1, 0, 0], // 8
            vec![0, 0, 0, 0, 0, 0, 0, 1, 0, 0], // 9
        ],
        nodes_start: vec![0, 1, 6, 9],
        nodes_end: vec![4],
    }
}
