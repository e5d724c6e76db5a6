//! Benchmark parameter types.
//!
//! Each struct renders compactly via `Display` so it can serve as a
//! Criterion `BenchmarkId` parameter.

use std::fmt;

/// Parameters for a batched aggregation run.
#[derive(Clone, Debug)]
pub struct AggregateBenchParams {
    /// Short label of the tree family.
    pub tree: &'static str,
    /// Number of nodes in the tree.
    pub node_count: usize,
    /// Number of scenario rows per batch.
    pub scenarios: usize,
}

impl fmt::Display for AggregateBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},n={},m={}", self.tree, self.node_count, self.scenarios)
    }
}

/// Parameters for a planning run.
#[derive(Clone, Debug)]
pub struct PlanBenchParams {
    /// Short label of the tree family.
    pub tree: &'static str,
    /// Number of nodes in the tree.
    pub node_count: usize,
}

impl fmt::Display for PlanBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},n={}", self.tree, self.node_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_render_compact_ids() {
        let aggregate = AggregateBenchParams {
            tree: "random",
            node_count: 100,
            scenarios: 1000,
        };
        assert_eq!(aggregate.to_string(), "random,n=100,m=1000");
        let plan = PlanBenchParams {
            tree: "chain",
            node_count: 8,
        };
        assert_eq!(plan.to_string(), "chain,n=8");
    }
}
