use treesum_core::Graph;
use treesum_test_support::trees::TreeFixture;

/// Converts a plain-data fixture into a core graph via its adjacency matrix.
#[must_use]
pub fn fixture_graph(fixture: &TreeFixture) -> Graph {
    Graph::from_adjacency(
        &fixture.adjacency(),
        fixture.leaves.iter().copied(),
        [fixture.root],
    )
    .expect("fixture indices are in range")
}
