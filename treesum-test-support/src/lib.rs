//! Shared test utilities used across treesum crates.
//!
//! Nothing here depends on `treesum-core`, so the core crate's own unit tests
//! can use these helpers without pulling in a second copy of its types.

pub mod profile;
pub mod tracing;
pub mod trees;
