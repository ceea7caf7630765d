//! Testing utilities for pipeline graphs.
//!
//! This module provides:
//! - Builders for stages, freight and whole snapshots
//! - Assertions over graphs and laid-out views

mod assertions;
mod fixtures;

pub use assertions::{
    assert_graph_edge, assert_no_graph_edge, assert_no_overlap, assert_no_view_node,
    assert_view_edge_count, assert_view_node,
};
pub use fixtures::{FreightFixture, SnapshotFixture, StageFixture};
