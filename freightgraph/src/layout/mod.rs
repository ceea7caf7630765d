//! Graph layout.
//!
//! [`layout_graph`] resolves node sizes, hands the topology to a
//! [`LayoutProvider`] and attaches handle anchors to the result.
//! [`LayeredLayout`] is the default provider.

mod geometry;
mod layered;
mod positioned;
mod provider;

pub use geometry::{KindSizes, NodeSizes, Point, Size};
pub use layered::{LayeredLayout, DEFAULT_NODE_SEP, DEFAULT_RANK_SEP, DEFAULT_SWEEPS};
pub use positioned::{
    layout_graph, Handle, NodeHandles, PositionedEdge, PositionedGraph, PositionedNode,
};
pub use provider::{LayoutInput, LayoutPositions, LayoutProvider, RankDir};
