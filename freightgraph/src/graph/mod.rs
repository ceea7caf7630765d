//! Pipeline graph construction.
//!
//! This module provides:
//! - Stable, kind-prefixed node ids
//! - Relations derived from stages (subscribers, freight occupancy, lookups)
//! - The graph builder with exclusion filters and edge color hints

mod builder;
mod colors;
mod filter;
mod index;
mod relations;
mod types;

pub use builder::{freight_edge_id, GraphBuilder};
pub use colors::{WarehouseColors, DEFAULT_PALETTE};
pub use filter::GraphFilter;
pub use index::{
    is_stacked_id, is_stage_id, is_subscription_id, is_warehouse_id, stacked_id, subscription_id,
    subscription_ids, Indexed, NodeIdKind, STACKED_PREFIX, STAGE_PREFIX, SUBSCRIPTION_PREFIX,
    WAREHOUSE_PREFIX,
};
pub use relations::{
    build_freight_by_name, build_freight_occupancy, build_stage_auto_promotion_map,
    build_stage_by_name, build_subscriber_map, build_warehouse_by_name, is_freight_in_use,
    FreightOccupancy, Relations, RelationsView, SubscriberMap,
};
pub use types::{
    EdgeKind, EdgeView, GraphEdge, GraphNode, NodeKind, PipelineGraph, StackedGroupNode, StageNode,
    SubscriptionNode, WarehouseNode,
};
