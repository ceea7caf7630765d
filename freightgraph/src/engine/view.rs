//! Presentation output of one rebuild.

use crate::graph::{EdgeKind, NodeKind, RelationsView};
use crate::layout::{NodeHandles, Point, PositionedGraph, RankDir, Size};
use crate::stacking::StackedNode;
use serde::Serialize;
use uuid::Uuid;

/// A laid-out node ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewNode {
    /// Node id.
    pub id: String,
    /// Kind label and payload.
    #[serde(flatten)]
    pub kind: NodeKind,
    /// Top-left corner.
    pub position: Point,
    /// Box size.
    pub size: Size,
    /// Edge attachment points.
    pub handles: NodeHandles,
}

/// A laid-out edge ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewEdge {
    /// Edge id.
    pub id: String,
    /// Source node id.
    pub source: String,
    /// Target node id.
    pub target: String,
    /// Relationship the edge expresses.
    pub kind: EdgeKind,
    /// Outbound handle on the source node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    /// Inbound handle on the target node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
    /// Color of the origin warehouse.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Where the edge leaves the source.
    pub source_anchor: Point,
    /// Where the edge enters the target.
    pub target_anchor: Point,
}

/// Everything the presentation layer needs for one snapshot.
///
/// Views are immutable once built and shared behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineView {
    /// Unique per rebuild; a memoized view keeps the revision it was built with.
    pub revision: Uuid,
    /// Content hash of the inputs.
    pub input_hash: String,
    /// Flow direction.
    pub direction: RankDir,
    /// Width of the bounding box.
    pub width: f64,
    /// Height of the bounding box.
    pub height: f64,
    /// Nodes in graph order.
    pub nodes: Vec<ViewNode>,
    /// Edges in graph order.
    pub edges: Vec<ViewEdge>,
    /// Stacked groups present in the view.
    pub stacked: Vec<StackedNode>,
    /// Derived relations.
    pub relations: RelationsView,
}

impl PipelineView {
    pub(crate) fn assemble(
        input_hash: String,
        positioned: PositionedGraph,
        stacked: Vec<StackedNode>,
        relations: RelationsView,
    ) -> Self {
        let nodes = positioned
            .nodes
            .into_iter()
            .map(|n| ViewNode {
                id: n.node.id,
                kind: n.node.kind,
                position: n.position,
                size: n.size,
                handles: n.handles,
            })
            .collect();
        let edges = positioned
            .edges
            .into_iter()
            .map(|e| ViewEdge {
                id: e.edge.id,
                source: e.source,
                target: e.target,
                kind: e.edge.kind,
                source_handle: e.edge.source_handle,
                target_handle: e.edge.target_handle,
                color: e.edge.color,
                source_anchor: e.source_anchor,
                target_anchor: e.target_anchor,
            })
            .collect();

        Self {
            revision: Uuid::now_v7(),
            input_hash,
            direction: positioned.direction,
            width: positioned.width,
            height: positioned.height,
            nodes,
            edges,
            stacked,
            relations,
        }
    }

    /// Finds a node by id.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&ViewNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Finds an edge by id.
    #[must_use]
    pub fn edge(&self, id: &str) -> Option<&ViewEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// Returns the ids of all nodes of one kind label.
    pub fn node_ids_of<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.nodes
            .iter()
            .filter(move |n| n.kind.label() == label)
            .map(|n| n.id.as_str())
    }

    /// Serializes the view as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
