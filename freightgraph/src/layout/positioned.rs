//! Laid-out graph with handle anchors.

use super::geometry::{NodeSizes, Point, Size};
use super::provider::{LayoutInput, LayoutProvider, RankDir};
use crate::config::LayoutConfig;
use crate::graph::{GraphEdge, GraphNode, NodeKind, PipelineGraph};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A connection point on a node's border.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Handle {
    /// Handle id; the origin warehouse name for stage handles.
    pub id: String,
    /// Absolute position.
    pub position: Point,
}

/// Inbound and outbound handles of one node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeHandles {
    /// Inbound handles, one per requested origin.
    pub targets: Vec<Handle>,
    /// Outbound handles, one per origin passed on.
    pub sources: Vec<Handle>,
}

impl NodeHandles {
    fn target(&self, id: &str) -> Option<Point> {
        self.targets.iter().find(|h| h.id == id).map(|h| h.position)
    }

    fn source(&self, id: &str) -> Option<Point> {
        self.sources.iter().find(|h| h.id == id).map(|h| h.position)
    }
}

/// A node with its position and size.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedNode {
    /// The graph node.
    pub node: GraphNode,
    /// Top-left corner.
    pub position: Point,
    /// Box size.
    pub size: Size,
    /// Handles; empty for nodes without per-origin handles.
    pub handles: NodeHandles,
}

/// An edge with absolute anchor points.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedEdge {
    /// Source node id.
    pub source: String,
    /// Target node id.
    pub target: String,
    /// The graph edge.
    pub edge: GraphEdge,
    /// Where the edge leaves the source.
    pub source_anchor: Point,
    /// Where the edge enters the target.
    pub target_anchor: Point,
}

/// The output of a layout pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionedGraph {
    /// Nodes in graph order.
    pub nodes: Vec<PositionedNode>,
    /// Edges in graph order.
    pub edges: Vec<PositionedEdge>,
    /// Rank direction used.
    pub direction: RankDir,
    /// Overall width.
    pub width: f64,
    /// Overall height.
    pub height: f64,
}

impl PositionedGraph {
    /// Finds a node by id.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&PositionedNode> {
        self.nodes.iter().find(|n| n.node.id == id)
    }
}

/// Lays out `graph` with `provider`.
#[must_use]
pub fn layout_graph(
    graph: &PipelineGraph,
    provider: &dyn LayoutProvider,
    config: &LayoutConfig,
    sizes: &NodeSizes,
) -> PositionedGraph {
    let nodes: Vec<&GraphNode> = graph.nodes().collect();
    let position_of: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();

    let input = LayoutInput {
        sizes: nodes.iter().map(|n| sizes.resolve(n, &config.sizes)).collect(),
        edges: graph
            .edges()
            .filter_map(|e| Some((*position_of.get(e.source)?, *position_of.get(e.target)?)))
            .collect(),
    };
    let direction = config.rank_dir;
    let positions = provider.layout(&input, direction);

    let placed: Vec<PositionedNode> = nodes
        .iter()
        .zip(&input.sizes)
        .enumerate()
        .map(|(i, (node, &size))| {
            let position = positions.points.get(i).copied().unwrap_or_default();
            PositionedNode {
                node: (*node).clone(),
                position,
                size,
                handles: handles_for(node, position, size, direction),
            }
        })
        .collect();

    let edges = graph
        .edges()
        .filter_map(|e| {
            let source = &placed[*position_of.get(e.source)?];
            let target = &placed[*position_of.get(e.target)?];
            let source_anchor = e
                .edge
                .source_handle
                .as_deref()
                .and_then(|h| source.handles.source(h))
                .unwrap_or_else(|| outbound_anchor(source, direction));
            let target_anchor = e
                .edge
                .target_handle
                .as_deref()
                .and_then(|h| target.handles.target(h))
                .unwrap_or_else(|| inbound_anchor(target, direction));
            Some(PositionedEdge {
                source: e.source.to_string(),
                target: e.target.to_string(),
                edge: e.edge.clone(),
                source_anchor,
                target_anchor,
            })
        })
        .collect();

    let width = placed
        .iter()
        .map(|n| n.position.x + n.size.width)
        .fold(0.0, f64::max);
    let height = placed
        .iter()
        .map(|n| n.position.y + n.size.height)
        .fold(0.0, f64::max);

    PositionedGraph {
        nodes: placed,
        edges,
        direction,
        width,
        height,
    }
}

fn handles_for(node: &GraphNode, position: Point, size: Size, direction: RankDir) -> NodeHandles {
    let NodeKind::Stage(stage) = &node.kind else {
        return NodeHandles::default();
    };
    let spread = |inbound: bool| -> Vec<Handle> {
        let slots = stage.origins.len() + 1;
        stage
            .origins
            .iter()
            .enumerate()
            .map(|(i, origin)| {
                #[allow(clippy::cast_precision_loss)]
                let fraction = (i + 1) as f64 / slots as f64;
                let at = match (direction, inbound) {
                    (RankDir::LeftRight, true) => {
                        Point::new(position.x, position.y + size.height * fraction)
                    }
                    (RankDir::LeftRight, false) => {
                        Point::new(position.x + size.width, position.y + size.height * fraction)
                    }
                    (RankDir::TopBottom, true) => {
                        Point::new(position.x + size.width * fraction, position.y)
                    }
                    (RankDir::TopBottom, false) => {
                        Point::new(position.x + size.width * fraction, position.y + size.height)
                    }
                };
                Handle {
                    id: origin.clone(),
                    position: at,
                }
            })
            .collect()
    };
    NodeHandles {
        targets: spread(true),
        sources: spread(false),
    }
}

fn inbound_anchor(node: &PositionedNode, direction: RankDir) -> Point {
    let Point { x, y } = node.position;
    match direction {
        RankDir::LeftRight => Point::new(x, y + node.size.height / 2.0),
        RankDir::TopBottom => Point::new(x + node.size.width / 2.0, y),
    }
}

fn outbound_anchor(node: &PositionedNode, direction: RankDir) -> Point {
    let Point { x, y } = node.position;
    match direction {
        RankDir::LeftRight => Point::new(x + node.size.width, y + node.size.height / 2.0),
        RankDir::TopBottom => Point::new(x + node.size.width / 2.0, y + node.size.height),
    }
}
