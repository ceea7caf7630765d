//! Directed multigraph of warehouses, subscriptions, stages and stacked groups.

use crate::model::SubscriptionKind;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// Payload of a warehouse node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseNode {
    /// Warehouse name.
    pub name: String,
    /// Number of subscriptions.
    pub subscription_count: usize,
    /// Whether the warehouse reports `Ready`.
    pub healthy: bool,
    /// Whether the warehouse is reconciling.
    pub reconciling: bool,
}

/// Payload of a subscription node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionNode {
    /// Owning warehouse name.
    pub warehouse: String,
    /// Repository kind.
    pub subscription_kind: SubscriptionKind,
    /// Repository URL, if set.
    pub repo_url: Option<String>,
    /// Label for display.
    pub display_name: String,
}

/// Payload of a stage node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageNode {
    /// Stage name.
    pub name: String,
    /// Origins requested, in declaration order; one inbound handle each.
    pub origins: Vec<String>,
    /// Whether the stage has no promotion steps.
    pub control_flow: bool,
    /// Whether auto-promotion is enabled.
    pub auto_promotion: bool,
    /// Current freight name per origin.
    pub current_freight: BTreeMap<String, String>,
    /// Name of the promotion in flight, if any.
    pub promoting: Option<String>,
}

/// Payload of a synthetic node standing in for collapsed descendants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackedGroupNode {
    /// Number of collapsed nodes.
    pub count: usize,
    /// The anchor whose descendants were collapsed.
    pub parent_node_id: String,
}

/// What a graph node represents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum NodeKind {
    /// A freight source.
    Warehouse(WarehouseNode),
    /// An upstream repository of a warehouse.
    Subscription(SubscriptionNode),
    /// A promotion target.
    Stage(StageNode),
    /// Collapsed descendants of an anchor node.
    StackedGroup(StackedGroupNode),
}

impl NodeKind {
    /// Returns the short kind label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Warehouse(_) => "warehouse",
            Self::Subscription(_) => "subscription",
            Self::Stage(_) => "stage",
            Self::StackedGroup(_) => "stacked_group",
        }
    }
}

/// A node in the pipeline graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Stable, kind-prefixed id.
    pub id: String,
    /// Node kind and payload.
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl GraphNode {
    /// Creates a node.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    /// Returns the stage payload, if this is a stage node.
    #[must_use]
    pub fn as_stage(&self) -> Option<&StageNode> {
        match &self.kind {
            NodeKind::Stage(stage) => Some(stage),
            _ => None,
        }
    }

    /// Returns the resource name behind this node, if it has one.
    #[must_use]
    pub fn resource_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Warehouse(w) => Some(&w.name),
            NodeKind::Stage(s) => Some(&s.name),
            NodeKind::Subscription(_) | NodeKind::StackedGroup(_) => None,
        }
    }
}

/// The relationship an edge expresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Subscription feeds a warehouse.
    Subscription,
    /// Freight flows from a warehouse or stage into a stage.
    Freight,
    /// Anchor to its stacked group.
    Stacked,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Subscription => write!(f, "subscription"),
            Self::Freight => write!(f, "freight"),
            Self::Stacked => write!(f, "stacked"),
        }
    }
}

/// An edge in the pipeline graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    /// Unique edge id.
    pub id: String,
    /// Relationship kind.
    pub kind: EdgeKind,
    /// The warehouse the flowing freight originates from.
    pub warehouse: Option<String>,
    /// Color hint for rendering.
    pub color: Option<String>,
    /// Handle on the source node.
    pub source_handle: Option<String>,
    /// Handle on the target node.
    pub target_handle: Option<String>,
}

impl GraphEdge {
    /// Creates an untagged edge.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            warehouse: None,
            color: None,
            source_handle: None,
            target_handle: None,
        }
    }

    /// Tags the edge with its origin warehouse.
    #[must_use]
    pub fn with_warehouse(mut self, warehouse: impl Into<String>) -> Self {
        self.warehouse = Some(warehouse.into());
        self
    }

    /// Sets the color hint.
    #[must_use]
    pub fn with_color(mut self, color: Option<String>) -> Self {
        self.color = color;
        self
    }

    /// Sets the source and target handles.
    #[must_use]
    pub fn with_handles(mut self, source: Option<String>, target: Option<String>) -> Self {
        self.source_handle = source;
        self.target_handle = target;
        self
    }
}

/// A borrowed view of an edge with its endpoint ids.
#[derive(Debug, Clone, Copy)]
pub struct EdgeView<'a> {
    /// Source node id.
    pub source: &'a str,
    /// Target node id.
    pub target: &'a str,
    /// Edge data.
    pub edge: &'a GraphEdge,
}

/// A directed multigraph keyed by node id.
///
/// Iteration order is a pure function of the operations applied, so
/// everything derived from a graph is deterministic for identical inputs.
/// Without removals it is insertion order.
#[derive(Debug, Clone, Default)]
pub struct PipelineGraph {
    graph: StableDiGraph<GraphNode, GraphEdge>,
    index: HashMap<String, NodeIndex>,
    edge_ids: HashSet<String>,
}

impl PipelineGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node; an existing node with the same id is kept.
    pub fn add_node(&mut self, node: GraphNode) -> bool {
        if self.index.contains_key(&node.id) {
            return false;
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.index.insert(id, idx);
        true
    }

    /// Adds an edge between existing nodes.
    ///
    /// Returns false if either endpoint is missing or an edge with the same id
    /// already exists.
    pub fn add_edge(&mut self, source: &str, target: &str, edge: GraphEdge) -> bool {
        let (Some(&src), Some(&dst)) = (self.index.get(source), self.index.get(target)) else {
            return false;
        };
        if !self.edge_ids.insert(edge.id.clone()) {
            return false;
        }
        self.graph.add_edge(src, dst, edge);
        true
    }

    /// Removes a node and all of its edges.
    pub fn remove_node(&mut self, id: &str) -> Option<GraphNode> {
        let idx = self.index.remove(id)?;
        let incident: Vec<String> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .chain(self.graph.edges_directed(idx, Direction::Incoming))
            .map(|e| e.weight().id.clone())
            .collect();
        for edge_id in incident {
            self.edge_ids.remove(&edge_id);
        }
        self.graph.remove_node(idx)
    }

    /// Returns true if a node with this id exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Returns the node with this id.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index.get(id).and_then(|&idx| self.graph.node_weight(idx))
    }

    /// Iterates nodes in index order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_indices().filter_map(|idx| self.graph.node_weight(idx))
    }

    /// Iterates edges in index order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeView<'_>> {
        self.graph.edge_indices().filter_map(|idx| {
            let (src, dst) = self.graph.edge_endpoints(idx)?;
            Some(EdgeView {
                source: &self.graph[src].id,
                target: &self.graph[dst].id,
                edge: &self.graph[idx],
            })
        })
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns distinct successor ids in edge index order.
    #[must_use]
    pub fn successors(&self, id: &str) -> Vec<&str> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Returns distinct predecessor ids in edge index order.
    #[must_use]
    pub fn predecessors(&self, id: &str) -> Vec<&str> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Returns ids of nodes with no incoming edges, in index order.
    #[must_use]
    pub fn sources(&self) -> Vec<&str> {
        self.graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .edges_directed(idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|idx| self.graph[idx].id.as_str())
            .collect()
    }

    fn neighbors(&self, id: &str, direction: Direction) -> Vec<&str> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        // petgraph walks adjacency lists newest-first
        let mut edges: Vec<_> = self.graph.edges_directed(idx, direction).collect();
        edges.sort_by_key(|e| e.id());

        let mut seen = HashSet::new();
        edges
            .into_iter()
            .map(|e| match direction {
                Direction::Outgoing => e.target(),
                Direction::Incoming => e.source(),
            })
            .filter(|n| seen.insert(*n))
            .map(|n| self.graph[n].id.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stacked(id: &str) -> GraphNode {
        GraphNode::new(
            id,
            NodeKind::StackedGroup(StackedGroupNode {
                count: 1,
                parent_node_id: String::new(),
            }),
        )
    }

    fn chain() -> PipelineGraph {
        let mut graph = PipelineGraph::new();
        for id in ["a", "b", "c"] {
            graph.add_node(stacked(id));
        }
        graph.add_edge("a", "b", GraphEdge::new("a->b", EdgeKind::Freight));
        graph.add_edge("b", "c", GraphEdge::new("b->c", EdgeKind::Freight));
        graph
    }

    #[test]
    fn test_add_node_keeps_existing() {
        let mut graph = PipelineGraph::new();
        assert!(graph.add_node(stacked("a")));
        assert!(!graph.add_node(stacked("a")));
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_add_edge_requires_endpoints_and_unique_id() {
        let mut graph = chain();
        assert!(!graph.add_edge("a", "missing", GraphEdge::new("x", EdgeKind::Freight)));
        assert!(!graph.add_edge("a", "b", GraphEdge::new("a->b", EdgeKind::Freight)));
        assert!(graph.add_edge(
            "a",
            "b",
            GraphEdge::new("a->b#other", EdgeKind::Freight).with_warehouse("other")
        ));
        assert_eq!(graph.edge_count(), 3);
        // Parallel edges collapse to one successor
        assert_eq!(graph.successors("a"), vec!["b"]);
    }

    #[test]
    fn test_remove_node_drops_edges() {
        let mut graph = chain();
        let removed = graph.remove_node("b").unwrap();
        assert_eq!(removed.id, "b");
        assert_eq!(graph.edge_count(), 0);
        assert!(!graph.contains("b"));
        // Edge ids are free again
        graph.add_node(stacked("b"));
        assert!(graph.add_edge("a", "b", GraphEdge::new("a->b", EdgeKind::Freight)));
    }

    #[test]
    fn test_sources_and_neighbors() {
        let graph = chain();
        assert_eq!(graph.sources(), vec!["a"]);
        assert_eq!(graph.predecessors("c"), vec!["b"]);
        assert!(graph.successors("missing").is_empty());
    }

    #[test]
    fn test_edges_in_insertion_order() {
        let graph = chain();
        let ids: Vec<_> = graph.edges().map(|e| e.edge.id.as_str()).collect();
        assert_eq!(ids, vec!["a->b", "b->c"]);
    }
}
