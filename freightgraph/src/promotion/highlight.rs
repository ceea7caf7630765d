//! Node and edge emphasis derived from the current selection.

use super::action::Selection;
use super::eligibility::{is_eligible, ActionKind};
use crate::graph::{EdgeKind, NodeKind, PipelineGraph, Relations};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// How a node is drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeMode {
    /// No emphasis.
    #[default]
    Default,
    /// The stage the action is about.
    Selected,
    /// A stage or warehouse taking part in the action.
    Highlighted,
    /// A stage the action cannot involve.
    Disabled,
}

/// How an edge is drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeMode {
    /// No emphasis.
    #[default]
    Default,
    /// Freight would flow along this edge.
    Animated,
    /// Not part of the action.
    Dimmed,
}

/// Per-node and per-edge modes for one selection.
///
/// Nodes and edges without an entry are drawn in default mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphHighlight {
    /// Node id to mode.
    pub nodes: BTreeMap<String, NodeMode>,
    /// Edge id to mode.
    pub edges: BTreeMap<String, EdgeMode>,
}

impl GraphHighlight {
    /// Derives modes for `selection` over `graph`.
    ///
    /// Reads stages, freight and subscribers from `relations`; the graph is
    /// not modified.
    #[must_use]
    pub fn derive(selection: &Selection, graph: &PipelineGraph, relations: &Relations<'_>) -> Self {
        let stage_ids: HashMap<&str, &str> = graph
            .nodes()
            .filter_map(|n| n.as_stage().map(|s| (s.name.as_str(), n.id.as_str())))
            .collect();

        match selection {
            Selection::Idle => Self::default(),
            Selection::Promoting { stage } => Self::promoting(graph, &stage_ids, stage, None),
            Selection::PromotingDownstream { stage } => {
                Self::downstream(graph, relations, &stage_ids, stage)
            }
            Selection::ManuallyApproving { freight } => {
                Self::approving(graph, relations, &stage_ids, freight)
            }
            Selection::Confirming { stage, freight, action } => match action {
                ActionKind::Promote => {
                    Self::promoting(graph, &stage_ids, stage, Some((relations, freight.as_str())))
                }
                ActionKind::PromoteDownstream => {
                    Self::downstream(graph, relations, &stage_ids, stage)
                }
                ActionKind::ManualApprove => {
                    let mut highlight = Self::dim_stages(graph, &stage_ids, &HashSet::new());
                    if let Some(&id) = stage_ids.get(stage.as_str()) {
                        highlight.nodes.insert(id.to_string(), NodeMode::Selected);
                    }
                    highlight
                }
            },
        }
    }

    /// Returns the mode of a node.
    #[must_use]
    pub fn node_mode(&self, id: &str) -> NodeMode {
        self.nodes.get(id).copied().unwrap_or_default()
    }

    /// Returns the mode of an edge.
    #[must_use]
    pub fn edge_mode(&self, id: &str) -> EdgeMode {
        self.edges.get(id).copied().unwrap_or_default()
    }

    /// Target selected, its sources highlighted, inbound freight edges
    /// animated. While confirming, only sources holding eligible freight stay
    /// highlighted.
    fn promoting(
        graph: &PipelineGraph,
        stage_ids: &HashMap<&str, &str>,
        target: &str,
        confirming: Option<(&Relations<'_>, &str)>,
    ) -> Self {
        let Some(&target_id) = stage_ids.get(target) else {
            return Self::default();
        };
        let sources: HashSet<&str> = graph.predecessors(target_id).into_iter().collect();
        let mut highlight = Self::dim_stages(graph, stage_ids, &sources);
        highlight.nodes.insert(target_id.to_string(), NodeMode::Selected);

        for source in &sources {
            let keep = match (confirming, graph.node(source).map(|n| &n.kind)) {
                (Some((relations, freight)), Some(NodeKind::Stage(stage))) => relations
                    .freight_by_name
                    .get(freight)
                    .is_some_and(|f| f.is_verified_in(&stage.name)),
                _ => true,
            };
            if keep {
                highlight.nodes.insert((*source).to_string(), NodeMode::Highlighted);
            }
        }
        highlight.animate_edges(graph, |source, target| {
            target == target_id && sources.contains(source)
        });
        highlight
    }

    /// Initiating stage selected, its subscribers highlighted.
    fn downstream(
        graph: &PipelineGraph,
        relations: &Relations<'_>,
        stage_ids: &HashMap<&str, &str>,
        stage: &str,
    ) -> Self {
        let Some(&source_id) = stage_ids.get(stage) else {
            return Self::default();
        };
        let subscribers: HashSet<&str> = relations
            .subscribers_of(stage)
            .filter_map(|name| stage_ids.get(name).copied())
            .collect();
        let mut highlight = Self::dim_stages(graph, stage_ids, &subscribers);
        highlight.nodes.insert(source_id.to_string(), NodeMode::Selected);
        for id in &subscribers {
            highlight.nodes.insert((*id).to_string(), NodeMode::Highlighted);
        }
        highlight.animate_edges(graph, |source, target| {
            source == source_id && subscribers.contains(target)
        });
        highlight
    }

    /// Stages the freight could be approved for highlighted, stages it is
    /// already approved for disabled.
    fn approving(
        graph: &PipelineGraph,
        relations: &Relations<'_>,
        stage_ids: &HashMap<&str, &str>,
        freight: &str,
    ) -> Self {
        let mut highlight = Self::default();
        let Some(freight) = relations.freight_by_name.get(freight) else {
            return highlight;
        };
        for (name, id) in stage_ids {
            let Some(stage) = relations.stage_by_name.get(name) else {
                continue;
            };
            let mode = if freight.is_approved_for(name) {
                NodeMode::Disabled
            } else if is_eligible(freight, stage, ActionKind::Promote) {
                NodeMode::Default
            } else {
                NodeMode::Highlighted
            };
            if mode != NodeMode::Default {
                highlight.nodes.insert((*id).to_string(), mode);
            }
        }
        for edge in graph.edges() {
            highlight.edges.insert(edge.edge.id.clone(), EdgeMode::Dimmed);
        }
        highlight
    }

    /// Disables every stage not in `keep`.
    fn dim_stages(
        graph: &PipelineGraph,
        stage_ids: &HashMap<&str, &str>,
        keep: &HashSet<&str>,
    ) -> Self {
        let mut highlight = Self::default();
        for id in stage_ids.values() {
            if !keep.contains(id) {
                highlight.nodes.insert((*id).to_string(), NodeMode::Disabled);
            }
        }
        for edge in graph.edges() {
            highlight.edges.insert(edge.edge.id.clone(), EdgeMode::Dimmed);
        }
        highlight
    }

    fn animate_edges(&mut self, graph: &PipelineGraph, selected: impl Fn(&str, &str) -> bool) {
        for edge in graph.edges() {
            if edge.edge.kind == EdgeKind::Freight && selected(edge.source, edge.target) {
                self.edges.insert(edge.edge.id.clone(), EdgeMode::Animated);
            }
        }
    }
}
