//! Builds the pipeline graph from stages and warehouses.

use super::colors::WarehouseColors;
use super::filter::GraphFilter;
use super::index::{subscription_ids, Indexed};
use super::types::{
    EdgeKind, GraphEdge, GraphNode, NodeKind, PipelineGraph, StageNode, SubscriptionNode,
    WarehouseNode,
};
use crate::model::{FreightOriginKind, Stage, Warehouse};
use std::collections::HashMap;
use tracing::debug;

type StagePredicate<'a> = Box<dyn Fn(&Stage) -> bool + 'a>;
type WarehousePredicate<'a> = Box<dyn Fn(&Warehouse) -> bool + 'a>;

/// Builder for a [`PipelineGraph`].
///
/// Excluded stages and warehouses are never created, so no edge can point at
/// them.
///
/// # Example
///
/// ```
/// use freightgraph::graph::GraphBuilder;
/// use freightgraph::model::{FreightRequest, Stage, Warehouse};
///
/// let mut test = Stage::new("test");
/// test.spec.requested_freight = vec![FreightRequest::from_warehouse("main").direct()];
/// let warehouses = vec![Warehouse::new("main")];
///
/// let graph = GraphBuilder::new(&[test], &warehouses).build();
/// assert_eq!(graph.node_count(), 2);
/// assert_eq!(graph.edge_count(), 1);
/// ```
pub struct GraphBuilder<'a> {
    stages: &'a [Stage],
    warehouses: &'a [Warehouse],
    ignore_stage: Option<StagePredicate<'a>>,
    ignore_warehouse: Option<WarehousePredicate<'a>>,
    colors: Option<&'a WarehouseColors>,
}

impl<'a> GraphBuilder<'a> {
    /// Creates a builder over the given resources.
    #[must_use]
    pub fn new(stages: &'a [Stage], warehouses: &'a [Warehouse]) -> Self {
        Self {
            stages,
            warehouses,
            ignore_stage: None,
            ignore_warehouse: None,
            colors: None,
        }
    }

    /// Excludes every stage and warehouse the filter names.
    #[must_use]
    pub fn with_filter(self, filter: &'a GraphFilter) -> Self {
        self.with_stage_ignore(|s| filter.is_stage_ignored(s))
            .with_warehouse_ignore(|w| filter.is_warehouse_ignored(w))
    }

    /// Sets the stage exclusion predicate.
    #[must_use]
    pub fn with_stage_ignore(mut self, predicate: impl Fn(&Stage) -> bool + 'a) -> Self {
        self.ignore_stage = Some(Box::new(predicate));
        self
    }

    /// Sets the warehouse exclusion predicate.
    #[must_use]
    pub fn with_warehouse_ignore(mut self, predicate: impl Fn(&Warehouse) -> bool + 'a) -> Self {
        self.ignore_warehouse = Some(Box::new(predicate));
        self
    }

    /// Colors warehouse-tagged edges.
    #[must_use]
    pub fn with_colors(mut self, colors: &'a WarehouseColors) -> Self {
        self.colors = Some(colors);
        self
    }

    /// Builds the graph.
    ///
    /// Dangling references (unknown or excluded origins and upstream stages)
    /// are skipped.
    #[must_use]
    pub fn build(self) -> PipelineGraph {
        let mut graph = PipelineGraph::new();

        let warehouses: HashMap<&str, &Warehouse> = self
            .warehouses
            .iter()
            .filter(|w| !self.is_warehouse_ignored(w))
            .map(|w| (w.name.as_str(), w))
            .collect();
        let stages: HashMap<&str, &Stage> = self
            .stages
            .iter()
            .filter(|s| !self.is_stage_ignored(s))
            .map(|s| (s.name.as_str(), s))
            .collect();

        for warehouse in self.warehouses.iter().filter(|w| !self.is_warehouse_ignored(w)) {
            self.add_warehouse(&mut graph, warehouse);
        }
        for stage in self.stages.iter().filter(|s| !self.is_stage_ignored(s)) {
            graph.add_node(stage_node(stage));
        }
        for stage in self.stages.iter().filter(|s| !self.is_stage_ignored(s)) {
            self.add_stage_edges(&mut graph, stage, &warehouses, &stages);
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Built pipeline graph"
        );
        graph
    }

    fn is_stage_ignored(&self, stage: &Stage) -> bool {
        self.ignore_stage.as_ref().is_some_and(|f| f(stage))
    }

    fn is_warehouse_ignored(&self, warehouse: &Warehouse) -> bool {
        self.ignore_warehouse.as_ref().is_some_and(|f| f(warehouse))
    }

    fn color(&self, warehouse: &str) -> Option<String> {
        self.colors.and_then(|c| c.get(warehouse)).map(str::to_string)
    }

    fn add_warehouse(&self, graph: &mut PipelineGraph, warehouse: &Warehouse) {
        let warehouse_id = warehouse.node_id();
        graph.add_node(GraphNode::new(
            warehouse_id.clone(),
            NodeKind::Warehouse(WarehouseNode {
                name: warehouse.name.clone(),
                subscription_count: warehouse.spec.subscriptions.len(),
                healthy: warehouse.is_healthy(),
                reconciling: warehouse.is_reconciling(),
            }),
        ));

        let ids = subscription_ids(warehouse);
        for (subscription, id) in warehouse.spec.subscriptions.iter().zip(ids) {
            graph.add_node(GraphNode::new(
                id.clone(),
                NodeKind::Subscription(SubscriptionNode {
                    warehouse: warehouse.name.clone(),
                    subscription_kind: subscription.kind(),
                    repo_url: subscription.repo_url().map(str::to_string),
                    display_name: subscription.display_name(),
                }),
            ));
            let edge = GraphEdge::new(format!("{id}->{warehouse_id}"), EdgeKind::Subscription)
                .with_warehouse(warehouse.name.clone())
                .with_color(self.color(&warehouse.name));
            graph.add_edge(&id, &warehouse_id, edge);
        }
    }

    fn add_stage_edges(
        &self,
        graph: &mut PipelineGraph,
        stage: &Stage,
        warehouses: &HashMap<&str, &Warehouse>,
        stages: &HashMap<&str, &Stage>,
    ) {
        let stage_id = stage.node_id();
        for request in &stage.spec.requested_freight {
            let origin = request.origin.name.as_str();
            if request.origin.kind != FreightOriginKind::Warehouse {
                debug!(stage = %stage.name, origin, "Skipping request with unsupported origin kind");
                continue;
            }
            let Some(warehouse) = warehouses.get(origin) else {
                debug!(stage = %stage.name, origin, "Skipping request for unknown or excluded warehouse");
                continue;
            };

            if request.sources.direct {
                let source_id = warehouse.node_id();
                let edge = self
                    .freight_edge(&source_id, &stage_id, origin)
                    .with_handles(None, Some(origin.to_string()));
                graph.add_edge(&source_id, &stage_id, edge);
            }

            for upstream in &request.sources.stages {
                if upstream == &stage.name {
                    debug!(stage = %stage.name, "Skipping self-referencing upstream stage");
                    continue;
                }
                let Some(upstream_stage) = stages.get(upstream.as_str()) else {
                    debug!(stage = %stage.name, upstream = %upstream, "Skipping unknown or excluded upstream stage");
                    continue;
                };
                let source_id = upstream_stage.node_id();
                let edge = self
                    .freight_edge(&source_id, &stage_id, origin)
                    .with_handles(Some(origin.to_string()), Some(origin.to_string()));
                graph.add_edge(&source_id, &stage_id, edge);
            }
        }
    }

    fn freight_edge(&self, source_id: &str, target_id: &str, origin: &str) -> GraphEdge {
        GraphEdge::new(freight_edge_id(source_id, target_id, origin), EdgeKind::Freight)
            .with_warehouse(origin)
            .with_color(self.color(origin))
    }
}

/// Returns the id of the freight edge carrying `origin` from source to target.
#[must_use]
pub fn freight_edge_id(source_id: &str, target_id: &str, origin: &str) -> String {
    format!("{source_id}->{target_id}#{origin}")
}

fn stage_node(stage: &Stage) -> GraphNode {
    let mut origins: Vec<String> = Vec::new();
    for request in &stage.spec.requested_freight {
        if !origins.contains(&request.origin.name) {
            origins.push(request.origin.name.clone());
        }
    }
    let current_freight = stage
        .current_freight()
        .into_iter()
        .flat_map(|c| c.items.values())
        .map(|r| (r.origin.name.clone(), r.name.clone()))
        .collect();

    GraphNode::new(
        stage.node_id(),
        NodeKind::Stage(StageNode {
            name: stage.name.clone(),
            origins,
            control_flow: stage.is_control_flow(),
            auto_promotion: stage.status.auto_promotion_enabled,
            current_freight,
            promoting: stage
                .status
                .current_promotion
                .as_ref()
                .map(|p| p.name.clone()),
        }),
    )
}
