//! Collapsing long chains into counter nodes.
//!
//! Stacking after an anchor removes everything downstream of it and puts a
//! single `stacked/<anchor>` node in its place. The canonical resources are
//! never touched: expanding a group means dropping its anchor and rebuilding.

use crate::config::DEFAULT_AUTO_STACK_DEPTH;
use crate::graph::{
    is_stacked_id, stacked_id, EdgeKind, GraphBuilder, GraphEdge, GraphNode, Indexed, NodeKind,
    PipelineGraph, StackedGroupNode,
};
use crate::model::{Stage, Warehouse};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// A group of collapsed nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackedNode {
    /// Number of collapsed nodes.
    pub count: usize,
    /// The anchor the group hangs off.
    pub parent_node_id: String,
}

/// Output of [`stack`].
#[derive(Debug, Clone)]
pub struct StackResult {
    /// The rewritten graph.
    pub graph: PipelineGraph,
    /// One entry per group present after stacking, in traversal order.
    pub stacked_nodes: Vec<StackedNode>,
}

/// Collapses the downstream closure of every anchor in `after_node_ids`.
///
/// Anchors are visited breadth-first from the graph's sources. An anchor that
/// lies strictly downstream of another anchor is dropped before the walk, so
/// groups never nest and every reported group is present in the graph.
/// Anchors missing from the graph are ignored. Running `stack` again with the
/// same anchors leaves the graph unchanged.
#[must_use]
pub fn stack(after_node_ids: &[String], mut graph: PipelineGraph) -> StackResult {
    let anchors = outermost_anchors(&graph, after_node_ids);
    let mut stacked_nodes = Vec::new();

    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<String> = graph.sources().into_iter().map(str::to_string).collect();
    for id in &queue {
        visited.insert(id.clone());
    }

    while let Some(id) = queue.pop_front() {
        if !graph.contains(&id) {
            continue;
        }
        if anchors.contains(id.as_str()) {
            stacked_nodes.push(collapse(&mut graph, &id));
            continue;
        }
        for next in graph.successors(&id) {
            if !is_stacked_id(next) && visited.insert(next.to_string()) {
                queue.push_back(next.to_string());
            }
        }
    }
    stacked_nodes.retain(|node| graph.contains(&stacked_id(&node.parent_node_id)));

    StackResult {
        graph,
        stacked_nodes,
    }
}

/// Present anchors that no other present anchor strictly reaches.
///
/// Anchors on a common cycle reach each other; they are all kept and the walk
/// order decides which one collapses the others.
fn outermost_anchors<'a>(graph: &PipelineGraph, after_node_ids: &'a [String]) -> HashSet<&'a str> {
    let present: Vec<&str> = after_node_ids
        .iter()
        .map(String::as_str)
        .filter(|id| {
            let found = graph.contains(id);
            if !found {
                debug!(anchor = id, "Ignoring stale stack anchor");
            }
            found
        })
        .collect();
    let reach: Vec<HashSet<String>> = present
        .iter()
        .map(|id| descendants(graph, id).into_iter().collect())
        .collect();

    present
        .iter()
        .enumerate()
        .filter(|&(i, id)| {
            !present.iter().enumerate().any(|(j, other)| {
                i != j && reach[j].contains(*id) && !reach[i].contains(*other)
            })
        })
        .map(|(_, id)| *id)
        .collect()
}

fn collapse(graph: &mut PipelineGraph, anchor: &str) -> StackedNode {
    let group_id = stacked_id(anchor);
    if let Some(NodeKind::StackedGroup(existing)) = graph.node(&group_id).map(|n| &n.kind) {
        return StackedNode {
            count: existing.count,
            parent_node_id: existing.parent_node_id.clone(),
        };
    }

    let closure = descendants(graph, anchor);
    let mut count = 0;
    for id in &closure {
        match graph.remove_node(id).map(|n| n.kind) {
            // Fold in groups from an earlier pass rather than nesting them
            Some(NodeKind::StackedGroup(group)) => count += group.count,
            Some(_) => count += 1,
            None => {}
        }
    }

    graph.add_node(GraphNode::new(
        group_id.clone(),
        NodeKind::StackedGroup(StackedGroupNode {
            count,
            parent_node_id: anchor.to_string(),
        }),
    ));
    graph.add_edge(
        anchor,
        &group_id,
        GraphEdge::new(format!("{anchor}->{group_id}"), EdgeKind::Stacked),
    );
    debug!(anchor, count, "Stacked descendants");

    StackedNode {
        count,
        parent_node_id: anchor.to_string(),
    }
}

/// Every node reachable from `start`, excluding `start`, in BFS order.
fn descendants(graph: &PipelineGraph, start: &str) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::from([start]);
    let mut order = Vec::new();
    let mut queue = VecDeque::from([start]);
    while let Some(id) = queue.pop_front() {
        for next in graph.successors(id) {
            if seen.insert(next) {
                order.push(next.to_string());
                queue.push_back(next);
            }
        }
    }
    order
}

/// Proposes stack anchors for deep pipelines in an already built graph.
///
/// For each warehouse, in order, walks downstream breadth-first and proposes
/// the first node found at `depth` hops. Warehouses missing from the graph
/// (filtered out) propose nothing. Duplicates are dropped.
#[must_use]
pub fn suggest_stack_points(
    graph: &PipelineGraph,
    warehouses: &[Warehouse],
    depth: usize,
) -> Vec<String> {
    let mut suggestions: Vec<String> = Vec::new();

    for warehouse in warehouses {
        let root = warehouse.node_id();
        if !graph.contains(&root) {
            continue;
        }
        let mut seen: HashSet<&str> = HashSet::from([root.as_str()]);
        let mut frontier: Vec<&str> = vec![root.as_str()];
        for _ in 0..depth {
            let mut next_frontier = Vec::new();
            for id in frontier {
                for next in graph.successors(id) {
                    if seen.insert(next) {
                        next_frontier.push(next);
                    }
                }
            }
            frontier = next_frontier;
        }
        if let Some(&candidate) = frontier.first() {
            if !suggestions.iter().any(|s| s == candidate) {
                suggestions.push(candidate.to_string());
            }
        }
    }
    suggestions
}

/// Proposes stack anchors over the unfiltered graph of `stages` and `warehouses`.
#[must_use]
pub fn auto_suggest_stack_points_at(
    stages: &[Stage],
    warehouses: &[Warehouse],
    depth: usize,
) -> Vec<String> {
    let graph = GraphBuilder::new(stages, warehouses).build();
    suggest_stack_points(&graph, warehouses, depth)
}

/// [`auto_suggest_stack_points_at`] with the default depth of five hops.
#[must_use]
pub fn auto_suggest_stack_points(stages: &[Stage], warehouses: &[Warehouse]) -> Vec<String> {
    auto_suggest_stack_points_at(stages, warehouses, DEFAULT_AUTO_STACK_DEPTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphFilter;
    use crate::model::{FreightRequest, RepoSubscription};
    use pretty_assertions::assert_eq;

    fn chain(len: usize) -> (Vec<Stage>, Vec<Warehouse>) {
        let mut w1 = Warehouse::new("W1");
        w1.spec.subscriptions = vec![RepoSubscription::image("ghcr.io/app")];
        let stages = (0..len)
            .map(|i| {
                let mut stage = Stage::new(format!("s{i}"));
                let request = if i == 0 {
                    FreightRequest::from_warehouse("W1").direct()
                } else {
                    FreightRequest::from_warehouse("W1").from_stage(format!("s{}", i - 1))
                };
                stage.spec.requested_freight = vec![request];
                stage
            })
            .collect();
        (stages, vec![w1])
    }

    fn node_ids(graph: &PipelineGraph) -> Vec<String> {
        let mut ids: Vec<_> = graph.nodes().map(|n| n.id.clone()).collect();
        ids.sort();
        ids
    }

    fn edge_ids(graph: &PipelineGraph) -> Vec<String> {
        let mut ids: Vec<_> = graph.edges().map(|e| e.edge.id.clone()).collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_stack_after_warehouse() {
        let (stages, warehouses) = chain(2);
        let graph = GraphBuilder::new(&stages, &warehouses).build();

        let result = stack(&["warehouse/W1".to_string()], graph);

        assert_eq!(
            result.stacked_nodes,
            vec![StackedNode {
                count: 2,
                parent_node_id: "warehouse/W1".into()
            }]
        );
        assert_eq!(result.graph.node_count(), 3);
        assert_eq!(result.graph.edge_count(), 2);
        assert!(result.graph.contains("stacked/warehouse/W1"));
        assert_eq!(result.graph.successors("warehouse/W1"), vec!["stacked/warehouse/W1"]);
    }

    #[test]
    fn test_stack_is_idempotent() {
        let (stages, warehouses) = chain(4);
        let anchors = vec!["stage/s1".to_string()];

        let once = stack(&anchors, GraphBuilder::new(&stages, &warehouses).build());
        let twice = stack(&anchors, once.graph.clone());

        assert_eq!(node_ids(&once.graph), node_ids(&twice.graph));
        assert_eq!(edge_ids(&once.graph), edge_ids(&twice.graph));
        assert_eq!(once.stacked_nodes, twice.stacked_nodes);
    }

    #[test]
    fn test_expand_and_restack_reproduces_count() {
        let (stages, warehouses) = chain(5);
        let anchors = vec!["stage/s1".to_string()];

        let stacked = stack(&anchors, GraphBuilder::new(&stages, &warehouses).build());
        let expanded = stack(&[], GraphBuilder::new(&stages, &warehouses).build());
        let restacked = stack(&anchors, expanded.graph);

        assert!(expanded.stacked_nodes.is_empty());
        assert_eq!(stacked.stacked_nodes[0].count, 3);
        assert_eq!(restacked.stacked_nodes, stacked.stacked_nodes);
    }

    #[test]
    fn test_nested_anchors_do_not_double_collapse() {
        let (stages, warehouses) = chain(5);
        let anchors = vec!["stage/s3".to_string(), "stage/s1".to_string()];

        let result = stack(&anchors, GraphBuilder::new(&stages, &warehouses).build());

        assert_eq!(result.stacked_nodes.len(), 1);
        assert_eq!(result.stacked_nodes[0].parent_node_id, "stage/s1");
        assert!(!result.graph.contains("stacked/stage/s3"));
    }

    #[test]
    fn test_downstream_anchor_reached_first_is_not_reported() {
        let mut s1 = Stage::new("s1");
        s1.spec.requested_freight = vec![FreightRequest::from_warehouse("W1").direct()];
        let mut s2 = Stage::new("s2");
        s2.spec.requested_freight = vec![
            FreightRequest::from_warehouse("W2").direct(),
            FreightRequest::from_warehouse("W1").from_stage("s1"),
        ];
        let mut s3 = Stage::new("s3");
        s3.spec.requested_freight = vec![FreightRequest::from_warehouse("W2").from_stage("s2")];
        let stages = vec![s1, s2, s3];
        let warehouses = vec![Warehouse::new("W2"), Warehouse::new("W1")];
        let anchors = vec!["stage/s1".to_string(), "stage/s2".to_string()];

        let once = stack(&anchors, GraphBuilder::new(&stages, &warehouses).build());
        let twice = stack(&anchors, once.graph.clone());

        assert_eq!(
            once.stacked_nodes,
            vec![StackedNode {
                count: 2,
                parent_node_id: "stage/s1".into()
            }]
        );
        assert_eq!(
            node_ids(&once.graph),
            vec!["stacked/stage/s1", "stage/s1", "warehouse/W1", "warehouse/W2"]
        );
        assert_eq!(twice.stacked_nodes, once.stacked_nodes);
        assert_eq!(node_ids(&twice.graph), node_ids(&once.graph));
    }

    #[test]
    fn test_anchors_on_a_cycle_collapse_once() {
        let mut a = Stage::new("a");
        a.spec.requested_freight = vec![
            FreightRequest::from_warehouse("W1").direct(),
            FreightRequest::from_warehouse("W1").from_stage("b"),
        ];
        let mut b = Stage::new("b");
        b.spec.requested_freight = vec![FreightRequest::from_warehouse("W1").from_stage("a")];
        let stages = vec![a, b];
        let warehouses = vec![Warehouse::new("W1")];
        let anchors = vec!["stage/a".to_string(), "stage/b".to_string()];

        let result = stack(&anchors, GraphBuilder::new(&stages, &warehouses).build());

        assert_eq!(result.stacked_nodes.len(), 1);
        assert_eq!(result.stacked_nodes[0].parent_node_id, "stage/a");
        assert!(result
            .stacked_nodes
            .iter()
            .all(|n| result.graph.contains(&stacked_id(&n.parent_node_id))));
    }

    #[test]
    fn test_stale_anchor_is_noop() {
        let (stages, warehouses) = chain(2);
        let graph = GraphBuilder::new(&stages, &warehouses).build();
        let before = node_ids(&graph);

        let result = stack(&["stage/gone".to_string()], graph);

        assert!(result.stacked_nodes.is_empty());
        assert_eq!(node_ids(&result.graph), before);
    }

    #[test]
    fn test_diamond_closure_counted_once() {
        let mut a = Stage::new("a");
        a.spec.requested_freight = vec![FreightRequest::from_warehouse("W1").direct()];
        let mut b = Stage::new("b");
        b.spec.requested_freight = vec![FreightRequest::from_warehouse("W1").from_stage("a")];
        let mut c = Stage::new("c");
        c.spec.requested_freight = vec![FreightRequest::from_warehouse("W1").from_stage("a")];
        let mut d = Stage::new("d");
        d.spec.requested_freight =
            vec![FreightRequest::from_warehouse("W1").from_stage("b").from_stage("c")];
        let stages = vec![a, b, c, d];
        let warehouses = vec![Warehouse::new("W1")];

        let result = stack(
            &["stage/a".to_string()],
            GraphBuilder::new(&stages, &warehouses).build(),
        );

        assert_eq!(result.stacked_nodes[0].count, 3);
    }

    #[test]
    fn test_auto_suggest_stack_points() {
        let (stages, warehouses) = chain(7);
        assert_eq!(auto_suggest_stack_points(&stages, &warehouses), vec!["stage/s4".to_string()]);

        let (short, warehouses) = chain(3);
        assert!(auto_suggest_stack_points(&short, &warehouses).is_empty());
    }

    #[test]
    fn test_suggestions_respect_filtered_graph() {
        let (mut stages, mut warehouses) = chain(7);
        let mut other = Stage::new("x0");
        other.spec.requested_freight = vec![FreightRequest::from_warehouse("W2").direct()];
        stages.push(other);
        warehouses.push(Warehouse::new("W2"));

        let filter = GraphFilter::only_warehouse("W2", &stages, &warehouses);
        let graph = GraphBuilder::new(&stages, &warehouses)
            .with_filter(&filter)
            .build();

        assert!(suggest_stack_points(&graph, &warehouses, DEFAULT_AUTO_STACK_DEPTH).is_empty());
        assert_eq!(
            auto_suggest_stack_points(&stages, &warehouses),
            vec!["stage/s4".to_string()]
        );
    }

    #[test]
    fn test_auto_suggest_dedupes_shared_stages() {
        let mut stages = Vec::new();
        let mut prev: Option<String> = None;
        for i in 0..6 {
            let mut stage = Stage::new(format!("s{i}"));
            stage.spec.requested_freight = ["W1", "W2"]
                .into_iter()
                .map(|w| match &prev {
                    None => FreightRequest::from_warehouse(w).direct(),
                    Some(p) => FreightRequest::from_warehouse(w).from_stage(p.clone()),
                })
                .collect();
            prev = Some(stage.name.clone());
            stages.push(stage);
        }
        let warehouses = vec![Warehouse::new("W1"), Warehouse::new("W2")];

        assert_eq!(auto_suggest_stack_points(&stages, &warehouses), vec!["stage/s4".to_string()]);
    }
}
