//! Test assertions for graphs and views.

use crate::engine::PipelineView;
use crate::graph::PipelineGraph;

/// Asserts that the graph has an edge from `source` to `target`.
pub fn assert_graph_edge(graph: &PipelineGraph, source: &str, target: &str) {
    assert!(
        graph.successors(source).contains(&target),
        "Expected edge {source} -> {target}, successors of {source}: {:?}",
        graph.successors(source)
    );
}

/// Asserts that the graph has no edge from `source` to `target`.
pub fn assert_no_graph_edge(graph: &PipelineGraph, source: &str, target: &str) {
    assert!(
        !graph.successors(source).contains(&target),
        "Expected no edge {source} -> {target}"
    );
}

/// Asserts that the view contains a node with this id.
pub fn assert_view_node(view: &PipelineView, id: &str) {
    assert!(
        view.node(id).is_some(),
        "Expected node '{id}', view has: {:?}",
        view.nodes.iter().map(|n| n.id.as_str()).collect::<Vec<_>>()
    );
}

/// Asserts that the view has no node with this id.
pub fn assert_no_view_node(view: &PipelineView, id: &str) {
    assert!(view.node(id).is_none(), "Expected node '{id}' to be absent");
}

/// Asserts that the view has exactly `expected` edges from `source` to `target`.
pub fn assert_view_edge_count(view: &PipelineView, source: &str, target: &str, expected: usize) {
    let actual = view
        .edges
        .iter()
        .filter(|e| e.source == source && e.target == target)
        .count();
    assert_eq!(
        actual, expected,
        "Expected {expected} edges {source} -> {target}, got {actual}"
    );
}

/// Asserts that no two nodes of the view overlap.
pub fn assert_no_overlap(view: &PipelineView) {
    for (i, a) in view.nodes.iter().enumerate() {
        for b in &view.nodes[i + 1..] {
            let apart = a.position.x + a.size.width <= b.position.x
                || b.position.x + b.size.width <= a.position.x
                || a.position.y + a.size.height <= b.position.y
                || b.position.y + b.size.height <= a.position.y;
            assert!(apart, "Nodes '{}' and '{}' overlap", a.id, b.id);
        }
    }
}
