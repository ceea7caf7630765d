//! Layered (Sugiyama-style) layout.
//!
//! Four phases, each deterministic for a given input order:
//! 1. Cycle breaking: depth-first back edges are reversed
//! 2. Ranking: longest path from the sources
//! 3. Ordering: barycenter sweeps, ties keep the current order
//! 4. Coordinates: ranks packed along the rank axis, nodes centered across it

use super::geometry::Point;
use super::provider::{LayoutInput, LayoutPositions, LayoutProvider, RankDir};
use crate::config::LayoutConfig;
use std::collections::{HashSet, VecDeque};

/// Default gap between nodes of one rank.
pub const DEFAULT_NODE_SEP: f64 = 40.0;
/// Default gap between ranks.
pub const DEFAULT_RANK_SEP: f64 = 100.0;
/// Default number of down/up ordering sweeps.
pub const DEFAULT_SWEEPS: usize = 8;

/// The default [`LayoutProvider`].
#[derive(Debug, Clone, PartialEq)]
pub struct LayeredLayout {
    node_sep: f64,
    rank_sep: f64,
    sweeps: usize,
}

impl Default for LayeredLayout {
    fn default() -> Self {
        Self {
            node_sep: DEFAULT_NODE_SEP,
            rank_sep: DEFAULT_RANK_SEP,
            sweeps: DEFAULT_SWEEPS,
        }
    }
}

impl LayeredLayout {
    /// Creates a layout with default spacing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a layout with the spacing from `config`.
    #[must_use]
    pub fn from_config(config: &LayoutConfig) -> Self {
        Self {
            node_sep: config.node_sep,
            rank_sep: config.rank_sep,
            sweeps: config.sweeps,
        }
    }

    /// Sets the gap between nodes of one rank.
    #[must_use]
    pub fn with_node_sep(mut self, sep: f64) -> Self {
        self.node_sep = sep;
        self
    }

    /// Sets the gap between ranks.
    #[must_use]
    pub fn with_rank_sep(mut self, sep: f64) -> Self {
        self.rank_sep = sep;
        self
    }

    /// Sets the number of ordering sweeps.
    #[must_use]
    pub fn with_sweeps(mut self, sweeps: usize) -> Self {
        self.sweeps = sweeps;
        self
    }
}

impl LayoutProvider for LayeredLayout {
    fn name(&self) -> &str {
        "layered"
    }

    fn layout(&self, input: &LayoutInput, direction: RankDir) -> LayoutPositions {
        let n = input.len();
        if n == 0 {
            return LayoutPositions::default();
        }

        let edges = normalize_edges(n, &input.edges);
        let forward = break_cycles(n, &edges);
        let ranks = assign_ranks(n, &forward);
        let mut layers = group_layers(&ranks);
        self.reduce_crossings(n, &mut layers, &forward);

        LayoutPositions {
            points: self.assign_coordinates(input, &layers, direction),
        }
    }
}

/// Drops self loops, out-of-range endpoints and duplicates.
fn normalize_edges(n: usize, edges: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut seen = HashSet::new();
    edges
        .iter()
        .copied()
        .filter(|&(s, t)| s != t && s < n && t < n)
        .filter(|e| seen.insert(*e))
        .collect()
}

/// Reverses depth-first back edges so the result is acyclic.
fn break_cycles(n: usize, edges: &[(usize, usize)]) -> Vec<(usize, usize)> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        New,
        Active,
        Done,
    }

    let mut adjacency = vec![Vec::new(); n];
    for &(s, t) in edges {
        adjacency[s].push(t);
    }

    let mut marks = vec![Mark::New; n];
    let mut back = HashSet::new();
    for root in 0..n {
        if marks[root] != Mark::New {
            continue;
        }
        // Explicit stack of (node, next child position)
        let mut stack = vec![(root, 0usize)];
        marks[root] = Mark::Active;
        while let Some((node, child)) = stack.last_mut() {
            let node = *node;
            if let Some(&next) = adjacency[node].get(*child) {
                *child += 1;
                match marks[next] {
                    Mark::New => {
                        marks[next] = Mark::Active;
                        stack.push((next, 0));
                    }
                    Mark::Active => {
                        back.insert((node, next));
                    }
                    Mark::Done => {}
                }
            } else {
                marks[node] = Mark::Done;
                stack.pop();
            }
        }
    }

    let mut seen = HashSet::new();
    edges
        .iter()
        .map(|&(s, t)| if back.contains(&(s, t)) { (t, s) } else { (s, t) })
        .filter(|e| seen.insert(*e))
        .collect()
}

/// Longest-path ranking over an acyclic edge list.
fn assign_ranks(n: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut in_degree = vec![0usize; n];
    let mut adjacency = vec![Vec::new(); n];
    for &(s, t) in edges {
        in_degree[t] += 1;
        adjacency[s].push(t);
    }

    let mut rank = vec![0usize; n];
    let mut queue: VecDeque<usize> = (0..n).filter(|&v| in_degree[v] == 0).collect();
    while let Some(node) = queue.pop_front() {
        for &next in &adjacency[node] {
            rank[next] = rank[next].max(rank[node] + 1);
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                queue.push_back(next);
            }
        }
    }
    rank
}

fn group_layers(ranks: &[usize]) -> Vec<Vec<usize>> {
    let depth = ranks.iter().copied().max().map_or(0, |r| r + 1);
    let mut layers = vec![Vec::new(); depth];
    for (node, &rank) in ranks.iter().enumerate() {
        layers[rank].push(node);
    }
    layers
}

impl LayeredLayout {
    fn reduce_crossings(&self, n: usize, layers: &mut [Vec<usize>], edges: &[(usize, usize)]) {
        let mut predecessors = vec![Vec::new(); n];
        let mut successors = vec![Vec::new(); n];
        for &(s, t) in edges {
            successors[s].push(t);
            predecessors[t].push(s);
        }

        let mut position = vec![0usize; n];
        for layer in layers.iter() {
            for (i, &node) in layer.iter().enumerate() {
                position[node] = i;
            }
        }

        for _ in 0..self.sweeps {
            for r in 1..layers.len() {
                reorder(&mut layers[r], &predecessors, &mut position);
            }
            for r in (0..layers.len().saturating_sub(1)).rev() {
                reorder(&mut layers[r], &successors, &mut position);
            }
        }
    }

    fn assign_coordinates(
        &self,
        input: &LayoutInput,
        layers: &[Vec<usize>],
        direction: RankDir,
    ) -> Vec<Point> {
        let horizontal = direction.is_horizontal();
        let along = |i: usize| {
            let size = input.sizes[i];
            if horizontal { size.width } else { size.height }
        };
        let across = |i: usize| {
            let size = input.sizes[i];
            if horizontal { size.height } else { size.width }
        };

        let extents: Vec<f64> = layers
            .iter()
            .map(|layer| layer.iter().map(|&i| along(i)).fold(0.0, f64::max))
            .collect();
        let spans: Vec<f64> = layers
            .iter()
            .map(|layer| {
                let gaps = layer.len().saturating_sub(1);
                #[allow(clippy::cast_precision_loss)]
                let gaps = gaps as f64 * self.node_sep;
                layer.iter().map(|&i| across(i)).sum::<f64>() + gaps
            })
            .collect();
        let widest = spans.iter().copied().fold(0.0, f64::max);

        let mut points = vec![Point::default(); input.len()];
        let mut rank_offset = 0.0;
        for ((layer, extent), span) in layers.iter().zip(&extents).zip(&spans) {
            let mut cursor = (widest - span) / 2.0;
            for &node in layer {
                let main = rank_offset + (extent - along(node)) / 2.0;
                points[node] = if horizontal {
                    Point::new(main, cursor)
                } else {
                    Point::new(cursor, main)
                };
                cursor += across(node) + self.node_sep;
            }
            rank_offset += extent + self.rank_sep;
        }
        points
    }
}

/// Sorts one layer by the mean position of its neighbors.
fn reorder(layer: &mut [usize], neighbors: &[Vec<usize>], position: &mut [usize]) {
    #[allow(clippy::cast_precision_loss)]
    let barycenter = |node: usize| -> f64 {
        let adjacent = &neighbors[node];
        if adjacent.is_empty() {
            position[node] as f64
        } else {
            adjacent.iter().map(|&m| position[m] as f64).sum::<f64>() / adjacent.len() as f64
        }
    };

    let mut keyed: Vec<(f64, usize)> = layer.iter().map(|&node| (barycenter(node), node)).collect();
    // Stable sort keeps the current order on ties
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));

    for (i, (_, node)) in keyed.into_iter().enumerate() {
        layer[i] = node;
        position[node] = i;
    }
}
