//! Configuration for graph building, layout and user preferences.
//!
//! Every value here is passed explicitly into a rebuild; nothing is read from
//! ambient state.

mod store;

pub use store::{InMemoryPreferenceStore, JsonFilePreferenceStore, PreferenceStore};

#[cfg(test)]
pub use store::MockPreferenceStore;

use crate::graph::{GraphBuilder, GraphFilter};
use crate::stacking::suggest_stack_points;
use crate::layout::{KindSizes, RankDir, DEFAULT_NODE_SEP, DEFAULT_RANK_SEP, DEFAULT_SWEEPS};
use crate::model::{Stage, Warehouse};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Depth at which stack points are suggested.
pub const DEFAULT_AUTO_STACK_DEPTH: usize = 5;

/// Layout spacing, direction and default node sizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Direction ranks advance in.
    #[serde(default)]
    pub rank_dir: RankDir,
    /// Gap between nodes of one rank.
    #[serde(default = "default_node_sep")]
    pub node_sep: f64,
    /// Gap between ranks.
    #[serde(default = "default_rank_sep")]
    pub rank_sep: f64,
    /// Ordering sweeps.
    #[serde(default = "default_sweeps")]
    pub sweeps: usize,
    /// Fallback sizes per node kind.
    #[serde(default)]
    pub sizes: KindSizes,
}

fn default_node_sep() -> f64 {
    DEFAULT_NODE_SEP
}

fn default_rank_sep() -> f64 {
    DEFAULT_RANK_SEP
}

fn default_sweeps() -> usize {
    DEFAULT_SWEEPS
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            rank_dir: RankDir::default(),
            node_sep: default_node_sep(),
            rank_sep: default_rank_sep(),
            sweeps: default_sweeps(),
            sizes: KindSizes::default(),
        }
    }
}

impl LayoutConfig {
    /// Creates a layout configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rank direction.
    #[must_use]
    pub fn with_rank_dir(mut self, rank_dir: RankDir) -> Self {
        self.rank_dir = rank_dir;
        self
    }

    /// Sets node and rank separation.
    #[must_use]
    pub fn with_spacing(mut self, node_sep: f64, rank_sep: f64) -> Self {
        self.node_sep = node_sep;
        self.rank_sep = rank_sep;
        self
    }

    /// Sets the default sizes per kind.
    #[must_use]
    pub fn with_sizes(mut self, sizes: KindSizes) -> Self {
        self.sizes = sizes;
        self
    }
}

/// Inputs to one graph build besides the resources themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphBuildConfig {
    /// Stages and warehouses to leave out.
    #[serde(default)]
    pub filter: GraphFilter,
    /// Node ids whose descendants are collapsed.
    #[serde(default)]
    pub stacked_after: Vec<String>,
    /// Whether to add suggested stack points.
    #[serde(default)]
    pub auto_stack: bool,
    /// Depth used for suggested stack points.
    #[serde(default = "default_auto_stack_depth")]
    pub auto_stack_depth: usize,
    /// Per-warehouse color overrides.
    #[serde(default)]
    pub warehouse_colors: BTreeMap<String, String>,
}

fn default_auto_stack_depth() -> usize {
    DEFAULT_AUTO_STACK_DEPTH
}

impl Default for GraphBuildConfig {
    fn default() -> Self {
        Self {
            filter: GraphFilter::default(),
            stacked_after: Vec::new(),
            auto_stack: false,
            auto_stack_depth: default_auto_stack_depth(),
            warehouse_colors: BTreeMap::new(),
        }
    }
}

impl GraphBuildConfig {
    /// Creates a build configuration that filters and stacks nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives a build configuration from user preferences.
    ///
    /// Hidden warehouses drop the stages fed only by them; a warehouse filter
    /// keeps only what that warehouse reaches. Auto-stacking stays on only
    /// until the suggestions have been seeded into `stacked_after`.
    #[must_use]
    pub fn from_preferences(prefs: &Preferences, stages: &[Stage], warehouses: &[Warehouse]) -> Self {
        let mut filter = GraphFilter::hide_warehouses(&prefs.hidden_warehouses, stages);
        if let Some(warehouse) = &prefs.warehouse_filter {
            filter = filter.union(GraphFilter::only_warehouse(warehouse, stages, warehouses));
        }
        Self {
            filter,
            stacked_after: prefs.stacked_after.clone(),
            auto_stack: prefs.auto_stack && !prefs.auto_stack_seeded,
            auto_stack_depth: default_auto_stack_depth(),
            warehouse_colors: prefs.warehouse_colors.clone(),
        }
    }

    /// Sets the filter.
    #[must_use]
    pub fn with_filter(mut self, filter: GraphFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Adds a stack anchor.
    #[must_use]
    pub fn with_stack_after(mut self, node_id: impl Into<String>) -> Self {
        self.stacked_after.push(node_id.into());
        self
    }

    /// Enables or disables suggested stack points.
    #[must_use]
    pub fn with_auto_stack(mut self, enabled: bool) -> Self {
        self.auto_stack = enabled;
        self
    }

    /// Overrides the color of one warehouse.
    #[must_use]
    pub fn with_warehouse_color(mut self, warehouse: impl Into<String>, color: impl Into<String>) -> Self {
        self.warehouse_colors.insert(warehouse.into(), color.into());
        self
    }
}

/// Display preferences persisted per project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Warehouses hidden from the graph.
    #[serde(default)]
    pub hidden_warehouses: BTreeSet<String>,
    /// Show only the pipeline fed by this warehouse.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse_filter: Option<String>,
    /// Node ids whose descendants are collapsed.
    #[serde(default)]
    pub stacked_after: Vec<String>,
    /// Whether to stack deep pipelines automatically.
    #[serde(default)]
    pub auto_stack: bool,
    /// Whether suggested stack points were already written to `stacked_after`.
    #[serde(default)]
    pub auto_stack_seeded: bool,
    /// Per-warehouse color overrides.
    #[serde(default)]
    pub warehouse_colors: BTreeMap<String, String>,
}

impl Preferences {
    /// Collapses everything downstream of a node.
    ///
    /// Returns false if the node was already an anchor.
    pub fn stack_after(&mut self, node_id: impl Into<String>) -> bool {
        let node_id = node_id.into();
        if self.stacked_after.contains(&node_id) {
            return false;
        }
        self.stacked_after.push(node_id);
        true
    }

    /// Expands a stacked group by dropping its anchor.
    ///
    /// Returns false if the node was not an anchor.
    pub fn unstack(&mut self, node_id: &str) -> bool {
        let before = self.stacked_after.len();
        self.stacked_after.retain(|id| id != node_id);
        self.stacked_after.len() != before
    }

    /// Writes suggested stack points into `stacked_after`, once.
    ///
    /// Suggestions are computed over the graph these preferences would show.
    /// Returns the anchors added; nothing happens when auto-stacking is off or
    /// has already been seeded.
    pub fn seed_auto_stack(&mut self, stages: &[Stage], warehouses: &[Warehouse]) -> Vec<String> {
        if !self.auto_stack || self.auto_stack_seeded {
            return Vec::new();
        }
        let build = GraphBuildConfig::from_preferences(self, stages, warehouses);
        let graph = GraphBuilder::new(stages, warehouses)
            .with_filter(&build.filter)
            .build();

        let mut added = Vec::new();
        for anchor in suggest_stack_points(&graph, warehouses, build.auto_stack_depth) {
            if self.stack_after(anchor.clone()) {
                added.push(anchor);
            }
        }
        self.auto_stack_seeded = true;
        added
    }

    /// Hides or shows a warehouse; returns whether it is now hidden.
    pub fn toggle_warehouse(&mut self, warehouse: &str) -> bool {
        if self.hidden_warehouses.remove(warehouse) {
            false
        } else {
            self.hidden_warehouses.insert(warehouse.to_string());
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FreightRequest;

    #[test]
    fn test_layout_config_defaults_from_empty_json() {
        let config: LayoutConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, LayoutConfig::default());
        assert_eq!(config.rank_dir, RankDir::LeftRight);
        assert_eq!(config.sweeps, DEFAULT_SWEEPS);
    }

    #[test]
    fn test_build_config_defaults_from_empty_json() {
        let config: GraphBuildConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.auto_stack_depth, DEFAULT_AUTO_STACK_DEPTH);
        assert!(config.stacked_after.is_empty());
    }

    #[test]
    fn test_preferences_stack_and_unstack() {
        let mut prefs = Preferences::default();
        assert!(prefs.stack_after("warehouse/w1"));
        assert!(!prefs.stack_after("warehouse/w1"));
        assert!(prefs.unstack("warehouse/w1"));
        assert!(!prefs.unstack("warehouse/w1"));
    }

    #[test]
    fn test_toggle_warehouse() {
        let mut prefs = Preferences::default();
        assert!(prefs.toggle_warehouse("w1"));
        assert!(prefs.hidden_warehouses.contains("w1"));
        assert!(!prefs.toggle_warehouse("w1"));
        assert!(prefs.hidden_warehouses.is_empty());
    }

    #[test]
    fn test_build_config_from_preferences() {
        let mut a = Stage::new("a");
        a.spec.requested_freight = vec![FreightRequest::from_warehouse("w1").direct()];
        let mut b = Stage::new("b");
        b.spec.requested_freight = vec![FreightRequest::from_warehouse("w2").direct()];
        let stages = vec![a, b];
        let warehouses = vec![Warehouse::new("w1"), Warehouse::new("w2"), Warehouse::new("w3")];

        let prefs = Preferences {
            hidden_warehouses: BTreeSet::from(["w2".to_string()]),
            warehouse_filter: Some("w1".into()),
            stacked_after: vec!["stage/a".into()],
            ..Default::default()
        };
        let config = GraphBuildConfig::from_preferences(&prefs, &stages, &warehouses);

        assert!(config.filter.ignored_stages.contains("b"));
        assert!(!config.filter.ignored_stages.contains("a"));
        assert!(config.filter.ignored_warehouses.contains("w3"));
        assert_eq!(config.stacked_after, vec!["stage/a".to_string()]);
    }

    fn chain(len: usize) -> (Vec<Stage>, Vec<Warehouse>) {
        let stages = (0..len)
            .map(|i| {
                let mut stage = Stage::new(format!("s{i}"));
                let request = if i == 0 {
                    FreightRequest::from_warehouse("w1").direct()
                } else {
                    FreightRequest::from_warehouse("w1").from_stage(format!("s{}", i - 1))
                };
                stage.spec.requested_freight = vec![request];
                stage
            })
            .collect();
        (stages, vec![Warehouse::new("w1")])
    }

    #[test]
    fn test_seed_auto_stack_once() {
        let (stages, warehouses) = chain(7);
        let mut prefs = Preferences {
            auto_stack: true,
            ..Default::default()
        };

        assert_eq!(prefs.seed_auto_stack(&stages, &warehouses), vec!["stage/s4".to_string()]);
        assert_eq!(prefs.stacked_after, vec!["stage/s4".to_string()]);
        assert!(prefs.auto_stack_seeded);
        assert!(!GraphBuildConfig::from_preferences(&prefs, &stages, &warehouses).auto_stack);

        assert!(prefs.unstack("stage/s4"));
        assert!(prefs.seed_auto_stack(&stages, &warehouses).is_empty());
        assert!(prefs.stacked_after.is_empty());
    }

    #[test]
    fn test_seed_auto_stack_skipped_when_disabled() {
        let (stages, warehouses) = chain(7);
        let mut prefs = Preferences::default();

        assert!(prefs.seed_auto_stack(&stages, &warehouses).is_empty());
        assert!(!prefs.auto_stack_seeded);
    }

    #[test]
    fn test_seed_auto_stack_uses_filtered_graph() {
        let (mut stages, mut warehouses) = chain(7);
        let mut other = Stage::new("x0");
        other.spec.requested_freight = vec![FreightRequest::from_warehouse("w2").direct()];
        stages.push(other);
        warehouses.push(Warehouse::new("w2"));
        let mut prefs = Preferences {
            auto_stack: true,
            warehouse_filter: Some("w2".into()),
            ..Default::default()
        };

        assert!(prefs.seed_auto_stack(&stages, &warehouses).is_empty());
        assert!(prefs.stacked_after.is_empty());
    }

    #[test]
    fn test_preferences_round_trip_camel_case() {
        let json = r#"{"hiddenWarehouses": ["w1"], "autoStack": true}"#;
        let prefs: Preferences = serde_json::from_str(json).unwrap();
        assert!(prefs.auto_stack);
        assert!(prefs.warehouse_filter.is_none());
    }
}
