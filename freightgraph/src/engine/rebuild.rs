//! The explicit rebuild pass.

use super::cache::ViewCache;
use super::view::PipelineView;
use crate::config::{GraphBuildConfig, LayoutConfig, Preferences};
use crate::errors::GraphError;
use crate::graph::{GraphBuilder, Relations, WarehouseColors};
use crate::layout::{layout_graph, LayeredLayout, LayoutProvider, NodeSizes};
use crate::model::ProjectSnapshot;
use crate::observability::{PhaseTimings, SpanTimer};
use crate::stacking::{stack, suggest_stack_points};
use crate::utils::content_hash;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Everything a rebuild depends on, hashed for memoization.
#[derive(Serialize)]
struct RebuildInputs<'a> {
    snapshot: &'a ProjectSnapshot,
    build: &'a GraphBuildConfig,
    layout: &'a LayoutConfig,
    sizes: &'a NodeSizes,
    provider: &'a str,
}

/// Turns project snapshots into laid-out pipeline views.
///
/// Each call to [`rebuild`](Self::rebuild) runs indexing, relations, graph
/// construction, stacking and layout in that order. Identical inputs return
/// the memoized view.
pub struct PipelineEngine {
    provider: Option<Box<dyn LayoutProvider>>,
    cache: ViewCache,
}

impl Default for PipelineEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PipelineEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineEngine")
            .field("provider", &self.provider.as_ref().map_or("layered", |p| p.name()))
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl PipelineEngine {
    /// Creates an engine using [`LayeredLayout`] and the default cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            provider: None,
            cache: ViewCache::default(),
        }
    }

    /// Uses a custom layout provider instead of [`LayeredLayout`].
    #[must_use]
    pub fn with_provider(mut self, provider: Box<dyn LayoutProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Sets how many views are memoized. Zero disables memoization.
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache = ViewCache::new(capacity);
        self
    }

    /// Returns the memo.
    #[must_use]
    pub fn cache(&self) -> &ViewCache {
        &self.cache
    }

    /// Rebuilds the view for `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns an error if a resource name is duplicated within its kind or
    /// the inputs cannot be hashed.
    pub fn rebuild(
        &self,
        snapshot: &ProjectSnapshot,
        build: &GraphBuildConfig,
        layout: &LayoutConfig,
        sizes: &NodeSizes,
    ) -> Result<Arc<PipelineView>, GraphError> {
        let layered;
        let provider: &dyn LayoutProvider = if let Some(provider) = &self.provider {
            provider.as_ref()
        } else {
            layered = LayeredLayout::from_config(layout);
            &layered
        };

        let key = content_hash(&RebuildInputs {
            snapshot,
            build,
            layout,
            sizes,
            provider: provider.name(),
        })?;
        if let Some(view) = self.cache.get(&key) {
            debug!(input_hash = %key, "Reusing memoized view");
            return Ok(view);
        }

        let mut timings = PhaseTimings::new();

        let timer = SpanTimer::start("relations");
        let relations = Relations::build(snapshot)?;
        timings.record(timer);

        let timer = SpanTimer::start("graph");
        let colors = WarehouseColors::assign(&snapshot.warehouses, &build.warehouse_colors);
        let graph = GraphBuilder::new(&snapshot.stages, &snapshot.warehouses)
            .with_filter(&build.filter)
            .with_colors(&colors)
            .build();
        timings.record(timer);

        let timer = SpanTimer::start("stack");
        let mut anchors = build.stacked_after.clone();
        if build.auto_stack {
            for suggestion in
                suggest_stack_points(&graph, &snapshot.warehouses, build.auto_stack_depth)
            {
                if !anchors.contains(&suggestion) {
                    anchors.push(suggestion);
                }
            }
        }
        let stacked = stack(&anchors, graph);
        timings.record(timer);

        let timer = SpanTimer::start("layout");
        let positioned = layout_graph(&stacked.graph, provider, layout, sizes);
        timings.record(timer);

        let view = Arc::new(PipelineView::assemble(
            key.clone(),
            positioned,
            stacked.stacked_nodes,
            relations.to_view(),
        ));
        info!(
            input_hash = %key,
            revision = %view.revision,
            nodes = view.nodes.len(),
            edges = view.edges.len(),
            stacked = view.stacked.len(),
            provider = provider.name(),
            duration_ms = timings.total_ms(),
            "Rebuilt pipeline view"
        );

        self.cache.insert(key, Arc::clone(&view));
        Ok(view)
    }

    /// Rebuilds with a build configuration derived from `preferences`.
    ///
    /// Suggested stack points are written into `preferences` on the first
    /// render with auto-stacking enabled, so they can later be unstacked like
    /// any other anchor.
    ///
    /// # Errors
    ///
    /// Same as [`rebuild`](Self::rebuild).
    pub fn rebuild_with_preferences(
        &self,
        snapshot: &ProjectSnapshot,
        preferences: &mut Preferences,
        layout: &LayoutConfig,
        sizes: &NodeSizes,
    ) -> Result<Arc<PipelineView>, GraphError> {
        let seeded = preferences.seed_auto_stack(&snapshot.stages, &snapshot.warehouses);
        if !seeded.is_empty() {
            debug!(anchors = ?seeded, "Seeded suggested stack points");
        }
        let build =
            GraphBuildConfig::from_preferences(preferences, &snapshot.stages, &snapshot.warehouses);
        self.rebuild(snapshot, &build, layout, sizes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutInput, LayoutPositions, Point, RankDir};
    use crate::model::{Stage, Warehouse};

    struct Diagonal;

    impl LayoutProvider for Diagonal {
        fn name(&self) -> &str {
            "diagonal"
        }

        fn layout(&self, input: &LayoutInput, _direction: RankDir) -> LayoutPositions {
            LayoutPositions {
                points: (0..input.len())
                    .map(|i| Point::new(i as f64 * 10.0, i as f64 * 10.0))
                    .collect(),
            }
        }
    }

    fn snapshot() -> ProjectSnapshot {
        ProjectSnapshot::new(vec![Stage::new("solo")], vec![Warehouse::new("w")], Vec::new())
    }

    #[test]
    fn test_memoizes_identical_inputs() {
        let engine = PipelineEngine::new();
        let snapshot = snapshot();
        let config = GraphBuildConfig::new();

        let first = engine
            .rebuild(&snapshot, &config, &LayoutConfig::new(), &NodeSizes::new())
            .unwrap();
        let second = engine
            .rebuild(&snapshot, &config, &LayoutConfig::new(), &NodeSizes::new())
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(engine.cache().len(), 1);
    }

    #[test]
    fn test_changed_inputs_rebuild() {
        let engine = PipelineEngine::new();
        let snapshot = snapshot();

        let lr = engine
            .rebuild(&snapshot, &GraphBuildConfig::new(), &LayoutConfig::new(), &NodeSizes::new())
            .unwrap();
        let tb = engine
            .rebuild(
                &snapshot,
                &GraphBuildConfig::new(),
                &LayoutConfig::new().with_rank_dir(RankDir::TopBottom),
                &NodeSizes::new(),
            )
            .unwrap();

        assert_ne!(lr.input_hash, tb.input_hash);
        assert_ne!(lr.revision, tb.revision);
        assert_eq!(tb.direction, RankDir::TopBottom);
    }

    #[test]
    fn test_custom_provider() {
        let engine = PipelineEngine::new()
            .with_provider(Box::new(Diagonal))
            .with_cache_capacity(0);
        let snapshot = snapshot();

        let view = engine
            .rebuild(&snapshot, &GraphBuildConfig::new(), &LayoutConfig::new(), &NodeSizes::new())
            .unwrap();

        assert_eq!(view.nodes[0].position, Point::new(0.0, 0.0));
        assert_eq!(view.nodes[1].position, Point::new(10.0, 10.0));
        assert!(engine.cache().is_empty());
    }

    #[test]
    fn test_duplicate_stage_is_error() {
        let engine = PipelineEngine::new();
        let snapshot =
            ProjectSnapshot::new(vec![Stage::new("a"), Stage::new("a")], Vec::new(), Vec::new());

        let err = engine
            .rebuild(&snapshot, &GraphBuildConfig::new(), &LayoutConfig::new(), &NodeSizes::new())
            .unwrap_err();

        assert!(matches!(err, GraphError::DuplicateResource(_)));
    }
}
