//! Rebuild loop driven by a snapshot source.

use super::source::SnapshotSource;
use super::token::CancellationToken;
use crate::config::{GraphBuildConfig, LayoutConfig};
use crate::engine::{PipelineEngine, PipelineView};
use crate::layout::NodeSizes;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Why a watcher stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum StopReason {
    /// The token was cancelled.
    Cancelled(Option<String>),
    /// The source ran out of snapshots.
    SourceClosed,
    /// The source reported an error.
    SourceFailed(String),
}

/// Counters of one watcher run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchSummary {
    /// Snapshots turned into views.
    pub rebuilds: usize,
    /// Snapshots that failed to rebuild.
    pub failures: usize,
    /// Why the loop ended.
    pub stop: StopReason,
}

/// Publishes a fresh [`PipelineView`] for every snapshot received.
///
/// Subscribers read the latest view from a `tokio::sync::watch` channel. A
/// snapshot that fails to rebuild is logged and the previous view stays
/// published. Cancellation is only observed between snapshots.
#[derive(Debug)]
pub struct PipelineWatcher {
    engine: Arc<PipelineEngine>,
    build: GraphBuildConfig,
    layout: LayoutConfig,
    sizes: NodeSizes,
    tx: watch::Sender<Option<Arc<PipelineView>>>,
}

impl PipelineWatcher {
    /// Creates a watcher and the receiver its views are published on.
    #[must_use]
    pub fn new(
        engine: Arc<PipelineEngine>,
        build: GraphBuildConfig,
        layout: LayoutConfig,
        sizes: NodeSizes,
    ) -> (Self, watch::Receiver<Option<Arc<PipelineView>>>) {
        let (tx, rx) = watch::channel(None);
        (
            Self {
                engine,
                build,
                layout,
                sizes,
                tx,
            },
            rx,
        )
    }

    /// Returns another receiver of published views.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<PipelineView>>> {
        self.tx.subscribe()
    }

    /// Runs until the source closes or fails, or `token` is cancelled.
    pub async fn run<S>(self, mut source: S, token: Arc<CancellationToken>) -> WatchSummary
    where
        S: SnapshotSource,
    {
        let mut rebuilds = 0;
        let mut failures = 0;

        let stop = loop {
            let next = tokio::select! {
                biased;
                () = token.cancelled() => break StopReason::Cancelled(token.reason()),
                next = source.next_snapshot() => next,
            };
            let snapshot = match next {
                Ok(Some(snapshot)) => snapshot,
                Ok(None) => break StopReason::SourceClosed,
                Err(err) => {
                    warn!(error = %err, "Snapshot source failed");
                    break StopReason::SourceFailed(err.to_string());
                }
            };

            match self
                .engine
                .rebuild(&snapshot, &self.build, &self.layout, &self.sizes)
            {
                Ok(view) => {
                    debug!(revision = %view.revision, "Publishing pipeline view");
                    self.tx.send_replace(Some(view));
                    rebuilds += 1;
                }
                Err(err) => {
                    warn!(error = %err, "Skipping snapshot that failed to rebuild");
                    failures += 1;
                }
            }
        };

        info!(rebuilds, failures, stop = ?stop, "Pipeline watcher stopped");
        WatchSummary {
            rebuilds,
            failures,
            stop,
        }
    }

    /// Runs the watcher on the tokio runtime.
    pub fn spawn<S>(self, source: S, token: Arc<CancellationToken>) -> JoinHandle<WatchSummary>
    where
        S: SnapshotSource + 'static,
    {
        tokio::spawn(self.run(source, token))
    }
}
