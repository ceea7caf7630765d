//! Continuous rebuilds from an external snapshot feed.
//!
//! A [`PipelineWatcher`] pulls snapshots from a [`SnapshotSource`], rebuilds
//! each one through a shared [`PipelineEngine`](crate::engine::PipelineEngine)
//! and publishes the result on a `tokio::sync::watch` channel until its
//! [`CancellationToken`] fires.

mod source;
mod token;
mod watcher;

pub use source::{ChannelSource, SnapshotSource, StreamSource};
pub use token::{CancelCallback, CancellationToken};
pub use watcher::{PipelineWatcher, StopReason, WatchSummary};
