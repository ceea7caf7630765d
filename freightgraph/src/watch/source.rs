//! Where snapshots come from.

use crate::model::ProjectSnapshot;
use async_trait::async_trait;
use futures::stream::{Stream, StreamExt};
use std::fmt;
use tokio::sync::mpsc;

/// Delivers project snapshots one at a time.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotSource: Send {
    /// Waits for the next snapshot. `Ok(None)` means the source is exhausted.
    async fn next_snapshot(&mut self) -> anyhow::Result<Option<ProjectSnapshot>>;
}

/// Snapshots pushed through a tokio channel.
#[derive(Debug)]
pub struct ChannelSource {
    rx: mpsc::Receiver<ProjectSnapshot>,
}

impl ChannelSource {
    /// Creates a bounded channel and its source end.
    #[must_use]
    pub fn channel(capacity: usize) -> (mpsc::Sender<ProjectSnapshot>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx })
    }
}

impl From<mpsc::Receiver<ProjectSnapshot>> for ChannelSource {
    fn from(rx: mpsc::Receiver<ProjectSnapshot>) -> Self {
        Self { rx }
    }
}

#[async_trait]
impl SnapshotSource for ChannelSource {
    async fn next_snapshot(&mut self) -> anyhow::Result<Option<ProjectSnapshot>> {
        Ok(self.rx.recv().await)
    }
}

/// Snapshots from any stream of fallible results.
pub struct StreamSource<S> {
    stream: S,
}

impl<S> StreamSource<S> {
    /// Wraps a stream.
    pub fn new(stream: S) -> Self {
        Self { stream }
    }
}

impl<S> fmt::Debug for StreamSource<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSource").finish_non_exhaustive()
    }
}

#[async_trait]
impl<S> SnapshotSource for StreamSource<S>
where
    S: Stream<Item = anyhow::Result<ProjectSnapshot>> + Send + Unpin,
{
    async fn next_snapshot(&mut self) -> anyhow::Result<Option<ProjectSnapshot>> {
        self.stream.next().await.transpose()
    }
}
