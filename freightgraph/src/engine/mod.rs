//! Snapshot to view.
//!
//! [`PipelineEngine::rebuild`] is the single entry point: it takes a
//! [`ProjectSnapshot`](crate::model::ProjectSnapshot) plus build and layout
//! configuration and returns a shared, immutable [`PipelineView`].

mod cache;
mod rebuild;
mod view;


pub use cache::{ViewCache, DEFAULT_CACHE_CAPACITY};
pub use rebuild::PipelineEngine;
pub use view::{PipelineView, ViewEdge, ViewNode};
