//! # Freightgraph
//!
//! A pipeline graph engine for freight promotion.
//!
//! Freightgraph turns a project's Warehouses, Stages and Freight into a
//! laid-out directed graph and answers promotion questions about it:
//!
//! - **Graph construction**: stable node ids, derived relations and filters
//! - **Layout**: rank-based layered layout behind a pluggable provider
//! - **Stacking**: collapse long pipelines into counter nodes
//! - **Promotion**: eligibility, soak time and the interactive action flow
//! - **Watching**: rebuild on every new snapshot with cooperative cancellation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use freightgraph::prelude::*;
//!
//! let engine = PipelineEngine::new();
//! let build = GraphBuildConfig::new().with_stack_after("stage/uat");
//! let view = engine.rebuild(&snapshot, &build, &LayoutConfig::new(), &NodeSizes::new())?;
//!
//! for node in &view.nodes {
//!     println!("{} at {:?}", node.id, node.position);
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod engine;
pub mod errors;
pub mod graph;
pub mod layout;
pub mod model;
pub mod observability;
pub mod promotion;
pub mod stacking;
pub mod testing;
pub mod utils;
pub mod watch;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{
        GraphBuildConfig, InMemoryPreferenceStore, JsonFilePreferenceStore, LayoutConfig,
        PreferenceStore, Preferences,
    };
    pub use crate::engine::{PipelineEngine, PipelineView, ViewEdge, ViewNode};
    pub use crate::errors::{ActionError, GraphError};
    pub use crate::graph::{
        GraphBuilder, GraphFilter, NodeKind, PipelineGraph, Relations, WarehouseColors,
    };
    pub use crate::layout::{LayeredLayout, LayoutProvider, NodeSizes, Point, RankDir, Size};
    pub use crate::model::{Freight, FreightRequest, ProjectSnapshot, Stage, Warehouse};
    pub use crate::observability::{init_tracing, LogFormat};
    pub use crate::promotion::{
        is_eligible, ActionKind, ActionStateMachine, EligibilityReport, GraphHighlight,
        PromotionOutcome, Selection,
    };
    pub use crate::stacking::{auto_suggest_stack_points, stack, suggest_stack_points, StackedNode};
    pub use crate::utils::{format_duration, parse_duration, Timestamp};
    pub use crate::watch::{CancellationToken, PipelineWatcher, SnapshotSource};
}
