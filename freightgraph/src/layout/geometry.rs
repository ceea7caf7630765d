//! Points, sizes and per-node size overrides.

use crate::graph::GraphNode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A point in layout space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A box size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Width.
    #[serde(rename = "w")]
    pub width: f64,
    /// Height.
    #[serde(rename = "h")]
    pub height: f64,
}

impl Size {
    /// Creates a size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Returns true if both dimensions are finite and positive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Default box sizes per node kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KindSizes {
    /// Warehouse boxes.
    #[serde(default = "default_warehouse_size")]
    pub warehouse: Size,
    /// Subscription boxes.
    #[serde(default = "default_subscription_size")]
    pub subscription: Size,
    /// Stage boxes.
    #[serde(default = "default_stage_size")]
    pub stage: Size,
    /// Stacked group boxes.
    #[serde(default = "default_stacked_size")]
    pub stacked_group: Size,
}

fn default_warehouse_size() -> Size {
    Size::new(250.0, 110.0)
}

fn default_subscription_size() -> Size {
    Size::new(250.0, 80.0)
}

fn default_stage_size() -> Size {
    Size::new(300.0, 160.0)
}

fn default_stacked_size() -> Size {
    Size::new(180.0, 60.0)
}

impl Default for KindSizes {
    fn default() -> Self {
        Self {
            warehouse: default_warehouse_size(),
            subscription: default_subscription_size(),
            stage: default_stage_size(),
            stacked_group: default_stacked_size(),
        }
    }
}

impl KindSizes {
    /// Returns the default size for a kind label.
    #[must_use]
    pub fn for_label(&self, label: &str) -> Option<Size> {
        match label {
            "warehouse" => Some(self.warehouse),
            "subscription" => Some(self.subscription),
            "stage" => Some(self.stage),
            "stacked_group" => Some(self.stacked_group),
            _ => None,
        }
    }
}

/// Measured sizes supplied by the presentation layer.
///
/// Lookups go by node id first, then by kind label. Invalid sizes are
/// ignored so the kind default applies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSizes {
    /// Sizes by node id.
    #[serde(default)]
    pub by_id: BTreeMap<String, Size>,
    /// Sizes by kind label.
    #[serde(default)]
    pub by_kind: BTreeMap<String, Size>,
}

impl NodeSizes {
    /// Creates an empty set of overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the size of one node.
    #[must_use]
    pub fn with_node(mut self, id: impl Into<String>, size: Size) -> Self {
        self.by_id.insert(id.into(), size);
        self
    }

    /// Sets the size of every node of a kind.
    #[must_use]
    pub fn with_kind(mut self, label: impl Into<String>, size: Size) -> Self {
        self.by_kind.insert(label.into(), size);
        self
    }

    /// Resolves the size of a node.
    #[must_use]
    pub fn resolve(&self, node: &GraphNode, defaults: &KindSizes) -> Size {
        let label = node.kind.label();
        self.by_id
            .get(&node.id)
            .or_else(|| self.by_kind.get(label))
            .copied()
            .filter(Size::is_valid)
            .or_else(|| defaults.for_label(label))
            .unwrap_or_else(default_stage_size)
    }
}
