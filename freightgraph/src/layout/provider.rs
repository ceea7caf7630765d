//! The layout provider seam.

use super::geometry::{Point, Size};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction ranks advance in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RankDir {
    /// Ranks advance left to right.
    #[default]
    #[serde(rename = "LR")]
    LeftRight,
    /// Ranks advance top to bottom.
    #[serde(rename = "TB")]
    TopBottom,
}

impl RankDir {
    /// Returns true for left-to-right layouts.
    #[must_use]
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::LeftRight)
    }
}

impl fmt::Display for RankDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LeftRight => write!(f, "LR"),
            Self::TopBottom => write!(f, "TB"),
        }
    }
}

/// Nodes and edges handed to a provider.
///
/// Edges refer to nodes by their position in `sizes`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutInput {
    /// Box size of each node.
    pub sizes: Vec<Size>,
    /// Directed edges as (source, target) node positions.
    pub edges: Vec<(usize, usize)>,
}

impl LayoutInput {
    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    /// Returns true if there are no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

/// Top-left corner of each node, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutPositions {
    /// Node positions.
    pub points: Vec<Point>,
}

/// Computes node positions for a directed graph.
///
/// Implementations must be deterministic: identical input yields identical
/// positions.
pub trait LayoutProvider: Send + Sync {
    /// Returns the provider name.
    fn name(&self) -> &str;

    /// Positions every node of `input`.
    fn layout(&self, input: &LayoutInput, direction: RankDir) -> LayoutPositions;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_dir_serde() {
        assert_eq!(serde_json::to_string(&RankDir::LeftRight).unwrap(), "\"LR\"");
        let dir: RankDir = serde_json::from_str("\"TB\"").unwrap();
        assert_eq!(dir, RankDir::TopBottom);
        assert!(!dir.is_horizontal());
        assert_eq!(RankDir::default().to_string(), "LR");
    }
}
