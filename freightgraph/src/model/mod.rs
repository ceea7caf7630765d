//! Resource snapshots consumed by the graph engine.
//!
//! These mirror the backend's JSON shapes (camelCase keys). Unknown fields are
//! ignored and absent collections default to empty, so partially populated
//! snapshots still deserialize.

mod freight;
mod stage;
mod warehouse;

pub use freight::{
    ApprovedStage, Chart, CurrentStage, Freight, FreightStatus, GitCommit, Image, VerifiedStage,
};
pub use stage::{
    FreightCollection, FreightOrigin, FreightOriginKind, FreightReference, FreightRequest,
    FreightSources, PromotionRef, Stage, StageSpec, StageStatus, VerificationInfo,
};
pub use warehouse::{
    ChartSubscription, Condition, GitSubscription, ImageSubscription, RepoSubscription,
    SubscriptionKind, Warehouse, WarehouseSpec, WarehouseStatus,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kinds of resource the engine indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// A freight source.
    Warehouse,
    /// An upstream repository attached to a warehouse.
    Subscription,
    /// A promotion target.
    Stage,
    /// A bundle of artifact references.
    Freight,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warehouse => write!(f, "warehouse"),
            Self::Subscription => write!(f, "subscription"),
            Self::Stage => write!(f, "stage"),
            Self::Freight => write!(f, "freight"),
        }
    }
}

/// One authoritative snapshot of a project's resources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    /// All stages in the project.
    #[serde(default)]
    pub stages: Vec<Stage>,
    /// All warehouses in the project.
    #[serde(default)]
    pub warehouses: Vec<Warehouse>,
    /// All freight known to the project.
    #[serde(default)]
    pub freight: Vec<Freight>,
}

impl ProjectSnapshot {
    /// Creates a snapshot from its parts.
    #[must_use]
    pub fn new(stages: Vec<Stage>, warehouses: Vec<Warehouse>, freight: Vec<Freight>) -> Self {
        Self {
            stages,
            warehouses,
            freight,
        }
    }

    /// Returns true if a stage with this name exists.
    #[must_use]
    pub fn has_stage(&self, name: &str) -> bool {
        self.stages.iter().any(|s| s.name == name)
    }

    /// Returns true if a freight with this name exists.
    #[must_use]
    pub fn has_freight(&self, name: &str) -> bool {
        self.freight.iter().any(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_kind_display() {
        assert_eq!(ResourceKind::Warehouse.to_string(), "warehouse");
        assert_eq!(ResourceKind::Subscription.to_string(), "subscription");
        assert_eq!(ResourceKind::Stage.to_string(), "stage");
        assert_eq!(ResourceKind::Freight.to_string(), "freight");
    }

    #[test]
    fn test_snapshot_deserialize_partial() {
        let json = r#"{"stages": [{"name": "test"}], "freight": []}"#;
        let snapshot: ProjectSnapshot = serde_json::from_str(json).unwrap();

        assert!(snapshot.has_stage("test"));
        assert!(!snapshot.has_stage("prod"));
        assert!(snapshot.warehouses.is_empty());
    }
}
