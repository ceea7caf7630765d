//! Stage resources and their freight requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named promotion target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    /// The project namespace.
    #[serde(default)]
    pub namespace: String,
    /// The stage name, unique within the project.
    pub name: String,
    /// The backend-assigned uid.
    #[serde(default)]
    pub uid: String,
    /// Desired state.
    #[serde(default)]
    pub spec: StageSpec,
    /// Observed state.
    #[serde(default)]
    pub status: StageStatus,
}

impl Stage {
    /// Creates a stage with an empty spec and status.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Returns true when the stage has no promotion steps and only passes
    /// freight through.
    #[must_use]
    pub fn is_control_flow(&self) -> bool {
        self.spec.promotion_steps.is_empty()
    }

    /// Returns the most recent freight collection, if any.
    #[must_use]
    pub fn current_freight(&self) -> Option<&FreightCollection> {
        self.status.freight_history.first()
    }

    /// Returns the names of freight currently in this stage.
    pub fn current_freight_names(&self) -> impl Iterator<Item = &str> {
        self.current_freight()
            .into_iter()
            .flat_map(|c| c.items.values())
            .map(|r| r.name.as_str())
    }

    /// Returns the requests whose origin is the given warehouse.
    pub fn requests_for<'a>(&'a self, warehouse: &'a str) -> impl Iterator<Item = &'a FreightRequest> {
        self.spec
            .requested_freight
            .iter()
            .filter(move |r| r.origin.name == warehouse)
    }

    /// Returns every upstream stage named by any request, in declaration order.
    pub fn upstream_stages(&self) -> impl Iterator<Item = &str> {
        self.spec
            .requested_freight
            .iter()
            .flat_map(|r| r.sources.stages.iter())
            .map(String::as_str)
    }
}

/// Desired state of a stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageSpec {
    /// Freight this stage accepts, one entry per origin.
    #[serde(default)]
    pub requested_freight: Vec<FreightRequest>,
    /// Promotion steps; opaque to the graph engine.
    #[serde(default)]
    pub promotion_steps: Vec<serde_json::Value>,
}

/// A request for freight from one origin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreightRequest {
    /// Where the freight originates.
    pub origin: FreightOrigin,
    /// Where the stage may obtain it from.
    #[serde(default)]
    pub sources: FreightSources,
}

impl FreightRequest {
    /// Creates a request for freight from a warehouse.
    #[must_use]
    pub fn from_warehouse(warehouse: impl Into<String>) -> Self {
        Self {
            origin: FreightOrigin::warehouse(warehouse),
            sources: FreightSources::default(),
        }
    }

    /// Accepts freight directly from the origin.
    #[must_use]
    pub fn direct(mut self) -> Self {
        self.sources.direct = true;
        self
    }

    /// Accepts freight verified in an upstream stage.
    #[must_use]
    pub fn from_stage(mut self, stage: impl Into<String>) -> Self {
        self.sources.stages.push(stage.into());
        self
    }

    /// Sets the required soak time (Go duration string, e.g. "30m").
    #[must_use]
    pub fn with_required_soak_time(mut self, soak: impl Into<String>) -> Self {
        self.sources.required_soak_time = Some(soak.into());
        self
    }
}

/// The kind of resource freight originates from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FreightOriginKind {
    /// A warehouse.
    #[default]
    Warehouse,
    /// Any kind this engine does not know about.
    #[serde(other)]
    Unknown,
}

/// A reference to the origin of freight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreightOrigin {
    /// Origin kind.
    #[serde(default)]
    pub kind: FreightOriginKind,
    /// Origin name.
    pub name: String,
}

impl FreightOrigin {
    /// Creates a warehouse origin.
    #[must_use]
    pub fn warehouse(name: impl Into<String>) -> Self {
        Self {
            kind: FreightOriginKind::Warehouse,
            name: name.into(),
        }
    }

    /// Returns the key the backend uses for freight history items.
    #[must_use]
    pub fn key(&self) -> String {
        match self.kind {
            FreightOriginKind::Warehouse => format!("Warehouse/{}", self.name),
            FreightOriginKind::Unknown => self.name.clone(),
        }
    }
}

/// Where a stage may take requested freight from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreightSources {
    /// Accept freight straight from the origin.
    #[serde(default)]
    pub direct: bool,
    /// Accept freight verified in these upstream stages.
    #[serde(default)]
    pub stages: Vec<String>,
    /// How long freight must have been in an upstream stage first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_soak_time: Option<String>,
}

/// Observed state of a stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageStatus {
    /// The promotion in flight, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_promotion: Option<PromotionRef>,
    /// The most recently finished promotion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_promotion: Option<PromotionRef>,
    /// Freight collections, most recent first.
    #[serde(default)]
    pub freight_history: Vec<FreightCollection>,
    /// Whether freight is promoted into this stage automatically.
    #[serde(default)]
    pub auto_promotion_enabled: bool,
}

/// A reference to a promotion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionRef {
    /// Promotion name.
    pub name: String,
    /// The freight being promoted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freight: Option<FreightReference>,
    /// When the promotion finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// A set of freight, one per origin, that was current in a stage together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreightCollection {
    /// Collection id.
    #[serde(default)]
    pub id: String,
    /// Freight keyed by origin key (e.g. "Warehouse/main").
    #[serde(default)]
    pub items: BTreeMap<String, FreightReference>,
    /// Verification attempts for this collection.
    #[serde(default)]
    pub verification_history: Vec<VerificationInfo>,
}

impl FreightCollection {
    /// Creates a collection from freight references.
    #[must_use]
    pub fn of(refs: impl IntoIterator<Item = FreightReference>) -> Self {
        Self {
            items: refs.into_iter().map(|r| (r.origin.key(), r)).collect(),
            ..Default::default()
        }
    }
}

/// A reference to a piece of freight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreightReference {
    /// Freight name.
    pub name: String,
    /// Freight origin.
    #[serde(default)]
    pub origin: FreightOrigin,
}

impl FreightReference {
    /// Creates a reference to freight from a warehouse.
    #[must_use]
    pub fn new(name: impl Into<String>, warehouse: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            origin: FreightOrigin::warehouse(warehouse),
        }
    }
}

/// A single verification attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationInfo {
    /// Verification id.
    #[serde(default)]
    pub id: String,
    /// Phase reported by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    /// Start time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    /// Finish time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_time: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_deserialize_backend_shape() {
        let json = r#"{
            "namespace": "demo",
            "name": "uat",
            "uid": "1234",
            "spec": {
                "requestedFreight": [
                    {"origin": {"kind": "Warehouse", "name": "main"},
                     "sources": {"direct": false, "stages": ["test"], "requiredSoakTime": "30m"}}
                ],
                "promotionSteps": [{"uses": "git-clone"}]
            },
            "status": {
                "freightHistory": [
                    {"items": {"Warehouse/main": {"name": "abc", "origin": {"kind": "Warehouse", "name": "main"}}}}
                ],
                "autoPromotionEnabled": true
            }
        }"#;
        let stage: Stage = serde_json::from_str(json).unwrap();

        assert_eq!(stage.name, "uat");
        assert!(!stage.is_control_flow());
        assert!(stage.status.auto_promotion_enabled);
        assert_eq!(stage.upstream_stages().collect::<Vec<_>>(), vec!["test"]);
        assert_eq!(stage.current_freight_names().collect::<Vec<_>>(), vec!["abc"]);
        assert_eq!(
            stage.spec.requested_freight[0].sources.required_soak_time.as_deref(),
            Some("30m")
        );
    }

    #[test]
    fn test_unknown_origin_kind() {
        let origin: FreightOrigin =
            serde_json::from_str(r#"{"kind": "Bucket", "name": "x"}"#).unwrap();
        assert_eq!(origin.kind, FreightOriginKind::Unknown);
        assert_eq!(origin.key(), "x");
    }

    #[test]
    fn test_control_flow_stage() {
        let stage = Stage::new("gate");
        assert!(stage.is_control_flow());
        assert!(stage.current_freight().is_none());
    }

    #[test]
    fn test_request_builder() {
        let request = FreightRequest::from_warehouse("main")
            .direct()
            .from_stage("test")
            .with_required_soak_time("1h");

        assert!(request.sources.direct);
        assert_eq!(request.sources.stages, vec!["test".to_string()]);
        assert_eq!(request.origin.key(), "Warehouse/main");
    }
}
