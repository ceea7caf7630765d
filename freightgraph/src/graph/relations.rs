//! Relations derived from raw stage, warehouse and freight lists.

use crate::errors::DuplicateResourceError;
use crate::model::{Freight, ProjectSnapshot, ResourceKind, Stage, Warehouse};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Upstream stage name to the stages that take freight from it.
pub type SubscriberMap = BTreeMap<String, BTreeSet<String>>;

/// Freight name to the stages it is currently in.
pub type FreightOccupancy = BTreeMap<String, Vec<String>>;

/// Inverts every stage's upstream-stage sources into a subscriber map.
///
/// Direct warehouse sources do not contribute. A stage naming itself as an
/// upstream source is dropped.
#[must_use]
pub fn build_subscriber_map(stages: &[Stage]) -> SubscriberMap {
    let mut subscribers = SubscriberMap::new();
    for stage in stages {
        for upstream in stage.upstream_stages() {
            if upstream == stage.name {
                debug!(stage = %stage.name, "Ignoring self-referencing freight source");
                continue;
            }
            subscribers
                .entry(upstream.to_string())
                .or_default()
                .insert(stage.name.clone());
        }
    }
    subscribers
}

/// Records, for each freight, the stages currently holding it.
///
/// Only the most recent freight history entry of each stage counts. Stage
/// lists are sorted and free of duplicates.
#[must_use]
pub fn build_freight_occupancy(stages: &[Stage]) -> FreightOccupancy {
    let mut occupancy: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for stage in stages {
        for freight in stage.current_freight_names() {
            occupancy
                .entry(freight.to_string())
                .or_default()
                .insert(stage.name.clone());
        }
    }
    occupancy
        .into_iter()
        .map(|(freight, stages)| (freight, stages.into_iter().collect()))
        .collect()
}

/// Returns true if any stage currently holds the freight.
#[must_use]
pub fn is_freight_in_use(occupancy: &FreightOccupancy, freight: &str) -> bool {
    occupancy.get(freight).is_some_and(|stages| !stages.is_empty())
}

/// Maps stage name to its auto-promotion flag.
#[must_use]
pub fn build_stage_auto_promotion_map(stages: &[Stage]) -> BTreeMap<String, bool> {
    stages
        .iter()
        .map(|s| (s.name.clone(), s.status.auto_promotion_enabled))
        .collect()
}

/// Indexes stages by name.
///
/// # Errors
///
/// Returns an error if two stages share a name.
pub fn build_stage_by_name(stages: &[Stage]) -> Result<HashMap<&str, &Stage>, DuplicateResourceError> {
    index_by_name(stages, ResourceKind::Stage, |s| s.name.as_str())
}

/// Indexes warehouses by name.
///
/// # Errors
///
/// Returns an error if two warehouses share a name.
pub fn build_warehouse_by_name(
    warehouses: &[Warehouse],
) -> Result<HashMap<&str, &Warehouse>, DuplicateResourceError> {
    index_by_name(warehouses, ResourceKind::Warehouse, |w| w.name.as_str())
}

/// Indexes freight by name.
///
/// # Errors
///
/// Returns an error if two freight share a name.
pub fn build_freight_by_name(freight: &[Freight]) -> Result<HashMap<&str, &Freight>, DuplicateResourceError> {
    index_by_name(freight, ResourceKind::Freight, |f| f.name.as_str())
}

fn index_by_name<'a, T>(
    items: &'a [T],
    kind: ResourceKind,
    name: impl Fn(&'a T) -> &'a str,
) -> Result<HashMap<&'a str, &'a T>, DuplicateResourceError> {
    let mut map = HashMap::with_capacity(items.len());
    for item in items {
        let key = name(item);
        if map.insert(key, item).is_some() {
            return Err(DuplicateResourceError::new(kind, key));
        }
    }
    Ok(map)
}

/// All lookup tables and derived relations for one snapshot.
#[derive(Debug, Clone)]
pub struct Relations<'a> {
    /// Upstream stage to dependent stages.
    pub subscribers: SubscriberMap,
    /// Freight to the stages holding it.
    pub occupancy: FreightOccupancy,
    /// Stage to auto-promotion flag.
    pub auto_promotion: BTreeMap<String, bool>,
    /// Stages by name.
    pub stage_by_name: HashMap<&'a str, &'a Stage>,
    /// Warehouses by name.
    pub warehouse_by_name: HashMap<&'a str, &'a Warehouse>,
    /// Freight by name.
    pub freight_by_name: HashMap<&'a str, &'a Freight>,
}

impl<'a> Relations<'a> {
    /// Builds every relation over a snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if any resource name is duplicated within its kind.
    pub fn build(snapshot: &'a ProjectSnapshot) -> Result<Self, DuplicateResourceError> {
        Ok(Self {
            subscribers: build_subscriber_map(&snapshot.stages),
            occupancy: build_freight_occupancy(&snapshot.stages),
            auto_promotion: build_stage_auto_promotion_map(&snapshot.stages),
            stage_by_name: build_stage_by_name(&snapshot.stages)?,
            warehouse_by_name: build_warehouse_by_name(&snapshot.warehouses)?,
            freight_by_name: build_freight_by_name(&snapshot.freight)?,
        })
    }

    /// Returns the stages that take freight from `stage`.
    pub fn subscribers_of(&self, stage: &str) -> impl Iterator<Item = &str> {
        self.subscribers
            .get(stage)
            .into_iter()
            .flat_map(|s| s.iter().map(String::as_str))
    }

    /// Returns an owned view for presentation.
    #[must_use]
    pub fn to_view(&self) -> RelationsView {
        RelationsView {
            subscribers_by_stage: self.subscribers.clone(),
            freight_in_stages: self.occupancy.clone(),
            auto_promotion: self.auto_promotion.clone(),
        }
    }
}

/// Derived relations handed to the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationsView {
    /// Upstream stage to dependent stages.
    pub subscribers_by_stage: SubscriberMap,
    /// Freight to the stages holding it.
    pub freight_in_stages: FreightOccupancy,
    /// Stage to auto-promotion flag.
    pub auto_promotion: BTreeMap<String, bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FreightCollection, FreightReference, FreightRequest};

    fn stage(name: &str, requests: Vec<FreightRequest>) -> Stage {
        let mut s = Stage::new(name);
        s.spec.requested_freight = requests;
        s
    }

    #[test]
    fn test_subscriber_map() {
        let stages = vec![
            stage("test", vec![FreightRequest::from_warehouse("w").direct()]),
            stage("uat", vec![FreightRequest::from_warehouse("w").from_stage("test")]),
            stage("prod", vec![FreightRequest::from_warehouse("w").from_stage("test").from_stage("uat")]),
        ];
        let map = build_subscriber_map(&stages);

        assert_eq!(map.get("test").unwrap().len(), 2);
        assert!(map.get("test").unwrap().contains("uat"));
        assert!(map.get("uat").unwrap().contains("prod"));
        // Direct sources do not appear
        assert!(!map.contains_key("w"));
    }

    #[test]
    fn test_subscriber_map_never_self_references() {
        let stages = vec![
            stage("loop", vec![FreightRequest::from_warehouse("w").from_stage("loop")]),
            stage("a", vec![FreightRequest::from_warehouse("w").from_stage("b")]),
            stage("b", vec![FreightRequest::from_warehouse("w").from_stage("a").from_stage("b")]),
        ];
        let map = build_subscriber_map(&stages);

        for (source, dependents) in &map {
            assert!(!dependents.contains(source), "{source} subscribes to itself");
        }
        assert!(!map.contains_key("loop"));
    }

    #[test]
    fn test_freight_occupancy_uses_latest_history() {
        let mut test = Stage::new("test");
        test.status.freight_history = vec![
            FreightCollection::of([FreightReference::new("new", "w")]),
            FreightCollection::of([FreightReference::new("old", "w")]),
        ];
        let mut uat = Stage::new("uat");
        uat.status.freight_history = vec![FreightCollection::of([FreightReference::new("new", "w")])];

        let occupancy = build_freight_occupancy(&[uat, test]);

        assert_eq!(occupancy.get("new").unwrap(), &vec!["test".to_string(), "uat".to_string()]);
        assert!(is_freight_in_use(&occupancy, "new"));
        assert!(!is_freight_in_use(&occupancy, "old"));
    }

    #[test]
    fn test_lookup_tables_fail_on_duplicates() {
        let stages = vec![Stage::new("a"), Stage::new("a")];
        let err = build_stage_by_name(&stages).unwrap_err();
        assert_eq!(err.kind, ResourceKind::Stage);
        assert_eq!(err.name, "a");

        let warehouses = vec![Warehouse::new("w"), Warehouse::new("x")];
        assert_eq!(build_warehouse_by_name(&warehouses).unwrap().len(), 2);
    }

    #[test]
    fn test_relations_build() {
        let mut auto = stage("test", vec![FreightRequest::from_warehouse("w").direct()]);
        auto.status.auto_promotion_enabled = true;
        let snapshot = ProjectSnapshot::new(
            vec![auto, stage("uat", vec![FreightRequest::from_warehouse("w").from_stage("test")])],
            vec![Warehouse::new("w")],
            vec![Freight::new("f1", "w")],
        );
        let relations = Relations::build(&snapshot).unwrap();

        assert_eq!(relations.subscribers_of("test").collect::<Vec<_>>(), vec!["uat"]);
        assert_eq!(relations.auto_promotion.get("test"), Some(&true));
        assert!(relations.freight_by_name.contains_key("f1"));

        let view = relations.to_view();
        assert_eq!(view.subscribers_by_stage, relations.subscribers);
    }
}
