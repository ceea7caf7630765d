//! Node-exclusion filters applied before graph construction.

use crate::model::{FreightOriginKind, Stage, Warehouse};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Names of stages and warehouses the graph builder must not create.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphFilter {
    /// Stage names to exclude.
    #[serde(default)]
    pub ignored_stages: BTreeSet<String>,
    /// Warehouse names to exclude.
    #[serde(default)]
    pub ignored_warehouses: BTreeSet<String>,
}

impl GraphFilter {
    /// Creates a filter that excludes nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Excludes a stage.
    #[must_use]
    pub fn ignore_stage(mut self, name: impl Into<String>) -> Self {
        self.ignored_stages.insert(name.into());
        self
    }

    /// Excludes a warehouse.
    #[must_use]
    pub fn ignore_warehouse(mut self, name: impl Into<String>) -> Self {
        self.ignored_warehouses.insert(name.into());
        self
    }

    /// Keeps only the pipeline fed by one warehouse.
    ///
    /// Every other warehouse is excluded, as is every stage that freight from
    /// `warehouse` cannot reach by following direct and upstream-stage sources.
    #[must_use]
    pub fn only_warehouse(warehouse: &str, stages: &[Stage], warehouses: &[Warehouse]) -> Self {
        let ignored_warehouses = warehouses
            .iter()
            .filter(|w| w.name != warehouse)
            .map(|w| w.name.clone())
            .collect();

        let mut reachable: BTreeSet<&str> = stages
            .iter()
            .filter(|s| s.requests_for(warehouse).any(|r| r.sources.direct))
            .map(|s| s.name.as_str())
            .collect();
        loop {
            let before = reachable.len();
            for stage in stages {
                let fed = stage
                    .requests_for(warehouse)
                    .flat_map(|r| r.sources.stages.iter())
                    .any(|up| reachable.contains(up.as_str()));
                if fed {
                    reachable.insert(stage.name.as_str());
                }
            }
            if reachable.len() == before {
                break;
            }
        }

        let ignored_stages = stages
            .iter()
            .filter(|s| !reachable.contains(s.name.as_str()))
            .map(|s| s.name.clone())
            .collect();
        Self {
            ignored_stages,
            ignored_warehouses,
        }
    }

    /// Hides warehouses and the stages fed only by them.
    ///
    /// Stages without any request are kept.
    #[must_use]
    pub fn hide_warehouses<'a>(
        hidden: impl IntoIterator<Item = &'a String>,
        stages: &[Stage],
    ) -> Self {
        let ignored_warehouses: BTreeSet<String> = hidden.into_iter().cloned().collect();
        let ignored_stages = stages
            .iter()
            .filter(|s| {
                let requests = &s.spec.requested_freight;
                !requests.is_empty()
                    && requests.iter().all(|r| {
                        r.origin.kind == FreightOriginKind::Warehouse
                            && ignored_warehouses.contains(&r.origin.name)
                    })
            })
            .map(|s| s.name.clone())
            .collect();
        Self {
            ignored_stages,
            ignored_warehouses,
        }
    }

    /// Combines two filters, excluding what either excludes.
    #[must_use]
    pub fn union(mut self, other: Self) -> Self {
        self.ignored_stages.extend(other.ignored_stages);
        self.ignored_warehouses.extend(other.ignored_warehouses);
        self
    }

    /// Returns true if the stage is excluded.
    #[must_use]
    pub fn is_stage_ignored(&self, stage: &Stage) -> bool {
        self.ignored_stages.contains(&stage.name)
    }

    /// Returns true if the warehouse is excluded.
    #[must_use]
    pub fn is_warehouse_ignored(&self, warehouse: &Warehouse) -> bool {
        self.ignored_warehouses.contains(&warehouse.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FreightRequest;

    fn stage(name: &str, origins: &[&str]) -> Stage {
        let mut s = Stage::new(name);
        s.spec.requested_freight = origins
            .iter()
            .map(|o| FreightRequest::from_warehouse(*o).direct())
            .collect();
        s
    }

    #[test]
    fn test_only_warehouse() {
        let stages = vec![stage("a", &["w1"]), stage("b", &["w2"]), stage("c", &["w1", "w2"])];
        let warehouses = vec![Warehouse::new("w1"), Warehouse::new("w2")];

        let filter = GraphFilter::only_warehouse("w1", &stages, &warehouses);

        assert!(!filter.is_stage_ignored(&stages[0]));
        assert!(filter.is_stage_ignored(&stages[1]));
        assert!(!filter.is_stage_ignored(&stages[2]));
        assert!(filter.is_warehouse_ignored(&warehouses[1]));
        assert!(!filter.is_warehouse_ignored(&warehouses[0]));
    }

    #[test]
    fn test_only_warehouse_follows_upstream_stages() {
        let mut uat = Stage::new("uat");
        uat.spec.requested_freight = vec![FreightRequest::from_warehouse("w1").from_stage("test")];
        let mut prod = Stage::new("prod");
        prod.spec.requested_freight = vec![FreightRequest::from_warehouse("w1").from_stage("uat")];
        let mut orphan = Stage::new("orphan");
        orphan.spec.requested_freight =
            vec![FreightRequest::from_warehouse("w1").from_stage("missing")];
        // Declared out of order on purpose
        let stages = vec![prod, uat, stage("test", &["w1"]), orphan];

        let filter = GraphFilter::only_warehouse("w1", &stages, &[Warehouse::new("w1")]);

        assert_eq!(filter.ignored_stages.iter().collect::<Vec<_>>(), vec!["orphan"]);
    }

    #[test]
    fn test_hide_warehouses() {
        let stages = vec![stage("a", &["w1"]), stage("c", &["w1", "w2"]), stage("empty", &[])];
        let hidden = vec!["w1".to_string()];

        let filter = GraphFilter::hide_warehouses(&hidden, &stages);

        assert!(filter.is_stage_ignored(&stages[0]));
        assert!(!filter.is_stage_ignored(&stages[1]));
        assert!(!filter.is_stage_ignored(&stages[2]));
    }

    #[test]
    fn test_union() {
        let filter = GraphFilter::new()
            .ignore_stage("a")
            .union(GraphFilter::new().ignore_stage("b").ignore_warehouse("w"));

        assert_eq!(filter.ignored_stages.len(), 2);
        assert!(filter.ignored_warehouses.contains("w"));
    }
}
