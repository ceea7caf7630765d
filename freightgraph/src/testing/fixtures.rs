//! Snapshot builders for tests.

use crate::model::{
    ApprovedStage, CurrentStage, Freight, FreightCollection, FreightReference, FreightRequest,
    ProjectSnapshot, PromotionRef, RepoSubscription, Stage, VerifiedStage, Warehouse,
};
use crate::utils::Timestamp;

/// Builds a [`Stage`] request by request.
#[derive(Debug, Clone)]
pub struct StageFixture {
    stage: Stage,
}

impl StageFixture {
    /// Starts a stage with no requests and no promotion steps.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            stage: Stage::new(name),
        }
    }

    /// Sets the uid.
    #[must_use]
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.stage.uid = uid.into();
        self
    }

    /// Requests freight from `warehouse` directly.
    #[must_use]
    pub fn direct(mut self, warehouse: &str) -> Self {
        self.stage
            .spec
            .requested_freight
            .push(FreightRequest::from_warehouse(warehouse).direct());
        self
    }

    /// Requests freight from `warehouse` via `upstream`.
    #[must_use]
    pub fn from_stage(mut self, warehouse: &str, upstream: &str) -> Self {
        self.stage
            .spec
            .requested_freight
            .push(FreightRequest::from_warehouse(warehouse).from_stage(upstream));
        self
    }

    /// Requests freight from `warehouse` via `upstream` after `soak`.
    #[must_use]
    pub fn soaked_from(mut self, warehouse: &str, upstream: &str, soak: &str) -> Self {
        self.stage.spec.requested_freight.push(
            FreightRequest::from_warehouse(warehouse)
                .from_stage(upstream)
                .with_required_soak_time(soak),
        );
        self
    }

    /// Adds a raw request.
    #[must_use]
    pub fn request(mut self, request: FreightRequest) -> Self {
        self.stage.spec.requested_freight.push(request);
        self
    }

    /// Adds a promotion step, making the stage a regular one.
    #[must_use]
    pub fn with_step(mut self, uses: &str) -> Self {
        self.stage
            .spec
            .promotion_steps
            .push(serde_json::json!({ "uses": uses }));
        self
    }

    /// Enables auto-promotion.
    #[must_use]
    pub fn auto_promote(mut self) -> Self {
        self.stage.status.auto_promotion_enabled = true;
        self
    }

    /// Records `freight` from `warehouse` as current.
    #[must_use]
    pub fn holding(mut self, freight: &str, warehouse: &str) -> Self {
        let reference = FreightReference::new(freight, warehouse);
        match self.stage.status.freight_history.first_mut() {
            Some(current) => {
                current.items.insert(reference.origin.key(), reference);
            }
            None => self
                .stage
                .status
                .freight_history
                .push(FreightCollection::of([reference])),
        }
        self
    }

    /// Marks a promotion as in flight.
    #[must_use]
    pub fn promoting(mut self, promotion: &str) -> Self {
        self.stage.status.current_promotion = Some(PromotionRef {
            name: promotion.to_string(),
            ..Default::default()
        });
        self
    }

    /// Returns the stage.
    #[must_use]
    pub fn build(self) -> Stage {
        self.stage
    }
}

/// Builds a [`Freight`] and its status.
#[derive(Debug, Clone)]
pub struct FreightFixture {
    freight: Freight,
}

impl FreightFixture {
    /// Starts freight produced by `warehouse`.
    #[must_use]
    pub fn new(name: impl Into<String>, warehouse: impl Into<String>) -> Self {
        Self {
            freight: Freight::new(name, warehouse),
        }
    }

    /// Marks it verified in `stage`.
    #[must_use]
    pub fn verified_in(mut self, stage: &str) -> Self {
        self.freight
            .status
            .verified_in
            .insert(stage.to_string(), VerifiedStage::default());
        self
    }

    /// Marks it verified in `stage` with a recorded longest soak.
    #[must_use]
    pub fn soaked_in(mut self, stage: &str, longest_soak: &str) -> Self {
        self.freight.status.verified_in.insert(
            stage.to_string(),
            VerifiedStage {
                verified_at: None,
                longest_soak: Some(longest_soak.to_string()),
            },
        );
        self
    }

    /// Marks it approved for `stage`.
    #[must_use]
    pub fn approved_for(mut self, stage: &str) -> Self {
        self.freight
            .status
            .approved_for
            .insert(stage.to_string(), ApprovedStage::default());
        self
    }

    /// Marks it current in `stage` since `since`.
    #[must_use]
    pub fn current_in(mut self, stage: &str, since: Timestamp) -> Self {
        self.freight
            .status
            .currently_in
            .insert(stage.to_string(), CurrentStage { since: Some(since) });
        self
    }

    /// Sets the alias.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.freight.alias = Some(alias.into());
        self
    }

    /// Returns the freight.
    #[must_use]
    pub fn build(self) -> Freight {
        self.freight
    }
}

/// Builds a whole [`ProjectSnapshot`].
#[derive(Debug, Clone, Default)]
pub struct SnapshotFixture {
    snapshot: ProjectSnapshot,
}

impl SnapshotFixture {
    /// Starts an empty project.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a warehouse subscribed to the given image repositories.
    #[must_use]
    pub fn warehouse(mut self, name: &str, images: &[&str]) -> Self {
        let mut warehouse = Warehouse::new(name);
        warehouse.spec.subscriptions = images.iter().map(|url| RepoSubscription::image(*url)).collect();
        self.snapshot.warehouses.push(warehouse);
        self
    }

    /// Adds a prepared warehouse.
    #[must_use]
    pub fn with_warehouse(mut self, warehouse: Warehouse) -> Self {
        self.snapshot.warehouses.push(warehouse);
        self
    }

    /// Adds a stage.
    #[must_use]
    pub fn stage(mut self, stage: StageFixture) -> Self {
        self.snapshot.stages.push(stage.build());
        self
    }

    /// Adds freight.
    #[must_use]
    pub fn freight(mut self, freight: FreightFixture) -> Self {
        self.snapshot.freight.push(freight.build());
        self
    }

    /// Adds a linear chain `prefix0 -> prefix1 -> ...` fed by `warehouse`.
    #[must_use]
    pub fn chain(mut self, warehouse: &str, prefix: &str, len: usize) -> Self {
        for i in 0..len {
            let stage = StageFixture::new(format!("{prefix}{i}"));
            let stage = if i == 0 {
                stage.direct(warehouse)
            } else {
                stage.from_stage(warehouse, &format!("{prefix}{}", i - 1))
            };
            self.snapshot.stages.push(stage.build());
        }
        self
    }

    /// Returns the snapshot.
    #[must_use]
    pub fn build(self) -> ProjectSnapshot {
        self.snapshot
    }
}
