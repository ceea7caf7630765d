//! Promotion eligibility.
//!
//! Every function here is pure: the answer depends only on the arguments.

use super::soak::{serialize_soak_map, soak_time_remaining_for};
use crate::model::{Freight, FreightOriginKind, Stage};
use crate::utils::Timestamp;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The promotion actions a user can start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    /// Promote freight into a stage.
    Promote,
    /// Promote freight from a stage into all of its subscribers.
    PromoteDownstream,
    /// Approve freight for a stage, bypassing verification.
    ManualApprove,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Promote => write!(f, "promote"),
            Self::PromoteDownstream => write!(f, "promote_downstream"),
            Self::ManualApprove => write!(f, "manual_approve"),
        }
    }
}

/// Returns true if `freight` may be used for `kind` at `stage`.
///
/// - `Promote`: `stage` is the target. The freight must be verified in an
///   upstream stage the target takes its origin from, be approved for the
///   target, or come from an origin the target takes directly.
/// - `PromoteDownstream`: `stage` initiates. The freight must be verified in
///   it; the subscribers' own requirements do not matter.
/// - `ManualApprove`: always eligible.
#[must_use]
pub fn is_eligible(freight: &Freight, stage: &Stage, kind: ActionKind) -> bool {
    match kind {
        ActionKind::Promote => {
            if freight.is_approved_for(&stage.name) {
                return true;
            }
            if freight.origin.kind != FreightOriginKind::Warehouse {
                return false;
            }
            stage.requests_for(&freight.origin.name).any(|request| {
                request.sources.direct
                    || request
                        .sources
                        .stages
                        .iter()
                        .any(|upstream| freight.is_verified_in(upstream))
            })
        }
        ActionKind::PromoteDownstream => freight.is_verified_in(&stage.name),
        ActionKind::ManualApprove => true,
    }
}

/// Returns true if promoting `freight` into `stage` needs an explicit
/// approval first.
#[must_use]
pub fn requires_manual_approval(freight: &Freight, stage: &Stage) -> bool {
    !is_eligible(freight, stage, ActionKind::Promote)
}

/// Eligibility and remaining soak time of every freight for one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityReport {
    /// The action evaluated.
    pub action: ActionKind,
    /// The target or initiating stage.
    pub stage: String,
    /// Freight name to eligibility.
    pub eligibility: BTreeMap<String, bool>,
    /// Freight name to remaining soak; `None` when fully soaked.
    #[serde(serialize_with = "serialize_soak_map")]
    pub soak_time: BTreeMap<String, Option<Duration>>,
}

impl EligibilityReport {
    /// Evaluates every freight for `kind` at `stage`.
    ///
    /// Soak time is only computed for `Promote`; other actions report `None`.
    #[must_use]
    pub fn compute(kind: ActionKind, stage: &Stage, freight: &[Freight], now: Timestamp) -> Self {
        let eligibility = freight
            .iter()
            .map(|f| (f.name.clone(), is_eligible(f, stage, kind)))
            .collect();
        let soak_time = freight
            .iter()
            .map(|f| {
                let remaining = match kind {
                    ActionKind::Promote => soak_time_remaining_for(f, stage, now),
                    ActionKind::PromoteDownstream | ActionKind::ManualApprove => None,
                };
                (f.name.clone(), remaining)
            })
            .collect();
        Self {
            action: kind,
            stage: stage.name.clone(),
            eligibility,
            soak_time,
        }
    }

    /// Returns the eligible freight names.
    pub fn eligible(&self) -> impl Iterator<Item = &str> {
        self.eligibility
            .iter()
            .filter(|(_, ok)| **ok)
            .map(|(name, _)| name.as_str())
    }

    /// Returns true if the named freight is eligible.
    #[must_use]
    pub fn is_eligible(&self, freight: &str) -> bool {
        self.eligibility.get(freight).copied().unwrap_or(false)
    }
}
