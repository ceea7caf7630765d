//! The promotion selection state machine.

use super::eligibility::{is_eligible, ActionKind};
use crate::errors::ActionError;
use crate::model::{Freight, ProjectSnapshot, Stage};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// What the user has selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum Selection {
    /// Nothing selected.
    #[default]
    Idle,
    /// Picking freight to promote into `stage`.
    Promoting {
        /// Target stage.
        stage: String,
    },
    /// Picking freight to promote from `stage` into its subscribers.
    PromotingDownstream {
        /// Initiating stage.
        stage: String,
    },
    /// Picking a stage to approve `freight` for.
    ManuallyApproving {
        /// Freight to approve.
        freight: String,
    },
    /// Waiting for the result of the chosen action.
    Confirming {
        /// Target, initiating or approved stage.
        stage: String,
        /// Chosen freight.
        freight: String,
        /// The action being confirmed.
        action: ActionKind,
    },
}

impl Selection {
    /// Returns the stage this selection refers to, if any.
    #[must_use]
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::Promoting { stage }
            | Self::PromotingDownstream { stage }
            | Self::Confirming { stage, .. } => Some(stage),
            Self::Idle | Self::ManuallyApproving { .. } => None,
        }
    }

    /// Returns the freight this selection refers to, if any.
    #[must_use]
    pub fn freight(&self) -> Option<&str> {
        match self {
            Self::ManuallyApproving { freight } | Self::Confirming { freight, .. } => Some(freight),
            Self::Idle | Self::Promoting { .. } | Self::PromotingDownstream { .. } => None,
        }
    }

    /// Returns the action in progress, if any.
    #[must_use]
    pub fn action(&self) -> Option<ActionKind> {
        match self {
            Self::Idle => None,
            Self::Promoting { .. } => Some(ActionKind::Promote),
            Self::PromotingDownstream { .. } => Some(ActionKind::PromoteDownstream),
            Self::ManuallyApproving { .. } => Some(ActionKind::ManualApprove),
            Self::Confirming { action, .. } => Some(*action),
        }
    }

    /// Returns true if nothing is selected.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Result of the promote or approve call made for a confirmed selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromotionOutcome {
    /// The call succeeded.
    Success,
    /// The call failed with a reason.
    Failure(String),
}

/// Drives [`Selection`] through user actions.
///
/// The machine only reads stages and freight; it never changes the graph.
#[derive(Debug, Clone, Default)]
pub struct ActionStateMachine {
    selection: Selection,
}

impl ActionStateMachine {
    /// Creates an idle machine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a machine resuming a selection.
    #[must_use]
    pub fn with_selection(selection: Selection) -> Self {
        Self { selection }
    }

    /// Returns the current selection.
    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Starts promoting into `stage`; selecting it again cancels.
    pub fn select_promote(&mut self, stage: &str) -> &Selection {
        self.toggle_stage_action(ActionKind::Promote, stage, |stage| Selection::Promoting {
            stage,
        })
    }

    /// Starts promoting downstream of `stage`; selecting it again cancels.
    pub fn select_promote_downstream(&mut self, stage: &str) -> &Selection {
        self.toggle_stage_action(ActionKind::PromoteDownstream, stage, |stage| {
            Selection::PromotingDownstream { stage }
        })
    }

    /// Starts approving `freight`; selecting it again cancels.
    pub fn select_manual_approval(&mut self, freight: &str) -> &Selection {
        let active = matches!(
            &self.selection,
            Selection::ManuallyApproving { freight: f } if f == freight
        ) || matches!(
            &self.selection,
            Selection::Confirming { freight: f, action: ActionKind::ManualApprove, .. } if f == freight
        );
        self.transition(if active {
            Selection::Idle
        } else {
            Selection::ManuallyApproving {
                freight: freight.to_string(),
            }
        })
    }

    /// Picks the freight for an active promotion.
    ///
    /// `stage` must be the stage the promotion was started on. Returns false
    /// and leaves the selection unchanged if no promotion is active for it or
    /// the freight is not eligible.
    pub fn select_freight(&mut self, freight: &Freight, stage: &Stage) -> bool {
        let action = match &self.selection {
            Selection::Promoting { stage: s } if *s == stage.name => ActionKind::Promote,
            Selection::PromotingDownstream { stage: s } if *s == stage.name => {
                ActionKind::PromoteDownstream
            }
            _ => return false,
        };
        if !is_eligible(freight, stage, action) {
            debug!(
                freight = %freight.name,
                stage = %stage.name,
                action = %action,
                "Ignoring ineligible freight selection"
            );
            return false;
        }
        self.transition(Selection::Confirming {
            stage: stage.name.clone(),
            freight: freight.name.clone(),
            action,
        });
        true
    }

    /// Picks the stage to approve the selected freight for.
    ///
    /// Returns false unless freight is being approved.
    pub fn select_approval_target(&mut self, stage: &str) -> bool {
        let Selection::ManuallyApproving { freight } = &self.selection else {
            return false;
        };
        let next = Selection::Confirming {
            stage: stage.to_string(),
            freight: freight.clone(),
            action: ActionKind::ManualApprove,
        };
        self.transition(next);
        true
    }

    /// Clears the selection.
    pub fn cancel(&mut self) {
        self.transition(Selection::Idle);
    }

    /// Applies the result of the confirmed action.
    ///
    /// Success clears the selection. Failure keeps it so the call can be
    /// retried.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::PromotionFailed`] on failure and
    /// [`ActionError::NotConfirming`] if nothing awaited a result.
    pub fn complete(&mut self, outcome: PromotionOutcome) -> Result<(), ActionError> {
        let Selection::Confirming { stage, freight, action } = &self.selection else {
            return Err(ActionError::NotConfirming);
        };
        match outcome {
            PromotionOutcome::Success => {
                info!(stage = %stage, freight = %freight, action = %action, "Promotion action succeeded");
                self.transition(Selection::Idle);
                Ok(())
            }
            PromotionOutcome::Failure(reason) => {
                Err(ActionError::promotion_failed(stage.clone(), freight.clone(), reason))
            }
        }
    }

    /// Resets to idle if the selected stage or freight left the snapshot.
    ///
    /// Returns true if the selection was reset.
    pub fn reconcile(&mut self, snapshot: &ProjectSnapshot) -> bool {
        let stage_gone = self.selection.stage().is_some_and(|s| !snapshot.has_stage(s));
        let freight_gone = self
            .selection
            .freight()
            .is_some_and(|f| !snapshot.has_freight(f));
        if stage_gone || freight_gone {
            debug!(selection = ?self.selection, "Selection no longer in snapshot, resetting");
            self.transition(Selection::Idle);
            return true;
        }
        false
    }

    fn toggle_stage_action(
        &mut self,
        action: ActionKind,
        stage: &str,
        select: fn(String) -> Selection,
    ) -> &Selection {
        let active = self.selection.action() == Some(action) && self.selection.stage() == Some(stage);
        self.transition(if active {
            Selection::Idle
        } else {
            select(stage.to_string())
        })
    }

    fn transition(&mut self, next: Selection) -> &Selection {
        if self.selection != next {
            debug!(from = ?self.selection, to = ?next, "Selection changed");
        }
        self.selection = next;
        &self.selection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FreightRequest, VerifiedStage};

    fn downstream_pair() -> (Stage, Stage, Freight) {
        let mut b = Stage::new("B");
        b.spec.requested_freight = vec![FreightRequest::from_warehouse("W").direct()];
        let mut c = Stage::new("C");
        c.spec.requested_freight = vec![FreightRequest::from_warehouse("W").from_stage("B")];
        let mut f = Freight::new("F", "W");
        f.status.verified_in.insert("B".into(), VerifiedStage::default());
        (b, c, f)
    }

    #[test]
    fn test_promote_flow() {
        let (_, c, f) = downstream_pair();
        let mut machine = ActionStateMachine::new();

        machine.select_promote("C");
        assert!(machine.select_freight(&f, &c));
        assert_eq!(
            machine.selection(),
            &Selection::Confirming {
                stage: "C".into(),
                freight: "F".into(),
                action: ActionKind::Promote
            }
        );

        machine.complete(PromotionOutcome::Success).unwrap();
        assert!(machine.selection().is_idle());
    }

    #[test]
    fn test_reselect_toggles_off() {
        let mut machine = ActionStateMachine::new();
        machine.select_promote("C");
        assert!(machine.select_promote("C").is_idle());

        machine.select_promote("C");
        // Switching action or stage does not toggle
        assert_eq!(
            machine.select_promote_downstream("C"),
            &Selection::PromotingDownstream { stage: "C".into() }
        );
        assert_eq!(
            machine.select_promote("B"),
            &Selection::Promoting { stage: "B".into() }
        );

        machine.select_manual_approval("F");
        assert!(machine.select_manual_approval("F").is_idle());
    }

    #[test]
    fn test_switching_action_on_same_stage() {
        let mut machine = ActionStateMachine::new();

        machine.select_promote_downstream("B");
        assert_eq!(
            machine.selection(),
            &Selection::PromotingDownstream { stage: "B".into() }
        );

        machine.select_promote("B");
        assert_eq!(machine.selection(), &Selection::Promoting { stage: "B".into() });

        machine.select_promote_downstream("B");
        assert_eq!(
            machine.selection(),
            &Selection::PromotingDownstream { stage: "B".into() }
        );
    }

    #[test]
    fn test_ineligible_freight_is_noop() {
        let (b, c, _) = downstream_pair();
        let unverified = Freight::new("G", "W");
        let mut machine = ActionStateMachine::new();

        machine.select_promote("C");
        assert!(!machine.select_freight(&unverified, &c));
        assert_eq!(machine.selection(), &Selection::Promoting { stage: "C".into() });

        // Freight for a stage other than the active one is refused too
        assert!(!machine.select_freight(&unverified, &b));
    }

    #[test]
    fn test_promote_downstream_requires_verification_in_source() {
        let (b, c, f) = downstream_pair();
        let mut machine = ActionStateMachine::new();

        machine.select_promote_downstream("C");
        assert!(!machine.select_freight(&f, &c));

        machine.select_promote_downstream("B");
        assert!(machine.select_freight(&f, &b));
        assert_eq!(machine.selection().action(), Some(ActionKind::PromoteDownstream));
    }

    #[test]
    fn test_failure_keeps_confirming() {
        let (_, c, f) = downstream_pair();
        let mut machine = ActionStateMachine::new();
        machine.select_promote("C");
        machine.select_freight(&f, &c);

        let err = machine
            .complete(PromotionOutcome::Failure("forbidden".into()))
            .unwrap_err();
        assert_eq!(err, ActionError::promotion_failed("C", "F", "forbidden"));
        assert!(matches!(machine.selection(), Selection::Confirming { .. }));

        // Retry succeeds
        assert!(machine.complete(PromotionOutcome::Success).is_ok());
        assert_eq!(machine.complete(PromotionOutcome::Success), Err(ActionError::NotConfirming));
    }

    #[test]
    fn test_manual_approval_flow() {
        let mut machine = ActionStateMachine::new();
        assert!(!machine.select_approval_target("C"));

        machine.select_manual_approval("F");
        assert!(machine.select_approval_target("C"));
        assert_eq!(machine.selection().action(), Some(ActionKind::ManualApprove));
        assert_eq!(machine.selection().stage(), Some("C"));

        machine.cancel();
        assert!(machine.selection().is_idle());
    }

    #[test]
    fn test_reconcile_resets_on_vanished_resources() {
        let (b, c, f) = downstream_pair();
        let snapshot = ProjectSnapshot::new(vec![b.clone(), c], vec![], vec![f.clone()]);

        let mut machine = ActionStateMachine::with_selection(Selection::Confirming {
            stage: "C".into(),
            freight: "F".into(),
            action: ActionKind::Promote,
        });
        assert!(!machine.reconcile(&snapshot));

        let shrunk = ProjectSnapshot::new(vec![b], vec![], vec![f]);
        assert!(machine.reconcile(&shrunk));
        assert!(machine.selection().is_idle());
    }

    #[test]
    fn test_selection_serializes_tagged() {
        let json = serde_json::to_value(Selection::Promoting { stage: "C".into() }).unwrap();
        assert_eq!(json, serde_json::json!({"state": "promoting", "stage": "C"}));
    }
}
