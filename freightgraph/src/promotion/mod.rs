//! Promotion rules and the interactive promotion flow.
//!
//! - [`is_eligible`] and [`EligibilityReport`] decide which freight may move
//! - soak helpers report how long freight must still sit in a stage
//! - [`ActionStateMachine`] tracks the user's selection through an action
//! - [`GraphHighlight`] turns that selection into node and edge emphasis

mod action;
mod eligibility;
mod highlight;
mod soak;

pub use action::{ActionStateMachine, PromotionOutcome, Selection};
pub use eligibility::{is_eligible, requires_manual_approval, ActionKind, EligibilityReport};
pub use highlight::{EdgeMode, GraphHighlight, NodeMode};
pub use soak::{
    required_soak_time, soak_time_remaining, soak_time_remaining_for, try_required_soak_time,
    SoakBreakdown,
};
