//! Stable node identifiers.
//!
//! Every id carries a kind prefix so consumers can branch on the node kind
//! without looking the resource up again.

use crate::model::{RepoSubscription, Stage, Warehouse};
use std::collections::HashSet;
use std::fmt;

/// Prefix of warehouse node ids.
pub const WAREHOUSE_PREFIX: &str = "warehouse/";
/// Prefix of subscription node ids.
pub const SUBSCRIPTION_PREFIX: &str = "subscription/";
/// Prefix of stage node ids.
pub const STAGE_PREFIX: &str = "stage/";
/// Prefix of stacked group node ids.
pub const STACKED_PREFIX: &str = "stacked/";

/// Resources that map to a graph node id.
pub trait Indexed {
    /// Returns the node id for this resource.
    fn node_id(&self) -> String;
}

impl Indexed for Warehouse {
    fn node_id(&self) -> String {
        scoped_id(WAREHOUSE_PREFIX, &self.uid, &self.name)
    }
}

impl Indexed for Stage {
    fn node_id(&self) -> String {
        scoped_id(STAGE_PREFIX, &self.uid, &self.name)
    }
}

fn scoped_id(prefix: &str, uid: &str, name: &str) -> String {
    if uid.is_empty() {
        format!("{prefix}{name}")
    } else {
        format!("{prefix}{uid}/{name}")
    }
}

/// Returns the id of one subscription of a warehouse.
///
/// The key is the repository URL, or `name:kind` when no URL is set. Use
/// [`subscription_ids`] when a warehouse may list the same key twice.
#[must_use]
pub fn subscription_id(warehouse: &Warehouse, subscription: &RepoSubscription) -> String {
    format!(
        "{SUBSCRIPTION_PREFIX}{}/{}",
        owner_key(warehouse),
        subscription_key(subscription)
    )
}

/// Returns ids for every subscription of a warehouse, unique within it.
///
/// Repeated keys get a `#n` suffix in declaration order.
#[must_use]
pub fn subscription_ids(warehouse: &Warehouse) -> Vec<String> {
    let mut seen = HashSet::new();
    warehouse
        .spec
        .subscriptions
        .iter()
        .map(|sub| {
            let base = subscription_id(warehouse, sub);
            let mut id = base.clone();
            let mut n = 1;
            while !seen.insert(id.clone()) {
                id = format!("{base}#{n}");
                n += 1;
            }
            id
        })
        .collect()
}

fn owner_key(warehouse: &Warehouse) -> String {
    warehouse
        .node_id()
        .trim_start_matches(WAREHOUSE_PREFIX)
        .to_string()
}

fn subscription_key(subscription: &RepoSubscription) -> String {
    match subscription.repo_url() {
        Some(url) => url.to_string(),
        None => format!("{}:{}", subscription.display_name(), subscription.kind()),
    }
}

/// Returns the id of the stacked group anchored at `anchor_id`.
#[must_use]
pub fn stacked_id(anchor_id: &str) -> String {
    format!("{STACKED_PREFIX}{anchor_id}")
}

/// The kind encoded in a node id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeIdKind {
    /// A warehouse id.
    Warehouse,
    /// A subscription id.
    Subscription,
    /// A stage id.
    Stage,
    /// A stacked group id.
    Stacked,
}

impl NodeIdKind {
    /// Recognizes the kind of an id, if it carries a known prefix.
    #[must_use]
    pub fn of(id: &str) -> Option<Self> {
        if id.starts_with(WAREHOUSE_PREFIX) {
            Some(Self::Warehouse)
        } else if id.starts_with(SUBSCRIPTION_PREFIX) {
            Some(Self::Subscription)
        } else if id.starts_with(STAGE_PREFIX) {
            Some(Self::Stage)
        } else if id.starts_with(STACKED_PREFIX) {
            Some(Self::Stacked)
        } else {
            None
        }
    }
}

impl fmt::Display for NodeIdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warehouse => write!(f, "warehouse"),
            Self::Subscription => write!(f, "subscription"),
            Self::Stage => write!(f, "stage"),
            Self::Stacked => write!(f, "stacked"),
        }
    }
}

/// Returns true if `id` is a warehouse id.
#[must_use]
pub fn is_warehouse_id(id: &str) -> bool {
    NodeIdKind::of(id) == Some(NodeIdKind::Warehouse)
}

/// Returns true if `id` is a subscription id.
#[must_use]
pub fn is_subscription_id(id: &str) -> bool {
    NodeIdKind::of(id) == Some(NodeIdKind::Subscription)
}

/// Returns true if `id` is a stage id.
#[must_use]
pub fn is_stage_id(id: &str) -> bool {
    NodeIdKind::of(id) == Some(NodeIdKind::Stage)
}

/// Returns true if `id` is a stacked group id.
#[must_use]
pub fn is_stacked_id(id: &str) -> bool {
    NodeIdKind::of(id) == Some(NodeIdKind::Stacked)
}
