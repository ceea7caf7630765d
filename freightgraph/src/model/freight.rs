//! Freight resources.

use super::FreightOrigin;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An immutable bundle of artifact references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Freight {
    /// Content-addressed name.
    pub name: String,
    /// Human-friendly alias.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// The warehouse that produced this freight.
    #[serde(default)]
    pub origin: FreightOrigin,
    /// Image references.
    #[serde(default)]
    pub images: Vec<Image>,
    /// Chart references.
    #[serde(default)]
    pub charts: Vec<Chart>,
    /// Git commit references.
    #[serde(default)]
    pub commits: Vec<GitCommit>,
    /// Relationship to stages.
    #[serde(default)]
    pub status: FreightStatus,
}

impl Freight {
    /// Creates freight originating from a warehouse.
    #[must_use]
    pub fn new(name: impl Into<String>, warehouse: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            origin: FreightOrigin::warehouse(warehouse),
            ..Default::default()
        }
    }

    /// Returns the alias if set, else the name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Returns true if verified in the given stage.
    #[must_use]
    pub fn is_verified_in(&self, stage: &str) -> bool {
        self.status.verified_in.contains_key(stage)
    }

    /// Returns true if manually approved for the given stage.
    #[must_use]
    pub fn is_approved_for(&self, stage: &str) -> bool {
        self.status.approved_for.contains_key(stage)
    }

    /// Returns when this freight became current in the given stage.
    #[must_use]
    pub fn current_since(&self, stage: &str) -> Option<DateTime<Utc>> {
        self.status.currently_in.get(stage).and_then(|c| c.since)
    }
}

/// Where a piece of freight is, has been verified, or has been approved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreightStatus {
    /// Stages this freight is currently in.
    #[serde(default)]
    pub currently_in: BTreeMap<String, CurrentStage>,
    /// Stages this freight has been verified in.
    #[serde(default)]
    pub verified_in: BTreeMap<String, VerifiedStage>,
    /// Stages this freight has been manually approved for.
    #[serde(default)]
    pub approved_for: BTreeMap<String, ApprovedStage>,
}

/// Freight presence in a stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentStage {
    /// When the freight became current.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<DateTime<Utc>>,
}

/// Freight verification record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedStage {
    /// When verification succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
    /// Longest continuous time spent in the stage (Go duration string).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longest_soak: Option<String>,
}

/// Freight approval record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovedStage {
    /// When the approval was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
}

/// An image reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    /// Repository URL.
    #[serde(rename = "repoURL", default)]
    pub repo_url: String,
    /// Tag.
    #[serde(default)]
    pub tag: String,
    /// Digest.
    #[serde(default)]
    pub digest: String,
}

/// A chart reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    /// Repository URL.
    #[serde(rename = "repoURL", default)]
    pub repo_url: String,
    /// Chart name.
    #[serde(default)]
    pub name: String,
    /// Chart version.
    #[serde(default)]
    pub version: String,
}

/// A git commit reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitCommit {
    /// Repository URL.
    #[serde(rename = "repoURL", default)]
    pub repo_url: String,
    /// Commit id.
    #[serde(default)]
    pub id: String,
    /// Branch, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Tag, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Commit message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
