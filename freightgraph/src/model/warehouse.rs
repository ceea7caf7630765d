//! Warehouse resources and their subscriptions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named source of freight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warehouse {
    /// The project namespace.
    #[serde(default)]
    pub namespace: String,
    /// The warehouse name, unique within the project.
    pub name: String,
    /// The backend-assigned uid.
    #[serde(default)]
    pub uid: String,
    /// Desired state.
    #[serde(default)]
    pub spec: WarehouseSpec,
    /// Observed state.
    #[serde(default)]
    pub status: WarehouseStatus,
}

impl Warehouse {
    /// Creates a warehouse with no subscriptions.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Returns true if the `Ready` condition is `True`.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status.condition("Ready").is_some_and(Condition::is_true)
    }

    /// Returns true if the `Reconciling` condition is `True`.
    #[must_use]
    pub fn is_reconciling(&self) -> bool {
        self.status
            .condition("Reconciling")
            .is_some_and(Condition::is_true)
    }
}

/// Desired state of a warehouse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseSpec {
    /// Upstream repositories.
    #[serde(default)]
    pub subscriptions: Vec<RepoSubscription>,
}

/// Observed state of a warehouse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseStatus {
    /// Status conditions.
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl WarehouseStatus {
    /// Finds a condition by type.
    #[must_use]
    pub fn condition(&self, type_: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.type_ == type_)
    }
}

/// A status condition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type, e.g. "Ready".
    #[serde(rename = "type")]
    pub type_: String,
    /// "True", "False" or "Unknown".
    pub status: String,
    /// Machine-readable reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Condition {
    /// Returns true if the status is "True".
    #[must_use]
    pub fn is_true(&self) -> bool {
        self.status == "True"
    }
}

/// The kind of upstream repository a subscription watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionKind {
    /// A container image repository.
    Image,
    /// A Helm chart repository.
    Chart,
    /// A git repository.
    Git,
    /// No repository set.
    Unknown,
}

impl fmt::Display for SubscriptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Chart => write!(f, "chart"),
            Self::Git => write!(f, "git"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// One upstream repository; exactly one field is expected to be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoSubscription {
    /// Image subscription.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageSubscription>,
    /// Chart subscription.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartSubscription>,
    /// Git subscription.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitSubscription>,
}

impl RepoSubscription {
    /// Creates an image subscription.
    #[must_use]
    pub fn image(repo_url: impl Into<String>) -> Self {
        Self {
            image: Some(ImageSubscription {
                repo_url: repo_url.into(),
            }),
            ..Default::default()
        }
    }

    /// Creates a git subscription.
    #[must_use]
    pub fn git(repo_url: impl Into<String>) -> Self {
        Self {
            git: Some(GitSubscription {
                repo_url: repo_url.into(),
            }),
            ..Default::default()
        }
    }

    /// Creates a chart subscription.
    #[must_use]
    pub fn chart(repo_url: impl Into<String>, name: Option<String>) -> Self {
        Self {
            chart: Some(ChartSubscription {
                repo_url: repo_url.into(),
                name,
            }),
            ..Default::default()
        }
    }

    /// Returns which repository kind is set.
    #[must_use]
    pub fn kind(&self) -> SubscriptionKind {
        if self.image.is_some() {
            SubscriptionKind::Image
        } else if self.chart.is_some() {
            SubscriptionKind::Chart
        } else if self.git.is_some() {
            SubscriptionKind::Git
        } else {
            SubscriptionKind::Unknown
        }
    }

    /// Returns the repository URL, if one is set and non-empty.
    #[must_use]
    pub fn repo_url(&self) -> Option<&str> {
        let url = match (&self.image, &self.chart, &self.git) {
            (Some(i), _, _) => i.repo_url.as_str(),
            (_, Some(c), _) => c.repo_url.as_str(),
            (_, _, Some(g)) => g.repo_url.as_str(),
            _ => return None,
        };
        (!url.is_empty()).then_some(url)
    }

    /// Returns a display name: the chart name when present, else the URL.
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(name) = self.chart.as_ref().and_then(|c| c.name.as_deref()) {
            return name.to_string();
        }
        self.repo_url().unwrap_or_default().to_string()
    }
}

/// An image repository subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSubscription {
    /// Repository URL.
    #[serde(rename = "repoURL", default)]
    pub repo_url: String,
}

/// A chart repository subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSubscription {
    /// Repository URL.
    #[serde(rename = "repoURL", default)]
    pub repo_url: String,
    /// Chart name for classic chart repositories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A git repository subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitSubscription {
    /// Repository URL.
    #[serde(rename = "repoURL", default)]
    pub repo_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_kinds() {
        assert_eq!(RepoSubscription::image("nginx").kind(), SubscriptionKind::Image);
        assert_eq!(RepoSubscription::git("https://git").kind(), SubscriptionKind::Git);
        assert_eq!(
            RepoSubscription::chart("oci://charts", None).kind(),
            SubscriptionKind::Chart
        );
        assert_eq!(RepoSubscription::default().kind(), SubscriptionKind::Unknown);
    }

    #[test]
    fn test_repo_url_empty_is_none() {
        assert_eq!(RepoSubscription::image("").repo_url(), None);
        assert_eq!(RepoSubscription::image("nginx").repo_url(), Some("nginx"));
    }

    #[test]
    fn test_chart_display_name() {
        let sub = RepoSubscription::chart("https://charts.example.com", Some("podinfo".into()));
        assert_eq!(sub.display_name(), "podinfo");
    }

    #[test]
    fn test_warehouse_deserialize() {
        let json = r#"{
            "name": "main",
            "uid": "w-1",
            "spec": {"subscriptions": [{"image": {"repoURL": "ghcr.io/app"}}, {"git": {"repoURL": "https://github.com/x/y"}}]},
            "status": {"conditions": [{"type": "Ready", "status": "True"}]}
        }"#;
        let warehouse: Warehouse = serde_json::from_str(json).unwrap();

        assert_eq!(warehouse.spec.subscriptions.len(), 2);
        assert_eq!(warehouse.spec.subscriptions[0].repo_url(), Some("ghcr.io/app"));
        assert!(warehouse.is_healthy());
        assert!(!warehouse.is_reconciling());
    }
}
