//! Error types for the pipeline graph engine.
//!
//! Dangling references, missing node sizes and stale stack anchors are not
//! errors; they are skipped or defaulted where they are encountered. The types
//! here cover the conditions that must fail loudly.

use crate::model::ResourceKind;
use crate::utils::DurationError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for graph engine operations.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Two resources of the same kind share a name.
    #[error("{0}")]
    DuplicateResource(#[from] DuplicateResourceError),

    /// A soak duration could not be parsed.
    #[error("{0}")]
    InvalidDuration(#[from] DurationError),

    /// Loading or saving preferences failed.
    #[error("Preference store error: {0}")]
    Preferences(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Metadata about an error for better diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ErrorInfo {
    /// Error code (e.g., "GRAPH-001-DUPLICATE").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl ErrorInfo {
    /// Creates a new error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
            context: HashMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("code".to_string(), serde_json::json!(self.code));
        map.insert("summary".to_string(), serde_json::json!(self.summary));
        if let Some(ref hint) = self.fix_hint {
            map.insert("fix_hint".to_string(), serde_json::json!(hint));
        }
        if !self.context.is_empty() {
            map.insert("context".to_string(), serde_json::json!(self.context));
        }
        map
    }
}

/// Error raised when a lookup table would silently overwrite an entry.
#[derive(Debug, Clone, Error)]
#[error("Duplicate {kind} '{name}' in snapshot")]
pub struct DuplicateResourceError {
    /// The resource kind.
    pub kind: ResourceKind,
    /// The duplicated name.
    pub name: String,
    /// Diagnostic info.
    pub error_info: ErrorInfo,
}

impl DuplicateResourceError {
    /// Creates a new duplicate resource error.
    #[must_use]
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        let name = name.into();
        let info = ErrorInfo::new(
            "GRAPH-001-DUPLICATE",
            format!("{kind} '{name}' appears more than once"),
        )
        .with_fix_hint("Scope every snapshot to a single project namespace before building.")
        .with_context_entry("kind", kind.to_string())
        .with_context_entry("name", name.clone());

        Self {
            kind,
            name,
            error_info: info,
        }
    }
}

/// Errors surfaced by the promotion action state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// The promotion or approval call failed; the selection is kept for retry.
    #[error("Promotion of freight '{freight}' to stage '{stage}' failed: {reason}")]
    PromotionFailed {
        /// Target stage.
        stage: String,
        /// Selected freight.
        freight: String,
        /// Failure reason reported by the caller.
        reason: String,
    },

    /// An outcome was reported while nothing was awaiting confirmation.
    #[error("No promotion is awaiting confirmation")]
    NotConfirming,
}

impl ActionError {
    /// Creates a promotion failed error.
    #[must_use]
    pub fn promotion_failed(
        stage: impl Into<String>,
        freight: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::PromotionFailed {
            stage: stage.into(),
            freight: freight.into(),
            reason: reason.into(),
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        match self {
            Self::PromotionFailed { stage, freight, reason } => {
                map.insert("type".to_string(), serde_json::json!("PromotionFailed"));
                map.insert("stage".to_string(), serde_json::json!(stage));
                map.insert("freight".to_string(), serde_json::json!(freight));
                map.insert("reason".to_string(), serde_json::json!(reason));
            }
            Self::NotConfirming => {
                map.insert("type".to_string(), serde_json::json!("NotConfirming"));
            }
        }
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}
