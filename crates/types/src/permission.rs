//! Permission descriptors and authorization decisions.

use serde::{Deserialize, Serialize};

/// Generic permission to run any orchestrator workflow.
pub const WORKFLOW_USE_PERMISSION: &str = "orchestrator.workflow.use";

/// A permission descriptor submitted to the authorization service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl Permission {
    /// Permission to use (run or abort) any workflow.
    pub fn workflow_use() -> Self {
        Self {
            name: WORKFLOW_USE_PERMISSION.to_string(),
            action: Some("update".to_string()),
        }
    }

    /// Permission to use one specific workflow.
    pub fn workflow_use_specific(workflow_id: &str) -> Self {
        Self {
            name: format!("{WORKFLOW_USE_PERMISSION}.{workflow_id}"),
            action: Some("update".to_string()),
        }
    }

    /// Descriptor set gating abort/rerun for a workflow. The specific
    /// descriptor is only included once the workflow id is known.
    pub fn workflow_use_set(workflow_id: Option<&str>) -> Vec<Self> {
        match workflow_id {
            Some(workflow_id) => vec![Self::workflow_use(), Self::workflow_use_specific(workflow_id)],
            None => vec![Self::workflow_use()],
        }
    }
}

/// Per-descriptor result reported by the authorization service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorizeResult {
    Allow,
    Deny,
    Conditional,
}

/// Aggregated decision for a descriptor set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PermissionDecision {
    pub allowed: bool,
}

impl PermissionDecision {
    pub const DENIED: Self = Self { allowed: false };
    pub const ALLOWED: Self = Self { allowed: true };

    /// Allowed when any descriptor in the set is allowed.
    pub fn from_results(results: &[AuthorizeResult]) -> Self {
        Self {
            allowed: results.iter().any(|result| *result == AuthorizeResult::Allow),
        }
    }
}
