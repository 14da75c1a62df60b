//! Workflow instance records as reported by the orchestrator backend.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value};

/// Placeholder shown when a detail field cannot be computed.
pub const VALUE_UNAVAILABLE: &str = "unavailable";

/// Lifecycle status of a workflow instance.
///
/// Unrecognized wire values (for example `Suspended`) map to [`InstanceStatus::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstanceStatus {
    Pending,
    Active,
    Completed,
    Aborted,
    Error,
    #[serde(other)]
    Unknown,
}

impl InstanceStatus {
    /// Every status, in wire declaration order.
    pub const ALL: [InstanceStatus; 6] = [
        InstanceStatus::Pending,
        InstanceStatus::Active,
        InstanceStatus::Completed,
        InstanceStatus::Aborted,
        InstanceStatus::Error,
        InstanceStatus::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Active => "Active",
            Self::Completed => "Completed",
            Self::Aborted => "Aborted",
            Self::Error => "Error",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow category advertised by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowCategory {
    Infrastructure,
    Assessment,
}

impl fmt::Display for WorkflowCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Infrastructure => f.write_str("Infrastructure"),
            Self::Assessment => f.write_str("Assessment"),
        }
    }
}

/// Error payload attached to a failed instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// A single node visited by the workflow runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInstance {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub node_type: Option<String>,
    #[serde(default)]
    pub enter: Option<DateTime<Utc>>,
    #[serde(default)]
    pub exit: Option<DateTime<Utc>>,
    #[serde(default)]
    pub definition_id: Option<String>,
}

/// Raw instance record mirrored from the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessInstance {
    /// Instance identifier.
    pub id: String,
    /// Identifier of the workflow definition this instance runs.
    pub process_id: String,
    /// Human-readable workflow name.
    #[serde(default)]
    pub process_name: Option<String>,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    /// Status; absent while the backend has not reported one yet.
    #[serde(default)]
    pub state: Option<InstanceStatus>,
    #[serde(default)]
    pub error: Option<InstanceError>,
    /// Free-form variable bag produced by the workflow.
    #[serde(default)]
    pub workflowdata: Option<JsonMap<String, Value>>,
    #[serde(default)]
    pub business_key: Option<String>,
    #[serde(default)]
    pub category: Option<WorkflowCategory>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub nodes: Vec<NodeInstance>,
}

impl ProcessInstance {
    /// Minimal record carrying only the identifiers.
    pub fn new(id: impl Into<String>, process_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            process_id: process_id.into(),
            process_name: None,
            start: None,
            end: None,
            state: None,
            error: None,
            workflowdata: None,
            business_key: None,
            category: None,
            description: None,
            nodes: Vec::new(),
        }
    }
}

/// An instance together with the assessment run that recommended it, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessedInstance {
    pub instance: ProcessInstance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessed_by: Option<ProcessInstance>,
}

impl From<ProcessInstance> for AssessedInstance {
    fn from(instance: ProcessInstance) -> Self {
        Self {
            instance,
            assessed_by: None,
        }
    }
}

/// Display-ready projection of a [`ProcessInstance`].
///
/// Always derived from a record; never edited on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailView {
    pub id: String,
    pub process_name: String,
    pub workflow_id: String,
    pub start: String,
    pub duration: String,
    pub category: Option<WorkflowCategory>,
    pub state: Option<InstanceStatus>,
    pub description: Option<String>,
    pub business_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_assessed_instance_from_backend_json() {
        let payload = json!({
            "instance": {
                "id": "abc",
                "processId": "greeting",
                "processName": "Greeting workflow",
                "start": "2024-01-01T00:00:00Z",
                "state": "Active",
                "businessKey": "bk-1",
                "category": "INFRASTRUCTURE",
                "workflowdata": { "result": { "completedWith": "success" }, "language": "en" },
                "nodes": [{ "id": "n1", "name": "Start", "type": "StartNode", "enter": "2024-01-01T00:00:00Z" }]
            },
            "assessedBy": { "id": "assess-1", "processId": "assessment" }
        });

        let assessed: AssessedInstance = serde_json::from_value(payload).expect("deserialize instance");
        assert_eq!(assessed.instance.id, "abc");
        assert_eq!(assessed.instance.state, Some(InstanceStatus::Active));
        assert_eq!(assessed.instance.category, Some(WorkflowCategory::Infrastructure));
        assert_eq!(assessed.instance.business_key.as_deref(), Some("bk-1"));
        assert_eq!(assessed.instance.nodes.len(), 1);
        assert_eq!(assessed.instance.nodes[0].node_type.as_deref(), Some("StartNode"));
        assert!(assessed.instance.end.is_none());
        assert_eq!(assessed.assessed_by.map(|instance| instance.id), Some("assess-1".to_string()));
    }

    #[test]
    fn unrecognized_status_maps_to_unknown() {
        let status: InstanceStatus = serde_json::from_value(json!("Suspended")).expect("deserialize status");
        assert_eq!(status, InstanceStatus::Unknown);
    }

    #[test]
    fn missing_state_is_none() {
        let instance: ProcessInstance = serde_json::from_value(json!({ "id": "x", "processId": "p" })).expect("deserialize");
        assert!(instance.state.is_none());
        assert!(instance.nodes.is_empty());
    }
}
