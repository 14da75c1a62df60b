//! Plain-text rendering of instance details for the terminal.

use std::fmt::Display;

use orca_engine::{ErrorInfo, PollState};
use orca_types::{AssessedInstance, DetailView, InstanceError, VALUE_UNAVAILABLE};
use serde_json::{Map as JsonMap, Value};

const LABEL_WIDTH: usize = 14;

fn or_unavailable<T: Display>(value: Option<T>) -> String {
    value.map(|value| value.to_string()).unwrap_or_else(|| VALUE_UNAVAILABLE.to_string())
}

fn field(out: &mut String, label: &str, value: impl Display) {
    out.push_str(&format!("{:<width$}{value}\n", format!("{label}:"), width = LABEL_WIDTH));
}

/// Multi-line summary used by `orca instance show`.
pub fn details_block(
    details: &DetailView,
    error: Option<&InstanceError>,
    assessed_by: Option<&str>,
    variables: Option<&JsonMap<String, Value>>,
) -> String {
    let mut out = String::new();
    field(&mut out, "Workflow", &details.workflow_id);
    field(&mut out, "Name", &details.process_name);
    field(&mut out, "Instance", &details.id);
    field(&mut out, "Status", or_unavailable(details.state));
    field(&mut out, "Category", or_unavailable(details.category));
    field(&mut out, "Started", &details.start);
    field(&mut out, "Duration", &details.duration);
    field(&mut out, "Business key", or_unavailable(details.business_key.as_deref()));
    field(&mut out, "Description", or_unavailable(details.description.as_deref()));
    if let Some(assessment_id) = assessed_by {
        field(&mut out, "Assessed by", assessment_id);
    }
    if let Some(error) = error {
        field(&mut out, "Error", &error.message);
    }
    if let Some(variables) = variables.filter(|variables| !variables.is_empty()) {
        out.push_str("Variables:\n");
        for (name, value) in variables {
            out.push_str(&format!("  {name} = {value}\n"));
        }
    }
    out
}

/// One line per observed poll state, used by `orca instance watch`.
pub fn watch_line(state: &PollState<AssessedInstance>, details: Option<&DetailView>) -> String {
    if state.loading {
        return "loading...".to_string();
    }
    let mut line = match details {
        Some(details) => format!(
            "{} {} (running for {})",
            details.id,
            or_unavailable(details.state),
            details.duration
        ),
        None => "no instance".to_string(),
    };
    if let Some(ErrorInfo { message }) = &state.error {
        line.push_str(&format!(" [refresh failed: {message}]"));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use orca_types::InstanceStatus;
    use serde_json::json;

    fn details() -> DetailView {
        DetailView {
            id: "abc".into(),
            process_name: "Greeting".into(),
            workflow_id: "greeting".into(),
            start: "1/1/2024, 9:00:00 AM".into(),
            duration: "2 hours".into(),
            category: None,
            state: Some(InstanceStatus::Completed),
            description: None,
            business_key: Some("bk-1".into()),
        }
    }

    #[test]
    fn details_block_lists_fields_and_variables() {
        let variables = json!({ "name": "world" }).as_object().cloned().unwrap();
        let block = details_block(&details(), None, Some("assess-1"), Some(&variables));

        assert!(block.contains("Status:       Completed\n"), "{block}");
        assert!(block.contains("Category:     unavailable\n"), "{block}");
        assert!(block.contains("Business key: bk-1\n"), "{block}");
        assert!(block.contains("Assessed by:  assess-1\n"), "{block}");
        assert!(block.ends_with("Variables:\n  name = \"world\"\n"), "{block}");
        assert!(!block.contains("Error:"));
    }

    #[test]
    fn details_block_shows_instance_error() {
        let error = InstanceError {
            message: "step failed".into(),
            stack: None,
        };
        let block = details_block(&details(), Some(&error), None, None);
        assert!(block.contains("Error:        step failed\n"), "{block}");
        assert!(!block.contains("Variables:"));
    }

    #[test]
    fn watch_line_reports_refresh_failures() {
        let state = PollState {
            loading: false,
            error: Some(ErrorInfo {
                message: "timeout".into(),
            }),
            value: None,
        };
        assert_eq!(
            watch_line(&state, Some(&details())),
            "abc Completed (running for 2 hours) [refresh failed: timeout]"
        );
        assert_eq!(watch_line(&PollState::default(), None), "loading...");
    }
}
