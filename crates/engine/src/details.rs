//! Projection of raw instance records into display-ready details.

use chrono::{Local, TimeZone};
use orca_types::{DetailView, ProcessInstance, VALUE_UNAVAILABLE};
use orca_util::{format_optional_timestamp, humanize_duration};
use serde_json::{Map as JsonMap, Value};

/// Key holding the workflow's final result inside the variable bag.
const RESULT_VARIABLE: &str = "result";

/// Maps an instance into its detail view, rendering times in the local zone.
pub fn to_detail_view(instance: &ProcessInstance) -> DetailView {
    to_detail_view_in(instance, &Local)
}

/// Maps an instance into its detail view, rendering times in `zone`.
///
/// The duration is only computed when both start and end are known. The
/// magnitude of `end - start` is humanized, so clock skew that puts the end
/// before the start still yields a readable value.
pub fn to_detail_view_in<Tz>(instance: &ProcessInstance, zone: &Tz) -> DetailView
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let duration = match (instance.start, instance.end) {
        (Some(start), Some(end)) => humanize_duration(end - start),
        _ => VALUE_UNAVAILABLE.to_string(),
    };

    let process_name = instance
        .process_name
        .as_deref()
        .filter(|name| !name.is_empty())
        .unwrap_or(VALUE_UNAVAILABLE)
        .to_string();

    DetailView {
        id: instance.id.clone(),
        process_name,
        workflow_id: instance.process_id.clone(),
        start: format_optional_timestamp(instance.start.as_ref(), zone),
        duration,
        category: instance.category,
        state: instance.state,
        description: instance.description.clone(),
        business_key: instance.business_key.clone(),
    }
}

/// Variables produced by the workflow, without its final `result`.
///
/// Returns `None` when the instance carries no variable bag.
pub fn instance_variables(instance: &ProcessInstance) -> Option<JsonMap<String, Value>> {
    instance.workflowdata.as_ref().map(|workflowdata| {
        let mut variables = workflowdata.clone();
        variables.remove(RESULT_VARIABLE);
        variables
    })
}
