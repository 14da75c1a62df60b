//! One-shot commands issued from the instance view.
//!
//! Abort goes to the backend; rerun is purely client-side and only builds a
//! URL for the [`Navigator`]. Neither enforces authorization: the view only
//! offers them when the permission decision allows it, and the backend stays
//! the authority.

use std::sync::Arc;

use anyhow::Result;
use orca_types::AssessedInstance;
use orca_util::{build_url, resolve_route};
use tracing::{info, warn};

use crate::service::InstanceService;

/// Query parameter carrying the instance to rerun.
pub const QUERY_PARAM_INSTANCE_ID: &str = "instanceId";
/// Query parameter carrying the assessment instance that recommended the workflow.
pub const QUERY_PARAM_ASSESSMENT_INSTANCE_ID: &str = "assessmentInstanceId";

const WORKFLOW_ID_PARAM: &str = "workflowId";
const ABORT_FAILED_TITLE: &str = "Abort workflow failed";

/// Performs client-side navigation.
pub trait Navigator: Send + Sync {
    fn navigate(&self, url: &str);
}

/// Failure of a one-shot command, shown until the user dismisses it.
///
/// Kept apart from the poller's error so a failed abort never masks or
/// clears the polling state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandAlert {
    pub title: String,
    pub message: String,
}

impl CommandAlert {
    pub(crate) fn abort_failed(error: &anyhow::Error) -> Self {
        Self {
            title: ABORT_FAILED_TITLE.to_string(),
            message: format!("{error:#}"),
        }
    }

    /// Full sentence rendered in the alert body.
    pub fn text(&self) -> String {
        format!("The abort operation failed with the following error: {}", self.message)
    }
}

/// Issues abort and rerun for a single view.
pub struct ActionDispatcher {
    service: Arc<dyn InstanceService>,
    navigator: Arc<dyn Navigator>,
    execute_route: String,
}

impl ActionDispatcher {
    pub fn new(service: Arc<dyn InstanceService>, navigator: Arc<dyn Navigator>, execute_route: impl Into<String>) -> Self {
        Self {
            service,
            navigator,
            execute_route: execute_route.into(),
        }
    }

    /// Asks the backend to abort `instance_id`.
    pub async fn abort(&self, instance_id: &str) -> Result<()> {
        match self.service.abort_instance(instance_id).await {
            Ok(()) => {
                info!(%instance_id, "workflow instance aborted");
                Ok(())
            }
            Err(error) => {
                warn!(%instance_id, error = %error, "abort failed");
                Err(error)
            }
        }
    }

    /// URL of the execute page prefilled from `assessed`.
    pub fn rerun_url(&self, assessed: &AssessedInstance) -> String {
        let route = resolve_route(&self.execute_route, &[(WORKFLOW_ID_PARAM, &assessed.instance.process_id)]);
        build_url(
            &route,
            &[
                (QUERY_PARAM_INSTANCE_ID, Some(assessed.instance.id.as_str())),
                (
                    QUERY_PARAM_ASSESSMENT_INSTANCE_ID,
                    assessed.assessed_by.as_ref().map(|assessment| assessment.id.as_str()),
                ),
            ],
        )
    }

    /// Navigates to the execute page for `assessed` and returns the URL used.
    pub fn rerun(&self, assessed: &AssessedInstance) -> String {
        let url = self.rerun_url(assessed);
        info!(instance_id = %assessed.instance.id, %url, "navigating to rerun");
        self.navigator.navigate(&url);
        url
    }
}
