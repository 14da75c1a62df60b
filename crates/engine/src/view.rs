//! View model for a single workflow instance.
//!
//! `InstanceView` is the scope that owns a [`Poller`] for one instance and the
//! local interaction state around it: the abort confirmation dialog, the
//! command alert raised by a failed abort, and the latest permission decision.
//! Rendering layers (the CLI here) read from it and call its actions.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use orca_types::{AssessedInstance, DetailView, Permission, PermissionDecision};
use serde_json::{Map as JsonMap, Value};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::actions::{ActionDispatcher, CommandAlert, Navigator};
use crate::details::{instance_variables, to_detail_view};
use crate::poller::{PollFetch, PollState, Poller};
use crate::service::{InstanceService, PermissionEvaluator};
use crate::status::{can_abort, can_rerun, is_in_flight};

/// Collaborators injected into an [`InstanceView`].
#[derive(Clone)]
pub struct ViewServices {
    pub instances: Arc<dyn InstanceService>,
    pub permissions: Arc<dyn PermissionEvaluator>,
    pub navigator: Arc<dyn Navigator>,
}

/// Tunables for an [`InstanceView`].
#[derive(Debug, Clone)]
pub struct ViewSettings {
    pub poll_interval: Duration,
    pub execute_route: String,
}

/// Which actions the view currently offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Affordances {
    /// Abort is shown for active or failed instances.
    pub abort_visible: bool,
    /// Abort is shown and the user may use the workflow.
    pub abort_enabled: bool,
    /// The instance has stopped and the user may use the workflow.
    pub rerun_enabled: bool,
}

/// Fetches the instance with its assessment; yields nothing without an id.
struct InstanceFetch {
    instances: Arc<dyn InstanceService>,
    instance_id: Option<String>,
}

#[async_trait]
impl PollFetch<AssessedInstance> for InstanceFetch {
    async fn fetch(&self) -> Result<Option<AssessedInstance>> {
        let Some(instance_id) = self.instance_id.as_deref() else {
            return Ok(None);
        };
        self.instances.get_instance(instance_id, true).await.map(Some)
    }
}

/// Keep polling while there is an instance that has not settled.
fn keep_polling(value: Option<&AssessedInstance>) -> bool {
    value.is_some_and(|assessed| is_in_flight(assessed.instance.state))
}

pub struct InstanceView {
    requested_id: Option<String>,
    poller: Poller<AssessedInstance>,
    dispatcher: ActionDispatcher,
    permissions: Arc<dyn PermissionEvaluator>,
    decision: PermissionDecision,
    abort_confirmation_open: bool,
    alert: Option<CommandAlert>,
}

impl InstanceView {
    /// Build a view for `instance_id`. Polling begins with [`InstanceView::start`].
    pub fn new(instance_id: Option<String>, services: ViewServices, settings: ViewSettings) -> Self {
        let instance_id = instance_id.filter(|id| !id.trim().is_empty());
        let fetch = Arc::new(InstanceFetch {
            instances: Arc::clone(&services.instances),
            instance_id: instance_id.clone(),
        });
        Self {
            requested_id: instance_id,
            poller: Poller::new(fetch, settings.poll_interval, keep_polling),
            dispatcher: ActionDispatcher::new(services.instances, services.navigator, settings.execute_route),
            permissions: services.permissions,
            decision: PermissionDecision::DENIED,
            abort_confirmation_open: false,
            alert: None,
        }
    }

    pub fn start(&self) {
        self.poller.start();
    }

    pub fn stop(&self) {
        self.poller.stop();
    }

    pub fn state(&self) -> PollState<AssessedInstance> {
        self.poller.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollState<AssessedInstance>> {
        self.poller.subscribe()
    }

    fn current(&self) -> Option<AssessedInstance> {
        self.poller.state().value
    }

    /// Page title: the loaded workflow id, otherwise the requested id.
    pub fn title(&self) -> Option<String> {
        self.current()
            .map(|assessed| assessed.instance.process_id)
            .or_else(|| self.requested_id.clone())
    }

    /// Detail projection, available once loading finished with a value.
    pub fn details(&self) -> Option<DetailView> {
        let state = self.poller.state();
        if state.loading {
            return None;
        }
        state.value.map(|assessed| to_detail_view(&assessed.instance))
    }

    /// Workflow variables without the final result.
    pub fn variables(&self) -> Option<JsonMap<String, Value>> {
        self.current().and_then(|assessed| instance_variables(&assessed.instance))
    }

    /// Re-evaluates the workflow-use permission set for the current workflow.
    ///
    /// Evaluation failures are treated as "not permitted".
    pub async fn refresh_permission(&mut self) -> PermissionDecision {
        let workflow_id = self.current().map(|assessed| assessed.instance.process_id);
        let permissions = Permission::workflow_use_set(workflow_id.as_deref());
        self.decision = match self.permissions.evaluate(&permissions).await {
            Ok(decision) => decision,
            Err(error) => {
                warn!(error = %error, "permission evaluation failed; treating as denied");
                PermissionDecision::DENIED
            }
        };
        debug!(allowed = self.decision.allowed, "permission decision updated");
        self.decision
    }

    pub fn permission(&self) -> PermissionDecision {
        self.decision
    }

    pub fn affordances(&self) -> Affordances {
        let status = self.current().and_then(|assessed| assessed.instance.state);
        let allowed = self.decision.allowed;
        let abort_visible = can_abort(status);
        Affordances {
            abort_visible,
            abort_enabled: abort_visible && allowed,
            rerun_enabled: allowed && can_rerun(status),
        }
    }

    pub fn toggle_abort_confirmation(&mut self) {
        self.abort_confirmation_open = !self.abort_confirmation_open;
    }

    pub fn is_abort_confirmation_open(&self) -> bool {
        self.abort_confirmation_open
    }

    /// Aborts the current instance.
    ///
    /// On success polling restarts to pick up the new status. On failure a
    /// [`CommandAlert`] is raised and the polling state is left untouched.
    /// The confirmation dialog is closed either way. Does nothing before the
    /// first value has loaded.
    pub async fn confirm_abort(&mut self) {
        let Some(assessed) = self.current() else {
            return;
        };
        match self.dispatcher.abort(&assessed.instance.id).await {
            Ok(()) => self.poller.restart(),
            Err(error) => self.alert = Some(CommandAlert::abort_failed(&error)),
        }
        self.abort_confirmation_open = false;
    }

    pub fn alert(&self) -> Option<&CommandAlert> {
        self.alert.as_ref()
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    /// Navigates to the execute page for the current instance.
    pub fn rerun(&self) -> Option<String> {
        self.current().map(|assessed| self.dispatcher.rerun(&assessed))
    }
}
