//! Backend seams used by the instance view.
//!
//! The view never talks HTTP directly; it is handed implementations of these
//! traits. [`OrchestratorClient`] implements both for production use, and tests
//! substitute in-memory doubles.

use anyhow::{Context, Result};
use async_trait::async_trait;
use orca_api::OrchestratorClient;
use orca_types::{AssessedInstance, Permission, PermissionDecision};
use tracing::debug;

/// Remote operations on workflow instances.
#[async_trait]
pub trait InstanceService: Send + Sync {
    /// Fetch one instance, optionally with the assessment that recommended it.
    async fn get_instance(&self, instance_id: &str, include_assessment: bool) -> Result<AssessedInstance>;

    /// Ask the backend to abort a running instance.
    async fn abort_instance(&self, instance_id: &str) -> Result<()>;
}

/// External authorization decision for a permission descriptor set.
#[async_trait]
pub trait PermissionEvaluator: Send + Sync {
    async fn evaluate(&self, permissions: &[Permission]) -> Result<PermissionDecision>;
}

#[async_trait]
impl InstanceService for OrchestratorClient {
    async fn get_instance(&self, instance_id: &str, include_assessment: bool) -> Result<AssessedInstance> {
        let assessed = OrchestratorClient::get_instance(self, instance_id, include_assessment).await?;
        debug!(%instance_id, state = ?assessed.instance.state, "fetched instance");
        Ok(assessed)
    }

    async fn abort_instance(&self, instance_id: &str) -> Result<()> {
        OrchestratorClient::abort_instance(self, instance_id).await?;
        Ok(())
    }
}

#[async_trait]
impl PermissionEvaluator for OrchestratorClient {
    async fn evaluate(&self, permissions: &[Permission]) -> Result<PermissionDecision> {
        let results = self.authorize(permissions).await.context("authorization request failed")?;
        Ok(PermissionDecision::from_results(&results))
    }
}
