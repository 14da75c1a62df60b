//! Shared type definitions for the Orca workspace.
//!
//! The models here mirror the orchestrator backend's wire format (camelCase
//! JSON) so the API client can deserialize responses directly, while the
//! engine and CLI work with strongly typed fields.

pub mod instance;
pub mod permission;

pub use instance::{
    AssessedInstance, DetailView, InstanceError, InstanceStatus, NodeInstance, ProcessInstance, VALUE_UNAVAILABLE, WorkflowCategory,
};
pub use permission::{AuthorizeResult, Permission, PermissionDecision};
