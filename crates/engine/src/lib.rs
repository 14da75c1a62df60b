//! # Orca Engine
//!
//! View model for watching and acting on a single orchestrator workflow
//! instance.
//!
//! ## Architecture
//!
//! - **`status`**: predicates classifying instance statuses
//! - **`details`**: projection of raw records into display-ready details
//! - **`poller`**: repeated-fetch loop with restart, stop, and stale-result discard
//! - **`actions`**: abort and rerun commands plus the navigation seam
//! - **`service`**: backend traits, implemented for [`orca_api::OrchestratorClient`]
//! - **`view`**: the owning scope tying the pieces together

pub mod actions;
pub mod details;
pub mod poller;
pub mod service;
pub mod status;
pub mod view;

pub use actions::{ActionDispatcher, CommandAlert, Navigator};
pub use details::{instance_variables, to_detail_view, to_detail_view_in};
pub use poller::{ErrorInfo, PollFetch, PollState, Poller, fetch_fn};
pub use service::{InstanceService, PermissionEvaluator};
pub use status::{can_abort, can_rerun, is_in_flight};
pub use view::{Affordances, InstanceView, ViewServices, ViewSettings};
