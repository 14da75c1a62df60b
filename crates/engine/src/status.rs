//! Status predicates driving polling and the instance actions.

use orca_types::InstanceStatus;

/// Returns `true` while an instance may still change on its own.
///
/// An absent status means the backend has not reported one yet, so the
/// instance is treated as running.
pub fn is_in_flight(status: Option<InstanceStatus>) -> bool {
    matches!(status, None | Some(InstanceStatus::Active | InstanceStatus::Pending))
}

/// Abort is offered for running instances and for instances stuck in error.
pub fn can_abort(status: Option<InstanceStatus>) -> bool {
    matches!(status, Some(InstanceStatus::Active | InstanceStatus::Error))
}

/// Rerun is offered once an instance has stopped.
pub fn can_rerun(status: Option<InstanceStatus>) -> bool {
    matches!(
        status,
        Some(InstanceStatus::Completed | InstanceStatus::Aborted | InstanceStatus::Error)
    )
}
