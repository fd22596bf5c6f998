//! Error taxonomy for the lifecycle workflows.
//!
//! Every failure mode a workflow can hit is a distinct variant, so callers
//! branch by matching instead of inspecting exception types. Variants that
//! terminate a poll carry the last-fetched machine payload for inspection.

use std::time::Duration;

use thiserror::Error;

use rackforge_client::ClientError;
use rackforge_core::{CoreError, Machine, SystemId};

/// A result type using `ControlError`.
pub type Result<T> = std::result::Result<T, ControlError>;

/// Errors raised by the deploy, wait and api-call workflows.
#[derive(Debug, Error)]
pub enum ControlError {
    /// A fetch the workflow depends on failed (HTTP error or unusable
    /// payload). No mutation was performed after this point.
    #[error("could not fetch {resource}: HTTP {status}: {detail}")]
    Fetch {
        /// Relative endpoint of the failed fetch.
        resource: String,
        /// HTTP status of the failure.
        status: u16,
        /// Body or decode detail, verbatim.
        detail: String,
    },

    /// The machine is allocated to a different user. No call was attempted.
    #[error("machine {system_id} is allocated to user {owner}, not to current user {current_user}")]
    NotOwner {
        /// The machine in question.
        system_id: SystemId,
        /// Recorded owner of the machine.
        owner: String,
        /// The authenticated user.
        current_user: String,
        /// Last-fetched payload.
        machine: Box<Machine>,
    },

    /// The machine is in a state deployment cannot start from. No call was
    /// attempted.
    #[error("machine {system_id} must be Ready or Allocated to deploy, current status is {status}")]
    NotDeployable {
        /// The machine in question.
        system_id: SystemId,
        /// Last-seen status label.
        status: String,
        /// Last-fetched payload.
        machine: Box<Machine>,
    },

    /// The controller rejected the deploy mutation.
    #[error("deploy request rejected with HTTP {status}: {body}")]
    DeployRejected {
        /// HTTP status of the rejection.
        status: u16,
        /// Response body, verbatim.
        body: String,
        /// The machine as last seen before the rejected mutation.
        machine: Box<Machine>,
    },

    /// The controller rejected a passthrough API call.
    #[error("API call returned HTTP {status}: {body}")]
    CallRejected {
        /// HTTP status of the rejection.
        status: u16,
        /// Response body, verbatim.
        body: String,
    },

    /// While polling, the machine reported a status outside the acceptable
    /// set. Distinct from a timeout.
    #[error("waiting for machine failed, last status: {status}")]
    StatusRejected {
        /// Last-seen status label.
        status: String,
        /// Last-fetched payload, when one was decoded.
        machine: Option<Box<Machine>>,
    },

    /// The wall-clock deadline passed while the status was still only
    /// acceptable. Retrying outside this tool may succeed.
    #[error("timeout while waiting for machine after {}s", elapsed.as_secs())]
    Timeout {
        /// Time elapsed since the first fetch.
        elapsed: Duration,
        /// Last-fetched payload, when one was decoded.
        machine: Option<Box<Machine>>,
    },

    /// A caller-supplied status could not be resolved against the status
    /// model.
    #[error("unknown status: {0}")]
    UnknownStatus(#[from] CoreError),

    /// The transport or session failed underneath the workflow.
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl ControlError {
    /// The last-fetched machine payload attached to this error, if any.
    #[must_use]
    pub fn machine(&self) -> Option<&Machine> {
        match self {
            Self::NotOwner { machine, .. }
            | Self::NotDeployable { machine, .. }
            | Self::DeployRejected { machine, .. } => Some(machine),
            Self::StatusRejected { machine, .. } | Self::Timeout { machine, .. } => {
                machine.as_deref()
            }
            _ => None,
        }
    }

    /// True when no mutating call was issued before the failure.
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::NotOwner { .. } | Self::NotDeployable { .. } | Self::UnknownStatus(_)
        )
    }
}
