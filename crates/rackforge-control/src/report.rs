//! The structured result surface handed to automation.
//!
//! Library callers branch on [`ControlError`](crate::ControlError); outer
//! layers (the CLI, or anything driving many invocations) consume a flat
//! `Report` instead, so every workflow ends in the same shape whether it
//! succeeded or not.

use serde::Serialize;
use serde_json::Value;

use rackforge_core::Machine;

use crate::error::ControlError;
use crate::requests::{CallOutcome, DeployOutcome};

/// Flat outcome record for one workflow invocation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    /// Whether server-side state was (or would be) mutated.
    pub changed: bool,
    /// Whether the workflow failed.
    pub failed: bool,
    /// Whether the workflow skipped its action (dry-run of a mutation).
    pub skipped: bool,
    /// Human-readable summary or error message.
    pub msg: String,
    /// Latest known machine payload, when the workflow had one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine: Option<Machine>,
    /// HTTP status code of a passthrough call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Decoded body of a passthrough call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Whether a passthrough call got a 2xx answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
}

impl Report {
    /// A failure report with just a message, for errors raised before any
    /// workflow ran (configuration problems and the like).
    #[must_use]
    pub fn failure(msg: impl Into<String>) -> Self {
        Self {
            failed: true,
            msg: msg.into(),
            ..Self::default()
        }
    }

    /// Fold a deploy workflow result into a report.
    #[must_use]
    pub fn from_deploy(result: Result<DeployOutcome, ControlError>) -> Self {
        match result {
            Ok(outcome) => Self {
                changed: outcome.changed,
                msg: outcome.message,
                machine: Some(outcome.machine),
                ..Self::default()
            },
            Err(err) => Self::from_error(&err),
        }
    }

    /// Fold a wait workflow result into a report.
    #[must_use]
    pub fn from_wait(result: Result<Machine, ControlError>) -> Self {
        match result {
            Ok(machine) => Self {
                machine: Some(machine),
                ..Self::default()
            },
            Err(err) => Self::from_error(&err),
        }
    }

    /// Fold a passthrough call result into a report.
    #[must_use]
    pub fn from_call(result: Result<CallOutcome, ControlError>) -> Self {
        match result {
            Ok(outcome) => {
                let mut report = Self {
                    changed: outcome.changed,
                    skipped: outcome.skipped,
                    ..Self::default()
                };
                if let Some(response) = outcome.response {
                    report.status_code = Some(response.status_code);
                    report.success = Some(response.ok);
                    report.data = Some(response.data.into_value());
                }
                report
            }
            Err(ControlError::CallRejected { status, body }) => Self {
                failed: true,
                msg: format!("API call returned HTTP {status}: {body}"),
                status_code: Some(status),
                success: Some(false),
                data: Some(rackforge_client::Payload::decode(&body).into_value()),
                ..Self::default()
            },
            Err(err) => Self::from_error(&err),
        }
    }

    fn from_error(err: &ControlError) -> Self {
        Self {
            failed: true,
            msg: err.to_string(),
            machine: err.machine().cloned(),
            ..Self::default()
        }
    }
}
