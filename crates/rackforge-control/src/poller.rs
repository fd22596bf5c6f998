//! The resource state poller.
//!
//! Repeatedly fetches one machine and classifies its status against a
//! [`PollTarget`] until the wait succeeds, the status leaves the acceptable
//! set, or the wall-clock deadline passes. At most one fetch is in flight
//! at a time.
//!
//! Transport retry and polling are independent domains: the session retries
//! transient failures inside a single fetch; once a fetch fails for good,
//! the poll aborts immediately rather than treating it as "not ready yet".

use std::time::Duration;

use tokio::time::Instant;

use rackforge_client::ControllerApi;
use rackforge_core::{Machine, MachineStatus, SystemId};

use crate::error::{ControlError, Result};
use crate::target::{Classification, PollTarget};

/// Which payload field carries the status during a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMode {
    /// Read the numeric `status` code.
    Numeric,
    /// Read the lower-cased `status_name` string.
    Named,
}

/// A polling loop bound to one API session.
#[derive(Debug)]
pub struct Poller<'a, A> {
    api: &'a A,
    interval: Duration,
    timeout: Duration,
}

impl<'a, A: ControllerApi> Poller<'a, A> {
    /// Create a poller with the given sleep interval and overall deadline.
    #[must_use]
    pub const fn new(api: &'a A, interval: Duration, timeout: Duration) -> Self {
        Self {
            api,
            interval,
            timeout,
        }
    }

    /// Wait until the machine reaches the target.
    ///
    /// The deadline is measured from the first fetch and checked between
    /// iterations, so a fetch is never started after it has passed.
    ///
    /// # Errors
    ///
    /// - `ControlError::Fetch` when a fetch returns an error status;
    /// - `ControlError::StatusRejected` when the status leaves the
    ///   acceptable set (the last payload is attached);
    /// - `ControlError::Timeout` when the deadline passes first;
    /// - `ControlError::Client` when the transport fails outright.
    pub async fn wait(
        &self,
        system_id: &SystemId,
        target: &PollTarget,
        mode: StatusMode,
    ) -> Result<Machine> {
        let endpoint = format!("machines/{system_id}/");
        let started = Instant::now();

        tracing::trace!(
            %system_id,
            target = ?target.target(),
            acceptable = ?target.acceptable(),
            "starting poll"
        );

        loop {
            let machine = crate::fetch::machine(self.api, &endpoint).await?;
            let status = resolve_status(&machine, mode);

            let classification = match status {
                Some(status) => target.classify(status),
                // A missing or unknown status is by definition outside the
                // acceptable set.
                None => Classification::Reject,
            };

            tracing::trace!(
                %system_id,
                status = %machine.status_label(),
                elapsed_secs = started.elapsed().as_secs(),
                ?classification,
                "poll iteration"
            );

            match classification {
                Classification::Success => return Ok(machine),
                Classification::Reject => {
                    return Err(ControlError::StatusRejected {
                        status: machine.status_label(),
                        machine: Some(Box::new(machine)),
                    });
                }
                Classification::Continue => {}
            }

            tokio::time::sleep(self.interval).await;

            let elapsed = started.elapsed();
            if elapsed > self.timeout {
                return Err(ControlError::Timeout {
                    elapsed,
                    machine: Some(Box::new(machine)),
                });
            }
        }
    }
}

/// Extract the canonical status using the configured accessor.
fn resolve_status(machine: &Machine, mode: StatusMode) -> Option<MachineStatus> {
    match mode {
        StatusMode::Numeric => machine.machine_status(),
        StatusMode::Named => machine
            .status_name_lower()
            .as_deref()
            .and_then(MachineStatus::from_name),
    }
}
