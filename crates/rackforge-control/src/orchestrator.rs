//! The machine lifecycle orchestrator.
//!
//! Composes the session and poller into the three workflows: deploying a
//! machine, waiting for a status transition, and passing an opaque API
//! call through with change detection.
//!
//! ```text
//! deploy:   Fetching ─► Validating ─► (Deploying | AlreadyDone | Rejected)
//!                                          │
//!                                          ▼ (wait)
//!                                       Polling ─► Done
//! ```

use rackforge_client::{ControllerApi, Method, Params};
use rackforge_core::{Machine, MachineStatus};

use crate::error::{ControlError, Result};
use crate::fetch;
use crate::poller::{Poller, StatusMode};
use crate::requests::{CallOutcome, CallRequest, DeployOutcome, DeployRequest, WaitRequest};
use crate::target::PollTarget;

/// Drives the lifecycle workflows over one API session.
///
/// The orchestrator holds no state of its own; it is constructed per
/// invocation and borrows the session.
#[derive(Debug)]
pub struct Orchestrator<'a, A> {
    api: &'a A,
}

impl<'a, A: ControllerApi> Orchestrator<'a, A> {
    /// Create an orchestrator over the given API session.
    #[must_use]
    pub const fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// Deploy a machine.
    ///
    /// A machine that is already deployed, or already deploying, is treated
    /// as satisfied: the workflow succeeds without issuing any call. An
    /// allocated machine must belong to the authenticated user. Anything
    /// other than Ready or Allocated cannot be deployed.
    ///
    /// With `dry_run`, validation runs in full but the deploy mutation is
    /// never issued.
    ///
    /// # Errors
    ///
    /// See [`ControlError`]; precondition failures never mutate state, and
    /// poll failures carry the last-fetched payload.
    pub async fn deploy(&self, request: &DeployRequest, dry_run: bool) -> Result<DeployOutcome> {
        let endpoint = format!("machines/{}/", request.system_id);
        let machine = fetch::machine(self.api, &endpoint).await?;
        let user = fetch::whoami(self.api).await?;

        let Some(status) = machine.machine_status() else {
            return Err(ControlError::NotDeployable {
                system_id: request.system_id.clone(),
                status: machine.status_label(),
                machine: Box::new(machine),
            });
        };

        match status {
            MachineStatus::Deployed => {
                tracing::debug!(system_id = %request.system_id, "machine is already deployed");
                return Ok(DeployOutcome {
                    changed: false,
                    message: "machine is already deployed".to_string(),
                    machine,
                });
            }
            MachineStatus::Deploying => {
                tracing::debug!(system_id = %request.system_id, "deployment already in progress");
                return Ok(DeployOutcome {
                    changed: false,
                    message: "deployment already in progress".to_string(),
                    machine,
                });
            }
            MachineStatus::Allocated => {
                let owner = machine
                    .owner
                    .clone()
                    .unwrap_or_else(|| "nobody".to_string());
                if owner != user.username {
                    return Err(ControlError::NotOwner {
                        system_id: request.system_id.clone(),
                        owner,
                        current_user: user.username,
                        machine: Box::new(machine),
                    });
                }
            }
            MachineStatus::Ready => {}
            other => {
                return Err(ControlError::NotDeployable {
                    system_id: request.system_id.clone(),
                    status: other.name().to_string(),
                    machine: Box::new(machine),
                });
            }
        }

        if dry_run {
            return Ok(DeployOutcome {
                changed: true,
                message: "machine would be deployed".to_string(),
                machine,
            });
        }

        let response = self
            .api
            .call(Method::Post, &format!("{endpoint}?op=deploy"), &request.params())
            .await?;
        if !response.ok {
            return Err(ControlError::DeployRejected {
                status: response.status_code,
                body: fetch::render_body(&response),
                machine: Box::new(machine),
            });
        }

        tracing::info!(system_id = %request.system_id, "deployment started");

        // The deploy response carries the machine already in Deploying
        // state; fall back to the pre-deploy snapshot if it does not parse.
        let machine = response
            .json()
            .and_then(|value| Machine::from_value(value).ok())
            .unwrap_or(machine);

        if !request.wait {
            return Ok(DeployOutcome {
                changed: true,
                message: "deployment started".to_string(),
                machine,
            });
        }

        let poller = Poller::new(self.api, request.wait_interval, request.wait_timeout);
        let target = PollTarget::new([MachineStatus::Deployed], [MachineStatus::Deploying]);
        let machine = poller
            .wait(&request.system_id, &target, StatusMode::Numeric)
            .await?;

        Ok(DeployOutcome {
            changed: true,
            message: "machine deployed".to_string(),
            machine,
        })
    }

    /// Wait for a machine to reach a caller-supplied status.
    ///
    /// A thin composition over the poller in name-based mode; target and
    /// acceptable statuses resolve through the canonical status model, so
    /// names and numeric codes are interchangeable.
    ///
    /// # Errors
    ///
    /// Returns the poller's error unchanged; `UnknownStatus` when a
    /// supplied status resolves to nothing.
    pub async fn wait_for_status(&self, request: &WaitRequest) -> Result<Machine> {
        let target = PollTarget::from_strings(&request.target, &request.acceptable)?;
        let poller = Poller::new(self.api, request.wait_interval, request.wait_timeout);
        poller
            .wait(&request.system_id, &target, StatusMode::Named)
            .await
    }

    /// Pass an opaque API call through, with change detection.
    ///
    /// Mutating calls take a pre-call snapshot of the endpoint; the call is
    /// considered to have changed state when the response differs from the
    /// snapshot. In dry-run mode mutating calls are skipped outright while
    /// reads still execute.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::CallRejected` for a non-2xx response unless
    /// `fail_on_error` is off.
    pub async fn api_call(&self, request: &CallRequest, dry_run: bool) -> Result<CallOutcome> {
        if dry_run && request.method.is_mutating() {
            tracing::debug!(endpoint = %request.endpoint, "skipping mutating call in dry-run mode");
            return Ok(CallOutcome {
                changed: false,
                skipped: true,
                response: None,
            });
        }

        let before = if request.method.is_mutating() {
            Some(
                self.api
                    .call(Method::Get, &request.endpoint, &Params::new())
                    .await?,
            )
        } else {
            None
        };

        let response = self
            .api
            .call(request.method, &request.endpoint, &request.params)
            .await?;

        if !response.ok && request.fail_on_error {
            return Err(ControlError::CallRejected {
                status: response.status_code,
                body: fetch::render_body(&response),
            });
        }

        let changed = match &before {
            Some(snapshot) => response.ok && snapshot.data != response.data,
            None => false,
        };

        Ok(CallOutcome {
            changed,
            skipped: false,
            response: Some(response),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::testing::ScriptedApi;
    use rackforge_core::MachineStatus::{
        Allocated, Broken, Commissioning, Deployed, Deploying, Ready,
    };
    use rackforge_core::SystemId;

    fn request(wait: bool) -> DeployRequest {
        let mut request = DeployRequest::new("xc4n7d".parse().unwrap());
        request.wait = wait;
        request.wait_interval = Duration::from_secs(5);
        request.wait_timeout = Duration::from_secs(600);
        request
    }

    #[tokio::test]
    async fn deploy_is_idempotent_for_deployed_machines() {
        let api = ScriptedApi::with_responses(vec![
            ScriptedApi::machine(Deployed),
            ScriptedApi::whoami("admin"),
        ]);

        let outcome = Orchestrator::new(&api)
            .deploy(&request(false), false)
            .await
            .unwrap();

        assert!(!outcome.changed);
        assert_eq!(outcome.machine.machine_status(), Some(Deployed));
        assert_eq!(api.mutating_calls(), 0);
    }

    #[tokio::test]
    async fn deploy_is_idempotent_for_deploying_machines() {
        let api = ScriptedApi::with_responses(vec![
            ScriptedApi::machine(Deploying),
            ScriptedApi::whoami("admin"),
        ]);

        let outcome = Orchestrator::new(&api)
            .deploy(&request(false), false)
            .await
            .unwrap();

        assert!(!outcome.changed);
        assert_eq!(api.mutating_calls(), 0);
    }

    #[tokio::test]
    async fn deploy_rejects_foreign_allocations() {
        let api = ScriptedApi::with_responses(vec![
            ScriptedApi::owned_machine(Allocated, "mallory"),
            ScriptedApi::whoami("admin"),
        ]);

        let err = Orchestrator::new(&api)
            .deploy(&request(false), false)
            .await
            .unwrap_err();

        match err {
            ControlError::NotOwner {
                owner,
                current_user,
                ..
            } => {
                assert_eq!(owner, "mallory");
                assert_eq!(current_user, "admin");
            }
            other => panic!("expected ownership error, got {other:?}"),
        }
        assert_eq!(api.mutating_calls(), 0);
    }

    #[tokio::test]
    async fn deploy_accepts_own_allocation() {
        let api = ScriptedApi::with_responses(vec![
            ScriptedApi::owned_machine(Allocated, "admin"),
            ScriptedApi::whoami("admin"),
            ScriptedApi::machine(Deploying),
        ]);

        let outcome = Orchestrator::new(&api)
            .deploy(&request(false), false)
            .await
            .unwrap();

        assert!(outcome.changed);
        assert_eq!(outcome.message, "deployment started");
        assert_eq!(api.mutating_calls(), 1);
        assert!(api.endpoints()[2].ends_with("?op=deploy"));
    }

    #[tokio::test(start_paused = true)]
    async fn deploy_waits_until_deployed() {
        let api = ScriptedApi::with_responses(vec![
            ScriptedApi::machine(Ready),
            ScriptedApi::whoami("admin"),
            ScriptedApi::machine(Deploying), // deploy response
            ScriptedApi::machine(Deploying), // poll 1
            ScriptedApi::machine(Deploying), // poll 2
            ScriptedApi::machine(Deployed),  // poll 3
        ]);

        let outcome = Orchestrator::new(&api)
            .deploy(&request(true), false)
            .await
            .unwrap();

        assert!(outcome.changed);
        assert_eq!(outcome.message, "machine deployed");
        assert_eq!(outcome.machine.machine_status(), Some(Deployed));
        assert_eq!(api.call_count(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn deploy_fails_when_polling_leaves_acceptable_set() {
        let api = ScriptedApi::with_responses(vec![
            ScriptedApi::machine(Ready),
            ScriptedApi::whoami("admin"),
            ScriptedApi::machine(Deploying), // deploy response
            ScriptedApi::machine(Deploying), // poll 1
            ScriptedApi::machine(Broken),    // poll 2
        ]);

        let err = Orchestrator::new(&api)
            .deploy(&request(true), false)
            .await
            .unwrap_err();

        match err {
            ControlError::StatusRejected { status, machine } => {
                assert_eq!(status, "Broken");
                assert!(machine.is_some());
            }
            other => panic!("expected status rejection, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn deploy_times_out_and_keeps_last_payload() {
        let mut request = request(true);
        request.wait_timeout = Duration::from_secs(12);

        let api = ScriptedApi::with_outcomes(vec![
            Ok(ScriptedApi::machine(Ready)),
            Ok(ScriptedApi::whoami("admin")),
            Ok(ScriptedApi::machine(Deploying)), // deploy response
            Ok(ScriptedApi::machine(Deploying)),
            Ok(ScriptedApi::machine(Deploying)),
            Ok(ScriptedApi::machine(Deploying)),
        ]);

        let err = Orchestrator::new(&api)
            .deploy(&request, false)
            .await
            .unwrap_err();

        match err {
            ControlError::Timeout { machine, .. } => {
                assert_eq!(machine.unwrap().machine_status(), Some(Deploying));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn dry_run_reports_a_change_without_calling_deploy() {
        let api = ScriptedApi::with_responses(vec![
            ScriptedApi::machine(Ready),
            ScriptedApi::whoami("admin"),
        ]);

        let outcome = Orchestrator::new(&api)
            .deploy(&request(false), true)
            .await
            .unwrap();

        assert!(outcome.changed);
        assert_eq!(outcome.message, "machine would be deployed");
        assert_eq!(api.mutating_calls(), 0);
    }

    #[tokio::test]
    async fn broken_machines_are_not_deployable() {
        let api = ScriptedApi::with_responses(vec![
            ScriptedApi::machine(Broken),
            ScriptedApi::whoami("admin"),
        ]);

        let err = Orchestrator::new(&api)
            .deploy(&request(false), false)
            .await
            .unwrap_err();

        match err {
            ControlError::NotDeployable { status, .. } => assert_eq!(status, "Broken"),
            other => panic!("expected precondition error, got {other:?}"),
        }
        assert_eq!(api.mutating_calls(), 0);
    }

    #[tokio::test]
    async fn fetch_failure_aborts_immediately() {
        let api = ScriptedApi::with_responses(vec![ScriptedApi::not_found()]);

        let err = Orchestrator::new(&api)
            .deploy(&request(false), false)
            .await
            .unwrap_err();

        assert!(matches!(err, ControlError::Fetch { status: 404, .. }));
        assert_eq!(api.call_count(), 1);
    }

    #[tokio::test]
    async fn rejected_deploy_carries_the_body() {
        let api = ScriptedApi::with_responses(vec![
            ScriptedApi::machine(Ready),
            ScriptedApi::whoami("admin"),
            ScriptedApi::text_response(503, "no rack controller available"),
        ]);

        let err = Orchestrator::new(&api)
            .deploy(&request(false), false)
            .await
            .unwrap_err();

        match err {
            ControlError::DeployRejected {
                status,
                body,
                machine,
            } => {
                assert_eq!(status, 503);
                assert_eq!(body, "no rack controller available");
                assert_eq!(machine.machine_status(), Some(Ready));
            }
            other => panic!("expected deploy rejection, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn wait_workflow_reaches_named_target() {
        let api = ScriptedApi::with_statuses(&[Commissioning, Commissioning, Ready]);

        let mut request = WaitRequest::new("xc4n7d".parse::<SystemId>().unwrap(), "ready");
        request.acceptable = vec!["commissioning".to_string()];

        let machine = Orchestrator::new(&api)
            .wait_for_status(&request)
            .await
            .unwrap();

        assert_eq!(machine.machine_status(), Some(Ready));
        assert_eq!(api.call_count(), 3);
    }

    #[tokio::test]
    async fn wait_workflow_rejects_unknown_status_names() {
        let api = ScriptedApi::with_responses(vec![]);
        let request = WaitRequest::new("xc4n7d".parse::<SystemId>().unwrap(), "launching");

        let err = Orchestrator::new(&api)
            .wait_for_status(&request)
            .await
            .unwrap_err();

        assert!(matches!(err, ControlError::UnknownStatus(_)));
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn api_call_get_passes_through() {
        let api = ScriptedApi::with_responses(vec![ScriptedApi::json_response(
            200,
            &json!([{"system_id": "xc4n7d"}]),
        )]);

        let outcome = Orchestrator::new(&api)
            .api_call(&CallRequest::new(Method::Get, "machines/"), false)
            .await
            .unwrap();

        assert!(!outcome.changed);
        assert!(!outcome.skipped);
        assert!(outcome.response.unwrap().ok);
        assert_eq!(api.call_count(), 1);
    }

    #[tokio::test]
    async fn mutating_call_detects_change_against_snapshot() {
        let api = ScriptedApi::with_responses(vec![
            ScriptedApi::json_response(200, &json!({"description": "old"})),
            ScriptedApi::json_response(200, &json!({"description": "new"})),
        ]);

        let outcome = Orchestrator::new(&api)
            .api_call(&CallRequest::new(Method::Put, "maas/?op=set_config"), false)
            .await
            .unwrap();

        assert!(outcome.changed);
    }

    #[tokio::test]
    async fn mutating_call_with_identical_payload_is_unchanged() {
        let api = ScriptedApi::with_responses(vec![
            ScriptedApi::json_response(200, &json!({"description": "same"})),
            ScriptedApi::json_response(200, &json!({"description": "same"})),
        ]);

        let outcome = Orchestrator::new(&api)
            .api_call(&CallRequest::new(Method::Put, "maas/?op=set_config"), false)
            .await
            .unwrap();

        assert!(!outcome.changed);
    }

    #[tokio::test]
    async fn api_call_failure_can_be_downgraded() {
        let api = ScriptedApi::with_responses(vec![
            ScriptedApi::json_response(200, &json!({})),
            ScriptedApi::not_found(),
        ]);

        let mut request = CallRequest::new(Method::Post, "machines/gone/?op=release");
        request.fail_on_error = false;

        let outcome = Orchestrator::new(&api).api_call(&request, false).await.unwrap();
        let response = outcome.response.unwrap();
        assert!(!response.ok);
        assert_eq!(response.status_code, 404);
    }

    #[tokio::test]
    async fn api_call_failure_is_fatal_by_default() {
        let api = ScriptedApi::with_responses(vec![
            ScriptedApi::json_response(200, &json!({})),
            ScriptedApi::not_found(),
        ]);

        let err = Orchestrator::new(&api)
            .api_call(&CallRequest::new(Method::Post, "machines/gone/?op=release"), false)
            .await
            .unwrap_err();

        assert!(matches!(err, ControlError::CallRejected { status: 404, .. }));
    }

    #[tokio::test]
    async fn dry_run_skips_mutating_calls_entirely() {
        let api = ScriptedApi::with_responses(vec![]);

        let outcome = Orchestrator::new(&api)
            .api_call(&CallRequest::new(Method::Post, "machines/xc4n7d/?op=release"), true)
            .await
            .unwrap();

        assert!(outcome.skipped);
        assert!(outcome.response.is_none());
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn dry_run_still_executes_reads() {
        let api = ScriptedApi::with_responses(vec![ScriptedApi::json_response(200, &json!([]))]);

        let outcome = Orchestrator::new(&api)
            .api_call(&CallRequest::new(Method::Get, "machines/"), true)
            .await
            .unwrap();

        assert!(!outcome.skipped);
        assert_eq!(api.call_count(), 1);
    }
}
