//! Scripted `ControllerApi` implementation for workflow tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use rackforge_client::{ControllerApi, Method, Params, Response};
use rackforge_core::MachineStatus;

/// An API stub that answers calls from a prepared script, in order.
pub(crate) struct ScriptedApi {
    script: Mutex<VecDeque<rackforge_client::Result<Response>>>,
    repeat: Option<Response>,
    calls: Mutex<Vec<(Method, String)>>,
}

impl ScriptedApi {
    /// Answer calls with the given responses, then panic if called again.
    pub(crate) fn with_responses(responses: Vec<Response>) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().map(Ok).collect()),
            repeat: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer calls with the given outcomes, errors included.
    pub(crate) fn with_outcomes(outcomes: Vec<rackforge_client::Result<Response>>) -> Self {
        Self {
            script: Mutex::new(outcomes.into_iter().collect()),
            repeat: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer with machine payloads carrying the given statuses, in order.
    pub(crate) fn with_statuses(statuses: &[MachineStatus]) -> Self {
        Self::with_responses(statuses.iter().map(|s| Self::machine(*s)).collect())
    }

    /// Answer every call with the same machine payload, forever.
    pub(crate) fn repeating_status(status: MachineStatus) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            repeat: Some(Self::machine(status)),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A 200 machine payload with the given status.
    pub(crate) fn machine(status: MachineStatus) -> Response {
        Self::raw_machine(json!({
            "system_id": "xc4n7d",
            "hostname": "rack-01",
            "status": status.code(),
            "status_name": status.name(),
            "owner": null,
        }))
    }

    /// A 200 machine payload with the given status and owner.
    pub(crate) fn owned_machine(status: MachineStatus, owner: &str) -> Response {
        Self::raw_machine(json!({
            "system_id": "xc4n7d",
            "hostname": "rack-01",
            "status": status.code(),
            "status_name": status.name(),
            "owner": owner,
        }))
    }

    /// A 200 payload for the whoami endpoint.
    pub(crate) fn whoami(username: &str) -> Response {
        Self::json_response(200, &json!({"username": username, "is_superuser": false}))
    }

    /// A 404 with a JSON error body.
    pub(crate) fn not_found() -> Response {
        Self::json_response(404, &json!({"error": "no such machine"}))
    }

    /// A 200 response with an arbitrary machine payload.
    pub(crate) fn raw_machine(payload: Value) -> Response {
        Self::json_response(200, &payload)
    }

    /// Any status code with a JSON body.
    pub(crate) fn json_response(status: u16, body: &Value) -> Response {
        Response::from_parts(status, &body.to_string())
    }

    /// Any status code with a plain text body.
    pub(crate) fn text_response(status: u16, body: &str) -> Response {
        Response::from_parts(status, body)
    }

    /// Total number of calls issued.
    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Number of mutating (non-GET) calls issued.
    pub(crate) fn mutating_calls(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(method, _)| method.is_mutating())
            .count()
    }

    /// The endpoints called so far, in order.
    pub(crate) fn endpoints(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, endpoint)| endpoint.clone())
            .collect()
    }
}

#[async_trait]
impl ControllerApi for ScriptedApi {
    async fn call(
        &self,
        method: Method,
        endpoint: &str,
        _params: &Params,
    ) -> rackforge_client::Result<Response> {
        self.calls
            .lock()
            .unwrap()
            .push((method, endpoint.to_string()));

        if let Some(next) = self.script.lock().unwrap().pop_front() {
            return next;
        }
        match &self.repeat {
            Some(response) => Ok(response.clone()),
            None => panic!("scripted API exhausted at {method} {endpoint}"),
        }
    }
}
