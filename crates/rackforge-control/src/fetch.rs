//! Shared fetch helpers for the workflows.

use rackforge_client::{ControllerApi, Method, Params, Payload, Response};
use rackforge_core::{CurrentUser, Machine};

use crate::error::{ControlError, Result};

/// Fetch one machine, turning error statuses and unusable bodies into
/// terminal `Fetch` errors.
pub(crate) async fn machine<A: ControllerApi>(api: &A, endpoint: &str) -> Result<Machine> {
    let response = api.call(Method::Get, endpoint, &Params::new()).await?;

    if !response.ok {
        return Err(ControlError::Fetch {
            resource: endpoint.to_string(),
            status: response.status_code,
            detail: render_body(&response),
        });
    }

    let Some(value) = response.json() else {
        return Err(ControlError::Fetch {
            resource: endpoint.to_string(),
            status: response.status_code,
            detail: "response body is not JSON".to_string(),
        });
    };

    Machine::from_value(value).map_err(|e| ControlError::Fetch {
        resource: endpoint.to_string(),
        status: response.status_code,
        detail: e.to_string(),
    })
}

/// Fetch the authenticated user's identity.
pub(crate) async fn whoami<A: ControllerApi>(api: &A) -> Result<CurrentUser> {
    const ENDPOINT: &str = "users/?op=whoami";
    let response = api.call(Method::Get, ENDPOINT, &Params::new()).await?;

    if !response.ok {
        return Err(ControlError::Fetch {
            resource: ENDPOINT.to_string(),
            status: response.status_code,
            detail: render_body(&response),
        });
    }

    let Some(value) = response.json() else {
        return Err(ControlError::Fetch {
            resource: ENDPOINT.to_string(),
            status: response.status_code,
            detail: "response body is not JSON".to_string(),
        });
    };

    CurrentUser::from_value(value).map_err(|e| ControlError::Fetch {
        resource: ENDPOINT.to_string(),
        status: response.status_code,
        detail: e.to_string(),
    })
}

/// A printable rendering of a response body for error messages.
pub(crate) fn render_body(response: &Response) -> String {
    match &response.data {
        Payload::Json(value) => value.to_string(),
        Payload::Text(text) => text.clone(),
    }
}
