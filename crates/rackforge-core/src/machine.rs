//! Typed views of controller payloads.
//!
//! Machine payloads carry dozens of fields; the workflows only ever inspect
//! a handful. Those are modelled as named optional fields, and everything
//! else is preserved verbatim in a flattened raw map so callers always get
//! the complete payload back.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::status::MachineStatus;

/// A machine resource as reported by the controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    /// Opaque machine identifier.
    #[serde(default)]
    pub system_id: Option<String>,
    /// Short hostname.
    #[serde(default)]
    pub hostname: Option<String>,
    /// Fully qualified domain name.
    #[serde(default)]
    pub fqdn: Option<String>,
    /// Numeric lifecycle status code.
    #[serde(default)]
    pub status: Option<i64>,
    /// Human-readable status name.
    #[serde(default)]
    pub status_name: Option<String>,
    /// Username of the owner, if allocated.
    #[serde(default)]
    pub owner: Option<String>,
    /// Everything else the controller sent, preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Machine {
    /// Interpret a decoded JSON payload as a machine record.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::MalformedPayload` when the payload is not an
    /// object shaped like a machine.
    pub fn from_value(value: &Value) -> Result<Self, CoreError> {
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Resolve the canonical status from the numeric code.
    ///
    /// `None` when the payload carried no code or an unknown one.
    #[must_use]
    pub fn machine_status(&self) -> Option<MachineStatus> {
        self.status.and_then(MachineStatus::from_code)
    }

    /// The lower-cased status name, as used for name-based polling.
    #[must_use]
    pub fn status_name_lower(&self) -> Option<String> {
        self.status_name.as_deref().map(str::to_lowercase)
    }

    /// A printable description of the last-seen status for error messages.
    #[must_use]
    pub fn status_label(&self) -> String {
        match (&self.status_name, self.status) {
            (Some(name), _) => name.clone(),
            (None, Some(code)) => code.to_string(),
            (None, None) => "unknown".to_string(),
        }
    }
}

/// The authenticated user, from the controller's whoami endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Login name the controller tracks ownership by.
    pub username: String,
    /// Everything else the controller sent.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl CurrentUser {
    /// Interpret a decoded JSON payload as the current user.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::MalformedPayload` when the payload has no
    /// username.
    pub fn from_value(value: &Value) -> Result<Self, CoreError> {
        Ok(serde_json::from_value(value.clone())?)
    }
}
