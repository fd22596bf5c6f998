//! Request and outcome types for the lifecycle workflows.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use rackforge_client::{Method, Params, Response};
use rackforge_core::{Machine, SystemId};

/// How often the poller fetches the machine, unless overridden.
pub const DEFAULT_WAIT_INTERVAL: Duration = Duration::from_secs(5);

/// Overall poll deadline, unless overridden.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(600);

/// Parameters for the deploy workflow.
#[derive(Debug, Clone)]
pub struct DeployRequest {
    /// The machine to deploy.
    pub system_id: SystemId,
    /// Cloud-init user data handed to the machine at first boot.
    pub user_data: Option<String>,
    /// Operating system series to install; controller default when unset.
    pub distro_series: Option<String>,
    /// Hardware-enablement kernel to install.
    pub hwe_kernel: Option<String>,
    /// Comment for the controller's event log.
    pub comment: Option<String>,
    /// Register the machine as a KVM host after deployment.
    pub install_kvm: bool,
    /// Block until the deployment reaches a terminal status.
    pub wait: bool,
    /// Poll interval while waiting.
    pub wait_interval: Duration,
    /// Overall wall-clock deadline while waiting.
    pub wait_timeout: Duration,
}

impl DeployRequest {
    /// A request with the controller's defaults for everything optional.
    #[must_use]
    pub const fn new(system_id: SystemId) -> Self {
        Self {
            system_id,
            user_data: None,
            distro_series: None,
            hwe_kernel: None,
            comment: None,
            install_kvm: false,
            wait: false,
            wait_interval: DEFAULT_WAIT_INTERVAL,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }

    /// The form parameters for the deploy operation. Absent optionals are
    /// omitted entirely rather than sent empty.
    #[must_use]
    pub fn params(&self) -> Params {
        let mut params = Params::new();
        if let Some(user_data) = &self.user_data {
            params.insert("user_data".to_string(), user_data.clone());
        }
        if let Some(distro_series) = &self.distro_series {
            params.insert("distro_series".to_string(), distro_series.clone());
        }
        if let Some(hwe_kernel) = &self.hwe_kernel {
            params.insert("hwe_kernel".to_string(), hwe_kernel.clone());
        }
        if let Some(comment) = &self.comment {
            params.insert("comment".to_string(), comment.clone());
        }
        params.insert("install_kvm".to_string(), self.install_kvm.to_string());
        params
    }
}

/// Result of a deploy workflow run.
#[derive(Debug, Clone, Serialize)]
pub struct DeployOutcome {
    /// Whether the controller's state was (or would be) mutated.
    pub changed: bool,
    /// Human-readable summary of what happened.
    pub message: String,
    /// The latest known machine payload.
    pub machine: Machine,
}

/// Parameters for the wait workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitRequest {
    /// The machine to watch.
    pub system_id: SystemId,
    /// Status names (or numeric codes) that end the wait successfully.
    pub target: Vec<String>,
    /// Statuses that keep the wait alive without ending it.
    #[serde(default)]
    pub acceptable: Vec<String>,
    /// Poll interval.
    #[serde(default = "WaitRequest::default_interval", with = "duration_secs")]
    pub wait_interval: Duration,
    /// Overall wall-clock deadline.
    #[serde(default = "WaitRequest::default_timeout", with = "duration_secs")]
    pub wait_timeout: Duration,
}

impl WaitRequest {
    /// A request waiting for a single target status.
    #[must_use]
    pub fn new(system_id: SystemId, target: impl Into<String>) -> Self {
        Self {
            system_id,
            target: vec![target.into()],
            acceptable: Vec::new(),
            wait_interval: DEFAULT_WAIT_INTERVAL,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }

    const fn default_interval() -> Duration {
        DEFAULT_WAIT_INTERVAL
    }

    const fn default_timeout() -> Duration {
        DEFAULT_WAIT_TIMEOUT
    }
}

/// (De)serialize a `Duration` as whole seconds.
mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}

/// Parameters for an opaque passthrough API call.
#[derive(Debug, Clone)]
pub struct CallRequest {
    /// HTTP method.
    pub method: Method,
    /// Relative endpoint, query string included, passed through untouched.
    pub endpoint: String,
    /// Form parameters for mutating methods.
    pub params: Params,
    /// Treat a non-2xx response as a workflow failure.
    pub fail_on_error: bool,
}

impl CallRequest {
    /// A call with no parameters that fails on error statuses.
    #[must_use]
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            params: Params::new(),
            fail_on_error: true,
        }
    }
}

/// Result of a passthrough API call.
#[derive(Debug, Clone)]
pub struct CallOutcome {
    /// Whether the call changed server-side state, judged by comparing
    /// a pre-call snapshot of the endpoint with the call's response.
    pub changed: bool,
    /// True when a mutating call was skipped in dry-run mode.
    pub skipped: bool,
    /// The response, absent only for skipped calls.
    pub response: Option<Response>,
}
