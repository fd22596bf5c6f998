//! Controller endpoint resolution.
//!
//! A session is bound to one controller base URL and one API version; both
//! are immutable once the session exists. Relative endpoint paths resolve
//! against `{base_url}/api/{version}/` and a leading slash on the endpoint
//! is tolerated.

use url::Url;

use crate::error::ClientError;

/// Default controller root on a local installation.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5240/MAAS/";

/// Default API version spoken by the session.
pub const DEFAULT_API_VERSION: &str = "2.0";

/// A controller base URL plus API version.
#[derive(Debug, Clone)]
pub struct ControllerEndpoint {
    base_url: String,
    api_version: String,
}

impl ControllerEndpoint {
    /// Create an endpoint from a base URL and API version.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` when the base URL does not parse as an
    /// absolute http(s) URL.
    pub fn new(base_url: &str, api_version: &str) -> Result<Self, ClientError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| ClientError::Config(format!("invalid controller URL {base_url:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "controller URL must be http or https, got {:?}",
                parsed.scheme()
            )));
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_version: api_version.to_string(),
        })
    }

    /// The configured API version.
    #[must_use]
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// The absolute API root: `{base_url}/api/{version}/`.
    #[must_use]
    pub fn api_root(&self) -> String {
        format!("{}/api/{}/", self.base_url, self.api_version)
    }

    /// Resolve a relative endpoint path against the API root.
    ///
    /// Endpoints are opaque; query strings pass through untouched.
    #[must_use]
    pub fn resolve(&self, endpoint: &str) -> String {
        format!("{}{}", self.api_root(), endpoint.trim_start_matches('/'))
    }

    /// The credential exchange endpoint, outside the versioned API root.
    #[must_use]
    pub fn authenticate_url(&self) -> String {
        format!("{}/accounts/authenticate/", self.base_url)
    }
}

impl Default for ControllerEndpoint {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.trim_end_matches('/').to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}
