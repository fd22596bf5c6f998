//! The API session: one controller, one API version, one credential.
//!
//! `Session` is the unit everything above the wire is built on. It resolves
//! relative endpoints against the API root, signs each request, retries
//! transient failures with backoff, and decodes the body into a
//! [`Response`]. It holds no machine-specific state and is safe to share
//! across workflow calls within one invocation.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::multipart;
use serde::Deserialize;

use crate::credentials::{ApiKey, Credentials};
use crate::endpoint::ControllerEndpoint;
use crate::error::{ClientError, Result};
use crate::response::Response;
use crate::retry::{is_retryable_error, RetryPolicy};
use crate::sign;

/// Form parameters for a write call, in deterministic order.
pub type Params = BTreeMap<String, String>;

/// HTTP methods the controller API accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Read a resource.
    Get,
    /// Invoke an operation or create a resource.
    Post,
    /// Replace a resource.
    Put,
    /// Remove a resource.
    Delete,
}

impl Method {
    /// True for methods that carry a form body.
    #[must_use]
    pub const fn is_mutating(self) -> bool {
        !matches!(self, Self::Get)
    }

    fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

impl FromStr for Method {
    type Err = ClientError;

    /// Parse a method name; anything else is rejected before any network
    /// call is attempted.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            _ => Err(ClientError::Method(s.to_string())),
        }
    }
}

/// The controller client capability.
///
/// This trait is the seam between the transport and the workflows above
/// it; tests substitute scripted implementations.
#[async_trait]
pub trait ControllerApi: Send + Sync {
    /// Perform one API call against a relative endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error when the call cannot complete at the transport
    /// level; an HTTP error status is a successful `Response` with
    /// `ok == false`.
    async fn call(&self, method: Method, endpoint: &str, params: &Params) -> Result<Response>;
}

/// Response shape of the credential exchange endpoint.
#[derive(Debug, Deserialize)]
struct TokenGrant {
    consumer_key: String,
    token_key: String,
    token_secret: String,
}

/// An authenticated API session bound to one controller.
#[derive(Debug, Clone)]
pub struct Session {
    http: reqwest::Client,
    endpoint: ControllerEndpoint,
    key: ApiKey,
    retry: RetryPolicy,
}

impl Session {
    /// Create a session from a pre-obtained API key.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if the HTTP client cannot be built.
    pub fn new(endpoint: ControllerEndpoint, key: ApiKey) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint,
            key,
            retry: RetryPolicy::default(),
        })
    }

    /// Replace the retry policy (primarily for tests and tuning).
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Create a session from either credential form.
    ///
    /// An API key is used directly. A username/password pair is exchanged
    /// for a key first; from then on both forms behave identically.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` when the controller rejects the
    /// exchange, or a transport/config error if it cannot be reached.
    pub async fn connect(endpoint: ControllerEndpoint, credentials: Credentials) -> Result<Self> {
        match credentials {
            Credentials::ApiKey(key) => Self::new(endpoint, key),
            Credentials::Password { username, password } => {
                let key = Self::exchange_password(&endpoint, &username, &password).await?;
                tracing::debug!(username = %username, "exchanged password for API token");
                Self::new(endpoint, key)
            }
        }
    }

    /// The endpoint this session is bound to.
    #[must_use]
    pub fn endpoint(&self) -> &ControllerEndpoint {
        &self.endpoint
    }

    /// Exchange a username/password pair for an API key.
    async fn exchange_password(
        endpoint: &ControllerEndpoint,
        username: &str,
        password: &str,
    ) -> Result<ApiKey> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;

        let response = http
            .post(endpoint.authenticate_url())
            .form(&[
                ("username", username),
                ("password", password),
                ("consumer", "rackforge"),
            ])
            .send()
            .await
            .map_err(|e| ClientError::Transport {
                attempts: 1,
                source: e,
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let grant: TokenGrant = serde_json::from_str(&body).map_err(|e| {
            ClientError::Credentials(format!("malformed token grant from controller: {e}"))
        })?;
        ApiKey::new(grant.consumer_key, grant.token_key, grant.token_secret)
    }

    /// Perform one API call against a relative endpoint.
    ///
    /// `params` ride as named, filename-less multipart form fields on
    /// mutating methods; `GET` never sends a body.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` when the network call cannot
    /// complete after exhausting retries.
    pub async fn call(&self, method: Method, endpoint: &str, params: &Params) -> Result<Response> {
        if method == Method::Get && !params.is_empty() {
            tracing::debug!(endpoint, "ignoring params on GET request");
        }

        let url = self.endpoint.resolve(endpoint);
        let mut attempt = 0u32;
        let mut delay = self.retry.initial_delay;

        loop {
            attempt += 1;
            match self.dispatch(method, &url, params).await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_server_error() && attempt < self.retry.max_attempts {
                        tracing::debug!(
                            endpoint,
                            status = status.as_u16(),
                            attempt,
                            max_attempts = self.retry.max_attempts,
                            "server error, retrying"
                        );
                    } else {
                        let body = response.text().await.map_err(|e| ClientError::Transport {
                            attempts: attempt,
                            source: e,
                        })?;
                        tracing::trace!(
                            endpoint,
                            status = status.as_u16(),
                            body = %body,
                            "API call completed"
                        );
                        return Ok(Response::from_parts(status.as_u16(), &body));
                    }
                }
                Err(err) if is_retryable_error(&err) && attempt < self.retry.max_attempts => {
                    tracing::debug!(
                        endpoint,
                        error = %err,
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        "transport error, retrying"
                    );
                }
                Err(err) => {
                    return Err(ClientError::Transport {
                        attempts: attempt,
                        source: err,
                    });
                }
            }

            tokio::time::sleep(delay).await;
            delay = self.retry.next_delay(delay);
        }
    }

    /// Build, sign and send one request. Each attempt re-signs with a
    /// fresh nonce and rebuilds the form body.
    async fn dispatch(
        &self,
        method: Method,
        url: &str,
        params: &Params,
    ) -> std::result::Result<reqwest::Response, reqwest::Error> {
        let mut request = self
            .http
            .request(method.as_reqwest(), url)
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, sign::authorization_header(&self.key));

        if method.is_mutating() {
            let mut form = multipart::Form::new();
            for (name, value) in params {
                form = form.text(name.clone(), value.clone());
            }
            request = request.multipart(form);
        }

        request.send().await
    }
}

#[async_trait]
impl ControllerApi for Session {
    async fn call(&self, method: Method, endpoint: &str, params: &Params) -> Result<Response> {
        Self::call(self, method, endpoint, params).await
    }
}
