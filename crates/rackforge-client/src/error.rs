//! Error types for the client crate.

use thiserror::Error;

/// A result type using `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors raised by the transport and session layer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The credential string could not be parsed into its parts.
    #[error("invalid credentials: {0}")]
    Credentials(String),

    /// The session configuration is unusable (bad URL, missing fields).
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An HTTP method outside GET/POST/PUT/DELETE was requested.
    #[error("invalid HTTP method: {0:?}")]
    Method(String),

    /// The network call could not complete after exhausting retries.
    ///
    /// Distinct from an HTTP error status: no response was obtained at all.
    #[error("transport failure after {attempts} attempt(s): {source}")]
    Transport {
        /// How many attempts were made before giving up.
        attempts: u32,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The controller answered a call the session itself depends on
    /// (e.g. the credential exchange) with an error status.
    #[error("controller returned HTTP {status}: {body}")]
    Api {
        /// HTTP status code of the rejection.
        status: u16,
        /// Response body, verbatim.
        body: String,
    },
}

impl ClientError {
    /// True if the failure happened below HTTP, i.e. no response exists.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}
