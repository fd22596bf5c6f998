//! Credential forms accepted by the session.
//!
//! The controller issues API keys as a colon-separated triple. A
//! username/password pair is also accepted; it is exchanged for a key at
//! session construction, so everything past the front door runs on the
//! signed path.

use std::fmt;
use std::str::FromStr;

use crate::error::ClientError;

/// A three-part API key: `consumer_key:token:token_secret`.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey {
    /// OAuth consumer key.
    pub consumer_key: String,
    /// OAuth token.
    pub token: String,
    /// OAuth token secret.
    pub token_secret: String,
}

impl ApiKey {
    /// Assemble a key from its parts.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Credentials` if any part is empty.
    pub fn new(
        consumer_key: impl Into<String>,
        token: impl Into<String>,
        token_secret: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let key = Self {
            consumer_key: consumer_key.into(),
            token: token.into(),
            token_secret: token_secret.into(),
        };
        if key.consumer_key.is_empty() || key.token.is_empty() || key.token_secret.is_empty() {
            return Err(ClientError::Credentials(
                "API key parts must be non-empty".to_string(),
            ));
        }
        Ok(key)
    }
}

impl FromStr for ApiKey {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [consumer_key, token, token_secret] => {
                Self::new(*consumer_key, *token, *token_secret)
            }
            _ => Err(ClientError::Credentials(format!(
                "expected consumer_key:token:token_secret, got {} part(s)",
                parts.len()
            ))),
        }
    }
}

// Secrets stay out of logs.
impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKey")
            .field("consumer_key", &self.consumer_key)
            .field("token", &self.token)
            .field("token_secret", &"<redacted>")
            .finish()
    }
}

/// The credential supplied to [`crate::Session::connect`].
///
/// Exactly one form is active per session.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Pre-obtained API key; used directly for request signing.
    ApiKey(ApiKey),
    /// Username and password; exchanged for an API key at construction.
    Password {
        /// Login name.
        username: String,
        /// Password.
        password: String,
    },
}

impl Credentials {
    /// Build credentials from an API key string.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Credentials` if the string is not a valid
    /// three-part key.
    pub fn from_api_key(key: &str) -> Result<Self, ClientError> {
        Ok(Self::ApiKey(key.parse()?))
    }
}
