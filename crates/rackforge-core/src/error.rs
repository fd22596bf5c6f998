//! Common error types shared across the rackforge crates.

use thiserror::Error;

/// A result type using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors that can occur while interpreting controller data.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A system identifier was empty or malformed.
    #[error("invalid system id: {0:?}")]
    InvalidSystemId(String),

    /// The controller reported a status code outside the known enumeration.
    #[error("unknown machine status code: {0}")]
    UnknownStatusCode(i64),

    /// A status name did not match any known machine status.
    #[error("unknown machine status name: {0:?}")]
    UnknownStatusName(String),

    /// A payload could not be interpreted as the expected record.
    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
}
