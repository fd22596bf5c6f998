//! Signed HTTP transport and API session for a rackforge controller.
//!
//! This crate covers everything between a workflow and the wire:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │          workflows (rackforge-control)       │
//! └─────────────────────┬───────────────────────┘
//!                       │ ControllerApi::call
//! ┌─────────────────────▼───────────────────────┐
//! │                  Session                     │
//! │  endpoint resolution · OAuth signing ·       │
//! │  retry with backoff · body decoding          │
//! └─────────────────────┬───────────────────────┘
//!                       │ HTTPS
//! ┌─────────────────────▼───────────────────────┐
//! │               controller API                 │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use rackforge_client::{ControllerEndpoint, Credentials, Method, Params, Session};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let endpoint = ControllerEndpoint::new("http://rack.lab:5240/MAAS/", "2.0")?;
//! let credentials = Credentials::from_api_key("consumer:token:secret")?;
//! let session = Session::connect(endpoint, credentials).await?;
//!
//! let response = session.call(Method::Get, "machines/xc4n7d/", &Params::new()).await?;
//! println!("HTTP {} ok={}", response.status_code, response.ok);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod credentials;
pub mod endpoint;
pub mod error;
pub mod response;
pub mod retry;
pub mod session;

mod sign;

pub use credentials::{ApiKey, Credentials};
pub use endpoint::{ControllerEndpoint, DEFAULT_API_VERSION, DEFAULT_BASE_URL};
pub use error::{ClientError, Result};
pub use response::{Payload, Response};
pub use retry::RetryPolicy;
pub use session::{ControllerApi, Method, Params, Session};
