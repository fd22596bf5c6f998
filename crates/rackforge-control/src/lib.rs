//! Machine lifecycle workflows for a rackforge controller.
//!
//! This crate composes the API session into the workflows automation
//! actually runs: deploying a machine, waiting for a status transition,
//! and passing opaque API calls through with change detection.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Orchestrator                           │
//! │  ┌────────────┐  ┌───────────────┐  ┌───────────────────┐   │
//! │  │   deploy   │  │ wait_for_     │  │     api_call      │   │
//! │  │  workflow  │  │ status        │  │   (passthrough)   │   │
//! │  └─────┬──────┘  └──────┬────────┘  └────────┬──────────┘   │
//! │        │                │                    │              │
//! │        └───────┬────────┘                    │              │
//! │                ▼                             │              │
//! │        ┌──────────────┐                      │              │
//! │        │    Poller    │                      │              │
//! │        │ (PollTarget) │                      │              │
//! │        └───────┬──────┘                      │              │
//! └────────────────┼─────────────────────────────┼──────────────┘
//!                  ▼                             ▼
//!          ┌──────────────────────────────────────────┐
//!          │        ControllerApi (Session)           │
//!          └──────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use rackforge_client::{ControllerEndpoint, Credentials, Session};
//! use rackforge_control::{DeployRequest, Orchestrator, Report};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::connect(
//!     ControllerEndpoint::default(),
//!     Credentials::from_api_key("consumer:token:secret")?,
//! )
//! .await?;
//!
//! let mut request = DeployRequest::new("xc4n7d".parse()?);
//! request.distro_series = Some("jammy".to_string());
//! request.wait = true;
//!
//! let orchestrator = Orchestrator::new(&session);
//! let report = Report::from_deploy(orchestrator.deploy(&request, false).await);
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
mod fetch;
pub mod orchestrator;
pub mod poller;
pub mod report;
pub mod requests;
pub mod target;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{ControlError, Result};
pub use orchestrator::Orchestrator;
pub use poller::{Poller, StatusMode};
pub use report::Report;
pub use requests::{
    CallOutcome, CallRequest, DeployOutcome, DeployRequest, WaitRequest, DEFAULT_WAIT_INTERVAL,
    DEFAULT_WAIT_TIMEOUT,
};
pub use target::{Classification, PollTarget};

// Re-export the session-facing types workflow callers need.
pub use rackforge_client::{ControllerApi, Method, Params, Session};
pub use rackforge_core::{Machine, MachineStatus, SystemId};
