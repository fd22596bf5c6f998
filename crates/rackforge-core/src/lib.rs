//! Core types for the rackforge provisioning toolkit.
//!
//! This crate provides the foundational types shared by the client and
//! control crates:
//!
//! - **Identifiers**: the opaque `SystemId` a controller assigns to a machine
//! - **Status model**: the canonical [`MachineStatus`] enumeration with the
//!   controller's numeric codes and human-readable names
//! - **Records**: typed views of the machine and user payloads the workflows
//!   inspect, with a raw-map fallback for everything else
//!
//! # Example
//!
//! ```
//! use rackforge_core::{MachineStatus, SystemId};
//!
//! let id: SystemId = "xc4n7d".parse().unwrap();
//! assert_eq!(id.as_str(), "xc4n7d");
//!
//! // Numeric codes and status names resolve to the same model.
//! assert_eq!(MachineStatus::from_code(6), Some(MachineStatus::Deployed));
//! assert_eq!(MachineStatus::from_name("deployed"), Some(MachineStatus::Deployed));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod ids;
pub mod machine;
pub mod status;

pub use error::{CoreError, Result};
pub use ids::SystemId;
pub use machine::{CurrentUser, Machine};
pub use status::MachineStatus;
