//! Poll targets: which statuses end a wait, which keep it alive.

use std::collections::HashSet;

use rackforge_core::MachineStatus;

use crate::error::{ControlError, Result};

/// How one observed status relates to a [`PollTarget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The status is in the target set; the wait succeeded.
    Success,
    /// The status is acceptable but not yet terminal; keep polling.
    Continue,
    /// The status left the acceptable set; the wait failed.
    Reject,
}

/// The pair of status sets driving a poll loop.
///
/// The target set is always merged into the acceptable set at construction,
/// so callers never have to pre-deduplicate and the superset invariant
/// holds by design of the type.
#[derive(Debug, Clone)]
pub struct PollTarget {
    target: HashSet<MachineStatus>,
    acceptable: HashSet<MachineStatus>,
}

impl PollTarget {
    /// Build a target from any two collections of statuses.
    #[must_use]
    pub fn new(
        target: impl IntoIterator<Item = MachineStatus>,
        acceptable: impl IntoIterator<Item = MachineStatus>,
    ) -> Self {
        let target: HashSet<MachineStatus> = target.into_iter().collect();
        let mut acceptable: HashSet<MachineStatus> = acceptable.into_iter().collect();
        acceptable.extend(&target);
        Self { target, acceptable }
    }

    /// A target consisting of a single terminal status.
    #[must_use]
    pub fn single(status: MachineStatus) -> Self {
        Self::new([status], [])
    }

    /// Build a target from caller-supplied status strings.
    ///
    /// Each string may be a status name (case-insensitive) or a numeric
    /// code; both resolve through the canonical status model.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::UnknownStatus` for a string matching neither.
    pub fn from_strings<S: AsRef<str>>(target: &[S], acceptable: &[S]) -> Result<Self> {
        let parse = |values: &[S]| -> Result<Vec<MachineStatus>> {
            values
                .iter()
                .map(|v| MachineStatus::parse(v.as_ref()).map_err(ControlError::from))
                .collect()
        };
        Ok(Self::new(parse(target)?, parse(acceptable)?))
    }

    /// The statuses that end the wait successfully.
    #[must_use]
    pub const fn target(&self) -> &HashSet<MachineStatus> {
        &self.target
    }

    /// The statuses that keep the wait alive (always includes the target).
    #[must_use]
    pub const fn acceptable(&self) -> &HashSet<MachineStatus> {
        &self.acceptable
    }

    /// Classify one observed status.
    #[must_use]
    pub fn classify(&self, status: MachineStatus) -> Classification {
        if self.target.contains(&status) {
            Classification::Success
        } else if self.acceptable.contains(&status) {
            Classification::Continue
        } else {
            Classification::Reject
        }
    }
}
