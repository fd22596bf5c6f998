//! The canonical machine status model.
//!
//! The controller reports a machine status twice in every payload: as a
//! numeric `status` code and as a human-readable `status_name`. Callers may
//! address a status through either representation, so both resolve into this
//! single enumeration and all comparisons happen on the enum.

use std::fmt;

use crate::error::CoreError;

/// Lifecycle statuses a controller-managed machine can report.
///
/// Discriminants are the controller's wire codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i64)]
pub enum MachineStatus {
    /// Newly enlisted, not yet commissioned.
    New = 0,
    /// Hardware discovery in progress.
    Commissioning = 1,
    /// Commissioning did not complete.
    FailedCommissioning = 2,
    /// The controller lost contact with the machine.
    Missing = 3,
    /// Commissioned and available for allocation.
    Ready = 4,
    /// Held back from the general pool.
    Reserved = 5,
    /// Operating system installed and booted.
    Deployed = 6,
    /// Withdrawn from service.
    Retired = 7,
    /// Marked broken by an operator.
    Broken = 8,
    /// Operating system installation in progress.
    Deploying = 9,
    /// Acquired by a user, not yet deployed.
    Allocated = 10,
    /// Deployment did not complete.
    FailedDeployment = 11,
    /// Returning to the pool.
    Releasing = 12,
    /// Release did not complete.
    FailedReleasing = 13,
    /// Disks are being wiped.
    DiskErasing = 14,
    /// Disk erasure did not complete.
    FailedDiskErasing = 15,
}

impl MachineStatus {
    const ALL: [Self; 16] = [
        Self::New,
        Self::Commissioning,
        Self::FailedCommissioning,
        Self::Missing,
        Self::Ready,
        Self::Reserved,
        Self::Deployed,
        Self::Retired,
        Self::Broken,
        Self::Deploying,
        Self::Allocated,
        Self::FailedDeployment,
        Self::Releasing,
        Self::FailedReleasing,
        Self::DiskErasing,
        Self::FailedDiskErasing,
    ];

    /// The controller's numeric code for this status.
    #[must_use]
    pub const fn code(self) -> i64 {
        self as i64
    }

    /// Resolve a numeric wire code into a status.
    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.code() == code)
    }

    /// The controller's human-readable name for this status.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Commissioning => "Commissioning",
            Self::FailedCommissioning => "Failed commissioning",
            Self::Missing => "Missing",
            Self::Ready => "Ready",
            Self::Reserved => "Reserved",
            Self::Deployed => "Deployed",
            Self::Retired => "Retired",
            Self::Broken => "Broken",
            Self::Deploying => "Deploying",
            Self::Allocated => "Allocated",
            Self::FailedDeployment => "Failed deployment",
            Self::Releasing => "Releasing",
            Self::FailedReleasing => "Failed releasing",
            Self::DiskErasing => "Disk erasing",
            Self::FailedDiskErasing => "Failed disk erasing",
        }
    }

    /// Resolve a status name, case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let lowered = name.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.name().to_lowercase() == lowered)
    }

    /// Parse either representation: a numeric code or a status name.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UnknownStatusName` when the string matches
    /// neither a code nor a name.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        if let Ok(code) = value.trim().parse::<i64>() {
            return Self::from_code(code).ok_or(CoreError::UnknownStatusCode(code));
        }
        Self::from_name(value).ok_or_else(|| CoreError::UnknownStatusName(value.to_string()))
    }

    /// True while the controller is still working towards a deployment.
    #[must_use]
    pub const fn is_deploy_in_progress(self) -> bool {
        matches!(self, Self::Deploying)
    }

    /// True once a deployment has completed.
    #[must_use]
    pub const fn is_deployed(self) -> bool {
        matches!(self, Self::Deployed)
    }
}

impl fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for status in MachineStatus::ALL {
            assert_eq!(MachineStatus::from_code(status.code()), Some(status));
        }
    }

    #[test]
    fn names_round_trip() {
        for status in MachineStatus::ALL {
            assert_eq!(MachineStatus::from_name(status.name()), Some(status));
        }
    }

    #[test]
    fn name_lookup_is_case_insensitive() {
        assert_eq!(
            MachineStatus::from_name("FAILED DEPLOYMENT"),
            Some(MachineStatus::FailedDeployment)
        );
        assert_eq!(
            MachineStatus::from_name("deploying"),
            Some(MachineStatus::Deploying)
        );
    }

    #[test]
    fn unknown_code_is_none() {
        assert_eq!(MachineStatus::from_code(99), None);
        assert_eq!(MachineStatus::from_code(-1), None);
    }

    #[test]
    fn parse_accepts_both_representations() {
        assert_eq!(MachineStatus::parse("6").unwrap(), MachineStatus::Deployed);
        assert_eq!(
            MachineStatus::parse("ready").unwrap(),
            MachineStatus::Ready
        );
        assert!(matches!(
            MachineStatus::parse("42"),
            Err(CoreError::UnknownStatusCode(42))
        ));
        assert!(matches!(
            MachineStatus::parse("launching"),
            Err(CoreError::UnknownStatusName(_))
        ));
    }

    #[test]
    fn deploy_predicates() {
        assert!(MachineStatus::Deployed.is_deployed());
        assert!(MachineStatus::Deploying.is_deploy_in_progress());
        assert!(!MachineStatus::Ready.is_deployed());
        assert!(!MachineStatus::Ready.is_deploy_in_progress());
    }
}
