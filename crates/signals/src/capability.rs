//! Permission and platform-version gates.

use serde::{Deserialize, Serialize};

/// Runtime permission the platform may grant or deny.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Needed for any SIM/subscription query.
    ReadPhoneState,
    /// Needed for cell-info based signal levels on old platforms.
    CoarseLocation,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::ReadPhoneState => f.write_str("read_phone_state"),
            Capability::CoarseLocation => f.write_str("coarse_location"),
        }
    }
}

/// Platform API level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformVersion(pub u32);

impl PlatformVersion {
    pub const LOLLIPOP_MR1: PlatformVersion = PlatformVersion(22);
    pub const M: PlatformVersion = PlatformVersion(23);
    pub const N: PlatformVersion = PlatformVersion(24);
    pub const O: PlatformVersion = PlatformVersion(26);
    pub const P: PlatformVersion = PlatformVersion(28);
    pub const Q: PlatformVersion = PlatformVersion(29);
}

impl std::fmt::Display for PlatformVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "api {}", self.0)
    }
}

/// Minimum version for full SIM information (service state per subscription).
pub const SIM_INFO_MIN_VERSION: PlatformVersion = PlatformVersion::O;

/// Minimum version for audio-device based headset detection.
pub const AUDIO_DEVICES_MIN_VERSION: PlatformVersion = PlatformVersion::M;

/// Boolean capability oracle. Never fails; a missing capability disables a feature.
pub trait CapabilityProvider: Send + Sync {
    fn has_permission(&self, capability: Capability) -> bool;

    fn platform_version_at_least(&self, version: PlatformVersion) -> bool;
}

/// Provider that grants everything; useful for hosts without permission models.
pub struct AllowAll;

impl CapabilityProvider for AllowAll {
    fn has_permission(&self, _capability: Capability) -> bool {
        true
    }

    fn platform_version_at_least(&self, _version: PlatformVersion) -> bool {
        true
    }
}

/// Check a permission and a minimum version together.
pub fn require(
    provider: &dyn CapabilityProvider,
    capability: Capability,
    version: PlatformVersion,
    feature: &'static str,
) -> Result<(), crate::SignalError> {
    if !provider.platform_version_at_least(version) {
        return Err(crate::SignalError::PlatformUnsupported {
            feature,
            required: version,
        });
    }
    if !provider.has_permission(capability) {
        return Err(crate::SignalError::CapabilityDenied(capability));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SignalError;

    struct OldPlatform;

    impl CapabilityProvider for OldPlatform {
        fn has_permission(&self, _capability: Capability) -> bool {
            false
        }

        fn platform_version_at_least(&self, version: PlatformVersion) -> bool {
            version <= PlatformVersion::M
        }
    }

    #[test]
    fn test_require_checks_version_first() {
        let err = require(&OldPlatform, Capability::ReadPhoneState, PlatformVersion::O, "sim")
            .unwrap_err();
        assert!(matches!(err, SignalError::PlatformUnsupported { .. }));
    }

    #[test]
    fn test_require_reports_denied_permission() {
        let err = require(&OldPlatform, Capability::ReadPhoneState, PlatformVersion::M, "sim")
            .unwrap_err();
        assert!(matches!(
            err,
            SignalError::CapabilityDenied(Capability::ReadPhoneState)
        ));
    }

    #[test]
    fn test_allow_all() {
        assert!(require(&AllowAll, Capability::CoarseLocation, PlatformVersion::Q, "x").is_ok());
    }

    #[test]
    fn test_version_ordering() {
        assert!(PlatformVersion::O > PlatformVersion::N);
        assert!(PlatformVersion::LOLLIPOP_MR1 < PlatformVersion::M);
    }
}
