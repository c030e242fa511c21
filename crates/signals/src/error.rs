//! Error taxonomy for signal sources.
//!
//! None of these ever reach the render target. Callers log and degrade.

use crate::capability::{Capability, PlatformVersion};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignalError {
    /// Expected on locked-down devices; the dimension falls back to its default.
    #[error("capability denied: {0}")]
    CapabilityDenied(Capability),

    /// The platform is too old for this signal source.
    #[error("{feature} requires {required}")]
    PlatformUnsupported {
        feature: &'static str,
        required: PlatformVersion,
    },

    /// Null or unexpected payload from an adapter; the single event is dropped.
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    /// State that should not exist, e.g. an update for an untracked slot.
    #[error("internal inconsistency: {0}")]
    InternalInconsistency(String),
}

impl SignalError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        SignalError::MalformedEvent(msg.into())
    }

    pub fn inconsistency(msg: impl Into<String>) -> Self {
        SignalError::InternalInconsistency(msg.into())
    }

    /// Emit at the level this kind of failure deserves.
    pub fn log(&self) {
        match self {
            SignalError::CapabilityDenied(_) => tracing::debug!(error = %self, "signal degraded"),
            SignalError::PlatformUnsupported { .. } => {
                tracing::info!(error = %self, "signal unavailable on this platform")
            }
            SignalError::MalformedEvent(_) => tracing::warn!(error = %self, "event dropped"),
            SignalError::InternalInconsistency(_) => tracing::warn!(error = %self, "event dropped"),
        }
    }
}

pub type SignalResult<T> = std::result::Result<T, SignalError>;
