// src/errors.rs
//
// Fault taxonomy. Component-local faults (a failed probe, a failed match)
// are absorbed where they occur and never reach this enum; only systemic
// faults that the caller must know about are represented here.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum PerceptionError {
    /// The classifier model could not be initialized. Fatal to the
    /// detection path only; the radar path keeps running.
    #[error("failed to load classifier model: {0}")]
    ModelLoadFailed(String),

    /// A classifier run failed after successful initialization.
    #[error("classifier inference failed: {0}")]
    InferenceFailed(String),

    /// Transient sensor session interruption. Non-fatal advisory; tracked
    /// state is preserved and the condition clears on recovery.
    #[error("sensor session interrupted: {0}")]
    SessionInterrupted(String),

    /// The depth subsystem is not available at all on this device.
    #[error("depth sensor not available")]
    DepthUnavailable,
}

impl PerceptionError {
    /// Whether the session can keep running in a degraded mode.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::DepthUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverability() {
        assert!(PerceptionError::ModelLoadFailed("missing file".into()).is_recoverable());
        assert!(PerceptionError::SessionInterrupted("backgrounded".into()).is_recoverable());
        assert!(!PerceptionError::DepthUnavailable.is_recoverable());
    }

    #[test]
    fn test_display() {
        let err = PerceptionError::InferenceFailed("shape mismatch".into());
        assert_eq!(err.to_string(), "classifier inference failed: shape mismatch");
    }
}
