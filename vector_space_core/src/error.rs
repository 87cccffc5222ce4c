//! Error types for the Vector Space core.
//!
//! Only the load phase can fail. The geometry and interpolation engines are
//! total over finite input and never return these.

use crate::types::{PlatformId, SensorId};
use thiserror::Error;

/// Errors raised while assembling a scene or resolving geodetic input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Two platforms were registered under the same identifier
    #[error("Duplicate platform id: {0}")]
    DuplicatePlatform(PlatformId),

    /// Two sensors were registered under the same identifier
    #[error("Duplicate sensor id: {0}")]
    DuplicateSensor(SensorId),

    /// Sensor FOV or range parameters are unusable
    #[error("Invalid envelope for sensor {sensor}: {reason}")]
    InvalidEnvelope { sensor: SensorId, reason: String },

    /// `LlaReference::First` was requested on a track with no points
    #[error("Cannot take reference from first point: track is empty")]
    EmptyTrack,

    /// Explicit geodetic reference is out of range or not finite
    #[error("Invalid LLA reference: {0}")]
    InvalidReference(String),
}

impl CoreError {
    /// Creates an invalid envelope error.
    pub fn invalid_envelope(sensor: &SensorId, reason: impl Into<String>) -> Self {
        Self::InvalidEnvelope {
            sensor: sensor.clone(),
            reason: reason.into(),
        }
    }
}
