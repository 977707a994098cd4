use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures surfaced by the host positioning capability.
///
/// The first three are soft: observation keeps running and the host may
/// recover on its own. `CapabilityUnavailable` only comes out of
/// `PositionSampler::start` and means the session never begins.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorError {
    #[error("Positioning is not available on this device")]
    CapabilityUnavailable,

    #[error("Permission to access location was denied")]
    PermissionDenied,

    #[error("Position unavailable")]
    PositionUnavailable,

    #[error("Timed out waiting for a position fix")]
    Timeout,
}

impl SensorError {
    /// Maps the host's numeric error codes (1 = permission denied,
    /// 2 = position unavailable, 3 = timeout).
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(Self::PermissionDenied),
            2 => Some(Self::PositionUnavailable),
            3 => Some(Self::Timeout),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::CapabilityUnavailable)
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Failed to parse environment variable {var}: {value:?}")]
    Env { var: &'static str, value: String },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Sensor error: {0}")]
    Sensor(#[from] SensorError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
