//! Link-layer errors
//!
//! Transports report [`TransportError`] with no context. Channels wrap it into
//! a [`LinkError`] naming the sensor and endpoint so a single aggregated setup
//! failure still says where it happened.

use sensortag_core::{DecodeError, SensorKind};
use thiserror::Error;

/// Result type for link operations
pub type LinkResult<T> = Result<T, LinkError>;

/// Failure reported by a transport call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransportError {
    /// No device exposes the requested service
    #[error("Service not found")]
    NotFound,

    /// The device did not respond
    #[error("Device unreachable")]
    Unreachable,
}

/// Errors raised by sensor channels and the orchestrator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LinkError {
    /// Discovery found no device exposing the sensor's service
    #[error("{kind}: no device exposes service {service}")]
    DeviceNotFound {
        kind: SensorKind,
        service: &'static str,
    },

    /// A read or write on a characteristic failed
    #[error("{kind}: characteristic {characteristic} unreachable")]
    Unreachable {
        kind: SensorKind,
        characteristic: &'static str,
    },

    /// Malformed payload, including an unreadable calibration block
    #[error("{kind}: {source}")]
    Decode {
        kind: SensorKind,
        #[source]
        source: DecodeError,
    },

    /// Operation not valid in the channel's current state
    #[error("{kind}: cannot {operation} while {state}")]
    InvalidState {
        kind: SensorKind,
        state: &'static str,
        operation: &'static str,
    },

    /// The sensor has no such capability (e.g. period on the gyroscope)
    #[error("{kind}: {operation} not supported")]
    Unsupported {
        kind: SensorKind,
        operation: &'static str,
    },

    /// The channel or orchestrator has been disposed
    #[error("Disposed")]
    Disposed,
}

impl LinkError {
    /// Sensor the error belongs to, if any.
    pub fn kind(&self) -> Option<SensorKind> {
        match self {
            LinkError::DeviceNotFound { kind, .. }
            | LinkError::Unreachable { kind, .. }
            | LinkError::Decode { kind, .. }
            | LinkError::InvalidState { kind, .. }
            | LinkError::Unsupported { kind, .. } => Some(*kind),
            LinkError::Disposed => None,
        }
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, LinkError::Unreachable { .. })
    }
}
