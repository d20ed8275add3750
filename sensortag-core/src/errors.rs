//! Error Types for Payload Decoding
//!
//! ## Design Philosophy
//!
//! Decoding runs once per notification on the delivery path, so errors stay
//! small and `Copy`: no heap, no strings, just enough context to log what was
//! dropped. A decode error never aborts a stream. The pipeline drops the frame
//! and keeps going.
//!
//! ## Error Categories
//!
//! - `Truncated`: payload shorter than the field layout requires
//! - `InvalidAxisMask`: gyroscope configuration byte outside `1..=7`
//! - `CalibrationMissing`: barometer frame decoded before its calibration
//!   block was read. This is a sequencing bug in the caller, not a protocol
//!   fault.
//!
//! ```rust
//! use sensortag_core::{decode, DecodeError};
//!
//! match decode::humidity(&[0x00, 0x00]) {
//!     Err(DecodeError::Truncated { needed, got }) => assert_eq!((needed, got), (4, 2)),
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for decode operations
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Decode errors - kept small for the notification path
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Payload too short for the sensor's field layout
    #[error("Payload truncated: need {needed} bytes, got {got}")]
    Truncated {
        /// Minimum payload length for this decoder
        needed: usize,
        /// Length actually received
        got: usize,
    },

    /// Pressure decode attempted with an unpopulated calibration block
    #[error("Calibration block not populated")]
    CalibrationMissing,

    /// Gyroscope axis mask outside the valid range
    #[error("Invalid gyroscope axis mask {0:#04x}")]
    InvalidAxisMask(u8),
}

impl DecodeError {
    /// Checks that `bytes` holds at least `needed` bytes.
    pub(crate) fn require(bytes: &[u8], needed: usize) -> DecodeResult<()> {
        if bytes.len() < needed {
            return Err(Self::Truncated {
                needed,
                got: bytes.len(),
            });
        }
        Ok(())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DecodeError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Truncated { needed, got } =>
                defmt::write!(fmt, "Truncated: need {}, got {}", needed, got),
            Self::CalibrationMissing =>
                defmt::write!(fmt, "Calibration missing"),
            Self::InvalidAxisMask(mask) =>
                defmt::write!(fmt, "Invalid axis mask {}", mask),
        }
    }
}
