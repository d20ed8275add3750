//! Barometric pressure decoder (T5400)
//!
//! ## Compensation
//!
//! The T5400 reports raw temperature `t_r` (signed) and raw pressure `p_r`
//! (unsigned). Turning them into physical units needs eight per-device
//! coefficients read from the calibration characteristic during setup:
//!
//! ```text
//! c0..c3 : unsigned 16-bit      c4..c7 : signed 16-bit
//!
//! t_a = 100 * (c0 * t_r / 2^8 + c1 * 2^6) / 2^16        (0.01 °C)
//! S   = c2 + c3 * t_r / 2^17 + (c4 * t_r / 2^15) * t_r / 2^19
//! O   = c5 * 2^14 + c6 * t_r / 2^3 + (c7 * t_r / 2^15) * t_r / 2^4
//! P   = (S * p_r + O) / 2^14                               (Pa)
//! ```
//!
//! Source: EPCOS T5400 application note.
//!
//! ## Precondition
//!
//! The block must be read before any barometer frame is decoded. A block that
//! was never populated is all zero; decoding against it returns
//! [`DecodeError::CalibrationMissing`] rather than a plausible-looking zero.

use crate::constants::sensors::CALIBRATION_BLOCK_LEN;
use crate::errors::{DecodeError, DecodeResult};

use super::{i16_le, u16_le};

/// Per-device barometer compensation coefficients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalibrationBlock {
    coefficients: [i32; CALIBRATION_BLOCK_LEN],
}

impl CalibrationBlock {
    /// Block from already parsed coefficients, c1 first.
    pub const fn new(coefficients: [i32; CALIBRATION_BLOCK_LEN]) -> Self {
        Self { coefficients }
    }

    /// Parses the 16-byte calibration characteristic value.
    ///
    /// The first four words are unsigned, the last four signed.
    pub fn from_bytes(bytes: &[u8]) -> DecodeResult<Self> {
        DecodeError::require(bytes, CALIBRATION_BLOCK_LEN * 2)?;

        let mut coefficients = [0i32; CALIBRATION_BLOCK_LEN];
        for (i, c) in coefficients.iter_mut().enumerate() {
            *c = if i < 4 {
                u16_le(bytes, i * 2) as i32
            } else {
                i16_le(bytes, i * 2) as i32
            };
        }

        Ok(Self { coefficients })
    }

    /// Coefficients c1..c8.
    pub fn coefficients(&self) -> &[i32; CALIBRATION_BLOCK_LEN] {
        &self.coefficients
    }

    /// False for a block that was never read.
    pub fn is_populated(&self) -> bool {
        self.coefficients.iter().any(|&c| c != 0)
    }

    fn checked(&self) -> DecodeResult<[f64; CALIBRATION_BLOCK_LEN]> {
        if !self.is_populated() {
            return Err(DecodeError::CalibrationMissing);
        }
        Ok(self.coefficients.map(|c| c as f64))
    }
}

const P2_3: f64 = 8.0;
const P2_4: f64 = 16.0;
const P2_6: f64 = 64.0;
const P2_8: f64 = 256.0;
const P2_14: f64 = 16384.0;
const P2_15: f64 = 32768.0;
const P2_16: f64 = 65536.0;
const P2_17: f64 = 131072.0;
const P2_19: f64 = 524288.0;

/// Compensated pressure in pascal.
pub fn pressure(bytes: &[u8], calibration: &CalibrationBlock) -> DecodeResult<f64> {
    DecodeError::require(bytes, 4)?;
    let c = calibration.checked()?;

    let t_r = i16_le(bytes, 0) as f64;
    let p_r = u16_le(bytes, 2) as f64;

    let s = c[2] + c[3] * t_r / P2_17 + ((c[4] * t_r / P2_15) * t_r) / P2_19;
    let o = c[5] * P2_14 + c[6] * t_r / P2_3 + ((c[7] * t_r / P2_15) * t_r) / P2_4;

    Ok((s * p_r + o) / P2_14)
}

/// Sensor die temperature in °C from the same frame.
pub fn pressure_die_temperature(bytes: &[u8], calibration: &CalibrationBlock) -> DecodeResult<f64> {
    DecodeError::require(bytes, 2)?;
    let c = calibration.checked()?;

    let t_r = i16_le(bytes, 0) as f64;
    let centi = 100.0 * (c[0] * t_r / P2_8 + c[1] * P2_6) / P2_16;

    Ok(centi / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAL: CalibrationBlock =
        CalibrationBlock::new([45697, 25592, 48894, 36174, 2600, -1166, 6730, -4800]);

    #[test]
    fn zero_raw_values_yield_offset_coefficient() {
        let p = pressure(&[0, 0, 0, 0], &CAL).unwrap();
        assert_eq!(p, -1166.0);
    }

    #[test]
    fn typical_reading_is_sea_level_range() {
        // t_r = 0x0100 (256), p_r = 0x85EA (34282)
        let p = pressure(&[0x00, 0x01, 0xEA, 0x85], &CAL).unwrap();
        let hpa = p / 100.0;
        assert!((hpa - 1013.0).abs() < 1.0, "got {} hPa", hpa);
    }

    #[test]
    fn die_temperature_is_plausible() {
        let t = pressure_die_temperature(&[0x00, 0x01, 0xEA, 0x85], &CAL).unwrap();
        assert!((t - 25.69).abs() < 0.01, "got {} °C", t);
    }

    #[test]
    fn unpopulated_block_is_rejected() {
        let empty = CalibrationBlock::default();
        assert!(!empty.is_populated());
        assert_eq!(pressure(&[1, 2, 3, 4], &empty), Err(DecodeError::CalibrationMissing));
        assert_eq!(
            pressure_die_temperature(&[1, 2], &empty),
            Err(DecodeError::CalibrationMissing)
        );
    }

    #[test]
    fn block_parses_signedness_per_word() {
        let mut bytes = [0u8; 16];
        bytes[0..2].copy_from_slice(&0xFFFFu16.to_le_bytes());
        bytes[8..10].copy_from_slice(&(-2i16).to_le_bytes());
        bytes[14..16].copy_from_slice(&0x8000u16.to_le_bytes());

        let block = CalibrationBlock::from_bytes(&bytes).unwrap();
        assert_eq!(block.coefficients()[0], 65535);
        assert_eq!(block.coefficients()[4], -2);
        assert_eq!(block.coefficients()[7], -32768);
    }

    #[test]
    fn short_calibration_value() {
        assert_eq!(
            CalibrationBlock::from_bytes(&[0; 15]),
            Err(DecodeError::Truncated { needed: 16, got: 15 })
        );
    }
}
