//! Relative humidity decoder (SHT21)

use crate::constants::sensors::HUMIDITY_STATUS_MASK;
use crate::errors::{DecodeError, DecodeResult};

use super::u16_le;

/// Relative humidity in %RH.
///
/// The RH word sits at offset 2. Its two low bits are status flags and are
/// cleared before applying the datasheet transfer function
/// `RH = -6 + 125 * S / 2^16` (with `S` normalised by 65535 here).
pub fn humidity(bytes: &[u8]) -> DecodeResult<f64> {
    DecodeError::require(bytes, 4)?;

    let raw = u16_le(bytes, 2) & !HUMIDITY_STATUS_MASK;
    Ok(-6.0 + 125.0 * (raw as f64 / 65535.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midscale_reading() {
        // 32768 at offset 2
        let rh = humidity(&[0x00, 0x00, 0x00, 0x80]).unwrap();
        assert!((rh - 56.5009).abs() < 1e-3, "got {}", rh);
    }

    #[test]
    fn status_bits_are_cleared() {
        let clean = humidity(&[0, 0, 0x00, 0x80]).unwrap();
        let flagged = humidity(&[0, 0, 0x03, 0x80]).unwrap();
        assert_eq!(clean, flagged);
    }

    #[test]
    fn range_endpoints() {
        assert_eq!(humidity(&[0, 0, 0, 0]).unwrap(), -6.0);
        let top = humidity(&[0, 0, 0xFF, 0xFF]).unwrap();
        assert!((top - (-6.0 + 125.0 * 65532.0 / 65535.0)).abs() < 1e-12);
    }

    #[test]
    fn short_payload() {
        assert_eq!(
            humidity(&[0, 0, 0]),
            Err(DecodeError::Truncated { needed: 4, got: 3 })
        );
    }
}
