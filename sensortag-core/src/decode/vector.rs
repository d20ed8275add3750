//! Three-axis decoders for the accelerometer and magnetometer

use crate::constants::sensors::MAGNETOMETER_SCALE;
use crate::errors::{DecodeError, DecodeResult};

use super::i16_le;

/// Decoded three-axis reading
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vector3 {
    /// X axis
    pub x: f64,
    /// Y axis
    pub y: f64,
    /// Z axis
    pub z: f64,
}

impl Vector3 {
    /// Builds a reading from its three components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Components as `[x, y, z]`.
    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// Accelerometer: three signed bytes, each multiplied by `scale` (g per count).
///
/// [`ACCELEROMETER_DEFAULT_SCALE`](crate::constants::ACCELEROMETER_DEFAULT_SCALE)
/// gives g at the default range.
pub fn accelerometer(bytes: &[u8], scale: f64) -> DecodeResult<Vector3> {
    DecodeError::require(bytes, 3)?;

    if scale == 0.0 {
        log_warn!("Accelerometer scale of 0 zeroes every axis");
    }

    Ok(Vector3::new(
        bytes[0] as i8 as f64 * scale,
        bytes[1] as i8 as f64 * scale,
        bytes[2] as i8 as f64 * scale,
    ))
}

/// Magnetometer: three signed 16-bit axes at a fixed 2000/65536 µT per count.
pub fn magnetometer(bytes: &[u8]) -> DecodeResult<Vector3> {
    DecodeError::require(bytes, 6)?;

    Ok(Vector3::new(
        i16_le(bytes, 0) as f64 * MAGNETOMETER_SCALE,
        i16_le(bytes, 2) as f64 * MAGNETOMETER_SCALE,
        i16_le(bytes, 4) as f64 * MAGNETOMETER_SCALE,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ACCELEROMETER_DEFAULT_SCALE;

    #[test]
    fn accelerometer_bytes_are_signed() {
        let v = accelerometer(&[64, 0xC0, 0x80], ACCELEROMETER_DEFAULT_SCALE).unwrap();
        assert_eq!(v, Vector3::new(1.0, -1.0, -2.0));
    }

    #[test]
    fn accelerometer_ignores_trailing_bytes() {
        let v = accelerometer(&[1, 2, 3, 99], 1.0).unwrap();
        assert_eq!(v.to_array(), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn accelerometer_short_payload() {
        assert_eq!(
            accelerometer(&[1, 2], 1.0),
            Err(DecodeError::Truncated { needed: 3, got: 2 })
        );
    }

    #[test]
    fn magnetometer_fixed_scale() {
        // 0x0800 = 2048 counts -> 62.5 µT
        let v = magnetometer(&[0x00, 0x08, 0x00, 0xF8, 0x00, 0x00]).unwrap();
        assert_eq!(v.x, 62.5);
        assert_eq!(v.y, -62.5);
        assert_eq!(v.z, 0.0);
    }

    #[test]
    fn magnetometer_short_payload() {
        assert!(matches!(
            magnetometer(&[0; 5]),
            Err(DecodeError::Truncated { needed: 6, got: 5 })
        ));
    }
}
