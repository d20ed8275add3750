//! Axis-selectable gyroscope decoder
//!
//! The gyroscope is enabled with an axis mask, and the notification carries
//! exactly one signed 16-bit word per enabled axis, packed from offset 0 in
//! X, Y, Z order. A one-axis configuration therefore produces a 2-byte
//! payload, two axes 4 bytes, all three 6 bytes.
//!
//! [`AxisReading`] keeps that variable arity. Use
//! [`AxisReading::to_vector3`] when a fixed shape is needed: each value lands
//! on its named axis and absent axes read as `0.0`.

use core::convert::TryFrom;

use heapless::Vec;

use crate::constants::sensors::GYROSCOPE_SCALE;
use crate::errors::{DecodeError, DecodeResult};

use super::{i16_le, Vector3};

/// Gyroscope axis selection, written as the enable command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum GyroscopeAxis {
    /// X only
    X = 1,
    /// Y only
    Y = 2,
    /// X and Y
    XY = 3,
    /// Z only
    Z = 4,
    /// X and Z
    XZ = 5,
    /// Y and Z
    YZ = 6,
    /// All three axes
    #[default]
    XYZ = 7,
}

impl GyroscopeAxis {
    /// Bit mask, X = bit 0.
    pub fn mask(self) -> u8 {
        self as u8
    }

    /// Number of axes this selection samples.
    pub fn axis_count(self) -> usize {
        self.mask().count_ones() as usize
    }

    /// X is sampled.
    pub fn has_x(self) -> bool {
        self.mask() & 0b001 != 0
    }

    /// Y is sampled.
    pub fn has_y(self) -> bool {
        self.mask() & 0b010 != 0
    }

    /// Z is sampled.
    pub fn has_z(self) -> bool {
        self.mask() & 0b100 != 0
    }
}

impl TryFrom<u8> for GyroscopeAxis {
    type Error = DecodeError;

    fn try_from(mask: u8) -> Result<Self, Self::Error> {
        Ok(match mask {
            1 => GyroscopeAxis::X,
            2 => GyroscopeAxis::Y,
            3 => GyroscopeAxis::XY,
            4 => GyroscopeAxis::Z,
            5 => GyroscopeAxis::XZ,
            6 => GyroscopeAxis::YZ,
            7 => GyroscopeAxis::XYZ,
            other => return Err(DecodeError::InvalidAxisMask(other)),
        })
    }
}

/// Decoded gyroscope values in °/s, one per enabled axis
#[derive(Debug, Clone, PartialEq)]
pub struct AxisReading {
    axes: GyroscopeAxis,
    values: Vec<f64, 3>,
}

impl AxisReading {
    /// Axes the values belong to.
    pub fn axes(&self) -> GyroscopeAxis {
        self.axes
    }

    /// Values in X, Y, Z order, enabled axes only.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of decoded axes.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True only for a reading with no axes.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Places each value on its named axis; absent axes are `0.0`.
    pub fn to_vector3(&self) -> Vector3 {
        let mut values = self.values.iter().copied();
        let mut next_if = |present: bool| {
            if present {
                values.next().unwrap_or(0.0)
            } else {
                0.0
            }
        };

        let x = next_if(self.axes.has_x());
        let y = next_if(self.axes.has_y());
        let z = next_if(self.axes.has_z());
        Vector3::new(x, y, z)
    }
}

/// Decodes one signed 16-bit word per axis in `axes`, scaled by 500/65536.
pub fn gyroscope(bytes: &[u8], axes: GyroscopeAxis) -> DecodeResult<AxisReading> {
    let count = axes.axis_count();
    DecodeError::require(bytes, count * 2)?;

    let mut values = Vec::new();
    for i in 0..count {
        // count <= 3 == capacity
        let _ = values.push(i16_le(bytes, i * 2) as f64 * GYROSCOPE_SCALE);
    }

    Ok(AxisReading { axes, values })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: [u8; 6] = [0x00, 0x01, 0x00, 0xFF, 0x80, 0x00];

    #[test]
    fn arity_follows_axis_mask() {
        assert_eq!(gyroscope(&PAYLOAD, GyroscopeAxis::X).unwrap().len(), 1);
        assert_eq!(gyroscope(&PAYLOAD, GyroscopeAxis::YZ).unwrap().len(), 2);
        assert_eq!(gyroscope(&PAYLOAD, GyroscopeAxis::XYZ).unwrap().len(), 3);
    }

    #[test]
    fn values_are_scaled_words() {
        let reading = gyroscope(&PAYLOAD, GyroscopeAxis::XYZ).unwrap();
        assert_eq!(
            reading.values(),
            &[256.0 * GYROSCOPE_SCALE, -256.0 * GYROSCOPE_SCALE, 128.0 * GYROSCOPE_SCALE]
        );
    }

    #[test]
    fn single_axis_reads_offset_zero() {
        let reading = gyroscope(&[0x00, 0x02], GyroscopeAxis::Z).unwrap();
        assert_eq!(reading.values(), &[512.0 * GYROSCOPE_SCALE]);
        assert_eq!(reading.to_vector3(), Vector3::new(0.0, 0.0, 512.0 * GYROSCOPE_SCALE));
    }

    #[test]
    fn vector_convention_fills_absent_axes() {
        let reading = gyroscope(&PAYLOAD, GyroscopeAxis::XZ).unwrap();
        let v = reading.to_vector3();
        assert_eq!(v.x, 256.0 * GYROSCOPE_SCALE);
        assert_eq!(v.y, 0.0);
        assert_eq!(v.z, -256.0 * GYROSCOPE_SCALE);
    }

    #[test]
    fn short_payload_for_mask() {
        assert_eq!(
            gyroscope(&[0; 4], GyroscopeAxis::XYZ),
            Err(DecodeError::Truncated { needed: 6, got: 4 })
        );
        assert!(gyroscope(&[0; 4], GyroscopeAxis::XY).is_ok());
    }

    #[test]
    fn axis_mask_conversion() {
        assert_eq!(GyroscopeAxis::try_from(7), Ok(GyroscopeAxis::XYZ));
        assert_eq!(GyroscopeAxis::try_from(0), Err(DecodeError::InvalidAxisMask(0)));
        assert_eq!(GyroscopeAxis::try_from(8), Err(DecodeError::InvalidAxisMask(8)));
        assert_eq!(GyroscopeAxis::XZ.axis_count(), 2);
    }
}
