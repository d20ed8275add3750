//! Payload Decoders
//!
//! ## Overview
//!
//! One decoder family per physical quantity. Every decoder is a pure function
//! from the notification payload (plus whatever calibration input it needs) to
//! a physical value. None of them panic: a payload shorter than the field
//! layout yields [`DecodeError::Truncated`], trailing bytes are ignored.
//!
//! ## Wire Layouts
//!
//! All multi-byte fields are little-endian.
//!
//! ```text
//! Sensor          Bytes  Layout
//! -------------------------------------------------------------
//! Accelerometer   3      i8 x, i8 y, i8 z
//! Magnetometer    6      i16 x, i16 y, i16 z
//! Gyroscope       2..6   i16 per enabled axis, in X, Y, Z order
//! Humidity        4      u16 temperature, u16 RH (2 status bits)
//! IR temperature  4      i16 thermopile voltage, u16 die temperature
//! Barometer       4      i16 raw temperature, u16 raw pressure
//! ```
//!
//! ## Data Dependencies
//!
//! Two decoders need more than their own frame:
//! - [`target_temperature`] needs the latest ambient (die) temperature, which
//!   arrives in the same characteristic but is combined across frames by the
//!   stream layer.
//! - [`pressure`] needs the [`CalibrationBlock`] read once during setup.

mod gyroscope;
mod humidity;
mod pressure;
mod temperature;
mod vector;

pub use gyroscope::{gyroscope, AxisReading, GyroscopeAxis};
pub use humidity::humidity;
pub use pressure::{pressure, pressure_die_temperature, CalibrationBlock};
pub use temperature::{ambient_temperature, target_temperature, TemperatureScale};
pub use vector::{accelerometer, magnetometer, Vector3};

pub use crate::errors::{DecodeError, DecodeResult};

/// Signed 16-bit little-endian field at `offset`.
///
/// Callers check the length first with [`DecodeError::require`].
pub(crate) fn i16_le(bytes: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

/// Unsigned 16-bit little-endian field at `offset`.
pub(crate) fn u16_le(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}
