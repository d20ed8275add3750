//! Infrared thermopile decoders (TMP006)
//!
//! ## Physics Background
//!
//! The TMP006 measures two things in one notification:
//! - the die temperature of the chip itself (`Tdie`, the "ambient" reading)
//! - the thermopile voltage `Vobj` produced by infrared radiation from the
//!   object in its field of view
//!
//! The object temperature follows from Stefan-Boltzmann after correcting the
//! thermopile's sensitivity and offset for the die temperature:
//!
//! ```text
//! S    = S0 * (1 + a1*(Tdie - Tref) + a2*(Tdie - Tref)^2)
//! Vos  = b0 + b1*(Tdie - Tref) + b2*(Tdie - Tref)^2
//! fObj = (Vobj - Vos) + c2*(Vobj - Vos)^2
//! Tobj = (Tdie^4 + fObj/S)^(1/4)
//! ```
//!
//! All temperatures in kelvin. Constants from TI SBOU107.
//!
//! ## Cross-Frame Dependency
//!
//! [`target_temperature`] takes the ambient value as an argument instead of
//! reading it from its own frame. The stream layer pairs each target frame
//! with the most recent ambient reading.

use libm::{pow, sqrt};

use crate::constants::sensors::{
    AMBIENT_COUNTS_PER_DEGREE, KELVIN_OFFSET, THERMOPILE_VOLTS_PER_COUNT, TMP006_A1, TMP006_A2,
    TMP006_B0, TMP006_B1, TMP006_B2, TMP006_C2, TMP006_S0, TMP006_TREF,
};
use crate::errors::{DecodeError, DecodeResult};

use super::{i16_le, u16_le};

/// Output temperature unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TemperatureScale {
    /// Degrees Celsius
    #[default]
    Celsius,
    /// Degrees Fahrenheit
    Fahrenheit,
}

impl TemperatureScale {
    /// Converts a Celsius value to this scale.
    pub fn from_celsius(self, celsius: f64) -> f64 {
        match self {
            TemperatureScale::Celsius => celsius,
            TemperatureScale::Fahrenheit => celsius * 1.8 + 32.0,
        }
    }
}

/// Die temperature: unsigned word at offset 2, 1/128 °C per count.
pub fn ambient_temperature(bytes: &[u8], scale: TemperatureScale) -> DecodeResult<f64> {
    DecodeError::require(bytes, 4)?;

    let celsius = u16_le(bytes, 2) as f64 / AMBIENT_COUNTS_PER_DEGREE;
    Ok(scale.from_celsius(celsius))
}

/// Object temperature from the thermopile word at offset 0.
///
/// `ambient_celsius` must be the die temperature in °C regardless of the
/// requested output `scale`.
pub fn target_temperature(
    bytes: &[u8],
    ambient_celsius: f64,
    scale: TemperatureScale,
) -> DecodeResult<f64> {
    DecodeError::require(bytes, 2)?;

    let v_obj = i16_le(bytes, 0) as f64 * THERMOPILE_VOLTS_PER_COUNT;
    let t_die = ambient_celsius + KELVIN_OFFSET;
    let dt = t_die - TMP006_TREF;

    let s = TMP006_S0 * (1.0 + TMP006_A1 * dt + TMP006_A2 * dt * dt);
    let v_os = TMP006_B0 + TMP006_B1 * dt + TMP006_B2 * dt * dt;
    let v = v_obj - v_os;
    let f_obj = v + TMP006_C2 * v * v;

    // fourth root
    let t_obj = sqrt(sqrt(pow(t_die, 4.0) + f_obj / s));

    Ok(scale.from_celsius(t_obj - KELVIN_OFFSET))
}
