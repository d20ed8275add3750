//! Sensor Command Bytes and Conversion Factors
//!
//! Values come from the peripheral's firmware documentation and the datasheets
//! of the individual sensor chips.

// ===== COMMANDS =====

/// Written to a configuration characteristic to switch the sensor on.
pub const SENSOR_ENABLE_COMMAND: u8 = 1;

/// Written to the barometer configuration characteristic to latch the
/// calibration coefficients into the calibration characteristic.
pub const CALIBRATION_STORE_COMMAND: u8 = 2;

// ===== SCALE FACTORS =====

/// Accelerometer counts per g at the default ±2 g range.
///
/// Source: KXTJ9 datasheet, 8-bit output mode
pub const ACCELEROMETER_DEFAULT_SCALE: f64 = 1.0 / 64.0;

/// Magnetometer µT per count, applied to every axis.
pub const MAGNETOMETER_SCALE: f64 = 2000.0 / 65536.0;

/// Gyroscope °/s per count at ±250 °/s.
pub const GYROSCOPE_SCALE: f64 = 500.0 / 65536.0;

/// Ambient die temperature counts per °C (TMP006 `Tamb` register >> 2 / 32).
pub const AMBIENT_COUNTS_PER_DEGREE: f64 = 128.0;

/// Volts per LSB of the thermopile voltage register (156.25 nV).
pub const THERMOPILE_VOLTS_PER_COUNT: f64 = 0.000_000_156_25;

/// Kelvin at 0 °C.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Pascals per hectopascal.
pub const PASCAL_PER_HECTOPASCAL: f64 = 100.0;

// ===== TMP006 CALIBRATION =====
//
// Source: TI SBOU107, "TMP006 User's Guide", section 5.1

/// Sensitivity at the reference temperature.
pub const TMP006_S0: f64 = 5.593e-14;
/// First-order sensitivity coefficient.
pub const TMP006_A1: f64 = 1.75e-3;
/// Second-order sensitivity coefficient.
pub const TMP006_A2: f64 = -1.678e-5;
/// Offset voltage at the reference temperature.
pub const TMP006_B0: f64 = -2.94e-5;
/// First-order offset coefficient.
pub const TMP006_B1: f64 = -5.7e-7;
/// Second-order offset coefficient.
pub const TMP006_B2: f64 = 4.63e-9;
/// Seebeck coefficient of the object's emission.
pub const TMP006_C2: f64 = 13.4;
/// Reference die temperature in kelvin.
pub const TMP006_TREF: f64 = 298.15;

// ===== SHT21 =====

/// Status bits occupying the two least significant bits of the RH word.
pub const HUMIDITY_STATUS_MASK: u16 = 0b11;

// ===== T5400 =====

/// Number of 16-bit coefficients in the barometer calibration block.
pub const CALIBRATION_BLOCK_LEN: usize = 8;
