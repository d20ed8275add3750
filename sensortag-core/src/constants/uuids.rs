//! GATT Identifiers
//!
//! Every sensor on the peripheral lives in its own primary service. Inside it
//! the data characteristic notifies readings, the configuration characteristic
//! switches the sensor on, and (where present) the period characteristic sets
//! the on-device sample period. The barometer adds a calibration
//! characteristic.
//!
//! All identifiers share the vendor base `F000xxxx-0451-4000-B000-000000000000`.

// ===== IR TEMPERATURE (TMP006) =====

/// Primary service of the infrared thermometer.
pub const IRT_SERVICE: &str = "f000aa00-0451-4000-b000-000000000000";
/// Infrared temperature readings (notify).
pub const IRT_DATA: &str = "f000aa01-0451-4000-b000-000000000000";
/// Infrared temperature configuration; takes the enable command.
pub const IRT_CONFIG: &str = "f000aa02-0451-4000-b000-000000000000";
/// Infrared temperature sample period, in 10 ms units.
pub const IRT_PERIOD: &str = "f000aa03-0451-4000-b000-000000000000";

// ===== ACCELEROMETER (KXTJ9) =====

/// Primary service of the accelerometer.
pub const ACC_SERVICE: &str = "f000aa10-0451-4000-b000-000000000000";
/// Accelerometer readings (notify).
pub const ACC_DATA: &str = "f000aa11-0451-4000-b000-000000000000";
/// Accelerometer configuration; takes the enable command.
pub const ACC_CONFIG: &str = "f000aa12-0451-4000-b000-000000000000";
/// Accelerometer sample period, in 10 ms units.
pub const ACC_PERIOD: &str = "f000aa13-0451-4000-b000-000000000000";

// ===== HUMIDITY (SHT21) =====

/// Primary service of the humidity sensor.
pub const HUM_SERVICE: &str = "f000aa20-0451-4000-b000-000000000000";
/// Humidity readings (notify).
pub const HUM_DATA: &str = "f000aa21-0451-4000-b000-000000000000";
/// Humidity configuration; takes the enable command.
pub const HUM_CONFIG: &str = "f000aa22-0451-4000-b000-000000000000";

// ===== MAGNETOMETER (MAG3110) =====

/// Primary service of the magnetometer.
pub const MAG_SERVICE: &str = "f000aa30-0451-4000-b000-000000000000";
/// Magnetometer readings (notify).
pub const MAG_DATA: &str = "f000aa31-0451-4000-b000-000000000000";
/// Magnetometer configuration; takes the enable command.
pub const MAG_CONFIG: &str = "f000aa32-0451-4000-b000-000000000000";
/// Magnetometer sample period, in 10 ms units.
pub const MAG_PERIOD: &str = "f000aa33-0451-4000-b000-000000000000";

// ===== BAROMETER (T5400) =====

/// Primary service of the barometer.
pub const BAR_SERVICE: &str = "f000aa40-0451-4000-b000-000000000000";
/// Barometer readings (notify).
pub const BAR_DATA: &str = "f000aa41-0451-4000-b000-000000000000";
/// Barometer configuration; takes the enable command.
pub const BAR_CONFIG: &str = "f000aa42-0451-4000-b000-000000000000";
/// Eight 16-bit compensation coefficients, valid after the store command.
pub const BAR_CALIBRATION: &str = "f000aa43-0451-4000-b000-000000000000";
/// Barometer sample period, in 10 ms units.
pub const BAR_PERIOD: &str = "f000aa44-0451-4000-b000-000000000000";

// ===== GYROSCOPE (IMU-3000) =====

/// Primary service of the gyroscope.
pub const GYR_SERVICE: &str = "f000aa50-0451-4000-b000-000000000000";
/// Gyroscope readings (notify).
pub const GYR_DATA: &str = "f000aa51-0451-4000-b000-000000000000";
/// Gyroscope configuration; takes the enable command.
pub const GYR_CONFIG: &str = "f000aa52-0451-4000-b000-000000000000";
