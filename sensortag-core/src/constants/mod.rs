//! Constants for SensorTag Core
//!
//! All protocol identifiers and numeric factors live here so decoders and the
//! link layer never carry magic numbers.
//!
//! ## Organization
//!
//! - **Uuids**: GATT service and characteristic identifiers, fixed by the
//!   peripheral's published protocol
//! - **Sensors**: command bytes, scale factors and calibration constants
//! - **Time**: sample periods and stream-shaping intervals

/// GATT service and characteristic identifiers.
pub mod uuids;

/// Command bytes, scale factors and thermopile calibration constants.
pub mod sensors;

/// Sample periods and output sampling intervals.
pub mod time;

pub use sensors::{
    ACCELEROMETER_DEFAULT_SCALE, CALIBRATION_BLOCK_LEN, CALIBRATION_STORE_COMMAND,
    GYROSCOPE_SCALE, MAGNETOMETER_SCALE, SENSOR_ENABLE_COMMAND,
};

pub use time::{
    DEFAULT_READ_PERIOD, ENVIRONMENT_SAMPLE_MS, MIN_READ_PERIOD, TARGET_SAMPLE_MS,
    VECTOR_SAMPLE_MS,
};
