//! Time-Related Constants
//!
//! On-device sample periods are expressed in units of 10 ms. Stream sampling
//! intervals are host-side and expressed in milliseconds.

/// Milliseconds per unit of the period characteristic.
pub const PERIOD_UNIT_MS: u64 = 10;

/// Default on-device period: 33 units = 330 ms.
pub const DEFAULT_READ_PERIOD: u8 = 33;

/// Firmware lower limit: 10 units = 100 ms.
pub const MIN_READ_PERIOD: u8 = 10;

// ===== OUTPUT SAMPLING =====

/// Accelerometer, gyroscope and magnetometer outputs.
pub const VECTOR_SAMPLE_MS: u64 = 300;

/// Humidity, pressure and ambient temperature outputs.
pub const ENVIRONMENT_SAMPLE_MS: u64 = 2000;

/// Target (object) temperature output.
pub const TARGET_SAMPLE_MS: u64 = 500;
