//! Core protocol layer for the SensorTag multi-sensor peripheral
//!
//! Turns raw GATT notification payloads into physical quantities. Everything
//! here is pure: no I/O, no clocks, no locks. The async link layer
//! (`sensortag-link`) drives transports and streams on top of it.
//!
//! Key constraints:
//! - `no_std` + `alloc` compatible
//! - Decoders never panic on short payloads
//! - No allocation on the decode path
//!
//! ```no_run
//! use sensortag_core::{decode, TemperatureScale};
//!
//! let payload = [0x10, 0xFF, 0x80, 0x0C];
//! let ambient = decode::ambient_temperature(&payload, TemperatureScale::Celsius)?;
//! let target = decode::target_temperature(&payload, ambient, TemperatureScale::Celsius)?;
//! # Ok::<(), sensortag_core::DecodeError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[cfg(not(feature = "std"))]
extern crate alloc;

// Macro for optional logging
#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

pub mod constants;
pub mod decode;
pub mod errors;
pub mod frame;
pub mod shaping;
pub mod time;

// Public API
pub use decode::{AxisReading, CalibrationBlock, GyroscopeAxis, TemperatureScale, Vector3};
pub use errors::{DecodeError, DecodeResult};
pub use frame::{EnableCommand, RawFrame, SamplePeriod, SensorIdentity, SensorKind};
pub use shaping::{Distinct, LatestPair, SameValue, SampleSlot};
pub use time::{Timestamp, TimeSource};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
