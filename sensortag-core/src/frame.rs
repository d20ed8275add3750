//! Sensor identities, raw frames and configuration commands
//!
//! A [`SensorIdentity`] is static: one per [`SensorKind`], naming the GATT
//! endpoints a channel talks to. A [`RawFrame`] is produced once per
//! notification and handed straight to the decode stage.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use core::fmt;

use crate::constants::{
    sensors::{CALIBRATION_STORE_COMMAND, SENSOR_ENABLE_COMMAND},
    time::{MIN_READ_PERIOD, PERIOD_UNIT_MS},
    uuids,
};
use crate::decode::GyroscopeAxis;
use crate::time::Timestamp;

/// Physical sensors on the peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SensorKind {
    /// KXTJ9 three-axis accelerometer
    Accelerometer,
    /// IMU-3000 three-axis gyroscope
    Gyroscope,
    /// SHT21 relative humidity
    Humidity,
    /// MAG3110 three-axis magnetometer
    Magnetometer,
    /// T5400 barometer
    Pressure,
    /// TMP006 thermopile (ambient and object temperature)
    InfraredTemperature,
}

impl SensorKind {
    /// All sensors, in setup order.
    pub const ALL: [SensorKind; 6] = [
        SensorKind::Accelerometer,
        SensorKind::Gyroscope,
        SensorKind::Humidity,
        SensorKind::Magnetometer,
        SensorKind::Pressure,
        SensorKind::InfraredTemperature,
    ];

    /// GATT endpoints for this sensor.
    pub const fn identity(self) -> SensorIdentity {
        match self {
            SensorKind::Accelerometer => SensorIdentity {
                kind: self,
                service: uuids::ACC_SERVICE,
                config: uuids::ACC_CONFIG,
                data: uuids::ACC_DATA,
                period: Some(uuids::ACC_PERIOD),
                calibration: None,
            },
            SensorKind::Gyroscope => SensorIdentity {
                kind: self,
                service: uuids::GYR_SERVICE,
                config: uuids::GYR_CONFIG,
                data: uuids::GYR_DATA,
                period: None,
                calibration: None,
            },
            SensorKind::Humidity => SensorIdentity {
                kind: self,
                service: uuids::HUM_SERVICE,
                config: uuids::HUM_CONFIG,
                data: uuids::HUM_DATA,
                period: None,
                calibration: None,
            },
            SensorKind::Magnetometer => SensorIdentity {
                kind: self,
                service: uuids::MAG_SERVICE,
                config: uuids::MAG_CONFIG,
                data: uuids::MAG_DATA,
                period: Some(uuids::MAG_PERIOD),
                calibration: None,
            },
            SensorKind::Pressure => SensorIdentity {
                kind: self,
                service: uuids::BAR_SERVICE,
                config: uuids::BAR_CONFIG,
                data: uuids::BAR_DATA,
                period: Some(uuids::BAR_PERIOD),
                calibration: Some(uuids::BAR_CALIBRATION),
            },
            SensorKind::InfraredTemperature => SensorIdentity {
                kind: self,
                service: uuids::IRT_SERVICE,
                config: uuids::IRT_CONFIG,
                data: uuids::IRT_DATA,
                period: Some(uuids::IRT_PERIOD),
                calibration: None,
            },
        }
    }

    /// Lower-case name used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            SensorKind::Accelerometer => "accelerometer",
            SensorKind::Gyroscope => "gyroscope",
            SensorKind::Humidity => "humidity",
            SensorKind::Magnetometer => "magnetometer",
            SensorKind::Pressure => "pressure",
            SensorKind::InfraredTemperature => "ir-temperature",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The protocol endpoints one sensor channel targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorIdentity {
    /// Sensor these endpoints belong to
    pub kind: SensorKind,
    /// Primary service
    pub service: &'static str,
    /// Enable/disable command target
    pub config: &'static str,
    /// Notifying characteristic carrying readings
    pub data: &'static str,
    /// On-device sample period, absent for gyroscope and humidity
    pub period: Option<&'static str>,
    /// Barometer calibration coefficients
    pub calibration: Option<&'static str>,
}

/// One notification's payload, tagged with its origin
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    /// Sensor that notified
    pub origin: SensorKind,
    /// Bytes exactly as delivered
    pub payload: Vec<u8>,
    /// Delivery time from the transport's clock
    pub timestamp: Timestamp,
}

impl RawFrame {
    /// Wraps one notification.
    pub fn new(origin: SensorKind, payload: Vec<u8>, timestamp: Timestamp) -> Self {
        Self {
            origin,
            payload,
            timestamp,
        }
    }

    /// The payload, for decoders.
    pub fn bytes(&self) -> &[u8] {
        &self.payload
    }
}

/// On-device sample period in units of 10 ms
///
/// The firmware rejects periods below 100 ms, so construction clamps to
/// [`MIN_READ_PERIOD`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "u8", into = "u8"))]
pub struct SamplePeriod(u8);

impl SamplePeriod {
    /// Period of `units` × 10 ms, clamped to the firmware minimum.
    pub fn new(units: u8) -> Self {
        if units < MIN_READ_PERIOD {
            log_warn!(
                "Sample period {} below firmware minimum, clamped to {}",
                units,
                MIN_READ_PERIOD
            );
        }
        Self(units.max(MIN_READ_PERIOD))
    }

    /// Period for `ms` rounded down to whole 10 ms units, saturating at
    /// 2550 ms.
    pub fn from_millis(ms: u64) -> Self {
        let units = (ms / PERIOD_UNIT_MS).min(u8::MAX as u64) as u8;
        Self::new(units)
    }

    /// Value written to the period characteristic.
    pub fn units(self) -> u8 {
        self.0
    }

    /// Period in milliseconds.
    pub fn as_millis(self) -> u64 {
        self.0 as u64 * PERIOD_UNIT_MS
    }
}

impl Default for SamplePeriod {
    fn default() -> Self {
        Self(crate::constants::DEFAULT_READ_PERIOD)
    }
}

impl From<u8> for SamplePeriod {
    fn from(units: u8) -> Self {
        Self::new(units)
    }
}

impl From<SamplePeriod> for u8 {
    fn from(period: SamplePeriod) -> Self {
        period.0
    }
}

/// Payload written to a sensor's configuration characteristic to enable it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnableCommand {
    /// Single byte `1`
    On,
    /// Gyroscope: the axis mask selects which axes are sampled
    Axes(GyroscopeAxis),
    /// Barometer: latch calibration coefficients for reading
    StoreCalibration,
}

impl EnableCommand {
    /// The command a sensor is switched on with.
    pub fn for_kind(kind: SensorKind, axes: GyroscopeAxis) -> Self {
        match kind {
            SensorKind::Gyroscope => EnableCommand::Axes(axes),
            _ => EnableCommand::On,
        }
    }

    /// Bytes written to the configuration characteristic.
    pub fn payload(self) -> [u8; 1] {
        match self {
            EnableCommand::On => [SENSOR_ENABLE_COMMAND],
            EnableCommand::Axes(axes) => [axes as u8],
            EnableCommand::StoreCalibration => [CALIBRATION_STORE_COMMAND],
        }
    }
}
