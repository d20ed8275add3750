//! Orchestrator configuration

use std::time::Duration;

use sensortag_core::constants::{
    ACCELEROMETER_DEFAULT_SCALE, ENVIRONMENT_SAMPLE_MS, TARGET_SAMPLE_MS, VECTOR_SAMPLE_MS,
};
use sensortag_core::{GyroscopeAxis, SamplePeriod, TemperatureScale};
use serde::{Deserialize, Serialize};

/// How the orchestrator configures sensors and shapes their streams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// On-device period for sensors that support one
    pub read_period: SamplePeriod,
    /// g per accelerometer count
    pub accelerometer_scale: f64,
    /// Axes the gyroscope is enabled with
    pub gyroscope_axes: GyroscopeAxis,
    /// Unit of ambient and target temperature streams
    pub temperature_scale: TemperatureScale,
    /// Sampling window of the three vector streams, in milliseconds
    pub vector_sample_ms: u64,
    /// Sampling window of humidity, pressure and ambient temperature
    pub environment_sample_ms: u64,
    /// Sampling window of target temperature
    pub target_sample_ms: u64,
    /// Dispose every channel when setup fails part way
    pub rollback_on_failure: bool,
    /// Treat unreachable writes as setup failures
    pub strict_writes: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            read_period: SamplePeriod::default(),
            accelerometer_scale: ACCELEROMETER_DEFAULT_SCALE,
            gyroscope_axes: GyroscopeAxis::default(),
            temperature_scale: TemperatureScale::default(),
            vector_sample_ms: VECTOR_SAMPLE_MS,
            environment_sample_ms: ENVIRONMENT_SAMPLE_MS,
            target_sample_ms: TARGET_SAMPLE_MS,
            rollback_on_failure: true,
            strict_writes: false,
        }
    }
}

impl OrchestratorConfig {
    /// Parses a JSON document; absent fields take their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Set the on-device read period
    pub fn read_period(mut self, period: SamplePeriod) -> Self {
        self.read_period = period;
        self
    }

    /// Set the accelerometer range scale
    pub fn accelerometer_scale(mut self, scale: f64) -> Self {
        self.accelerometer_scale = scale;
        self
    }

    pub fn gyroscope_axes(mut self, axes: GyroscopeAxis) -> Self {
        self.gyroscope_axes = axes;
        self
    }

    pub fn temperature_scale(mut self, scale: TemperatureScale) -> Self {
        self.temperature_scale = scale;
        self
    }

    pub fn rollback_on_failure(mut self, enabled: bool) -> Self {
        self.rollback_on_failure = enabled;
        self
    }

    pub fn strict_writes(mut self, enabled: bool) -> Self {
        self.strict_writes = enabled;
        self
    }

    pub fn vector_sample(&self) -> Duration {
        Duration::from_millis(self.vector_sample_ms)
    }

    pub fn environment_sample(&self) -> Duration {
        Duration::from_millis(self.environment_sample_ms)
    }

    pub fn target_sample(&self) -> Duration {
        Duration::from_millis(self.target_sample_ms)
    }
}
