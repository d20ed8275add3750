//! Sensor Orchestration
//!
//! ## Overview
//!
//! [`SensorOrchestrator`] owns one [`SensorChannel`] per physical sensor,
//! brings them up as a unit and publishes one typed stream per quantity.
//!
//! ## Setup Sequence
//!
//! Channels are configured strictly in order (accelerometer, gyroscope,
//! humidity, magnetometer, pressure, infrared temperature):
//!
//! ```text
//! initialize ─▶ set_read_period (if supported) ─▶ enable (+ calibration on pressure)
//! ```
//!
//! Notifications are switched on for all six only after every channel is
//! enabled. [`begin_setup`](SensorOrchestrator::begin_setup) reports `true`
//! only if all six end up streaming. The sequence runs once; a call made while
//! it is running waits for it and reports the same outcome. The first error stops the sequence, is
//! kept in [`last_error`](SensorOrchestrator::last_error), and, with
//! `rollback_on_failure` set, disposes the orchestrator so no channel is left
//! open.
//!
//! ## Stream Pipelines
//!
//! | Stream              | Source frames        | Shaping                         |
//! |---------------------|----------------------|---------------------------------|
//! | accelerometer       | accelerometer        | sample 300 ms, distinct         |
//! | gyroscope           | gyroscope            | sample 300 ms, distinct         |
//! | magnetometer        | magnetometer         | sample 300 ms, distinct         |
//! | humidity            | humidity             | sample 2 s, distinct            |
//! | pressure (hPa)      | pressure             | sample 2 s, distinct            |
//! | ambient temperature | infrared temperature | sample 2 s, distinct            |
//! | target temperature  | infrared temperature | combine with ambient °C, sample 500 ms, distinct |
//!
//! Frames that fail to decode are dropped and logged; the stream continues.
//!
//! ## Teardown
//!
//! [`dispose`](SensorOrchestrator::dispose) closes all output streams, then
//! disposes every channel. Once it returns no observer of an output stream is
//! running or will run. It runs on `Drop` as well.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use log::{debug, error, info, warn};
use parking_lot::Mutex;
use tokio::sync::OnceCell;
use sensortag_core::constants::sensors::PASCAL_PER_HECTOPASCAL;
use sensortag_core::{
    decode, DecodeError, DecodeResult, RawFrame, SensorKind, TemperatureScale, Vector3,
};

use crate::channel::{ChannelState, SensorChannel};
use crate::config::OrchestratorConfig;
use crate::error::{LinkError, LinkResult};
use crate::observable::Observable;
use crate::transport::Transport;

/// One output stream per physical quantity
#[derive(Clone)]
pub struct SensorStreams {
    /// g
    pub accelerometer: Observable<Vector3>,
    /// °/s, absent axes read 0.0
    pub gyroscope: Observable<Vector3>,
    /// µT
    pub magnetometer: Observable<Vector3>,
    /// %RH
    pub humidity: Observable<f64>,
    /// hPa
    pub pressure: Observable<f64>,
    pub ambient_temperature: Observable<f64>,
    pub target_temperature: Observable<f64>,
}

impl SensorStreams {
    fn close(&self) {
        self.accelerometer.close();
        self.gyroscope.close();
        self.magnetometer.close();
        self.humidity.close();
        self.pressure.close();
        self.ambient_temperature.close();
        self.target_temperature.close();
    }
}

/// Brings up every sensor on the peripheral and exposes their readings
pub struct SensorOrchestrator {
    config: OrchestratorConfig,
    /// Indexed by `SensorKind` discriminant, which follows setup order
    channels: [Arc<SensorChannel>; 6],
    streams: SensorStreams,
    last_error: Mutex<Option<LinkError>>,
    /// Outcome of the one setup run
    setup: OnceCell<bool>,
    disposed: AtomicBool,
}

impl SensorOrchestrator {
    /// Creates the channels and wires their pipelines. No transport call is
    /// made until [`begin_setup`](Self::begin_setup).
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime; the sampling operators
    /// spawn their interval tasks here.
    pub fn new(transport: Arc<dyn Transport>, config: OrchestratorConfig) -> Self {
        let channels = SensorKind::ALL.map(|kind| {
            Arc::new(
                SensorChannel::new(kind, transport.clone())
                    .with_gyroscope_axes(config.gyroscope_axes)
                    .with_strict_writes(config.strict_writes),
            )
        });
        let streams = build_streams(&channels, &config);

        Self {
            config,
            channels,
            streams,
            last_error: Mutex::new(None),
            setup: OnceCell::new(),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn streams(&self) -> &SensorStreams {
        &self.streams
    }

    pub fn channel(&self, kind: SensorKind) -> &SensorChannel {
        &self.channels[kind as usize]
    }

    /// Runs the setup sequence once.
    ///
    /// Returns `true` only if every channel is streaming. A call made while
    /// the sequence runs waits for it; later calls do not touch the channels
    /// and report whether they all still stream.
    pub async fn begin_setup(&self) -> bool {
        if self.disposed.load(Ordering::Acquire) {
            *self.last_error.lock() = Some(LinkError::Disposed);
            return false;
        }
        if self.setup.initialized() {
            warn!("Sensor setup already ran");
        }

        let succeeded = *self.setup.get_or_init(|| self.setup_once()).await;
        succeeded && self.is_streaming()
    }

    async fn setup_once(&self) -> bool {
        info!("Setting up {} sensors", self.channels.len());
        match self.run_setup().await {
            Ok(()) => {
                info!("All sensors streaming");
                true
            }
            Err(err) => {
                error!("Sensor setup failed: {}", err);
                *self.last_error.lock() = Some(err);
                if self.config.rollback_on_failure {
                    self.dispose();
                }
                false
            }
        }
    }

    async fn run_setup(&self) -> LinkResult<()> {
        for channel in &self.channels {
            channel.initialize().await?;
            if channel.identity().period.is_some() {
                channel.set_read_period(self.config.read_period).await?;
            }
            channel.enable().await?;
        }

        for channel in &self.channels {
            channel.enable_notifications().await?;
        }
        Ok(())
    }

    /// The failure the last `begin_setup` reported.
    pub fn last_error(&self) -> Option<LinkError> {
        self.last_error.lock().clone()
    }

    pub fn channel_states(&self) -> Vec<(SensorKind, ChannelState)> {
        self.channels
            .iter()
            .map(|channel| (channel.kind(), channel.state()))
            .collect()
    }

    pub fn is_streaming(&self) -> bool {
        self.channels.iter().all(|channel| channel.state().is_streaming())
    }

    /// Unreachable writes tolerated across all channels.
    pub fn warnings(&self) -> Vec<LinkError> {
        self.channels
            .iter()
            .flat_map(|channel| channel.warnings())
            .collect()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Closes every stream, then disposes every channel. Idempotent, valid
    /// whether or not setup ran.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.streams.close();
        for channel in &self.channels {
            channel.dispose();
        }
        info!("Sensor orchestrator disposed");
    }
}

impl Drop for SensorOrchestrator {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Decodes a frame, logging and dropping it on failure.
fn decoded<U, F>(kind: SensorKind, decode: F) -> impl Fn(&RawFrame) -> Option<U> + Send + Sync + 'static
where
    U: 'static,
    F: Fn(&[u8]) -> DecodeResult<U> + Send + Sync + 'static,
{
    move |frame: &RawFrame| match decode(frame.bytes()) {
        Ok(value) => Some(value),
        Err(err) => {
            debug!("{}: dropped frame: {}", kind, err);
            None
        }
    }
}

fn build_streams(channels: &[Arc<SensorChannel>; 6], config: &OrchestratorConfig) -> SensorStreams {
    let frames = |kind: SensorKind| channels[kind as usize].frames();
    let vector = config.vector_sample();
    let environment = config.environment_sample();

    let scale = config.accelerometer_scale;
    let accelerometer = frames(SensorKind::Accelerometer)
        .filter_map(decoded(SensorKind::Accelerometer, move |b| {
            decode::accelerometer(b, scale)
        }))
        .sample(vector)
        .distinct_until_changed();

    let axes = config.gyroscope_axes;
    let gyroscope = frames(SensorKind::Gyroscope)
        .filter_map(decoded(SensorKind::Gyroscope, move |b| {
            decode::gyroscope(b, axes).map(|reading| reading.to_vector3())
        }))
        .sample(vector)
        .distinct_until_changed();

    let magnetometer = frames(SensorKind::Magnetometer)
        .filter_map(decoded(SensorKind::Magnetometer, decode::magnetometer))
        .sample(vector)
        .distinct_until_changed();

    let humidity = frames(SensorKind::Humidity)
        .filter_map(decoded(SensorKind::Humidity, decode::humidity))
        .sample(environment)
        .distinct_until_changed();

    let barometer: Weak<SensorChannel> = Arc::downgrade(&channels[SensorKind::Pressure as usize]);
    let pressure = frames(SensorKind::Pressure)
        .filter_map(decoded(SensorKind::Pressure, move |b| {
            let calibration = barometer
                .upgrade()
                .and_then(|channel| channel.calibration())
                .ok_or(DecodeError::CalibrationMissing)?;
            decode::pressure(b, &calibration).map(|pa| pa / PASCAL_PER_HECTOPASCAL)
        }))
        .sample(environment)
        .distinct_until_changed();

    let unit = config.temperature_scale;
    let ambient_temperature = frames(SensorKind::InfraredTemperature)
        .filter_map(decoded(SensorKind::InfraredTemperature, move |b| {
            decode::ambient_temperature(b, unit)
        }))
        .sample(environment)
        .distinct_until_changed();

    // Attached before the combination so each frame refreshes the ambient
    // side first.
    let ambient_celsius = frames(SensorKind::InfraredTemperature).filter_map(decoded(
        SensorKind::InfraredTemperature,
        |b| decode::ambient_temperature(b, TemperatureScale::Celsius),
    ));
    let target_temperature = frames(SensorKind::InfraredTemperature)
        .combine_latest(&ambient_celsius, move |frame: &RawFrame, ambient: &f64| {
            decode::target_temperature(frame.bytes(), *ambient, unit)
        })
        .filter_map(|result: &DecodeResult<f64>| match result {
            Ok(value) => Some(*value),
            Err(err) => {
                debug!("{}: dropped frame: {}", SensorKind::InfraredTemperature, err);
                None
            }
        })
        .sample(config.target_sample())
        .distinct_until_changed();

    SensorStreams {
        accelerometer,
        gyroscope,
        magnetometer,
        humidity,
        pressure,
        ambient_temperature,
        target_temperature,
    }
}
