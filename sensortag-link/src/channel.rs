//! Per-sensor lifecycle state machine
//!
//! ## Overview
//!
//! A [`SensorChannel`] targets one sensor's service and characteristics and
//! walks it through its lifecycle:
//!
//! ```text
//! Unconfigured ─initialize─▶ Discovering ─▶ Discovered ─enable─▶ Enabling ─enable_notifications─▶ Streaming
//!                                 │              │ set_read_period                                    │  ▲
//!                                 ▼              ▼                                 disable_notifications│  │enable_notifications
//!                               Failed         Failed                                                  ▼  │
//!                                                                                                    Disabled
//! any state ─dispose─▶ Disposed
//! ```
//!
//! Raw notification payloads are published on [`frames`](SensorChannel::frames)
//! as [`RawFrame`]s tagged with the sensor kind and delivery timestamp.
//!
//! ## Unreachable writes
//!
//! A write the transport reports as unreachable is recorded as a warning and
//! the sequence continues, unless the channel was built with strict writes,
//! in which case it moves the channel to `Failed`. Discovery failure, an
//! unreadable calibration block and operations in the wrong state are always
//! errors.
//!
//! ## Disposal
//!
//! [`dispose`](SensorChannel::dispose) is synchronous, idempotent and valid in
//! every state. A notification that reaches the channel after disposal began
//! is discarded.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, trace, warn};
use parking_lot::Mutex;
use sensortag_core::{
    CalibrationBlock, DecodeError, EnableCommand, GyroscopeAxis, RawFrame, SamplePeriod,
    SensorIdentity, SensorKind, Timestamp,
};

use crate::error::{LinkError, LinkResult, TransportError};
use crate::observable::{Observable, Subject};
use crate::transport::{CacheMode, NotificationCallback, ServiceHandle, Transport};

/// Lifecycle state of a [`SensorChannel`]
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelState {
    Unconfigured,
    Discovering,
    /// Service open, sensor not yet enabled
    Discovered,
    /// Sensor enabled, notifications off
    Enabling,
    Streaming,
    /// Notifications turned off after streaming
    Disabled,
    Failed(LinkError),
    Disposed,
}

impl ChannelState {
    pub fn name(&self) -> &'static str {
        match self {
            ChannelState::Unconfigured => "unconfigured",
            ChannelState::Discovering => "discovering",
            ChannelState::Discovered => "discovered",
            ChannelState::Enabling => "enabling",
            ChannelState::Streaming => "streaming",
            ChannelState::Disabled => "disabled",
            ChannelState::Failed(_) => "failed",
            ChannelState::Disposed => "disposed",
        }
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self, ChannelState::Streaming)
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One sensor's link to the peripheral
pub struct SensorChannel {
    identity: SensorIdentity,
    transport: Arc<dyn Transport>,
    state: Mutex<ChannelState>,
    handle: Mutex<Option<ServiceHandle>>,
    frames: Subject<RawFrame>,
    calibration: Mutex<Option<CalibrationBlock>>,
    live: Arc<AtomicBool>,
    warnings: Mutex<Vec<LinkError>>,
    gyroscope_axes: GyroscopeAxis,
    strict_writes: bool,
}

impl SensorChannel {
    pub fn new(kind: SensorKind, transport: Arc<dyn Transport>) -> Self {
        Self {
            identity: kind.identity(),
            transport,
            state: Mutex::new(ChannelState::Unconfigured),
            handle: Mutex::new(None),
            frames: Subject::new(),
            calibration: Mutex::new(None),
            live: Arc::new(AtomicBool::new(false)),
            warnings: Mutex::new(Vec::new()),
            gyroscope_axes: GyroscopeAxis::default(),
            strict_writes: false,
        }
    }

    /// Axes the gyroscope is enabled with. Ignored by other sensors.
    pub fn with_gyroscope_axes(mut self, axes: GyroscopeAxis) -> Self {
        self.gyroscope_axes = axes;
        self
    }

    /// Treat unreachable writes as fatal.
    pub fn with_strict_writes(mut self, strict: bool) -> Self {
        self.strict_writes = strict;
        self
    }

    pub fn kind(&self) -> SensorKind {
        self.identity.kind
    }

    pub fn identity(&self) -> &SensorIdentity {
        &self.identity
    }

    pub fn state(&self) -> ChannelState {
        self.state.lock().clone()
    }

    /// Raw notifications, one frame per delivery.
    pub fn frames(&self) -> Observable<RawFrame> {
        self.frames.observable()
    }

    /// Calibration captured while enabling the barometer.
    pub fn calibration(&self) -> Option<CalibrationBlock> {
        *self.calibration.lock()
    }

    /// Unreachable writes tolerated so far.
    pub fn warnings(&self) -> Vec<LinkError> {
        self.warnings.lock().clone()
    }

    /// Discovers and opens the sensor's service.
    pub async fn initialize(&self) -> LinkResult<()> {
        self.begin("initialize", |s| matches!(s, ChannelState::Unconfigured), ChannelState::Discovering)?;

        match self.transport.discover_service(self.identity.service).await {
            Ok(handle) => {
                debug!("{}: discovered {}", self.kind(), handle);
                *self.handle.lock() = Some(handle.clone());
                if self.settle(ChannelState::Discovering, ChannelState::Discovered).is_err() {
                    // Disposed while discovering; dispose may already have
                    // taken and released the handle.
                    if let Some(handle) = self.handle.lock().take() {
                        self.transport.release_service(&handle);
                    }
                    return Err(LinkError::Disposed);
                }
                Ok(())
            }
            Err(_) => Err(self.fail(LinkError::DeviceNotFound {
                kind: self.kind(),
                service: self.identity.service,
            })),
        }
    }

    /// Writes the on-device sample period.
    ///
    /// Only valid once discovered, on sensors with a period characteristic.
    pub async fn set_read_period(&self, period: SamplePeriod) -> LinkResult<()> {
        let characteristic = self.identity.period.ok_or(LinkError::Unsupported {
            kind: self.kind(),
            operation: "set read period",
        })?;
        self.require_state("set read period", |s| matches!(s, ChannelState::Discovered))?;

        let handle = self.service_handle()?;
        debug!("{}: read period {} ms", self.kind(), period.as_millis());
        let result = self
            .transport
            .write_characteristic(&handle, characteristic, &[period.units()])
            .await;
        self.tolerate(characteristic, result)
    }

    /// Switches the sensor on.
    ///
    /// The barometer first latches and reads its calibration block; failure
    /// to obtain it is fatal.
    pub async fn enable(&self) -> LinkResult<()> {
        self.require_state("enable", |s| matches!(s, ChannelState::Discovered))?;
        let handle = self.service_handle()?;
        let config = self.identity.config;

        if let Some(characteristic) = self.identity.calibration {
            let latch = self
                .transport
                .write_characteristic(&handle, config, &EnableCommand::StoreCalibration.payload())
                .await;
            self.tolerate(config, latch)?;

            let block = self.read_calibration(&handle, characteristic).await?;
            *self.calibration.lock() = Some(block);
        }

        let command = EnableCommand::for_kind(self.kind(), self.gyroscope_axes);
        let result = self
            .transport
            .write_characteristic(&handle, config, &command.payload())
            .await;
        self.tolerate(config, result)?;

        self.settle(ChannelState::Discovered, ChannelState::Enabling)?;
        debug!("{}: enabled", self.kind());
        Ok(())
    }

    /// Subscribes to the data characteristic and starts publishing frames.
    pub async fn enable_notifications(&self) -> LinkResult<()> {
        let from = self.require_state("enable notifications", |s| {
            matches!(s, ChannelState::Enabling | ChannelState::Disabled)
        })?;
        let handle = self.service_handle()?;

        self.live.store(true, Ordering::Release);
        let result = self
            .transport
            .subscribe_notifications(&handle, self.identity.data, self.notification_callback())
            .await;
        if let Err(err) = self.tolerate(self.identity.data, result) {
            self.live.store(false, Ordering::Release);
            return Err(err);
        }

        if let Err(err) = self.settle(from, ChannelState::Streaming) {
            self.live.store(false, Ordering::Release);
            return Err(err);
        }
        debug!("{}: streaming", self.kind());
        Ok(())
    }

    /// Unsubscribes; the channel can later resume with
    /// [`enable_notifications`](Self::enable_notifications).
    pub async fn disable_notifications(&self) -> LinkResult<()> {
        self.require_state("disable notifications", |s| matches!(s, ChannelState::Streaming))?;
        let handle = self.service_handle()?;

        self.live.store(false, Ordering::Release);
        let result = self
            .transport
            .unsubscribe_notifications(&handle, self.identity.data)
            .await;
        self.tolerate(self.identity.data, result)?;

        self.settle(ChannelState::Streaming, ChannelState::Disabled)?;
        debug!("{}: notifications disabled", self.kind());
        Ok(())
    }

    /// Releases the service and closes the frame stream. Idempotent.
    pub fn dispose(&self) {
        self.live.store(false, Ordering::Release);
        {
            let mut state = self.state.lock();
            if *state == ChannelState::Disposed {
                return;
            }
            *state = ChannelState::Disposed;
        }

        if let Some(handle) = self.handle.lock().take() {
            self.transport.release_service(&handle);
        }
        self.frames.complete();
        debug!("{}: disposed", self.kind());
    }

    fn notification_callback(&self) -> NotificationCallback {
        let frames = self.frames.clone();
        let live = self.live.clone();
        let kind = self.kind();

        Arc::new(move |payload: &[u8], timestamp: Timestamp| {
            if !live.load(Ordering::Acquire) {
                trace!("{}: dropped notification after shutdown", kind);
                return;
            }
            frames.next(RawFrame::new(kind, payload.to_vec(), timestamp));
        })
    }

    async fn read_calibration(
        &self,
        handle: &ServiceHandle,
        characteristic: &'static str,
    ) -> LinkResult<CalibrationBlock> {
        let bytes = match self
            .transport
            .read_characteristic(handle, characteristic, CacheMode::Uncached)
            .await
        {
            Ok(bytes) => bytes,
            Err(_) => {
                return Err(self.fail(LinkError::Unreachable {
                    kind: self.kind(),
                    characteristic,
                }))
            }
        };

        let block = CalibrationBlock::from_bytes(&bytes)
            .and_then(|block| {
                if block.is_populated() {
                    Ok(block)
                } else {
                    Err(DecodeError::CalibrationMissing)
                }
            })
            .map_err(|source| {
                self.fail(LinkError::Decode {
                    kind: self.kind(),
                    source,
                })
            })?;

        debug!("{}: calibration {:?}", self.kind(), block.coefficients());
        Ok(block)
    }

    fn service_handle(&self) -> LinkResult<ServiceHandle> {
        self.handle.lock().clone().ok_or(LinkError::Disposed)
    }

    /// Moves to `next` if `allowed` accepts the current state, under one
    /// lock so a concurrent dispose cannot be overwritten.
    fn begin(
        &self,
        operation: &'static str,
        allowed: impl Fn(&ChannelState) -> bool,
        next: ChannelState,
    ) -> LinkResult<()> {
        let mut state = self.state.lock();
        self.check(&state, operation, allowed)?;
        debug!("{}: {} -> {}", self.kind(), *state, next);
        *state = next;
        Ok(())
    }

    /// Returns the current state if `allowed` accepts it.
    fn require_state(
        &self,
        operation: &'static str,
        allowed: impl Fn(&ChannelState) -> bool,
    ) -> LinkResult<ChannelState> {
        let state = self.state.lock();
        self.check(&state, operation, allowed)?;
        Ok(state.clone())
    }

    fn check(
        &self,
        state: &ChannelState,
        operation: &'static str,
        allowed: impl Fn(&ChannelState) -> bool,
    ) -> LinkResult<()> {
        if *state == ChannelState::Disposed {
            return Err(LinkError::Disposed);
        }
        if !allowed(state) {
            return Err(LinkError::InvalidState {
                kind: self.kind(),
                state: state.name(),
                operation,
            });
        }
        Ok(())
    }

    /// Completes a transition begun in `from`, unless the channel was
    /// disposed or failed meanwhile.
    fn settle(&self, from: ChannelState, to: ChannelState) -> LinkResult<()> {
        let mut state = self.state.lock();
        if *state != from {
            return Err(match &*state {
                ChannelState::Disposed => LinkError::Disposed,
                other => LinkError::InvalidState {
                    kind: self.kind(),
                    state: other.name(),
                    operation: "complete transition",
                },
            });
        }
        debug!("{}: {} -> {}", self.kind(), from, to);
        *state = to;
        Ok(())
    }

    /// Records `error` as the channel's failure and hands it back.
    fn fail(&self, error: LinkError) -> LinkError {
        let mut state = self.state.lock();
        if *state != ChannelState::Disposed {
            *state = ChannelState::Failed(error.clone());
        }
        error
    }

    /// Maps a transport result, downgrading unreachable to a warning unless
    /// writes are strict.
    fn tolerate(
        &self,
        characteristic: &'static str,
        result: Result<(), TransportError>,
    ) -> LinkResult<()> {
        let Err(_) = result else { return Ok(()) };

        let error = LinkError::Unreachable {
            kind: self.kind(),
            characteristic,
        };
        if self.strict_writes {
            return Err(self.fail(error));
        }

        warn!("{}", error);
        self.warnings.lock().push(error);
        Ok(())
    }
}

impl fmt::Debug for SensorChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensorChannel")
            .field("kind", &self.kind())
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loopback::LoopbackTransport;
    use sensortag_core::constants::uuids;

    const CALIBRATION: [u8; 16] = [
        0x81, 0xB2, 0xF8, 0x63, 0xFE, 0xBE, 0x4E, 0x8D, 0x28, 0x0A, 0x72, 0xFB, 0x4A, 0x1A, 0x40,
        0xED,
    ];

    fn setup(kind: SensorKind) -> (Arc<LoopbackTransport>, SensorChannel) {
        let link = Arc::new(LoopbackTransport::new().with_all_sensors());
        let channel = SensorChannel::new(kind, link.clone());
        (link, channel)
    }

    async fn bring_up(channel: &SensorChannel) {
        channel.initialize().await.unwrap();
        channel.enable().await.unwrap();
        channel.enable_notifications().await.unwrap();
    }

    #[tokio::test]
    async fn lifecycle_to_streaming() {
        let (link, channel) = setup(SensorKind::Humidity);
        assert_eq!(channel.state(), ChannelState::Unconfigured);

        channel.initialize().await.unwrap();
        assert_eq!(channel.state(), ChannelState::Discovered);

        channel.enable().await.unwrap();
        assert_eq!(channel.state(), ChannelState::Enabling);
        assert_eq!(link.writes_to(uuids::HUM_CONFIG), vec![vec![1]]);

        channel.enable_notifications().await.unwrap();
        assert!(channel.state().is_streaming());
        assert!(link.is_subscribed(uuids::HUM_DATA));
    }

    #[tokio::test]
    async fn frames_carry_origin_and_timestamp() {
        let (link, channel) = setup(SensorKind::Humidity);
        bring_up(&channel).await;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _sub = channel.frames().subscribe(move |f: &RawFrame| sink.lock().push(f.clone()));

        link.notify_at(uuids::HUM_DATA, &[1, 2, 3, 4], 99);
        let frames = seen.lock().clone();
        assert_eq!(frames, vec![RawFrame::new(SensorKind::Humidity, vec![1, 2, 3, 4], 99)]);
    }

    #[tokio::test]
    async fn discovery_failure_is_terminal() {
        let (link, channel) = setup(SensorKind::Pressure);
        link.remove_service(uuids::BAR_SERVICE);

        let err = channel.initialize().await.unwrap_err();
        assert!(matches!(err, LinkError::DeviceNotFound { kind: SensorKind::Pressure, .. }));
        assert!(matches!(channel.state(), ChannelState::Failed(_)));

        let again = channel.initialize().await.unwrap_err();
        assert!(matches!(again, LinkError::InvalidState { state: "failed", .. }));
    }

    #[tokio::test]
    async fn period_only_where_supported() {
        let (link, channel) = setup(SensorKind::Accelerometer);
        channel.initialize().await.unwrap();
        channel.set_read_period(SamplePeriod::default()).await.unwrap();
        assert_eq!(link.writes_to(uuids::ACC_PERIOD), vec![vec![33]]);

        let (_, gyro) = setup(SensorKind::Gyroscope);
        gyro.initialize().await.unwrap();
        let err = gyro.set_read_period(SamplePeriod::default()).await.unwrap_err();
        assert!(matches!(err, LinkError::Unsupported { .. }));
    }

    #[tokio::test]
    async fn gyroscope_enables_with_axis_mask() {
        let link = Arc::new(LoopbackTransport::new().with_all_sensors());
        let channel =
            SensorChannel::new(SensorKind::Gyroscope, link.clone()).with_gyroscope_axes(GyroscopeAxis::XZ);
        channel.initialize().await.unwrap();
        channel.enable().await.unwrap();
        assert_eq!(link.writes_to(uuids::GYR_CONFIG), vec![vec![5]]);
    }

    #[tokio::test]
    async fn pressure_captures_calibration_before_enable() {
        let (link, channel) = setup(SensorKind::Pressure);
        link.set_value(uuids::BAR_CALIBRATION, &CALIBRATION);

        channel.initialize().await.unwrap();
        channel.enable().await.unwrap();

        assert_eq!(link.writes_to(uuids::BAR_CONFIG), vec![vec![2], vec![1]]);
        let block = channel.calibration().unwrap();
        assert_eq!(block.coefficients()[0], 45697);
        assert_eq!(block.coefficients()[7], -4800);
    }

    #[tokio::test]
    async fn missing_calibration_is_fatal() {
        let (link, channel) = setup(SensorKind::Pressure);
        link.set_value(uuids::BAR_CALIBRATION, &[0; 16]);
        channel.initialize().await.unwrap();

        let err = channel.enable().await.unwrap_err();
        assert_eq!(
            err,
            LinkError::Decode {
                kind: SensorKind::Pressure,
                source: DecodeError::CalibrationMissing
            }
        );
        assert!(matches!(channel.state(), ChannelState::Failed(_)));
    }

    #[tokio::test]
    async fn unreachable_write_is_a_warning() {
        let (link, channel) = setup(SensorKind::Magnetometer);
        link.set_unreachable(uuids::MAG_PERIOD, true);

        channel.initialize().await.unwrap();
        channel.set_read_period(SamplePeriod::new(50)).await.unwrap();
        assert_eq!(channel.state(), ChannelState::Discovered);
        assert_eq!(channel.warnings().len(), 1);
        assert!(channel.warnings()[0].is_unreachable());
    }

    #[tokio::test]
    async fn strict_writes_fail_the_channel() {
        let link = Arc::new(LoopbackTransport::new().with_all_sensors());
        link.set_unreachable(uuids::MAG_CONFIG, true);
        let channel = SensorChannel::new(SensorKind::Magnetometer, link.clone()).with_strict_writes(true);

        channel.initialize().await.unwrap();
        let err = channel.enable().await.unwrap_err();
        assert!(err.is_unreachable());
        assert_eq!(channel.state(), ChannelState::Failed(err));
    }

    #[tokio::test]
    async fn disable_then_resume() {
        let (link, channel) = setup(SensorKind::Accelerometer);
        bring_up(&channel).await;

        let count = Arc::new(Mutex::new(0));
        let sink = count.clone();
        let _sub = channel.frames().subscribe(move |_: &RawFrame| *sink.lock() += 1);

        channel.disable_notifications().await.unwrap();
        assert_eq!(channel.state(), ChannelState::Disabled);
        assert!(!link.notify(uuids::ACC_DATA, &[1, 2, 3]));

        channel.enable_notifications().await.unwrap();
        assert!(link.notify(uuids::ACC_DATA, &[1, 2, 3]));
        assert_eq!(*count.lock(), 1);
    }

    #[tokio::test]
    async fn enable_before_initialize_is_rejected() {
        let (_, channel) = setup(SensorKind::Humidity);
        let err = channel.enable().await.unwrap_err();
        assert_eq!(
            err,
            LinkError::InvalidState {
                kind: SensorKind::Humidity,
                state: "unconfigured",
                operation: "enable"
            }
        );
    }

    #[tokio::test]
    async fn dispose_is_idempotent_and_silences_frames() {
        let (link, channel) = setup(SensorKind::Humidity);
        bring_up(&channel).await;

        let count = Arc::new(Mutex::new(0));
        let sink = count.clone();
        let _sub = channel.frames().subscribe(move |_: &RawFrame| *sink.lock() += 1);

        channel.dispose();
        channel.dispose();

        assert_eq!(channel.state(), ChannelState::Disposed);
        assert_eq!(link.released().len(), 1);
        assert!(!link.notify(uuids::HUM_DATA, &[0, 0, 0, 0]));
        assert_eq!(*count.lock(), 0);
        assert_eq!(channel.enable().await, Err(LinkError::Disposed));
    }

    #[tokio::test]
    async fn initialize_after_dispose_opens_nothing() {
        let (link, channel) = setup(SensorKind::Humidity);
        channel.dispose();

        assert_eq!(channel.initialize().await, Err(LinkError::Disposed));
        assert_eq!(channel.state(), ChannelState::Disposed);
        assert_eq!(link.open_services(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dispose_during_discovery_releases_the_service() {
        let (link, channel) = setup(SensorKind::Humidity);
        link.set_discovery_delay(std::time::Duration::from_millis(10));
        let channel = Arc::new(channel);

        let racer = channel.clone();
        let discovery = tokio::spawn(async move { racer.initialize().await });
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        assert_eq!(channel.state(), ChannelState::Discovering);

        channel.dispose();
        assert_eq!(discovery.await.unwrap(), Err(LinkError::Disposed));
        assert_eq!(channel.state(), ChannelState::Disposed);
        assert_eq!(link.open_services(), 0);
        assert_eq!(link.released().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn initialize_racing_dispose_never_reopens() {
        let link = Arc::new(LoopbackTransport::new().with_all_sensors());

        for _ in 0..500 {
            let channel = Arc::new(SensorChannel::new(SensorKind::Humidity, link.clone()));
            let racer = channel.clone();
            let discovery = tokio::spawn(async move { racer.initialize().await });
            let disposer = channel.clone();
            let teardown = tokio::task::spawn_blocking(move || disposer.dispose());

            let _ = discovery.await.unwrap();
            teardown.await.unwrap();
            assert_eq!(channel.state(), ChannelState::Disposed);
        }
        assert_eq!(link.open_services(), 0);
    }

    #[test]
    fn dispose_before_setup() {
        let (link, channel) = setup(SensorKind::Gyroscope);
        channel.dispose();
        assert_eq!(channel.state(), ChannelState::Disposed);
        assert!(link.released().is_empty());
    }
}
