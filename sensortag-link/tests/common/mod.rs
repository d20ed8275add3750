//! Shared fixtures for link-layer integration tests
//!
//! - A scripted peripheral exposing all six sensors with a valid barometer
//!   calibration block
//! - Payload builders for each sensor's wire format
//! - A recorder collecting everything a stream emits

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use sensortag_core::constants::uuids;
use sensortag_link::loopback::LoopbackTransport;
use sensortag_link::{Observable, OrchestratorConfig, SensorOrchestrator, Subscription};

/// Coefficients 45697, 25592, 48894, 36174, 2600, -1166, 6730, -4800
pub const CALIBRATION: [u8; 16] = [
    0x81, 0xB2, 0xF8, 0x63, 0xFE, 0xBE, 0x4E, 0x8D, 0x28, 0x0A, 0x72, 0xFB, 0x4A, 0x1A, 0x40, 0xED,
];

/// Barometer frame decoding to ~1013.01 hPa with [`CALIBRATION`]
pub const SEA_LEVEL_FRAME: [u8; 4] = [0x00, 0x01, 0xEA, 0x85];

/// Peripheral exposing every sensor, ready for a successful setup
pub fn scripted_link() -> Arc<LoopbackTransport> {
    let link = Arc::new(LoopbackTransport::new().with_all_sensors());
    link.set_value(uuids::BAR_CALIBRATION, &CALIBRATION);
    link
}

pub fn orchestrator(link: &Arc<LoopbackTransport>, config: OrchestratorConfig) -> SensorOrchestrator {
    SensorOrchestrator::new(link.clone(), config)
}

pub fn humidity_frame(raw: u16) -> [u8; 4] {
    let [lo, hi] = raw.to_le_bytes();
    [0, 0, lo, hi]
}

/// Thermopile frame with the die at `ambient_c` (1/128 °C resolution)
pub fn infrared_frame(object_raw: i16, ambient_c: f64) -> [u8; 4] {
    let [o_lo, o_hi] = object_raw.to_le_bytes();
    let [a_lo, a_hi] = ((ambient_c * 128.0) as u16).to_le_bytes();
    [o_lo, o_hi, a_lo, a_hi]
}

pub fn accelerometer_frame(x: i8, y: i8, z: i8) -> [u8; 3] {
    [x as u8, y as u8, z as u8]
}

pub fn vector_frame(x: i16, y: i16, z: i16) -> [u8; 6] {
    let mut frame = [0; 6];
    frame[0..2].copy_from_slice(&x.to_le_bytes());
    frame[2..4].copy_from_slice(&y.to_le_bytes());
    frame[4..6].copy_from_slice(&z.to_le_bytes());
    frame
}

/// Everything a stream emitted while the recorder was alive
pub struct Recorder<T> {
    seen: Arc<Mutex<Vec<T>>>,
    _subscription: Subscription,
}

impl<T: Clone + Send + Sync + 'static> Recorder<T> {
    pub fn attach(stream: &Observable<T>) -> Self {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let subscription = stream.subscribe(move |value: &T| sink.lock().push(value.clone()));
        Self {
            seen,
            _subscription: subscription,
        }
    }

    pub fn values(&self) -> Vec<T> {
        self.seen.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }
}

/// Lets paused Tokio time run forward by `ms`.
pub async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected} ± {tolerance}, got {actual}"
    );
}
