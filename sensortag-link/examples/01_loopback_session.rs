//! Example 01: A Scripted Sensor Session
//!
//! This example demonstrates how to:
//! - Script a peripheral with the in-memory transport
//! - Bring all six sensors up through the orchestrator
//! - Subscribe to the shaped output streams
//! - Tear everything down as a unit

use std::sync::Arc;
use std::time::Duration;

use sensortag_core::constants::uuids;
use sensortag_link::{loopback::LoopbackTransport, OrchestratorConfig, SensorOrchestrator};

const CALIBRATION: [u8; 16] = [
    0x81, 0xB2, 0xF8, 0x63, 0xFE, 0xBE, 0x4E, 0x8D, 0x28, 0x0A, 0x72, 0xFB, 0x4A, 0x1A, 0x40, 0xED,
];

#[tokio::main(flavor = "current_thread")]
async fn main() {
    println!("=== SensorTag Loopback Session ===\n");

    let link = Arc::new(LoopbackTransport::new().with_all_sensors());
    link.set_value(uuids::BAR_CALIBRATION, &CALIBRATION);

    let config = OrchestratorConfig::default();
    let sensors = SensorOrchestrator::new(link.clone(), config);
    let streams = sensors.streams().clone();

    let _subscriptions = [
        streams
            .accelerometer
            .subscribe(|v| println!("accelerometer  {:+.3} {:+.3} {:+.3} g", v.x, v.y, v.z)),
        streams
            .humidity
            .subscribe(|rh| println!("humidity       {rh:.1} %RH")),
        streams
            .pressure
            .subscribe(|hpa| println!("pressure       {hpa:.2} hPa")),
        streams
            .ambient_temperature
            .subscribe(|t| println!("ambient        {t:.2} °C")),
        streams
            .target_temperature
            .subscribe(|t| println!("target         {t:.2} °C")),
    ];

    if !sensors.begin_setup().await {
        println!("Setup failed: {:?}", sensors.last_error());
        return;
    }
    println!("Setup complete: {:?}\n", sensors.channel_states());

    // Ten seconds of readings at the device's default period
    for tick in 0u16..30 {
        let tilt = (tick as i8 % 8) - 4;
        link.notify(uuids::ACC_DATA, &[tilt as u8, 0, 64]);
        link.notify(uuids::HUM_DATA, &[0, 0, 0x00, 0x80 + tick as u8]);
        link.notify(uuids::BAR_DATA, &[0x00, 0x01, 0xEA, 0x85]);
        link.notify(uuids::IRT_DATA, &[0x00, 0x01, 0x80, 0x0C]);
        tokio::time::sleep(Duration::from_millis(330)).await;
    }

    sensors.dispose();
    println!("\nReleased {} services", link.released().len());
}
