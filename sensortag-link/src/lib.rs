//! Asynchronous link layer for the SensorTag multi-sensor peripheral
//!
//! ## Overview
//!
//! This crate drives the peripheral through a characteristic-based wireless
//! transport and turns its notifications into continuous, composable data
//! streams. Decoding is delegated to `sensortag-core`; everything here is
//! about lifecycle, timing and composition.
//!
//! ```text
//! Transport ──notification──▶ SensorChannel ──RawFrame──▶ decode ──▶ sample ──▶ distinct ──▶ SensorStreams
//!     ▲                              ▲
//!     └──── discover / write / read ─┴──── SensorOrchestrator (setup, teardown)
//! ```
//!
//! ## Layers
//!
//! ### Transport
//!
//! [`Transport`] is the only seam to the radio: discover a service, write and
//! read characteristics, subscribe to notifications, release the service.
//! [`LoopbackTransport`](loopback::LoopbackTransport) implements it in memory
//! for tests and demos (feature `loopback`, on by default).
//!
//! ### Channels
//!
//! A [`SensorChannel`] owns one sensor's endpoints and its lifecycle state
//! machine (`Unconfigured → Discovering → Discovered → Enabling → Streaming`,
//! with `Disabled`, `Failed` and `Disposed`). Unreachable writes surface as
//! per-channel warnings unless strict writes are configured.
//!
//! ### Streams
//!
//! [`Observable`] is a push-based, multi-subscriber stream. Subscribing
//! returns a [`Subscription`]; dropping it detaches the observer. Operators:
//! `map`, `filter_map`, `filter`, `distinct_until_changed`,
//! `sample(Duration)` and `combine_latest`.
//!
//! ### Orchestrator
//!
//! [`SensorOrchestrator`] brings all six sensors up in a fixed order,
//! reports all-or-nothing readiness from
//! [`begin_setup`](SensorOrchestrator::begin_setup) and exposes one stream per
//! physical quantity through [`SensorStreams`].
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sensortag_link::{loopback::LoopbackTransport, OrchestratorConfig, SensorOrchestrator};
//!
//! # async fn run() {
//! let transport = Arc::new(LoopbackTransport::new().with_all_sensors());
//! let orchestrator = SensorOrchestrator::new(transport, OrchestratorConfig::default());
//!
//! let _humidity = orchestrator
//!     .streams()
//!     .humidity
//!     .subscribe(|rh: &f64| println!("humidity {rh:.1} %RH"));
//!
//! if !orchestrator.begin_setup().await {
//!     eprintln!("setup failed: {:?}", orchestrator.last_error());
//! }
//! # }
//! ```
//!
//! ## Threading
//!
//! Notifications may arrive on any thread, concurrently across sensors.
//! Observers run on the delivering thread; sampling runs on Tokio tasks, so
//! [`SensorOrchestrator::new`] must be called inside a Tokio runtime.

#![deny(unsafe_code)]

pub mod channel;
pub mod config;
pub mod error;
#[cfg(feature = "loopback")]
pub mod loopback;
pub mod observable;
pub mod orchestrator;
pub mod transport;

// Re-export common types
pub use channel::{ChannelState, SensorChannel};
pub use config::OrchestratorConfig;
pub use error::{LinkError, LinkResult, TransportError};
pub use observable::{Observable, Subject, Subscription};
pub use orchestrator::{SensorOrchestrator, SensorStreams};
pub use transport::{CacheMode, NotificationCallback, ServiceHandle, Transport};
