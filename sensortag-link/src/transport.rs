//! Transport capability consumed by the link layer
//!
//! ## Overview
//!
//! The link layer never touches the radio. It drives whatever implements
//! [`Transport`]: a BLE stack binding, a serial bridge, or the in-memory
//! [`LoopbackTransport`](crate::loopback::LoopbackTransport) used in tests.
//!
//! ## Contract
//!
//! - Identifiers are 128-bit UUID strings, compared case-insensitively by
//!   implementations.
//! - "Unreachable" is reported synchronously as the result of the call.
//!   There are no timeouts at this layer.
//! - Notifications for one characteristic are delivered serially. Different
//!   characteristics may deliver concurrently from different threads.
//! - After `unsubscribe_notifications` or `release_service` returns, the
//!   transport must stop invoking the callback, though a delivery already in
//!   flight may still land.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use sensortag_core::Timestamp;

use crate::error::TransportError;

/// Callback receiving `(payload, timestamp)` for each notification
pub type NotificationCallback = Arc<dyn Fn(&[u8], Timestamp) + Send + Sync>;

/// Opaque handle to an opened service
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceHandle {
    id: u64,
    service: String,
}

impl ServiceHandle {
    pub fn new(id: u64, service: impl Into<String>) -> Self {
        Self {
            id,
            service: service.into(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn service(&self) -> &str {
        &self.service
    }
}

impl fmt::Display for ServiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.service, self.id)
    }
}

/// Whether a read may be served from the host's attribute cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    #[default]
    Cached,
    Uncached,
}

/// Characteristic-based wireless link to one peripheral
#[async_trait]
pub trait Transport: Send + Sync {
    /// Finds the device exposing `service` and opens it.
    async fn discover_service(&self, service: &str) -> Result<ServiceHandle, TransportError>;

    /// Writes `value` to a characteristic of an opened service.
    async fn write_characteristic(
        &self,
        handle: &ServiceHandle,
        characteristic: &str,
        value: &[u8],
    ) -> Result<(), TransportError>;

    /// Reads a characteristic's current value.
    async fn read_characteristic(
        &self,
        handle: &ServiceHandle,
        characteristic: &str,
        cache: CacheMode,
    ) -> Result<Vec<u8>, TransportError>;

    /// Enables notifications and attaches `callback` to them.
    async fn subscribe_notifications(
        &self,
        handle: &ServiceHandle,
        characteristic: &str,
        callback: NotificationCallback,
    ) -> Result<(), TransportError>;

    /// Disables notifications and detaches the callback.
    async fn unsubscribe_notifications(
        &self,
        handle: &ServiceHandle,
        characteristic: &str,
    ) -> Result<(), TransportError>;

    /// Closes the service. Must be idempotent and never block.
    fn release_service(&self, handle: &ServiceHandle);
}
