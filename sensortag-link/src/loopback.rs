//! In-memory transport
//!
//! A complete [`Transport`] that keeps services, characteristic values and
//! subscriptions in memory. Tests and demos use it to script a peripheral:
//! which services exist, what a read returns, which characteristics are
//! unreachable, how long discovery takes, and when notifications fire.
//!
//! ```rust
//! use sensortag_link::loopback::LoopbackTransport;
//! use sensortag_core::{constants::uuids, SensorKind};
//!
//! let link = LoopbackTransport::new().with_all_sensors();
//! link.remove_service(uuids::BAR_SERVICE);
//! assert!(!link.has_service(SensorKind::Pressure.identity().service));
//! ```

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use log::trace;
use parking_lot::Mutex;
use sensortag_core::{time::SystemTime, SensorKind, TimeSource, Timestamp};

use crate::error::TransportError;
use crate::transport::{CacheMode, NotificationCallback, ServiceHandle, Transport};

/// A successful characteristic write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    pub characteristic: String,
    pub value: Vec<u8>,
}

#[derive(Default)]
struct LoopbackState {
    services: HashSet<String>,
    values: HashMap<String, Vec<u8>>,
    unreachable: HashSet<String>,
    writes: Vec<WriteRecord>,
    /// characteristic -> (owning handle id, callback)
    subscriptions: HashMap<String, (u64, NotificationCallback)>,
    open: HashSet<u64>,
    released: Vec<ServiceHandle>,
    next_handle: u64,
    discovery_delay: Duration,
}

fn key(uuid: &str) -> String {
    uuid.to_ascii_lowercase()
}

/// Scriptable in-memory peripheral
pub struct LoopbackTransport<C = SystemTime> {
    clock: C,
    state: Mutex<LoopbackState>,
}

impl LoopbackTransport<SystemTime> {
    pub fn new() -> Self {
        Self::with_clock(SystemTime)
    }
}

impl Default for LoopbackTransport<SystemTime> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: TimeSource> LoopbackTransport<C> {
    /// Stamps notifications from `clock`.
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            state: Mutex::new(LoopbackState::default()),
        }
    }

    /// Exposes the service of every sensor on the peripheral.
    pub fn with_all_sensors(self) -> Self {
        for kind in SensorKind::ALL {
            self.add_service(kind.identity().service);
        }
        self
    }

    pub fn add_service(&self, service: &str) {
        self.state.lock().services.insert(key(service));
    }

    pub fn remove_service(&self, service: &str) {
        self.state.lock().services.remove(&key(service));
    }

    pub fn has_service(&self, service: &str) -> bool {
        self.state.lock().services.contains(&key(service))
    }

    /// Makes every discovery wait `delay` (Tokio time) before answering.
    pub fn set_discovery_delay(&self, delay: Duration) {
        self.state.lock().discovery_delay = delay;
    }

    /// Value served to subsequent reads.
    pub fn set_value(&self, characteristic: &str, value: &[u8]) {
        self.state
            .lock()
            .values
            .insert(key(characteristic), value.to_vec());
    }

    /// Makes every access to `characteristic` fail with `Unreachable`.
    pub fn set_unreachable(&self, characteristic: &str, unreachable: bool) {
        let mut state = self.state.lock();
        if unreachable {
            state.unreachable.insert(key(characteristic));
        } else {
            state.unreachable.remove(&key(characteristic));
        }
    }

    /// Delivers a notification stamped with the clock's current time.
    ///
    /// Returns false if nobody is subscribed.
    pub fn notify(&self, characteristic: &str, payload: &[u8]) -> bool {
        self.notify_at(characteristic, payload, self.clock.now())
    }

    pub fn notify_at(&self, characteristic: &str, payload: &[u8], timestamp: Timestamp) -> bool {
        let callback = self
            .state
            .lock()
            .subscriptions
            .get(&key(characteristic))
            .map(|(_, cb)| cb.clone());

        match callback {
            Some(cb) => {
                // Deliver outside the lock so the callback may call back in.
                cb(payload, timestamp);
                true
            }
            None => false,
        }
    }

    pub fn writes(&self) -> Vec<WriteRecord> {
        self.state.lock().writes.clone()
    }

    /// Values written to one characteristic, oldest first.
    pub fn writes_to(&self, characteristic: &str) -> Vec<Vec<u8>> {
        let wanted = key(characteristic);
        self.state
            .lock()
            .writes
            .iter()
            .filter(|w| w.characteristic == wanted)
            .map(|w| w.value.clone())
            .collect()
    }

    pub fn is_subscribed(&self, characteristic: &str) -> bool {
        self.state
            .lock()
            .subscriptions
            .contains_key(&key(characteristic))
    }

    pub fn subscription_count(&self) -> usize {
        self.state.lock().subscriptions.len()
    }

    pub fn open_services(&self) -> usize {
        self.state.lock().open.len()
    }

    pub fn released(&self) -> Vec<ServiceHandle> {
        self.state.lock().released.clone()
    }

    fn check(
        state: &LoopbackState,
        handle: &ServiceHandle,
        characteristic: &str,
    ) -> Result<(), TransportError> {
        if !state.open.contains(&handle.id()) || state.unreachable.contains(characteristic) {
            return Err(TransportError::Unreachable);
        }
        Ok(())
    }
}

#[async_trait]
impl<C: TimeSource + Send + Sync> Transport for LoopbackTransport<C> {
    async fn discover_service(&self, service: &str) -> Result<ServiceHandle, TransportError> {
        let delay = self.state.lock().discovery_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        let service = key(service);
        if !state.services.contains(&service) {
            return Err(TransportError::NotFound);
        }

        state.next_handle += 1;
        let handle = ServiceHandle::new(state.next_handle, service);
        state.open.insert(handle.id());
        trace!("loopback: opened {}", handle);
        Ok(handle)
    }

    async fn write_characteristic(
        &self,
        handle: &ServiceHandle,
        characteristic: &str,
        value: &[u8],
    ) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        let characteristic = key(characteristic);
        Self::check(&state, handle, &characteristic)?;

        state.values.insert(characteristic.clone(), value.to_vec());
        state.writes.push(WriteRecord {
            characteristic,
            value: value.to_vec(),
        });
        Ok(())
    }

    async fn read_characteristic(
        &self,
        handle: &ServiceHandle,
        characteristic: &str,
        _cache: CacheMode,
    ) -> Result<Vec<u8>, TransportError> {
        let state = self.state.lock();
        let characteristic = key(characteristic);
        Self::check(&state, handle, &characteristic)?;

        Ok(state.values.get(&characteristic).cloned().unwrap_or_default())
    }

    async fn subscribe_notifications(
        &self,
        handle: &ServiceHandle,
        characteristic: &str,
        callback: NotificationCallback,
    ) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        let characteristic = key(characteristic);
        Self::check(&state, handle, &characteristic)?;

        state
            .subscriptions
            .insert(characteristic, (handle.id(), callback));
        Ok(())
    }

    async fn unsubscribe_notifications(
        &self,
        handle: &ServiceHandle,
        characteristic: &str,
    ) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        let characteristic = key(characteristic);
        Self::check(&state, handle, &characteristic)?;

        state.subscriptions.remove(&characteristic);
        Ok(())
    }

    fn release_service(&self, handle: &ServiceHandle) {
        let mut state = self.state.lock();
        if state.open.remove(&handle.id()) {
            state.subscriptions.retain(|_, (owner, _)| *owner != handle.id());
            state.released.push(handle.clone());
            trace!("loopback: released {}", handle);
        }
    }
}
