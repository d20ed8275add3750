//! Time sources for notification timestamps
//!
//! The transport stamps each notification when it arrives. Real links use the
//! system clock; tests and replays use a [`ManualClock`] that is moved by hand
//! and can be shared with the transport that reads it.

use core::sync::atomic::{AtomicU64, Ordering};

/// Timestamp in milliseconds since epoch (or since start for manual clocks)
pub type Timestamp = u64;

/// Source of time for stamping frames
pub trait TimeSource {
    /// Get current timestamp in milliseconds
    fn now(&self) -> Timestamp;

    /// Check if this source provides wall clock time
    fn is_wall_clock(&self) -> bool;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now(&self) -> Timestamp {
        (**self).now()
    }

    fn is_wall_clock(&self) -> bool {
        (**self).is_wall_clock()
    }
}

#[cfg(feature = "std")]
impl<T: TimeSource + ?Sized> TimeSource for std::sync::Arc<T> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }

    fn is_wall_clock(&self) -> bool {
        (**self).is_wall_clock()
    }
}

/// System time source (requires std)
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTime;

#[cfg(feature = "std")]
impl TimeSource for SystemTime {
    fn now(&self) -> Timestamp {
        use std::time::{SystemTime as StdSystemTime, UNIX_EPOCH};

        StdSystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }

    fn is_wall_clock(&self) -> bool {
        true
    }
}

/// Clock that only moves when told to
///
/// All methods take `&self`, so one clock can stamp frames inside a transport
/// while a test advances it from outside.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Clock reading `start` until moved.
    pub const fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    /// Jumps to `timestamp`, backwards if asked.
    pub fn set(&self, timestamp: Timestamp) {
        self.now.store(timestamp, Ordering::Release);
    }

    /// Moves the clock forward by `ms`, saturating at `u64::MAX`.
    pub fn advance(&self, ms: u64) -> Timestamp {
        let previous = self
            .now
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |t| {
                Some(t.saturating_add(ms))
            })
            .unwrap_or_else(|t| t);
        previous.saturating_add(ms)
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::Acquire)
    }

    fn is_wall_clock(&self) -> bool {
        false
    }
}
