//! Scan state visible to the UI without going through the event queue.
//!
//! The orchestrator and the BLE worker update these atomics at lifecycle edges
//! so the display task can ask "is a scan running?" between frames.

use portable_atomic::{AtomicBool, AtomicU32, Ordering};

#[derive(Debug)]
pub struct ScanStatus {
    ble_scanning: AtomicBool,
    wifi_scanning: AtomicBool,
    last_duration_ms: AtomicU32,
}

impl ScanStatus {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ble_scanning: AtomicBool::new(false),
            wifi_scanning: AtomicBool::new(false),
            last_duration_ms: AtomicU32::new(0),
        }
    }

    /// Returns `true` from BLE start acceptance until its terminal event is posted.
    #[must_use]
    pub fn is_scanning(&self) -> bool {
        self.ble_scanning.load(Ordering::Acquire)
    }

    /// Returns `true` while a WiFi scan cycle is in flight.
    #[must_use]
    pub fn wifi_scanning(&self) -> bool {
        self.wifi_scanning.load(Ordering::Acquire)
    }

    /// Duration of the most recently finished scan, WiFi or BLE (0 before the first).
    #[must_use]
    pub fn last_duration_ms(&self) -> u32 {
        self.last_duration_ms.load(Ordering::Relaxed)
    }

    pub(crate) fn set_ble_scanning(&self, scanning: bool) {
        self.ble_scanning.store(scanning, Ordering::Release);
    }

    pub(crate) fn set_wifi_scanning(&self, scanning: bool) {
        self.wifi_scanning.store(scanning, Ordering::Release);
    }

    pub(crate) fn record_duration(&self, duration_ms: u32) {
        self.last_duration_ms.store(duration_ms, Ordering::Relaxed);
    }
}

impl Default for ScanStatus {
    fn default() -> Self {
        Self::new()
    }
}
