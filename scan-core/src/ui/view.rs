//! Display projections of the scan event stream.
//!
//! The views hold their own copies of device and AP rows; the orchestrator's
//! device ring stays authoritative and is never shared with the UI.

use heapless::Vec;

use crate::config::{BLE_DEVICE_CAPACITY, MAX_WIFI_APS};
use crate::messages::{BleDevice, ScanEvent, ScanSummary, WifiAp};
use crate::ui::router::UiEvent;

/// Top band of the BLE screen.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BleBand {
    Idle,
    ChoosingDuration,
    Scanning,
}

/// Status line of the BLE screen.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BleStatus {
    Ready,
    ChooseDuration,
    Scanning { remaining_s: u32 },
    /// Countdown reached zero or cancel was pressed; waiting for the terminal event.
    Finishing,
    Complete { count: u16 },
    Canceled { count: u16 },
    Unavailable,
}

/// BLE screen state driven by UI input and scan events.
#[derive(Clone, Debug)]
pub struct BleScanView<const ROWS: usize = BLE_DEVICE_CAPACITY> {
    band: BleBand,
    status: BleStatus,
    duration_ms: u32,
    remaining_ms: u32,
    cancel_pending: bool,
    rows: Vec<BleDevice, ROWS>,
}

impl<const ROWS: usize> BleScanView<ROWS> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            band: BleBand::Idle,
            status: BleStatus::Ready,
            duration_ms: 0,
            remaining_ms: 0,
            cancel_pending: false,
            rows: Vec::new(),
        }
    }

    #[must_use]
    pub const fn band(&self) -> BleBand {
        self.band
    }

    #[must_use]
    pub const fn status(&self) -> BleStatus {
        self.status
    }

    #[must_use]
    pub const fn duration_ms(&self) -> u32 {
        self.duration_ms
    }

    #[must_use]
    pub fn rows(&self) -> &[BleDevice] {
        &self.rows
    }

    /// Countdown rounded up to whole seconds.
    #[must_use]
    pub const fn remaining_seconds(&self) -> u32 {
        self.remaining_ms.div_ceil(1000)
    }

    /// Applies local UI input that changes the screen before any event arrives.
    pub fn on_ui(&mut self, event: UiEvent) {
        match event {
            UiEvent::BleScanRequested if self.band != BleBand::Scanning => {
                self.band = BleBand::ChoosingDuration;
                self.status = BleStatus::ChooseDuration;
            }
            UiEvent::BleCancelRequested if self.band == BleBand::Scanning => {
                self.cancel_pending = true;
                self.status = BleStatus::Finishing;
            }
            UiEvent::BleScanAcknowledged if self.band != BleBand::Scanning => {
                self.band = BleBand::Idle;
                self.status = BleStatus::Ready;
            }
            _ => {}
        }
    }

    /// Applies one event drained from the scan event queue.
    pub fn apply(&mut self, event: &ScanEvent) {
        match event {
            ScanEvent::BleScanStarted(summary) => {
                self.band = BleBand::Scanning;
                self.duration_ms = summary.duration_ms;
                self.remaining_ms = summary.duration_ms;
                self.cancel_pending = false;
                self.rows.clear();
                self.status = BleStatus::Scanning {
                    remaining_s: self.remaining_seconds(),
                };
            }
            ScanEvent::BleDeviceFound(device) => self.upsert(device),
            ScanEvent::BleScanCompleted(summary) => {
                self.finish(BleStatus::Complete {
                    count: summary.count,
                });
            }
            ScanEvent::BleScanCanceled(summary) => {
                self.finish(BleStatus::Canceled {
                    count: summary.count,
                });
            }
            ScanEvent::BleScanUnavailable { .. } => self.finish(BleStatus::Unavailable),
            ScanEvent::WifiApFound(_) | ScanEvent::WifiScanDone(_) => {}
        }
    }

    /// Advances the countdown by `delta_ms` of render time.
    pub fn tick(&mut self, delta_ms: u32) {
        if self.band != BleBand::Scanning {
            return;
        }
        self.remaining_ms = self.remaining_ms.saturating_sub(delta_ms);
        self.status = if self.cancel_pending || self.remaining_ms == 0 {
            BleStatus::Finishing
        } else {
            BleStatus::Scanning {
                remaining_s: self.remaining_seconds(),
            }
        };
    }

    fn finish(&mut self, status: BleStatus) {
        self.band = BleBand::Idle;
        self.status = status;
        self.remaining_ms = 0;
        self.cancel_pending = false;
    }

    fn upsert(&mut self, device: &BleDevice) {
        if let Some(row) = self.rows.iter_mut().find(|row| row.mac == device.mac) {
            if !device.name.is_empty() {
                row.name.clone_from(&device.name);
            }
            row.rssi = device.rssi;
            row.flags = device.flags;
            return;
        }
        // Rows beyond the display capacity are not shown.
        let _ = self.rows.push(device.clone());
    }
}

impl<const ROWS: usize> Default for BleScanView<ROWS> {
    fn default() -> Self {
        Self::new()
    }
}

/// WiFi screen state: AP rows for the current cycle plus the last summary.
#[derive(Clone, Debug)]
pub struct WifiScanView<const ROWS: usize = MAX_WIFI_APS> {
    scanning: bool,
    rows: Vec<WifiAp, ROWS>,
    last: Option<ScanSummary>,
}

impl<const ROWS: usize> WifiScanView<ROWS> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            scanning: false,
            rows: Vec::new(),
            last: None,
        }
    }

    #[must_use]
    pub const fn scanning(&self) -> bool {
        self.scanning
    }

    #[must_use]
    pub fn rows(&self) -> &[WifiAp] {
        &self.rows
    }

    #[must_use]
    pub const fn last_summary(&self) -> Option<ScanSummary> {
        self.last
    }

    pub fn on_ui(&mut self, event: UiEvent) {
        if event == UiEvent::WifiScanRequested && !self.scanning {
            self.scanning = true;
            self.rows.clear();
        }
    }

    pub fn apply(&mut self, event: &ScanEvent) {
        match event {
            ScanEvent::WifiApFound(ap) => {
                let _ = self.rows.push(ap.clone());
            }
            ScanEvent::WifiScanDone(summary) => {
                self.scanning = false;
                self.last = Some(*summary);
            }
            _ => {}
        }
    }
}

impl<const ROWS: usize> Default for WifiScanView<ROWS> {
    fn default() -> Self {
        Self::new()
    }
}
