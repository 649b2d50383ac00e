//! WiFi scan cycle bookkeeping.
//!
//! A WiFi scan is a single asynchronous radio operation: start it, wait for
//! the driver's completion notice, then drain the AP list. The tracker only
//! enforces the one-scan-at-a-time rule and measures the cycle.

use core::fmt;

use crate::ble::timestamp;
use crate::messages::{ScanEvent, ScanSummary};

/// Reason a WiFi scan could not be started.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WifiStartError {
    /// A scan cycle is already in flight.
    AlreadyScanning,
}

impl fmt::Display for WifiStartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WifiStartError::AlreadyScanning => f.write_str("wifi scan already in progress"),
        }
    }
}

/// Tracks whether a WiFi scan is in flight and when it began.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct WifiScanTracker {
    started_at_ms: Option<u64>,
}

impl WifiScanTracker {
    #[must_use]
    pub const fn new() -> Self {
        Self { started_at_ms: None }
    }

    #[must_use]
    pub const fn in_progress(&self) -> bool {
        self.started_at_ms.is_some()
    }

    /// Marks a scan as started.
    ///
    /// # Errors
    ///
    /// Returns [`WifiStartError::AlreadyScanning`] when a cycle is in flight.
    pub fn begin(&mut self, now_ms: u64) -> Result<(), WifiStartError> {
        if self.in_progress() {
            return Err(WifiStartError::AlreadyScanning);
        }
        self.started_at_ms = Some(now_ms);
        Ok(())
    }

    /// Closes the cycle and builds its `WifiScanDone` event.
    ///
    /// Completion notices that arrive with no scan in flight (for example,
    /// after a stop) still produce an event with zero duration.
    pub fn complete(&mut self, now_ms: u64, count: u16) -> ScanEvent {
        let elapsed = self
            .started_at_ms
            .take()
            .map_or(0, |started| now_ms.saturating_sub(started));
        ScanEvent::WifiScanDone(ScanSummary::new(
            count,
            u32::try_from(elapsed).unwrap_or(u32::MAX),
            timestamp(now_ms),
        ))
    }
}
