//! Radio primitives the scan runtime depends on.
//!
//! Drivers implement these traits; the orchestrator and BLE worker never touch
//! vendor APIs directly.

#![allow(async_fn_in_trait)]

use core::fmt;

use embassy_time::Duration;
use heapless::Vec;
use scan_core::config::{MAX_BURST_REPORTS, MAX_WIFI_APS};
use scan_core::messages::{BleDevice, WifiAp};

/// Reports collected during one BLE burst.
pub type BurstReports = Vec<BleDevice, MAX_BURST_REPORTS>;

/// APs drained from one completed WiFi scan.
pub type WifiResults = Vec<WifiAp, MAX_WIFI_APS>;

/// Failure reported by a radio primitive.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RadioError {
    /// The driver or scan handle could not be created.
    Unavailable,
    /// The radio is servicing another operation.
    Busy,
    /// Vendor error code.
    Driver(i32),
}

impl RadioError {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            RadioError::Unavailable => "unavailable",
            RadioError::Busy => "busy",
            RadioError::Driver(_) => "driver",
        }
    }
}

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RadioError::Driver(code) => write!(f, "driver error {code}"),
            other => f.write_str(other.label()),
        }
    }
}

/// Burst-callable BLE observer.
pub trait BleRadio {
    /// Acquires the scan handle. Called once per session before the first burst.
    async fn prepare(&mut self) -> Result<(), RadioError>;

    /// Scans for at most `window`, appending reports to `reports`.
    ///
    /// The future may be dropped mid-burst when the session deadline fires;
    /// reports pushed before that point are still processed.
    async fn scan_burst(
        &mut self,
        window: Duration,
        reports: &mut BurstReports,
    ) -> Result<(), RadioError>;

    /// Stops any scan still running in the controller.
    fn stop(&mut self);

    /// Drops the controller's cached advertisement results.
    fn clear_results(&mut self);
}

/// Asynchronous WiFi scanner.
pub trait WifiRadio {
    /// Kicks off a scan; completion is reported through [`WifiRadio::scan_complete`].
    fn start_scan(&mut self) -> Result<(), RadioError>;

    /// Best-effort stop. The driver may still deliver a completion afterwards.
    fn stop_scan(&mut self) -> Result<(), RadioError>;

    /// Resolves when the driver signals scan completion. Must be cancel-safe.
    async fn scan_complete(&mut self);

    /// Moves the discovered APs into `out`.
    fn take_results(&mut self, out: &mut WifiResults);

    /// Frees the driver's result cache.
    fn release_results(&mut self);
}

impl<T: BleRadio + ?Sized> BleRadio for &mut T {
    async fn prepare(&mut self) -> Result<(), RadioError> {
        (**self).prepare().await
    }

    async fn scan_burst(
        &mut self,
        window: Duration,
        reports: &mut BurstReports,
    ) -> Result<(), RadioError> {
        (**self).scan_burst(window, reports).await
    }

    fn stop(&mut self) {
        (**self).stop();
    }

    fn clear_results(&mut self) {
        (**self).clear_results();
    }
}

impl<T: WifiRadio + ?Sized> WifiRadio for &mut T {
    fn start_scan(&mut self) -> Result<(), RadioError> {
        (**self).start_scan()
    }

    fn stop_scan(&mut self) -> Result<(), RadioError> {
        (**self).stop_scan()
    }

    async fn scan_complete(&mut self) {
        (**self).scan_complete().await;
    }

    fn take_results(&mut self, out: &mut WifiResults) {
        (**self).take_results(out);
    }

    fn release_results(&mut self) {
        (**self).release_results();
    }
}
