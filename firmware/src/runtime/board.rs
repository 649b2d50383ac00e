//! Board bindings for the radio and heap seams.
//!
//! This board has no radio driver linked in. The stand-ins below fail every
//! scan attempt cleanly, so BLE sessions end with `BleScanCanceled{count: 0}`
//! and WiFi requests end with an empty `WifiScanDone`.

use embassy_time::Duration;
use handheld_scanner::radio::{BleRadio, BurstReports, RadioError, WifiRadio, WifiResults};
use scan_core::guard::{FixedMemoryProbe, HeapSnapshot};

/// RAM reserved for the radio stack's allocator region.
const RADIO_REGION_BYTES: u32 = 96 * 1024;

pub fn heap_probe() -> FixedMemoryProbe {
    FixedMemoryProbe::new(HeapSnapshot::new(RADIO_REGION_BYTES, RADIO_REGION_BYTES))
}

#[derive(Default)]
pub struct BoardBle;

impl BoardBle {
    pub const fn new() -> Self {
        Self
    }
}

impl BleRadio for BoardBle {
    async fn prepare(&mut self) -> Result<(), RadioError> {
        Err(RadioError::Unavailable)
    }

    async fn scan_burst(&mut self, _: Duration, _: &mut BurstReports) -> Result<(), RadioError> {
        Err(RadioError::Unavailable)
    }

    fn stop(&mut self) {}

    fn clear_results(&mut self) {}
}

#[derive(Default)]
pub struct BoardWifi;

impl BoardWifi {
    pub const fn new() -> Self {
        Self
    }
}

impl WifiRadio for BoardWifi {
    fn start_scan(&mut self) -> Result<(), RadioError> {
        Err(RadioError::Unavailable)
    }

    fn stop_scan(&mut self) -> Result<(), RadioError> {
        Ok(())
    }

    async fn scan_complete(&mut self) {
        core::future::pending::<()>().await;
    }

    fn take_results(&mut self, _: &mut WifiResults) {}

    fn release_results(&mut self) {}
}
