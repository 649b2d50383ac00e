//! Messages exchanged between the UI task and the scan orchestrator.
//!
//! [`ScanCommand`] values travel from the UI to the orchestrator and
//! [`ScanEvent`] values travel back. Both are plain `Copy`-free value types
//! with fixed-capacity string storage so they can sit inside bounded
//! channels without touching the heap.

use core::fmt;

use heapless::String;

/// Maximum SSID length in bytes (802.11 limit).
pub const MAX_SSID_LEN: usize = 32;

/// Maximum advertised BLE device name retained per report.
pub const MAX_BLE_NAME_LEN: usize = 31;

/// Six-byte hardware address shared by WiFi BSSIDs and BLE MACs.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// Creates a MAC address from raw bytes.
    #[must_use]
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// Returns the raw address bytes.
    #[must_use]
    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(value: [u8; 6]) -> Self {
        Self(value)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

/// Requests posted by the UI task.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ScanCommand {
    WifiStart,
    WifiStop,
    BleStart { duration_ms: u32 },
    BleCancel,
}

impl ScanCommand {
    /// Short label used in log output.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            ScanCommand::WifiStart => "wifi-start",
            ScanCommand::WifiStop => "wifi-stop",
            ScanCommand::BleStart { .. } => "ble-start",
            ScanCommand::BleCancel => "ble-cancel",
        }
    }
}

/// Access point reported by a completed WiFi scan.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WifiAp {
    pub ssid: String<MAX_SSID_LEN>,
    pub rssi: i8,
    pub channel: u8,
    pub bssid: MacAddress,
}

impl WifiAp {
    /// Builds an AP record, truncating the SSID on a character boundary.
    #[must_use]
    pub fn new(ssid: &str, rssi: i8, channel: u8, bssid: MacAddress) -> Self {
        Self {
            ssid: truncated(ssid),
            rssi,
            channel,
            bssid,
        }
    }
}

/// BLE advertiser observed during a scan burst.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BleDevice {
    pub name: String<MAX_BLE_NAME_LEN>,
    pub mac: MacAddress,
    pub rssi: i8,
    pub flags: u32,
}

impl BleDevice {
    /// Builds a device record, truncating the name on a character boundary.
    #[must_use]
    pub fn new(name: &str, mac: MacAddress, rssi: i8, flags: u32) -> Self {
        Self {
            name: truncated(name),
            mac,
            rssi,
            flags,
        }
    }

    /// Returns the advertised name or `(unknown)` when none was received.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "(unknown)"
        } else {
            self.name.as_str()
        }
    }
}

/// Completion metadata shared across WiFi and BLE lifecycle events.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ScanSummary {
    /// Number of APs or unique devices reported during the scan.
    pub count: u16,
    /// Wall-clock duration of the scan.
    pub duration_ms: u32,
    /// Monotonic time at which the event was produced.
    pub timestamp_ms: u32,
}

impl ScanSummary {
    #[must_use]
    pub const fn new(count: u16, duration_ms: u32, timestamp_ms: u32) -> Self {
        Self {
            count,
            duration_ms,
            timestamp_ms,
        }
    }
}

/// Results posted by the orchestrator.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ScanEvent {
    WifiApFound(WifiAp),
    WifiScanDone(ScanSummary),
    /// First event of every BLE session. `count` is always zero.
    BleScanStarted(ScanSummary),
    BleDeviceFound(BleDevice),
    BleScanCompleted(ScanSummary),
    BleScanCanceled(ScanSummary),
    /// A BLE start was refused by the resource guard; no session exists.
    BleScanUnavailable { free_bytes: u32, largest_block: u32 },
}

impl ScanEvent {
    /// Returns `true` for the completed/canceled event that ends a BLE session.
    #[must_use]
    pub const fn is_ble_terminal(&self) -> bool {
        matches!(
            self,
            ScanEvent::BleScanCompleted(_) | ScanEvent::BleScanCanceled(_)
        )
    }

    /// Returns `true` for events that must not be dropped on a full queue.
    ///
    /// Per-item discoveries may be shed under back-pressure; lifecycle events
    /// drive UI state machines and are always delivered.
    #[must_use]
    pub const fn is_lifecycle(&self) -> bool {
        !matches!(
            self,
            ScanEvent::WifiApFound(_) | ScanEvent::BleDeviceFound(_)
        )
    }

    /// Short label used in log output.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            ScanEvent::WifiApFound(_) => "wifi-ap-found",
            ScanEvent::WifiScanDone(_) => "wifi-scan-done",
            ScanEvent::BleScanStarted(_) => "ble-scan-started",
            ScanEvent::BleDeviceFound(_) => "ble-device-found",
            ScanEvent::BleScanCompleted(_) => "ble-scan-completed",
            ScanEvent::BleScanCanceled(_) => "ble-scan-canceled",
            ScanEvent::BleScanUnavailable { .. } => "ble-scan-unavailable",
        }
    }
}

fn truncated<const N: usize>(value: &str) -> String<N> {
    let mut out = String::new();
    for ch in value.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}
