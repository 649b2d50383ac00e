//! Simulated radio environment for the host emulator.

use embassy_time::{Duration, Instant, Timer};
use handheld_scanner::radio::{BleRadio, BurstReports, RadioError, WifiRadio, WifiResults};
use scan_core::guard::{FixedMemoryProbe, HeapSnapshot};
use scan_core::messages::{BleDevice, MacAddress, WifiAp};

const BEACON_NAMES: &[&str] = &[
    "Pixel Buds",
    "MX Keys",
    "Tile",
    "Forerunner 255",
    "Hue Bridge",
    "Galaxy Watch",
    "Thermo Hygro",
    "LE-Bose QC45",
    "iPhone",
    "Nordic_UART",
];

const ACCESS_POINTS: &[(&str, i8, u8)] = &[
    ("workshop", -38, 6),
    ("workshop-guest", -41, 6),
    ("DIRECT-7f-Printer", -63, 11),
    ("", -70, 1),
    ("xfinitywifi", -74, 1),
    ("Neighbor 5G", -79, 36),
    ("SKY8A21F", -83, 11),
    ("eduroam", -88, 149),
];

/// Canned radio surroundings selected on the command line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Profile {
    /// A handful of slow advertisers and two APs.
    Quiet,
    /// More advertisers than the device ring holds.
    Busy,
    /// Heap below the BLE start thresholds.
    LowMemory,
}

impl Profile {
    pub const ALL: [Profile; 3] = [Profile::Quiet, Profile::Busy, Profile::LowMemory];

    pub fn from_tag(tag: &str) -> Result<Self, String> {
        Profile::ALL
            .into_iter()
            .find(|profile| profile.tag().eq_ignore_ascii_case(tag))
            .ok_or_else(|| format!("Unknown environment profile `{tag}`"))
    }

    pub fn tag(self) -> &'static str {
        match self {
            Profile::Quiet => "quiet",
            Profile::Busy => "busy",
            Profile::LowMemory => "low-memory",
        }
    }

    pub fn ble_radio(self) -> SimBleRadio {
        let count = match self {
            Profile::Quiet => 3,
            Profile::Busy | Profile::LowMemory => 20,
        };
        SimBleRadio::new((0..count).map(Beacon::numbered).collect())
    }

    pub fn wifi_radio(self) -> SimWifiRadio {
        let count = match self {
            Profile::Quiet => 2,
            Profile::Busy | Profile::LowMemory => ACCESS_POINTS.len(),
        };
        SimWifiRadio::new(&ACCESS_POINTS[..count])
    }

    pub fn heap_probe(self) -> FixedMemoryProbe {
        match self {
            Profile::LowMemory => FixedMemoryProbe::new(HeapSnapshot::new(48 * 1024, 22 * 1024)),
            Profile::Quiet | Profile::Busy => FixedMemoryProbe::plentiful(),
        }
    }
}

/// Periodic advertiser.
#[derive(Clone, Debug)]
pub struct Beacon {
    name: &'static str,
    mac: MacAddress,
    rssi: i8,
    interval_ms: u64,
    phase_ms: u64,
}

impl Beacon {
    fn numbered(index: u8) -> Self {
        let slot = usize::from(index);
        // Every third advertiser past the named ones stays anonymous.
        let name = BEACON_NAMES
            .get(slot)
            .copied()
            .unwrap_or(if slot % 3 == 0 { "" } else { "BLE Tag" });
        Self {
            name,
            mac: MacAddress::new([0xC0, 0xFF, 0xEE, 0x00, 0x10, index]),
            rssi: -45 - i8::try_from(index * 2).unwrap_or(40),
            interval_ms: 180 + u64::from(index) * 97,
            phase_ms: u64::from(index) * 41,
        }
    }

    /// Returns `true` if an advertisement falls inside `[start_ms, end_ms)`.
    fn advertises_within(&self, start_ms: u64, end_ms: u64) -> bool {
        let first = if start_ms <= self.phase_ms {
            self.phase_ms
        } else {
            let periods = (start_ms - self.phase_ms).div_ceil(self.interval_ms);
            self.phase_ms + periods * self.interval_ms
        };
        first < end_ms
    }
}

/// BLE observer that reports whichever beacons advertised during each burst.
pub struct SimBleRadio {
    beacons: Vec<Beacon>,
    origin: Instant,
    cursor_ms: u64,
    jitter: u32,
}

impl SimBleRadio {
    pub fn new(beacons: Vec<Beacon>) -> Self {
        Self {
            beacons,
            origin: Instant::now(),
            cursor_ms: 0,
            jitter: 0x2545_F491,
        }
    }

    fn next_jitter(&mut self) -> i8 {
        self.jitter = self.jitter.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let offset = (self.jitter >> 16) % 7;
        i8::try_from(offset).unwrap_or(0) - 3
    }
}

impl BleRadio for SimBleRadio {
    async fn prepare(&mut self) -> Result<(), RadioError> {
        self.origin = Instant::now();
        self.cursor_ms = 0;
        Ok(())
    }

    async fn scan_burst(
        &mut self,
        window: Duration,
        reports: &mut BurstReports,
    ) -> Result<(), RadioError> {
        Timer::after(window).await;
        let end_ms = self.origin.elapsed().as_millis();
        let start_ms = self.cursor_ms;
        self.cursor_ms = end_ms;

        let heard: Vec<Beacon> = self
            .beacons
            .iter()
            .filter(|beacon| beacon.advertises_within(start_ms, end_ms))
            .cloned()
            .collect();
        for beacon in heard {
            let rssi = beacon.rssi.saturating_add(self.next_jitter());
            if reports
                .push(BleDevice::new(beacon.name, beacon.mac, rssi, 0x06))
                .is_err()
            {
                break;
            }
        }
        Ok(())
    }

    fn stop(&mut self) {}

    fn clear_results(&mut self) {}
}

/// WiFi scanner whose cycle completes a fixed time after it starts.
pub struct SimWifiRadio {
    aps: Vec<WifiAp>,
    scan_time: Duration,
    ready_at: Option<Instant>,
}

impl SimWifiRadio {
    fn new(table: &[(&str, i8, u8)]) -> Self {
        let aps = table
            .iter()
            .zip(0u8..)
            .map(|(&(ssid, rssi, channel), index)| {
                WifiAp::new(
                    ssid,
                    rssi,
                    channel,
                    MacAddress::new([0x3C, 0x84, 0x6A, 0x00, 0x20, index]),
                )
            })
            .collect();
        Self {
            aps,
            scan_time: Duration::from_millis(1_500),
            ready_at: None,
        }
    }
}

impl WifiRadio for SimWifiRadio {
    fn start_scan(&mut self) -> Result<(), RadioError> {
        if self.ready_at.is_some() {
            return Err(RadioError::Busy);
        }
        self.ready_at = Some(Instant::now() + self.scan_time);
        Ok(())
    }

    fn stop_scan(&mut self) -> Result<(), RadioError> {
        // The simulated driver finishes the cycle regardless.
        Ok(())
    }

    async fn scan_complete(&mut self) {
        match self.ready_at {
            Some(at) => {
                Timer::at(at).await;
                self.ready_at = None;
            }
            None => core::future::pending::<()>().await,
        }
    }

    fn take_results(&mut self, out: &mut WifiResults) {
        for ap in &self.aps {
            if out.push(ap.clone()).is_err() {
                break;
            }
        }
    }

    fn release_results(&mut self) {}
}
