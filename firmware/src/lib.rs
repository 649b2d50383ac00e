#![cfg_attr(target_os = "none", no_std)]

//! Runtime shell for the handheld scanner.
//!
//! `scan-core` decides what happens; this crate binds it to Embassy channels,
//! timers, and radio drivers. The same code runs on the device and on the host
//! (tests and the emulator), with logging switched between `defmt` and
//! `println!`.

pub mod ble;
pub mod channels;
pub mod log;
pub mod orchestrator;
pub mod radio;
pub mod status;
pub mod ui;
pub mod wifi;

pub use ble::{BleControl, BleScanWorker};
pub use channels::{CommandPort, EventPort, ScanChannels, ScanMutex};
pub use orchestrator::{Dispatch, ScanOrchestrator};
pub use radio::{BleRadio, RadioError, WifiRadio};
pub use status::ScanStatus;
pub use ui::UiBridge;
pub use wifi::WifiAdapter;

/// Milliseconds on the Embassy monotonic clock.
pub(crate) fn now_ms() -> u64 {
    embassy_time::Instant::now().as_millis()
}
