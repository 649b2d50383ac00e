#![no_std]

// Scan orchestration logic shared by the handheld firmware and host tooling.
//
// Everything here is executor-agnostic and allocation-free: the runtime crate
// supplies clocks, channels, and radios, and this crate decides what happens.

pub mod ble;
pub mod config;
pub mod devices;
pub mod guard;
pub mod messages;
pub mod queue;
pub mod ui;
pub mod wifi;

pub use ble::{BleScanMachine, BleScanState, BurstPlan, FinalizeError, ScanOutcome};
pub use config::ScanConfig;
pub use guard::{GuardRejection, HeapSnapshot, MemoryProbe, MemoryThresholds, ResourceGuard};
pub use messages::{BleDevice, MacAddress, ScanCommand, ScanEvent, ScanSummary, WifiAp};
pub use queue::{QueueError, QueueProducer};
pub use wifi::{WifiScanTracker, WifiStartError};
