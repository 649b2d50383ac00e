//! Log sites for the scan runtime.
//!
//! Each message has a `defmt` form for the device and a `println!` form for
//! host builds.

use scan_core::guard::{GuardRejection, HeapSnapshot};

use crate::radio::RadioError;

#[cfg(target_os = "none")]
pub fn command_dropped(label: &str) {
    defmt::warn!("scan: command queue full, dropped {=str}", label);
}

#[cfg(not(target_os = "none"))]
pub fn command_dropped(label: &str) {
    println!("scan: command queue full, dropped {label}");
}

#[cfg(target_os = "none")]
pub fn event_dropped(label: &str) {
    defmt::warn!("scan: event queue full, dropped {=str}", label);
}

#[cfg(not(target_os = "none"))]
pub fn event_dropped(label: &str) {
    println!("scan: event queue full, dropped {label}");
}

#[cfg(target_os = "none")]
pub fn command_received(label: &str) {
    defmt::debug!("scan: command {=str}", label);
}

#[cfg(not(target_os = "none"))]
pub fn command_received(label: &str) {
    println!("scan: command {label}");
}

#[cfg(target_os = "none")]
pub fn ble_started(duration_ms: u32, at_ms: u64) {
    defmt::info!("ble: scan started duration={=u32}ms t={=u64}ms", duration_ms, at_ms);
}

#[cfg(not(target_os = "none"))]
pub fn ble_started(duration_ms: u32, at_ms: u64) {
    println!("ble: scan started duration={duration_ms}ms t={at_ms}ms");
}

#[cfg(target_os = "none")]
pub fn ble_finished(outcome: &str, count: u16, elapsed_ms: u32) {
    defmt::info!(
        "ble: scan {=str} devices={=u16} elapsed={=u32}ms",
        outcome,
        count,
        elapsed_ms
    );
}

#[cfg(not(target_os = "none"))]
pub fn ble_finished(outcome: &str, count: u16, elapsed_ms: u32) {
    println!("ble: scan {outcome} devices={count} elapsed={elapsed_ms}ms");
}

#[cfg(target_os = "none")]
pub fn ble_restart() {
    defmt::info!("ble: start while scanning, canceling current session");
}

#[cfg(not(target_os = "none"))]
pub fn ble_restart() {
    println!("ble: start while scanning, canceling current session");
}

#[cfg(target_os = "none")]
pub fn ble_cancel_requested() {
    defmt::info!("ble: cancel requested");
}

#[cfg(not(target_os = "none"))]
pub fn ble_cancel_requested() {
    println!("ble: cancel requested");
}

#[cfg(target_os = "none")]
pub fn ble_cancel_idle() {
    defmt::info!("ble: cancel ignored, no active scan");
}

#[cfg(not(target_os = "none"))]
pub fn ble_cancel_idle() {
    println!("ble: cancel ignored, no active scan");
}

#[cfg(target_os = "none")]
pub fn ble_finalize_skipped() {
    defmt::warn!("ble: finalize skipped, session already closed");
}

#[cfg(not(target_os = "none"))]
pub fn ble_finalize_skipped() {
    println!("ble: finalize skipped, session already closed");
}

#[cfg(target_os = "none")]
pub fn ble_radio_error(stage: &str, error: RadioError) {
    match error {
        RadioError::Driver(code) => {
            defmt::error!("ble: radio {=str} failed code={=i32}", stage, code);
        }
        other => defmt::error!("ble: radio {=str} failed: {=str}", stage, other.label()),
    }
}

#[cfg(not(target_os = "none"))]
pub fn ble_radio_error(stage: &str, error: RadioError) {
    println!("ble: radio {stage} failed: {error}");
}

#[cfg(target_os = "none")]
pub fn guard_rejected(snapshot: HeapSnapshot, rejection: GuardRejection) {
    match rejection {
        GuardRejection::InsufficientFree { required, .. } => defmt::warn!(
            "guard: BLE start refused, free={=u32}B < {=u32}B",
            snapshot.free_bytes,
            required
        ),
        GuardRejection::Fragmented { required, .. } => defmt::warn!(
            "guard: BLE start refused, largest block={=u32}B < {=u32}B",
            snapshot.largest_free_block,
            required
        ),
    }
}

#[cfg(not(target_os = "none"))]
pub fn guard_rejected(snapshot: HeapSnapshot, rejection: GuardRejection) {
    println!(
        "guard: BLE start refused ({rejection}) free={}B largest={}B",
        snapshot.free_bytes, snapshot.largest_free_block
    );
}

#[cfg(target_os = "none")]
pub fn wifi_started() {
    defmt::info!("wifi: scan started");
}

#[cfg(not(target_os = "none"))]
pub fn wifi_started() {
    println!("wifi: scan started");
}

#[cfg(target_os = "none")]
pub fn wifi_busy() {
    defmt::info!("wifi: start ignored, scan already in progress");
}

#[cfg(not(target_os = "none"))]
pub fn wifi_busy() {
    println!("wifi: start ignored, scan already in progress");
}

#[cfg(target_os = "none")]
pub fn wifi_stop(in_progress: bool) {
    if in_progress {
        defmt::info!("wifi: stop requested, completion may still arrive");
    } else {
        defmt::info!("wifi: stop ignored, no scan in progress");
    }
}

#[cfg(not(target_os = "none"))]
pub fn wifi_stop(in_progress: bool) {
    if in_progress {
        println!("wifi: stop requested, completion may still arrive");
    } else {
        println!("wifi: stop ignored, no scan in progress");
    }
}

#[cfg(target_os = "none")]
pub fn wifi_radio_error(stage: &str, error: RadioError) {
    match error {
        RadioError::Driver(code) => {
            defmt::error!("wifi: radio {=str} failed code={=i32}", stage, code);
        }
        other => defmt::error!("wifi: radio {=str} failed: {=str}", stage, other.label()),
    }
}

#[cfg(not(target_os = "none"))]
pub fn wifi_radio_error(stage: &str, error: RadioError) {
    println!("wifi: radio {stage} failed: {error}");
}

#[cfg(target_os = "none")]
pub fn wifi_done(count: u16, duration_ms: u32) {
    defmt::info!("wifi: scan done aps={=u16} elapsed={=u32}ms", count, duration_ms);
}

#[cfg(not(target_os = "none"))]
pub fn wifi_done(count: u16, duration_ms: u32) {
    println!("wifi: scan done aps={count} elapsed={duration_ms}ms");
}

#[cfg(target_os = "none")]
pub fn ui_request_dropped(label: &str) {
    defmt::warn!("ui: {=str} not sent, command queue full", label);
}

#[cfg(not(target_os = "none"))]
pub fn ui_request_dropped(label: &str) {
    println!("ui: {label} not sent, command queue full");
}
