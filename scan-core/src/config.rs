//! Construction-time parameters for the scan orchestrator.

use crate::guard::MemoryThresholds;

/// Depth of the UI → orchestrator command queue.
pub const COMMAND_QUEUE_DEPTH: usize = 12;

/// Depth of the orchestrator → UI event queue. Sized for BLE discovery bursts.
pub const EVENT_QUEUE_DEPTH: usize = 96;

/// Unique BLE devices tracked per session.
pub const BLE_DEVICE_CAPACITY: usize = 16;

/// Distinct MACs remembered per session for the reported count. Must be a
/// power of two.
pub const SEEN_MAC_CAPACITY: usize = 256;

/// APs retained from a single WiFi scan cycle.
pub const MAX_WIFI_APS: usize = 32;

/// Reports a single radio burst may return.
pub const MAX_BURST_REPORTS: usize = 16;

/// Upper bound for a radio burst; also the worst-case cancellation latency.
pub const MAX_BURST_MS: u32 = 500;

/// Default interval the orchestrator waits for a command before housekeeping.
pub const DEFAULT_COMMAND_POLL_MS: u32 = 1_000;

/// Tunables injected when the orchestrator is built.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ScanConfig {
    burst_ms: u32,
    command_poll_ms: u32,
    memory: MemoryThresholds,
}

impl ScanConfig {
    /// Creates a configuration with default burst, poll, and memory settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            burst_ms: MAX_BURST_MS,
            command_poll_ms: DEFAULT_COMMAND_POLL_MS,
            memory: MemoryThresholds::DEFAULT,
        }
    }

    /// Overrides the burst length, clamped to `1..=MAX_BURST_MS`.
    #[must_use]
    pub const fn with_burst_ms(mut self, burst_ms: u32) -> Self {
        self.burst_ms = if burst_ms == 0 {
            1
        } else if burst_ms > MAX_BURST_MS {
            MAX_BURST_MS
        } else {
            burst_ms
        };
        self
    }

    /// Overrides the command poll interval (minimum 1 ms).
    #[must_use]
    pub const fn with_command_poll_ms(mut self, poll_ms: u32) -> Self {
        self.command_poll_ms = if poll_ms == 0 { 1 } else { poll_ms };
        self
    }

    /// Overrides the resource-guard thresholds.
    #[must_use]
    pub const fn with_memory_thresholds(mut self, memory: MemoryThresholds) -> Self {
        self.memory = memory;
        self
    }

    #[must_use]
    pub const fn burst_ms(&self) -> u32 {
        self.burst_ms
    }

    #[must_use]
    pub const fn command_poll_ms(&self) -> u32 {
        self.command_poll_ms
    }

    #[must_use]
    pub const fn memory(&self) -> MemoryThresholds {
        self.memory
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new()
    }
}
