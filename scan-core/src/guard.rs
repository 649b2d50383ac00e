//! Pre-flight memory check gating BLE scan start.
//!
//! The BLE stack allocates its controller state in a few large chunks and does
//! not recover from a partial initialization, so a scan is refused outright
//! when either the free heap or the largest contiguous block is too small.

use core::fmt;

/// Heap statistics for the allocator region used by the radio stack.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct HeapSnapshot {
    pub free_bytes: u32,
    pub largest_free_block: u32,
    /// Low-water mark since boot, when the allocator tracks it.
    pub min_free_bytes: Option<u32>,
}

impl HeapSnapshot {
    #[must_use]
    pub const fn new(free_bytes: u32, largest_free_block: u32) -> Self {
        Self {
            free_bytes,
            largest_free_block,
            min_free_bytes: None,
        }
    }
}

/// Source of heap statistics.
pub trait MemoryProbe {
    /// Reads the current heap state. Called once per scan-start attempt.
    fn snapshot(&self) -> HeapSnapshot;
}

/// Probe reporting a fixed snapshot; used by host builds and tests.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FixedMemoryProbe {
    snapshot: HeapSnapshot,
}

impl FixedMemoryProbe {
    #[must_use]
    pub const fn new(snapshot: HeapSnapshot) -> Self {
        Self { snapshot }
    }

    /// Probe that always satisfies the default thresholds.
    #[must_use]
    pub const fn plentiful() -> Self {
        Self::new(HeapSnapshot::new(256 * 1024, 128 * 1024))
    }

    /// Replaces the reported snapshot.
    pub fn set(&mut self, snapshot: HeapSnapshot) {
        self.snapshot = snapshot;
    }
}

impl MemoryProbe for FixedMemoryProbe {
    fn snapshot(&self) -> HeapSnapshot {
        self.snapshot
    }
}

impl<T: MemoryProbe + ?Sized> MemoryProbe for &T {
    fn snapshot(&self) -> HeapSnapshot {
        (**self).snapshot()
    }
}

/// Minimum heap levels required to start a BLE scan.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MemoryThresholds {
    pub min_free_bytes: u32,
    pub min_largest_block: u32,
}

impl MemoryThresholds {
    /// 70 KiB free and a 35 KiB contiguous block.
    pub const DEFAULT: Self = Self::new(70 * 1024, 35 * 1024);

    #[must_use]
    pub const fn new(min_free_bytes: u32, min_largest_block: u32) -> Self {
        Self {
            min_free_bytes,
            min_largest_block,
        }
    }
}

impl Default for MemoryThresholds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Reason a scan start was refused.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum GuardRejection {
    InsufficientFree { free_bytes: u32, required: u32 },
    Fragmented { largest_block: u32, required: u32 },
}

impl fmt::Display for GuardRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardRejection::InsufficientFree {
                free_bytes,
                required,
            } => write!(f, "free heap {free_bytes} B below {required} B"),
            GuardRejection::Fragmented {
                largest_block,
                required,
            } => write!(f, "largest block {largest_block} B below {required} B"),
        }
    }
}

/// Applies [`MemoryThresholds`] to snapshots read from a [`MemoryProbe`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ResourceGuard {
    thresholds: MemoryThresholds,
}

impl ResourceGuard {
    #[must_use]
    pub const fn new(thresholds: MemoryThresholds) -> Self {
        Self { thresholds }
    }

    #[must_use]
    pub const fn thresholds(&self) -> MemoryThresholds {
        self.thresholds
    }

    /// Evaluates a snapshot against the thresholds.
    ///
    /// # Errors
    ///
    /// Returns the first threshold the snapshot fails to meet.
    pub const fn evaluate(&self, snapshot: HeapSnapshot) -> Result<(), GuardRejection> {
        if snapshot.free_bytes < self.thresholds.min_free_bytes {
            return Err(GuardRejection::InsufficientFree {
                free_bytes: snapshot.free_bytes,
                required: self.thresholds.min_free_bytes,
            });
        }
        if snapshot.largest_free_block < self.thresholds.min_largest_block {
            return Err(GuardRejection::Fragmented {
                largest_block: snapshot.largest_free_block,
                required: self.thresholds.min_largest_block,
            });
        }
        Ok(())
    }

    /// Reads the probe once and evaluates the result.
    ///
    /// # Errors
    ///
    /// See [`ResourceGuard::evaluate`].
    pub fn check<P: MemoryProbe>(&self, probe: &P) -> Result<HeapSnapshot, GuardRejection> {
        let snapshot = probe.snapshot();
        self.evaluate(snapshot).map(|()| snapshot)
    }

    /// Boolean form of [`ResourceGuard::check`].
    pub fn check_ble_preconditions<P: MemoryProbe>(&self, probe: &P) -> bool {
        self.check(probe).is_ok()
    }
}

impl Default for ResourceGuard {
    fn default() -> Self {
        Self::new(MemoryThresholds::DEFAULT)
    }
}
