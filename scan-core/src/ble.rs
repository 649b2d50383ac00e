//! BLE scan session state machine.
//!
//! [`BleScanMachine`] owns the session bookkeeping and the device ring. It is
//! executor-agnostic: the runtime feeds it timestamps, radio reports and
//! cancellation requests, and forwards the [`ScanEvent`]s it returns. The
//! machine guarantees that a session opens with `BleScanStarted` and closes
//! with exactly one `BleScanCompleted` or `BleScanCanceled`.

use core::fmt;

use heapless::index_set::FnvIndexSet;

use crate::config::{BLE_DEVICE_CAPACITY, MAX_BURST_MS, SEEN_MAC_CAPACITY};
use crate::devices::{DeviceRing, Upsert};
use crate::messages::{BleDevice, MacAddress, ScanEvent, ScanSummary};

/// How a session ended.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ScanOutcome {
    Completed,
    Canceled,
}

impl ScanOutcome {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            ScanOutcome::Completed => "completed",
            ScanOutcome::Canceled => "canceled",
        }
    }
}

/// Lifecycle phases of the BLE scanner.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BleScanState {
    Idle,
    Scanning,
    Finalizing(ScanOutcome),
}

impl BleScanState {
    /// Returns `true` while a session exists.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, BleScanState::Idle)
    }
}

/// Errors returned when finalizing.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FinalizeError {
    /// No session is active; a terminal event was already emitted.
    NotActive,
}

impl fmt::Display for FinalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinalizeError::NotActive => f.write_str("no active BLE session"),
        }
    }
}

/// Bookkeeping for the single active session.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ScanSession {
    pub started_at_ms: u64,
    pub requested_duration_ms: u32,
    pub stop_deadline_ms: u64,
    pub reported_count: u16,
    pub cancel_requested: bool,
}

impl ScanSession {
    /// Milliseconds left before the deadline at `now_ms`.
    #[must_use]
    pub const fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.stop_deadline_ms.saturating_sub(now_ms)
    }
}

/// What the run unit should do next.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BurstPlan {
    /// Issue a radio burst no longer than `window_ms`.
    Scan { window_ms: u32 },
    /// Stop scanning and finalize with the given outcome.
    Stop(ScanOutcome),
}

/// Events produced when a session begins.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionStart {
    /// Terminal event for a session that was still running, if any.
    pub superseded: Option<ScanEvent>,
    pub started: ScanEvent,
}

/// Result of processing one device report.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Sighting {
    pub upsert: Upsert,
    pub event: ScanEvent,
}

/// BLE session state machine with its authoritative device ring.
///
/// The ring only holds the newest `CAPACITY` devices. Uniqueness for the
/// reported count is tracked separately, so a device that was evicted and
/// heard again is not counted twice.
#[derive(Clone, Debug)]
pub struct BleScanMachine<const CAPACITY: usize = BLE_DEVICE_CAPACITY> {
    state: BleScanState,
    session: Option<ScanSession>,
    devices: DeviceRing<CAPACITY>,
    seen: FnvIndexSet<MacAddress, SEEN_MAC_CAPACITY>,
    burst_ms: u32,
}

impl<const CAPACITY: usize> BleScanMachine<CAPACITY> {
    /// Creates an idle machine slicing scans into bursts of `burst_ms`.
    #[must_use]
    pub const fn new(burst_ms: u32) -> Self {
        let burst_ms = if burst_ms == 0 {
            1
        } else if burst_ms > MAX_BURST_MS {
            MAX_BURST_MS
        } else {
            burst_ms
        };
        Self {
            state: BleScanState::Idle,
            session: None,
            devices: DeviceRing::new(),
            seen: FnvIndexSet::new(),
            burst_ms,
        }
    }

    #[must_use]
    pub const fn state(&self) -> BleScanState {
        self.state
    }

    #[must_use]
    pub const fn is_scanning(&self) -> bool {
        self.state.is_active()
    }

    #[must_use]
    pub const fn session(&self) -> Option<&ScanSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub const fn devices(&self) -> &DeviceRing<CAPACITY> {
        &self.devices
    }

    #[must_use]
    pub const fn burst_ms(&self) -> u32 {
        self.burst_ms
    }

    /// Duration actually used for a request; zero is raised to one burst.
    #[must_use]
    pub const fn effective_duration_ms(&self, requested_ms: u32) -> u32 {
        if requested_ms == 0 {
            self.burst_ms
        } else {
            requested_ms
        }
    }

    /// Opens a new session, force-canceling any session still running.
    pub fn begin(&mut self, now_ms: u64, duration_ms: u32) -> SessionStart {
        let superseded = self.finalize(now_ms, ScanOutcome::Canceled).ok();

        let duration_ms = self.effective_duration_ms(duration_ms);
        self.devices.reset();
        self.seen.clear();
        self.session = Some(ScanSession {
            started_at_ms: now_ms,
            requested_duration_ms: duration_ms,
            stop_deadline_ms: now_ms.saturating_add(u64::from(duration_ms)),
            reported_count: 0,
            cancel_requested: false,
        });
        self.state = BleScanState::Scanning;

        SessionStart {
            superseded,
            started: ScanEvent::BleScanStarted(ScanSummary::new(
                0,
                duration_ms,
                timestamp(now_ms),
            )),
        }
    }

    /// Flags the active session for cancellation.
    ///
    /// Returns `false` when no session is scanning; the request is then a no-op.
    pub fn request_cancel(&mut self) -> bool {
        match (self.state, self.session.as_mut()) {
            (BleScanState::Scanning, Some(session)) => {
                session.cancel_requested = true;
                true
            }
            _ => false,
        }
    }

    /// Decides whether to run another burst at `now_ms`.
    ///
    /// The window never extends past the session deadline, so a session that
    /// is never canceled stops within one burst of its requested duration.
    #[must_use]
    pub fn next_burst(&self, now_ms: u64) -> BurstPlan {
        let session = match (self.state, self.session.as_ref()) {
            (BleScanState::Scanning, Some(session)) => session,
            (BleScanState::Finalizing(outcome), _) => return BurstPlan::Stop(outcome),
            _ => return BurstPlan::Stop(ScanOutcome::Canceled),
        };

        if session.cancel_requested {
            return BurstPlan::Stop(ScanOutcome::Canceled);
        }

        let remaining = session.remaining_ms(now_ms);
        if remaining == 0 {
            return BurstPlan::Stop(ScanOutcome::Completed);
        }

        let window_ms = u32::try_from(remaining)
            .unwrap_or(u32::MAX)
            .min(self.burst_ms);
        BurstPlan::Scan { window_ms }
    }

    /// Deduplicates a report against the ring and builds its event.
    ///
    /// Only the first sighting of a MAC in the session increments the
    /// reported count, even if the ring has since evicted it. Returns `None`
    /// when no session is scanning.
    pub fn record(&mut self, device: &BleDevice, now_ms: u64) -> Option<Sighting> {
        if self.state != BleScanState::Scanning {
            return None;
        }
        let session = self.session.as_mut()?;

        let upsert = self.devices.upsert(device, now_ms);
        let first_sighting = match self.seen.insert(device.mac) {
            Ok(inserted) => inserted,
            // Set is full: fall back to ring membership.
            Err(_) => upsert.is_new(),
        };
        if first_sighting {
            session.reported_count = session.reported_count.saturating_add(1);
        }

        let event = match self.devices.get(upsert.handle()) {
            Some(entry) => ScanEvent::BleDeviceFound(entry.device.clone()),
            None => ScanEvent::BleDeviceFound(device.clone()),
        };

        Some(Sighting { upsert, event })
    }

    /// Moves the session into `Finalizing`, fixing its outcome.
    ///
    /// # Errors
    ///
    /// Returns [`FinalizeError::NotActive`] when idle. A session that is
    /// already finalizing keeps its original outcome.
    pub fn enter_finalizing(&mut self, outcome: ScanOutcome) -> Result<ScanOutcome, FinalizeError> {
        match self.state {
            BleScanState::Idle => Err(FinalizeError::NotActive),
            BleScanState::Finalizing(existing) => Ok(existing),
            BleScanState::Scanning => {
                self.state = BleScanState::Finalizing(outcome);
                Ok(outcome)
            }
        }
    }

    /// Ends the session and returns its terminal event.
    ///
    /// `outcome` applies only when the session has not already entered
    /// `Finalizing`.
    ///
    /// # Errors
    ///
    /// Returns [`FinalizeError::NotActive`] when there is no session, which
    /// makes repeated calls harmless.
    pub fn finalize(&mut self, now_ms: u64, outcome: ScanOutcome) -> Result<ScanEvent, FinalizeError> {
        let outcome = self.enter_finalizing(outcome)?;
        let session = self.session.take().ok_or(FinalizeError::NotActive)?;
        self.state = BleScanState::Idle;

        let elapsed = now_ms.saturating_sub(session.started_at_ms);
        let summary = ScanSummary::new(
            session.reported_count,
            u32::try_from(elapsed).unwrap_or(u32::MAX),
            timestamp(now_ms),
        );

        Ok(match outcome {
            ScanOutcome::Completed => ScanEvent::BleScanCompleted(summary),
            ScanOutcome::Canceled => ScanEvent::BleScanCanceled(summary),
        })
    }
}

impl<const CAPACITY: usize> Default for BleScanMachine<CAPACITY> {
    fn default() -> Self {
        Self::new(MAX_BURST_MS)
    }
}

/// Truncates a monotonic millisecond clock to the 32-bit event timestamp.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn timestamp(now_ms: u64) -> u32 {
    (now_ms & 0xFFFF_FFFF) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::MacAddress;

    fn report(last: u8, rssi: i8) -> BleDevice {
        BleDevice::new("tag", MacAddress::new([0xC0, 0, 0, 0, 0, last]), rssi, 0)
    }

    #[test]
    fn begin_emits_started_with_requested_duration() {
        let mut machine: BleScanMachine = BleScanMachine::new(500);
        let start = machine.begin(1_000, 10_000);

        assert!(start.superseded.is_none());
        assert_eq!(
            start.started,
            ScanEvent::BleScanStarted(ScanSummary::new(0, 10_000, 1_000))
        );
        assert_eq!(machine.state(), BleScanState::Scanning);
        assert_eq!(machine.session().unwrap().stop_deadline_ms, 11_000);
    }

    #[test]
    fn zero_duration_is_raised_to_one_burst() {
        let mut machine: BleScanMachine = BleScanMachine::new(250);
        machine.begin(0, 0);
        assert_eq!(machine.session().unwrap().requested_duration_ms, 250);
        assert_eq!(machine.next_burst(0), BurstPlan::Scan { window_ms: 250 });
    }

    #[test]
    fn bursts_are_trimmed_to_the_deadline() {
        let mut machine: BleScanMachine = BleScanMachine::new(500);
        machine.begin(0, 1_200);
        assert_eq!(machine.next_burst(0), BurstPlan::Scan { window_ms: 500 });
        assert_eq!(machine.next_burst(1_000), BurstPlan::Scan { window_ms: 200 });
        assert_eq!(machine.next_burst(1_200), BurstPlan::Stop(ScanOutcome::Completed));
    }

    #[test]
    fn cancel_wins_over_remaining_time() {
        let mut machine: BleScanMachine = BleScanMachine::new(500);
        machine.begin(0, 30_000);
        assert!(machine.request_cancel());
        assert_eq!(machine.next_burst(2_000), BurstPlan::Stop(ScanOutcome::Canceled));
    }

    #[test]
    fn cancel_while_idle_is_a_no_op() {
        let mut machine: BleScanMachine = BleScanMachine::new(500);
        assert!(!machine.request_cancel());
        assert_eq!(machine.state(), BleScanState::Idle);
    }

    #[test]
    fn repeat_mac_counts_once() {
        let mut machine: BleScanMachine = BleScanMachine::new(500);
        machine.begin(0, 5_000);
        for (index, rssi) in [-90, -70, -50, -65].into_iter().enumerate() {
            let sighting = machine
                .record(&report(1, rssi), index as u64 * 100)
                .expect("session should accept reports");
            assert!(matches!(sighting.event, ScanEvent::BleDeviceFound(ref d) if d.rssi == rssi));
        }

        assert_eq!(machine.devices().len(), 1);
        let terminal = machine.finalize(5_000, ScanOutcome::Completed).unwrap();
        assert_eq!(
            terminal,
            ScanEvent::BleScanCompleted(ScanSummary::new(1, 5_000, 5_000))
        );
    }

    #[test]
    fn evicted_mac_is_not_counted_twice() {
        let mut machine: BleScanMachine<2> = BleScanMachine::new(500);
        machine.begin(0, 5_000);
        for (at, last) in [(0, 1), (10, 2), (20, 3), (30, 1), (40, 2)] {
            machine.record(&report(last, -50), at).expect("scanning");
        }

        assert_eq!(machine.devices().len(), 2);
        assert_eq!(machine.session().unwrap().reported_count, 3);
    }

    #[test]
    fn finalize_is_idempotent() {
        let mut machine: BleScanMachine = BleScanMachine::new(500);
        machine.begin(0, 1_000);
        assert!(machine.finalize(300, ScanOutcome::Canceled).is_ok());
        assert_eq!(
            machine.finalize(310, ScanOutcome::Canceled),
            Err(FinalizeError::NotActive)
        );
    }

    #[test]
    fn finalizing_outcome_is_sticky() {
        let mut machine: BleScanMachine = BleScanMachine::new(500);
        machine.begin(0, 1_000);
        machine.enter_finalizing(ScanOutcome::Canceled).unwrap();
        let terminal = machine.finalize(400, ScanOutcome::Completed).unwrap();
        assert!(matches!(terminal, ScanEvent::BleScanCanceled(_)));
    }

    #[test]
    fn begin_while_scanning_cancels_previous_session() {
        let mut machine: BleScanMachine = BleScanMachine::new(500);
        machine.begin(0, 10_000);
        machine.record(&report(1, -60), 100);

        let start = machine.begin(2_000, 20_000);
        assert_eq!(
            start.superseded,
            Some(ScanEvent::BleScanCanceled(ScanSummary::new(1, 2_000, 2_000)))
        );
        assert!(matches!(start.started, ScanEvent::BleScanStarted(_)));
        assert!(machine.devices().is_empty());
        assert_eq!(machine.session().unwrap().reported_count, 0);
    }

    #[test]
    fn reports_outside_a_session_are_ignored() {
        let mut machine: BleScanMachine = BleScanMachine::new(500);
        assert!(machine.record(&report(1, -60), 0).is_none());
    }
}
