//! BLE run worker.
//!
//! The worker is the only unit that mutates the session and device ring while
//! a scan is running. The orchestrator talks to it through [`BleControl`]:
//! a start signal, a cancel signal that interrupts the burst in flight, and a
//! finished signal raised after the terminal event has been posted.

use embassy_futures::select::{Either3, select3};
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Timer};
use scan_core::ble::{BleScanMachine, BurstPlan, ScanOutcome};
use scan_core::config::ScanConfig;
use scan_core::messages::ScanEvent;

use crate::channels::{EventPort, ScanMutex};
use crate::log;
use crate::now_ms;
use crate::radio::{BleRadio, BurstReports};
use crate::status::ScanStatus;

/// Signals shared between the orchestrator and the BLE worker.
pub struct BleControl {
    start: Signal<ScanMutex, u32>,
    cancel: Signal<ScanMutex, ()>,
    finished: Signal<ScanMutex, ScanOutcome>,
}

impl BleControl {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            start: Signal::new(),
            cancel: Signal::new(),
            finished: Signal::new(),
        }
    }

    /// Arms a new session, clearing any stale cancel or finished state.
    pub(crate) fn request_start(&self, duration_ms: u32) {
        self.cancel.reset();
        self.finished.reset();
        self.start.signal(duration_ms);
    }

    pub(crate) fn request_cancel(&self) {
        self.cancel.signal(());
    }

    /// Resolves once the running session has posted its terminal event.
    pub(crate) async fn wait_finished(&self) -> ScanOutcome {
        self.finished.wait().await
    }
}

impl Default for BleControl {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs BLE sessions on request, one at a time.
pub struct BleScanWorker<'a, R: BleRadio> {
    radio: R,
    machine: BleScanMachine,
    control: &'a BleControl,
    events: EventPort<'a>,
    status: &'a ScanStatus,
}

impl<'a, R: BleRadio> BleScanWorker<'a, R> {
    #[must_use]
    pub fn new(
        radio: R,
        config: &ScanConfig,
        control: &'a BleControl,
        events: EventPort<'a>,
        status: &'a ScanStatus,
    ) -> Self {
        Self {
            radio,
            machine: BleScanMachine::new(config.burst_ms()),
            control,
            events,
            status,
        }
    }

    #[must_use]
    pub fn machine(&self) -> &BleScanMachine {
        &self.machine
    }

    #[must_use]
    pub fn radio(&self) -> &R {
        &self.radio
    }

    /// Waits for start requests and runs each session to its terminal event.
    pub async fn run(&mut self) -> ! {
        loop {
            let duration_ms = self.control.start.wait().await;
            self.run_session(duration_ms).await;
        }
    }

    /// Runs one session and returns the terminal event it posted.
    pub async fn run_session(&mut self, duration_ms: u32) -> Option<ScanEvent> {
        let started_at = now_ms();
        let start = self.machine.begin(started_at, duration_ms);
        if let Some(superseded) = start.superseded {
            self.events.post(superseded).await;
        }
        if let ScanEvent::BleScanStarted(summary) = &start.started {
            log::ble_started(summary.duration_ms, started_at);
        }
        self.events.post(start.started).await;

        let outcome = match self.radio.prepare().await {
            Ok(()) => self.scan_until_stopped().await,
            Err(error) => {
                log::ble_radio_error("prepare", error);
                ScanOutcome::Canceled
            }
        };

        self.finish(outcome).await
    }

    async fn scan_until_stopped(&mut self) -> ScanOutcome {
        let Some(deadline_ms) = self.machine.session().map(|session| session.stop_deadline_ms)
        else {
            return ScanOutcome::Canceled;
        };
        let deadline = Instant::from_millis(deadline_ms);
        let mut reports = BurstReports::new();

        loop {
            if self.control.cancel.try_take().is_some() {
                self.machine.request_cancel();
            }

            let window_ms = match self.machine.next_burst(now_ms()) {
                BurstPlan::Stop(outcome) => return outcome,
                BurstPlan::Scan { window_ms } => window_ms,
            };

            reports.clear();
            let burst = self
                .radio
                .scan_burst(Duration::from_millis(u64::from(window_ms)), &mut reports);
            // The deadline timer and a cancel request both cut a burst short.
            let result = match select3(burst, Timer::at(deadline), self.control.cancel.wait()).await
            {
                Either3::First(result) => result,
                Either3::Second(()) => Ok(()),
                Either3::Third(()) => {
                    self.machine.request_cancel();
                    Ok(())
                }
            };

            let now = now_ms();
            for device in &reports {
                if let Some(sighting) = self.machine.record(device, now) {
                    let _ = self.events.try_post(sighting.event);
                }
            }

            if let Err(error) = result {
                log::ble_radio_error("burst", error);
                return ScanOutcome::Canceled;
            }
        }
    }

    async fn finish(&mut self, outcome: ScanOutcome) -> Option<ScanEvent> {
        self.radio.stop();
        self.radio.clear_results();

        let terminal = match self.machine.finalize(now_ms(), outcome) {
            Ok(event) => Some(event),
            Err(_) => {
                log::ble_finalize_skipped();
                None
            }
        };

        if let Some(event) = &terminal {
            if let ScanEvent::BleScanCompleted(summary) | ScanEvent::BleScanCanceled(summary) =
                event
            {
                log::ble_finished(outcome.label(), summary.count, summary.duration_ms);
                self.status.record_duration(summary.duration_ms);
            }
            self.events.post(event.clone()).await;
        }

        self.status.set_ble_scanning(false);
        self.control.finished.signal(outcome);
        terminal
    }
}
