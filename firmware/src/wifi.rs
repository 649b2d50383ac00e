//! WiFi scan adapter.
//!
//! Turns the radio's single scan-complete notice into one `WifiApFound` per
//! AP followed by a `WifiScanDone`. WiFi scans are not cancellable; a stop is
//! forwarded to the driver and the completion is still processed.

use scan_core::messages::ScanEvent;
use scan_core::wifi::{WifiScanTracker, WifiStartError};

use crate::channels::EventPort;
use crate::log;
use crate::now_ms;
use crate::radio::{WifiRadio, WifiResults};
use crate::status::ScanStatus;

pub struct WifiAdapter<'a, W: WifiRadio> {
    radio: W,
    tracker: WifiScanTracker,
    events: EventPort<'a>,
    status: &'a ScanStatus,
    results: WifiResults,
}

impl<'a, W: WifiRadio> WifiAdapter<'a, W> {
    #[must_use]
    pub fn new(radio: W, events: EventPort<'a>, status: &'a ScanStatus) -> Self {
        Self {
            radio,
            tracker: WifiScanTracker::new(),
            events,
            status,
            results: WifiResults::new(),
        }
    }

    #[must_use]
    pub fn in_progress(&self) -> bool {
        self.tracker.in_progress()
    }

    #[must_use]
    pub fn radio(&self) -> &W {
        &self.radio
    }

    /// Starts a scan unless one is already in flight.
    ///
    /// A driver that refuses to start still produces a `WifiScanDone` with no
    /// APs so the UI leaves its scanning state.
    pub async fn start(&mut self) {
        let now = now_ms();
        if let Err(WifiStartError::AlreadyScanning) = self.tracker.begin(now) {
            log::wifi_busy();
            return;
        }

        if let Err(error) = self.radio.start_scan() {
            log::wifi_radio_error("start", error);
            let done = self.tracker.complete(now_ms(), 0);
            self.events.post(done).await;
            return;
        }

        self.status.set_wifi_scanning(true);
        log::wifi_started();
    }

    /// Forwards a best-effort stop to the driver.
    pub fn stop(&mut self) {
        let in_progress = self.tracker.in_progress();
        log::wifi_stop(in_progress);
        if in_progress && let Err(error) = self.radio.stop_scan() {
            log::wifi_radio_error("stop", error);
        }
    }

    /// Waits for the driver's completion notice. Cancel-safe.
    pub async fn wait_complete(&mut self) {
        self.radio.scan_complete().await;
    }

    /// Drains the completed scan into the event queue.
    pub async fn on_complete(&mut self) {
        self.results.clear();
        self.radio.take_results(&mut self.results);

        let count = u16::try_from(self.results.len()).unwrap_or(u16::MAX);
        for ap in self.results.drain(..) {
            let _ = self.events.try_post(ScanEvent::WifiApFound(ap));
        }

        let done = self.tracker.complete(now_ms(), count);
        if let ScanEvent::WifiScanDone(summary) = &done {
            log::wifi_done(summary.count, summary.duration_ms);
            self.status.record_duration(summary.duration_ms);
        }
        self.events.post(done).await;

        self.radio.release_results();
        self.status.set_wifi_scanning(false);
    }
}
