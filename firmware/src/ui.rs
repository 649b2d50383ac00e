//! Display-task side of the scan queues.

use scan_core::messages::ScanEvent;
use scan_core::ui::{BleScanView, ScanRequester, UiEvent, WifiScanView};

use crate::channels::{CommandPort, EventReceiver, ScanChannels};
use crate::log;
use crate::status::ScanStatus;

/// Routes touch events to the orchestrator and folds scan events into views.
///
/// Never blocks: commands use non-blocking sends and events are drained
/// opportunistically once per frame.
pub struct UiBridge<'a> {
    requester: ScanRequester<CommandPort<'a>>,
    events: EventReceiver<'a>,
    status: &'a ScanStatus,
    ble: BleScanView,
    wifi: WifiScanView,
}

impl<'a> UiBridge<'a> {
    #[must_use]
    pub fn new(channels: &'a ScanChannels, status: &'a ScanStatus) -> Self {
        Self {
            requester: ScanRequester::new(channels.command_port()),
            events: channels.event_receiver(),
            status,
            ble: BleScanView::new(),
            wifi: WifiScanView::new(),
        }
    }

    #[must_use]
    pub fn ble(&self) -> &BleScanView {
        &self.ble
    }

    #[must_use]
    pub fn wifi(&self) -> &WifiScanView {
        &self.wifi
    }

    #[must_use]
    pub fn status(&self) -> &ScanStatus {
        self.status
    }

    /// Applies a touch event locally and forwards its command, if any.
    pub fn handle(&mut self, event: UiEvent) {
        self.ble.on_ui(event);
        self.wifi.on_ui(event);
        if let Err(error) = self.requester.submit(event) {
            log::ui_request_dropped(error.command.label());
        }
    }

    /// Drains every queued event into the views, calling `observe` for each.
    pub fn drain(&mut self, mut observe: impl FnMut(&ScanEvent)) -> usize {
        let mut drained = 0;
        while let Ok(event) = self.events.try_receive() {
            self.ble.apply(&event);
            self.wifi.apply(&event);
            observe(&event);
            drained += 1;
        }
        drained
    }

    /// Advances view countdowns by one frame.
    pub fn tick(&mut self, delta_ms: u32) {
        self.ble.tick(delta_ms);
    }
}
