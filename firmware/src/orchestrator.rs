//! Command dispatcher.
//!
//! The orchestrator drains the command queue with a bounded wait, hands WiFi
//! work to the [`WifiAdapter`], and starts or cancels BLE sessions on the
//! worker. It never scans itself, so a `BleCancel` is picked up while the
//! worker is mid-burst.

use embassy_futures::select::{Either, select};
use embassy_time::{Duration, with_timeout};
use scan_core::config::ScanConfig;
use scan_core::guard::{MemoryProbe, ResourceGuard};
use scan_core::messages::{ScanCommand, ScanEvent};

use crate::ble::BleControl;
use crate::channels::{CommandReceiver, EventPort};
use crate::log;
use crate::radio::WifiRadio;
use crate::status::ScanStatus;
use crate::wifi::WifiAdapter;

/// What a single pass of the loop handled.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Dispatch {
    Command(ScanCommand),
    WifiComplete,
    /// The poll interval elapsed with nothing to do.
    Idle,
}

pub struct ScanOrchestrator<'a, W: WifiRadio, P: MemoryProbe> {
    commands: CommandReceiver<'a>,
    events: EventPort<'a>,
    control: &'a BleControl,
    status: &'a ScanStatus,
    wifi: WifiAdapter<'a, W>,
    guard: ResourceGuard,
    probe: P,
    poll: Duration,
}

impl<'a, W: WifiRadio, P: MemoryProbe> ScanOrchestrator<'a, W, P> {
    #[must_use]
    pub fn new(
        config: &ScanConfig,
        commands: CommandReceiver<'a>,
        events: EventPort<'a>,
        control: &'a BleControl,
        status: &'a ScanStatus,
        wifi_radio: W,
        probe: P,
    ) -> Self {
        Self {
            commands,
            events,
            control,
            status,
            wifi: WifiAdapter::new(wifi_radio, events, status),
            guard: ResourceGuard::new(config.memory()),
            probe,
            poll: Duration::from_millis(u64::from(config.command_poll_ms())),
        }
    }

    #[must_use]
    pub fn wifi(&self) -> &WifiAdapter<'a, W> {
        &self.wifi
    }

    pub async fn run(&mut self) -> ! {
        loop {
            self.process_next().await;
        }
    }

    /// Waits up to one poll interval for work and handles it.
    pub async fn process_next(&mut self) -> Dispatch {
        let next = if self.wifi.in_progress() {
            match select(
                with_timeout(self.poll, self.commands.receive()),
                self.wifi.wait_complete(),
            )
            .await
            {
                Either::First(command) => command.ok().map(Dispatch::Command),
                Either::Second(()) => Some(Dispatch::WifiComplete),
            }
        } else {
            with_timeout(self.poll, self.commands.receive())
                .await
                .ok()
                .map(Dispatch::Command)
        };

        let Some(dispatch) = next else {
            return Dispatch::Idle;
        };

        match dispatch {
            Dispatch::Command(command) => self.dispatch(command).await,
            Dispatch::WifiComplete => self.wifi.on_complete().await,
            Dispatch::Idle => {}
        }
        dispatch
    }

    async fn dispatch(&mut self, command: ScanCommand) {
        log::command_received(command.label());
        match command {
            ScanCommand::WifiStart => self.wifi.start().await,
            ScanCommand::WifiStop => self.wifi.stop(),
            ScanCommand::BleStart { duration_ms } => self.start_ble(duration_ms).await,
            ScanCommand::BleCancel => self.cancel_ble(),
        }
    }

    async fn start_ble(&mut self, duration_ms: u32) {
        if self.status.is_scanning() {
            // The radio stack holds its memory while scanning; release it
            // before the guard looks at the heap.
            log::ble_restart();
            self.control.request_cancel();
            self.control.wait_finished().await;
        }

        let snapshot = self.probe.snapshot();
        if let Err(rejection) = self.guard.evaluate(snapshot) {
            log::guard_rejected(snapshot, rejection);
            self.events
                .post(ScanEvent::BleScanUnavailable {
                    free_bytes: snapshot.free_bytes,
                    largest_block: snapshot.largest_free_block,
                })
                .await;
            return;
        }

        self.status.set_ble_scanning(true);
        self.control.request_start(duration_ms);
    }

    fn cancel_ble(&mut self) {
        if self.status.is_scanning() {
            log::ble_cancel_requested();
            self.control.request_cancel();
        } else {
            log::ble_cancel_idle();
        }
    }
}
