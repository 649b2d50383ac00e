use embassy_futures::block_on;
use embassy_futures::join::join;
use embassy_futures::select::{Either, select};
use embassy_time::{Duration, Instant, Timer, with_timeout};
use handheld_scanner::radio::{BleRadio, BurstReports, RadioError, WifiRadio, WifiResults};
use handheld_scanner::{BleControl, BleScanWorker, ScanChannels, ScanOrchestrator, ScanStatus, UiBridge};
use scan_core::config::ScanConfig;
use scan_core::guard::{FixedMemoryProbe, HeapSnapshot, MemoryProbe};
use scan_core::messages::{BleDevice, MacAddress, ScanCommand, ScanEvent, ScanSummary, WifiAp};
use scan_core::ui::{BleStatus, ScanDuration, UiEvent};

const BURST_MS: u32 = 20;
/// Allowance for host scheduling jitter on top of the one-burst bound.
const JITTER_MS: u32 = 40;

struct SimBle {
    adverts: Vec<(u64, BleDevice)>,
    origin: Instant,
    cursor_ms: u64,
    fail_prepare: bool,
    fail_on_burst: Option<usize>,
    /// Fixed burst length that ignores the requested window.
    slice: Option<Duration>,
    bursts: usize,
    stops: usize,
}

impl SimBle {
    fn new(adverts: Vec<(u64, BleDevice)>) -> Self {
        Self {
            adverts,
            origin: Instant::from_ticks(0),
            cursor_ms: 0,
            fail_prepare: false,
            fail_on_burst: None,
            slice: None,
            bursts: 0,
            stops: 0,
        }
    }

    fn quiet() -> Self {
        Self::new(Vec::new())
    }

    /// A radio whose every burst runs for `ms` regardless of the window.
    fn sluggish(ms: u64) -> Self {
        Self {
            slice: Some(Duration::from_millis(ms)),
            ..Self::quiet()
        }
    }
}

impl BleRadio for SimBle {
    async fn prepare(&mut self) -> Result<(), RadioError> {
        if self.fail_prepare {
            return Err(RadioError::Unavailable);
        }
        self.origin = Instant::now();
        self.cursor_ms = 0;
        self.bursts = 0;
        Ok(())
    }

    async fn scan_burst(
        &mut self,
        window: Duration,
        reports: &mut BurstReports,
    ) -> Result<(), RadioError> {
        self.bursts += 1;
        if self.fail_on_burst == Some(self.bursts) {
            return Err(RadioError::Driver(-3));
        }

        Timer::after(self.slice.unwrap_or(window)).await;
        let end = self.origin.elapsed().as_millis();
        for (at, device) in &self.adverts {
            if *at >= self.cursor_ms && *at < end {
                let _ = reports.push(device.clone());
            }
        }
        self.cursor_ms = end;
        Ok(())
    }

    fn stop(&mut self) {
        self.stops += 1;
    }

    fn clear_results(&mut self) {}
}

struct SimWifi {
    aps: Vec<WifiAp>,
    scan_ms: u64,
    ready_at: Option<Instant>,
    starts: usize,
    stops: usize,
    released: usize,
}

impl SimWifi {
    fn new(aps: Vec<WifiAp>) -> Self {
        Self {
            aps,
            scan_ms: 60,
            ready_at: None,
            starts: 0,
            stops: 0,
            released: 0,
        }
    }
}

impl WifiRadio for SimWifi {
    fn start_scan(&mut self) -> Result<(), RadioError> {
        self.starts += 1;
        self.ready_at = Some(Instant::now() + Duration::from_millis(self.scan_ms));
        Ok(())
    }

    fn stop_scan(&mut self) -> Result<(), RadioError> {
        // The driver still finishes the cycle it started.
        self.stops += 1;
        Ok(())
    }

    async fn scan_complete(&mut self) {
        match self.ready_at {
            Some(at) => {
                Timer::at(at).await;
                self.ready_at = None;
            }
            None => core::future::pending::<()>().await,
        }
    }

    fn take_results(&mut self, out: &mut WifiResults) {
        for ap in &self.aps {
            let _ = out.push(ap.clone());
        }
    }

    fn release_results(&mut self) {
        self.released += 1;
    }
}

fn device(last: u8) -> BleDevice {
    BleDevice::new("sim", MacAddress::new([0xE4, 0, 0, 0, 0, last]), -60, 0)
}

fn config() -> ScanConfig {
    ScanConfig::new()
        .with_burst_ms(BURST_MS)
        .with_command_poll_ms(10)
}

/// Runs the orchestrator and worker alongside `script` until the script ends.
fn run_with<W, P, R, T>(
    orchestrator: &mut ScanOrchestrator<'_, W, P>,
    worker: &mut BleScanWorker<'_, R>,
    script: impl core::future::Future<Output = T>,
) -> T
where
    W: WifiRadio,
    P: MemoryProbe,
    R: BleRadio,
{
    block_on(async {
        let guarded = with_timeout(Duration::from_secs(10), script);
        match select(join(orchestrator.run(), worker.run()), guarded).await {
            Either::First(_) => unreachable!("runtime loops never return"),
            Either::Second(result) => result.expect("scenario timed out"),
        }
    })
}

/// Drains events into `seen` until `done` holds.
async fn collect_until(
    ui: &mut UiBridge<'_>,
    seen: &mut Vec<ScanEvent>,
    done: impl Fn(&[ScanEvent]) -> bool,
) {
    loop {
        ui.drain(|event| seen.push(event.clone()));
        if done(seen) {
            return;
        }
        Timer::after_millis(2).await;
    }
}

fn terminals(events: &[ScanEvent]) -> usize {
    events.iter().filter(|event| event.is_ble_terminal()).count()
}

fn summary_of(event: &ScanEvent) -> ScanSummary {
    match event {
        ScanEvent::BleScanCompleted(summary)
        | ScanEvent::BleScanCanceled(summary)
        | ScanEvent::BleScanStarted(summary)
        | ScanEvent::WifiScanDone(summary) => *summary,
        other => panic!("no summary on {other:?}"),
    }
}

#[test]
fn timed_scan_reports_unique_devices_then_completes() {
    let channels = ScanChannels::new();
    let control = BleControl::new();
    let status = ScanStatus::new();
    let config = config();

    let adverts = vec![
        (30, device(1)),
        (110, device(2)),
        (170, device(1)),
        (250, device(3)),
    ];
    let mut worker = BleScanWorker::new(
        SimBle::new(adverts),
        &config,
        &control,
        channels.event_port(),
        &status,
    );
    let mut orchestrator = ScanOrchestrator::new(
        &config,
        channels.command_receiver(),
        channels.event_port(),
        &control,
        &status,
        SimWifi::new(Vec::new()),
        FixedMemoryProbe::plentiful(),
    );
    let mut ui = UiBridge::new(&channels, &status);
    let mut seen = Vec::new();

    run_with(&mut orchestrator, &mut worker, async {
        channels
            .command_port()
            .sender()
            .send(ScanCommand::BleStart { duration_ms: 300 })
            .await;
        collect_until(&mut ui, &mut seen, |events| terminals(events) == 1).await;
    });

    assert!(matches!(seen.first(), Some(ScanEvent::BleScanStarted(_))));
    let found = seen
        .iter()
        .filter(|event| matches!(event, ScanEvent::BleDeviceFound(_)))
        .count();
    assert_eq!(found, 4);

    let last = seen.last().expect("terminal event");
    assert!(matches!(last, ScanEvent::BleScanCompleted(_)));
    let summary = summary_of(last);
    assert_eq!(summary.count, 3);
    assert!(summary.duration_ms >= 300);
    assert!(summary.duration_ms < 300 + BURST_MS + JITTER_MS);

    assert!(!status.is_scanning());
    assert_eq!(status.last_duration_ms(), summary.duration_ms);
    assert_eq!(ui.ble().rows().len(), 3);
    assert_eq!(worker.radio().stops, 1);
}

#[test]
fn cancel_is_observed_within_one_burst() {
    let channels = ScanChannels::new();
    let control = BleControl::new();
    let status = ScanStatus::new();
    let config = config();

    let mut worker = BleScanWorker::new(SimBle::quiet(), &config, &control, channels.event_port(), &status);
    let mut orchestrator = ScanOrchestrator::new(
        &config,
        channels.command_receiver(),
        channels.event_port(),
        &control,
        &status,
        SimWifi::new(Vec::new()),
        FixedMemoryProbe::plentiful(),
    );
    let mut ui = UiBridge::new(&channels, &status);
    let mut seen = Vec::new();

    run_with(&mut orchestrator, &mut worker, async {
        ui.handle(UiEvent::BleScanRequested);
        ui.handle(UiEvent::BleDurationSelected(ScanDuration::Long30s));
        collect_until(&mut ui, &mut seen, |events| !events.is_empty()).await;
        assert!(status.is_scanning());

        Timer::after_millis(100).await;
        ui.handle(UiEvent::BleCancelRequested);
        collect_until(&mut ui, &mut seen, |events| terminals(events) == 1).await;
    });

    let last = seen.last().expect("terminal event");
    assert!(matches!(last, ScanEvent::BleScanCanceled(_)));
    let summary = summary_of(last);
    assert!(summary.duration_ms >= 100);
    assert!(summary.duration_ms < 100 + BURST_MS + JITTER_MS);
    assert_eq!(summary.count, 0);
}

#[test]
fn start_while_scanning_cancels_then_restarts() {
    let channels = ScanChannels::new();
    let control = BleControl::new();
    let status = ScanStatus::new();
    let config = config();

    let mut worker = BleScanWorker::new(SimBle::quiet(), &config, &control, channels.event_port(), &status);
    let mut orchestrator = ScanOrchestrator::new(
        &config,
        channels.command_receiver(),
        channels.event_port(),
        &control,
        &status,
        SimWifi::new(Vec::new()),
        FixedMemoryProbe::plentiful(),
    );
    let mut ui = UiBridge::new(&channels, &status);
    let mut seen = Vec::new();

    run_with(&mut orchestrator, &mut worker, async {
        ui.handle(UiEvent::BleDurationSelected(ScanDuration::Long30s));
        collect_until(&mut ui, &mut seen, |events| !events.is_empty()).await;
        Timer::after_millis(60).await;

        let sender = channels.command_port().sender();
        sender
            .send(ScanCommand::BleStart { duration_ms: 150 })
            .await;
        collect_until(&mut ui, &mut seen, |events| terminals(events) == 2).await;
    });

    let lifecycle: Vec<&ScanEvent> = seen.iter().filter(|event| event.is_lifecycle()).collect();
    assert_eq!(lifecycle.len(), 4);
    assert!(matches!(lifecycle[0], ScanEvent::BleScanStarted(s) if s.duration_ms == 30_000));
    assert!(matches!(lifecycle[1], ScanEvent::BleScanCanceled(_)));
    assert!(matches!(lifecycle[2], ScanEvent::BleScanStarted(s) if s.duration_ms == 150));
    assert!(matches!(lifecycle[3], ScanEvent::BleScanCompleted(_)));
}

#[test]
fn low_memory_refuses_to_start() {
    let channels = ScanChannels::new();
    let control = BleControl::new();
    let status = ScanStatus::new();
    let config = config();

    let mut worker = BleScanWorker::new(SimBle::quiet(), &config, &control, channels.event_port(), &status);
    let mut orchestrator = ScanOrchestrator::new(
        &config,
        channels.command_receiver(),
        channels.event_port(),
        &control,
        &status,
        SimWifi::new(Vec::new()),
        FixedMemoryProbe::new(HeapSnapshot::new(50 * 1024, 20 * 1024)),
    );
    let mut ui = UiBridge::new(&channels, &status);
    let mut seen = Vec::new();

    run_with(&mut orchestrator, &mut worker, async {
        ui.handle(UiEvent::BleDurationSelected(ScanDuration::Short10s));
        collect_until(&mut ui, &mut seen, |events| !events.is_empty()).await;
        // Give a stray session time to show up if one was started.
        Timer::after_millis(50).await;
        ui.drain(|event| seen.push(event.clone()));
    });

    assert_eq!(
        seen,
        vec![ScanEvent::BleScanUnavailable {
            free_bytes: 50 * 1024,
            largest_block: 20 * 1024,
        }]
    );
    assert!(!status.is_scanning());
    assert!(worker.machine().session().is_none());
    assert_eq!(ui.ble().status(), BleStatus::Unavailable);
}

#[test]
fn radio_failure_before_first_burst_still_terminates() {
    let channels = ScanChannels::new();
    let control = BleControl::new();
    let status = ScanStatus::new();
    let config = config();

    let mut radio = SimBle::quiet();
    radio.fail_prepare = true;
    let mut worker = BleScanWorker::new(radio, &config, &control, channels.event_port(), &status);
    let mut orchestrator = ScanOrchestrator::new(
        &config,
        channels.command_receiver(),
        channels.event_port(),
        &control,
        &status,
        SimWifi::new(Vec::new()),
        FixedMemoryProbe::plentiful(),
    );
    let mut ui = UiBridge::new(&channels, &status);
    let mut seen = Vec::new();

    run_with(&mut orchestrator, &mut worker, async {
        ui.handle(UiEvent::BleDurationSelected(ScanDuration::Medium20s));
        collect_until(&mut ui, &mut seen, |events| terminals(events) == 1).await;
    });

    assert_eq!(seen.len(), 2);
    assert!(matches!(seen[0], ScanEvent::BleScanStarted(_)));
    assert!(matches!(seen[1], ScanEvent::BleScanCanceled(s) if s.count == 0));
}

#[test]
fn radio_failure_mid_session_cancels_with_count_so_far() {
    let channels = ScanChannels::new();
    let control = BleControl::new();
    let status = ScanStatus::new();
    let config = config();

    let mut radio = SimBle::new(vec![(5, device(1)), (25, device(2))]);
    radio.fail_on_burst = Some(3);
    let mut worker = BleScanWorker::new(radio, &config, &control, channels.event_port(), &status);
    let mut orchestrator = ScanOrchestrator::new(
        &config,
        channels.command_receiver(),
        channels.event_port(),
        &control,
        &status,
        SimWifi::new(Vec::new()),
        FixedMemoryProbe::plentiful(),
    );
    let mut ui = UiBridge::new(&channels, &status);
    let mut seen = Vec::new();

    run_with(&mut orchestrator, &mut worker, async {
        ui.handle(UiEvent::BleDurationSelected(ScanDuration::Short10s));
        collect_until(&mut ui, &mut seen, |events| terminals(events) == 1).await;
    });

    let last = seen.last().expect("terminal event");
    assert!(matches!(last, ScanEvent::BleScanCanceled(s) if s.count == 2));
}

#[test]
fn cancel_while_idle_emits_nothing() {
    let channels = ScanChannels::new();
    let control = BleControl::new();
    let status = ScanStatus::new();
    let config = config();

    let mut worker = BleScanWorker::new(SimBle::quiet(), &config, &control, channels.event_port(), &status);
    let mut orchestrator = ScanOrchestrator::new(
        &config,
        channels.command_receiver(),
        channels.event_port(),
        &control,
        &status,
        SimWifi::new(Vec::new()),
        FixedMemoryProbe::plentiful(),
    );
    let mut ui = UiBridge::new(&channels, &status);

    let drained = run_with(&mut orchestrator, &mut worker, async {
        ui.handle(UiEvent::BleCancelRequested);
        Timer::after_millis(50).await;
        ui.drain(|_| {})
    });

    assert_eq!(drained, 0);
    assert!(!status.is_scanning());
}

#[test]
fn wifi_scan_reports_each_ap_then_done() {
    let channels = ScanChannels::new();
    let control = BleControl::new();
    let status = ScanStatus::new();
    let config = config();

    let aps = vec![
        WifiAp::new("lab", -40, 1, MacAddress::new([1; 6])),
        WifiAp::new("lab", -40, 1, MacAddress::new([1; 6])),
        WifiAp::new("guest", -71, 11, MacAddress::new([2; 6])),
    ];
    let mut worker = BleScanWorker::new(SimBle::quiet(), &config, &control, channels.event_port(), &status);
    let mut orchestrator = ScanOrchestrator::new(
        &config,
        channels.command_receiver(),
        channels.event_port(),
        &control,
        &status,
        SimWifi::new(aps),
        FixedMemoryProbe::plentiful(),
    );
    let mut ui = UiBridge::new(&channels, &status);
    let mut seen = Vec::new();

    run_with(&mut orchestrator, &mut worker, async {
        ui.handle(UiEvent::WifiScanRequested);
        Timer::after_millis(10).await;
        assert!(status.wifi_scanning());
        // Ignored: a scan is already in flight.
        ui.handle(UiEvent::WifiScanRequested);
        collect_until(&mut ui, &mut seen, |events| {
            events
                .iter()
                .any(|event| matches!(event, ScanEvent::WifiScanDone(_)))
        })
        .await;
        Timer::after_millis(30).await;
        ui.drain(|event| seen.push(event.clone()));
    });

    assert_eq!(seen.len(), 4);
    assert!(seen[..3]
        .iter()
        .all(|event| matches!(event, ScanEvent::WifiApFound(_))));
    let done = summary_of(&seen[3]);
    assert_eq!(done.count, 3);
    assert!(done.duration_ms >= 60);

    assert!(!status.wifi_scanning());
    assert_eq!(orchestrator.wifi().radio().starts, 1);
    assert_eq!(orchestrator.wifi().radio().released, 1);
    assert_eq!(ui.wifi().rows().len(), 3);
}

#[test]
fn cancel_interrupts_a_burst_that_outlasts_its_window() {
    let channels = ScanChannels::new();
    let control = BleControl::new();
    let status = ScanStatus::new();
    let config = config();

    let mut worker = BleScanWorker::new(
        SimBle::sluggish(400),
        &config,
        &control,
        channels.event_port(),
        &status,
    );
    let mut orchestrator = ScanOrchestrator::new(
        &config,
        channels.command_receiver(),
        channels.event_port(),
        &control,
        &status,
        SimWifi::new(Vec::new()),
        FixedMemoryProbe::plentiful(),
    );
    let mut ui = UiBridge::new(&channels, &status);
    let mut seen = Vec::new();

    run_with(&mut orchestrator, &mut worker, async {
        channels
            .command_port()
            .sender()
            .send(ScanCommand::BleStart { duration_ms: 30_000 })
            .await;
        collect_until(&mut ui, &mut seen, |events| !events.is_empty()).await;

        Timer::after_millis(100).await;
        ui.handle(UiEvent::BleCancelRequested);
        collect_until(&mut ui, &mut seen, |events| terminals(events) == 1).await;
    });

    let last = seen.last().expect("terminal event");
    assert!(matches!(last, ScanEvent::BleScanCanceled(_)));
    let summary = summary_of(last);
    assert!(summary.duration_ms >= 100);
    assert!(summary.duration_ms < 100 + BURST_MS + JITTER_MS);
    assert_eq!(worker.radio().bursts, 1);
    assert!(!status.is_scanning());
}

#[test]
fn deadline_cuts_an_overrunning_burst_short() {
    let channels = ScanChannels::new();
    let control = BleControl::new();
    let status = ScanStatus::new();
    let config = config();

    let mut worker = BleScanWorker::new(
        SimBle::sluggish(400),
        &config,
        &control,
        channels.event_port(),
        &status,
    );
    let mut orchestrator = ScanOrchestrator::new(
        &config,
        channels.command_receiver(),
        channels.event_port(),
        &control,
        &status,
        SimWifi::new(Vec::new()),
        FixedMemoryProbe::plentiful(),
    );
    let mut ui = UiBridge::new(&channels, &status);
    let mut seen = Vec::new();

    run_with(&mut orchestrator, &mut worker, async {
        channels
            .command_port()
            .sender()
            .send(ScanCommand::BleStart { duration_ms: 300 })
            .await;
        collect_until(&mut ui, &mut seen, |events| terminals(events) == 1).await;
    });

    let last = seen.last().expect("terminal event");
    assert!(matches!(last, ScanEvent::BleScanCompleted(_)));
    let summary = summary_of(last);
    assert!(summary.duration_ms >= 300);
    assert!(summary.duration_ms < 300 + BURST_MS + JITTER_MS);
    assert_eq!(worker.radio().bursts, 1);
}

#[test]
fn wifi_stop_mid_scan_still_delivers_results() {
    let channels = ScanChannels::new();
    let control = BleControl::new();
    let status = ScanStatus::new();
    let config = config();

    let aps = vec![
        WifiAp::new("lab", -40, 1, MacAddress::new([1; 6])),
        WifiAp::new("guest", -71, 11, MacAddress::new([2; 6])),
    ];
    let mut worker = BleScanWorker::new(SimBle::quiet(), &config, &control, channels.event_port(), &status);
    let mut orchestrator = ScanOrchestrator::new(
        &config,
        channels.command_receiver(),
        channels.event_port(),
        &control,
        &status,
        SimWifi::new(aps),
        FixedMemoryProbe::plentiful(),
    );
    let mut ui = UiBridge::new(&channels, &status);
    let mut seen = Vec::new();

    run_with(&mut orchestrator, &mut worker, async {
        ui.handle(UiEvent::WifiScanRequested);
        Timer::after_millis(10).await;
        ui.handle(UiEvent::WifiStopRequested);
        collect_until(&mut ui, &mut seen, |events| {
            events
                .iter()
                .any(|event| matches!(event, ScanEvent::WifiScanDone(_)))
        })
        .await;
    });

    assert_eq!(seen.len(), 3);
    assert!(matches!(&seen[2], ScanEvent::WifiScanDone(s) if s.count == 2));
    assert_eq!(orchestrator.wifi().radio().stops, 1);
    assert_eq!(orchestrator.wifi().radio().released, 1);
    assert!(!status.wifi_scanning());
}

#[test]
fn wifi_stop_while_idle_emits_nothing() {
    let channels = ScanChannels::new();
    let control = BleControl::new();
    let status = ScanStatus::new();
    let config = config();

    let mut worker = BleScanWorker::new(SimBle::quiet(), &config, &control, channels.event_port(), &status);
    let mut orchestrator = ScanOrchestrator::new(
        &config,
        channels.command_receiver(),
        channels.event_port(),
        &control,
        &status,
        SimWifi::new(Vec::new()),
        FixedMemoryProbe::plentiful(),
    );
    let mut ui = UiBridge::new(&channels, &status);

    let drained = run_with(&mut orchestrator, &mut worker, async {
        ui.handle(UiEvent::WifiStopRequested);
        Timer::after_millis(50).await;
        ui.drain(|_| {})
    });

    assert_eq!(drained, 0);
    assert_eq!(orchestrator.wifi().radio().stops, 0);
    assert_eq!(orchestrator.wifi().radio().starts, 0);
}
