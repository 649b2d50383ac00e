use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant as HostInstant};

use embassy_futures::block_on;
use embassy_futures::select::{Either3, select3};
use embassy_time::{Instant, Ticker};
use handheld_scanner::{BleControl, BleScanWorker, ScanChannels, ScanOrchestrator, ScanStatus, UiBridge};
use scan_core::config::ScanConfig;
use scan_core::messages::ScanEvent;
use scan_core::ui::{BleStatus, ScanDuration, UiEvent};

use crate::environment::Profile;

/// Display refresh period of the emulated UI task.
const FRAME_MS: u32 = 33;

pub const HELP_TOPICS: &[(&str, &str)] = &[
    ("wifi", "wifi [scan|stop]               - start or stop a WiFi scan cycle"),
    (
        "ble",
        "ble [10|20|30|cancel|ack]      - open the picker, start, cancel, or dismiss a BLE scan",
    ),
    ("devices", "devices                        - list BLE rows on screen"),
    ("aps", "aps                            - list WiFi rows on screen"),
    ("status", "status                         - display scan state"),
    ("wait", "wait <ms>                      - pause input while events keep flowing"),
    ("help", "help [topic]                   - show help for a command"),
];

/// Outcome of one input line.
#[derive(Debug, Eq, PartialEq)]
pub enum Reply {
    Lines(Vec<String>),
    Wait(Duration),
    Exit,
}

/// Input line parsed into an emulator action.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Action {
    Ui(UiEvent),
    Devices,
    Aps,
    Status,
    Wait(u64),
    Help,
    Exit,
}

fn parse_action(line: &str) -> Result<Action, String> {
    let mut words = line.split_whitespace().map(str::to_ascii_lowercase);
    let head = words.next().unwrap_or_default();
    let arg = words.next();
    if let Some(extra) = words.next() {
        return Err(format!("unexpected `{extra}`"));
    }

    let action = match (head.as_str(), arg.as_deref()) {
        ("wifi", None | Some("scan")) => Action::Ui(UiEvent::WifiScanRequested),
        ("wifi", Some("stop")) => Action::Ui(UiEvent::WifiStopRequested),
        ("ble", None) => Action::Ui(UiEvent::BleScanRequested),
        ("ble", Some("cancel")) => Action::Ui(UiEvent::BleCancelRequested),
        ("ble", Some("ack")) => Action::Ui(UiEvent::BleScanAcknowledged),
        ("ble", Some(seconds)) => {
            let duration = ScanDuration::ALL
                .into_iter()
                .find(|duration| duration.label().trim_end_matches('s') == seconds)
                .ok_or_else(|| format!("unsupported duration `{seconds}` (use 10, 20, or 30)"))?;
            Action::Ui(UiEvent::BleDurationSelected(duration))
        }
        ("devices", None) => Action::Devices,
        ("aps", None) => Action::Aps,
        ("status", None) => Action::Status,
        ("wait", Some(ms)) => Action::Wait(
            ms.parse()
                .map_err(|_| format!("invalid wait `{ms}`"))?,
        ),
        ("help", _) => Action::Help,
        ("exit" | "quit", None) => Action::Exit,
        (other, _) => return Err(format!("unknown command `{other}`")),
    };
    Ok(action)
}

/// Wires the scan runtime to simulated radios and feeds it `input`.
///
/// Returns once `exit` is read or the input closes.
pub fn run<W: Write>(
    profile: Profile,
    input: &Receiver<String>,
    out: &mut W,
    transcript: Option<TranscriptLogger>,
) -> io::Result<()> {
    let channels = ScanChannels::new();
    let control = BleControl::new();
    let status = ScanStatus::new();
    let config = ScanConfig::new();

    let mut worker = BleScanWorker::new(
        profile.ble_radio(),
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
        profile.wifi_radio(),
        profile.heap_probe(),
    );
    let mut session = Session::new(&channels, &status, transcript);

    block_on(async {
        match select3(
            orchestrator.run(),
            worker.run(),
            session.drive(input, out),
        )
        .await
        {
            Either3::First(never) | Either3::Second(never) => never,
            Either3::Third(result) => result,
        }
    })
}

pub struct Session<'a> {
    ui: UiBridge<'a>,
    channels: &'a ScanChannels,
    transcript: Option<TranscriptLogger>,
    started_at: HostInstant,
}

impl<'a> Session<'a> {
    pub fn new(
        channels: &'a ScanChannels,
        status: &'a ScanStatus,
        transcript: Option<TranscriptLogger>,
    ) -> Self {
        Self {
            ui: UiBridge::new(channels, status),
            channels,
            transcript,
            started_at: HostInstant::now(),
        }
    }

    /// UI task loop: one input line per frame, events drained every frame.
    async fn drive<W: Write>(&mut self, input: &Receiver<String>, out: &mut W) -> io::Result<()> {
        let mut ticker = Ticker::every(embassy_time::Duration::from_millis(u64::from(FRAME_MS)));
        let mut resume_at: Option<Instant> = None;

        loop {
            if resume_at.is_none_or(|at| Instant::now() >= at) {
                resume_at = None;
                match input.try_recv() {
                    Ok(line) => match self.handle_command(&line)? {
                        Reply::Lines(lines) => emit(out, &lines)?,
                        Reply::Wait(pause) => {
                            let millis = u64::try_from(pause.as_millis()).unwrap_or(u64::MAX);
                            resume_at =
                                Some(Instant::now() + embassy_time::Duration::from_millis(millis));
                        }
                        Reply::Exit => return Ok(()),
                    },
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => return Ok(()),
                }
            }

            let lines = self.poll_events(FRAME_MS)?;
            emit(out, &lines)?;
            ticker.next().await;
        }
    }

    pub fn handle_command(&mut self, line: &str) -> io::Result<Reply> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Reply::Lines(Vec::new()));
        }

        let elapsed = self.started_at.elapsed();
        self.record(elapsed, TranscriptRole::Host, trimmed)?;

        let lines = match parse_action(trimmed) {
            Ok(Action::Exit) => return Ok(Reply::Exit),
            Ok(Action::Wait(ms)) => return Ok(Reply::Wait(Duration::from_millis(ms))),
            Ok(Action::Help) => help_lines(trimmed.split_whitespace().nth(1)),
            Ok(Action::Ui(event)) => {
                self.ui.handle(event);
                vec![format!("OK {}", describe_ble_status(self.ui.ble().status()))]
            }
            Ok(Action::Devices) => self.device_lines(),
            Ok(Action::Aps) => self.ap_lines(),
            Ok(Action::Status) => self.status_lines(),
            Err(detail) => vec![format!("ERR syntax {detail}")],
        };

        self.record_output(elapsed, &lines)?;
        Ok(Reply::Lines(lines))
    }

    /// Drains queued events into the views and narrates each one.
    pub fn poll_events(&mut self, delta_ms: u32) -> io::Result<Vec<String>> {
        let mut lines = Vec::new();
        self.ui.drain(|event| lines.push(describe_event(event)));
        self.ui.tick(delta_ms);

        let elapsed = self.started_at.elapsed();
        self.record_output(elapsed, &lines)?;
        Ok(lines)
    }

    fn device_lines(&self) -> Vec<String> {
        let rows = self.ui.ble().rows();
        let mut lines = vec![format!("{} BLE device(s)", rows.len())];
        lines.extend(rows.iter().map(|device| {
            format!(
                "  {} {:>4} dBm {}",
                device.mac,
                device.rssi,
                device.display_name()
            )
        }));
        lines
    }

    fn ap_lines(&self) -> Vec<String> {
        let rows = self.ui.wifi().rows();
        let mut lines = vec![format!("{} WiFi AP(s)", rows.len())];
        lines.extend(rows.iter().map(|ap| {
            let ssid = if ap.ssid.is_empty() {
                "(hidden)"
            } else {
                ap.ssid.as_str()
            };
            format!("  {} ch{:<3} {:>4} dBm {ssid}", ap.bssid, ap.channel, ap.rssi)
        }));
        lines
    }

    fn status_lines(&self) -> Vec<String> {
        let status = self.ui.status();
        vec![
            format!(
                "ble scanning={} screen={}",
                status.is_scanning(),
                describe_ble_status(self.ui.ble().status())
            ),
            format!("wifi scanning={}", status.wifi_scanning()),
            format!("last-duration={}ms", status.last_duration_ms()),
            format!(
                "dropped commands={} events={}",
                self.channels.dropped_commands(),
                self.channels.dropped_events()
            ),
        ]
    }

    fn record(&mut self, elapsed: Duration, role: TranscriptRole, line: &str) -> io::Result<()> {
        match self.transcript.as_mut() {
            Some(transcript) => transcript.append_line(elapsed, role, line),
            None => Ok(()),
        }
    }

    fn record_output(&mut self, elapsed: Duration, lines: &[String]) -> io::Result<()> {
        for line in lines {
            self.record(elapsed, TranscriptRole::Emulator, line)?;
        }
        Ok(())
    }
}

fn emit<W: Write>(out: &mut W, lines: &[String]) -> io::Result<()> {
    if lines.is_empty() {
        return Ok(());
    }
    for line in lines {
        writeln!(out, "{line}")?;
    }
    out.flush()
}

fn describe_event(event: &ScanEvent) -> String {
    match event {
        ScanEvent::WifiApFound(ap) => format!(
            "EVT {} {} ch={} rssi={} ssid={:?}",
            event.label(),
            ap.bssid,
            ap.channel,
            ap.rssi,
            ap.ssid.as_str()
        ),
        ScanEvent::BleDeviceFound(device) => format!(
            "EVT {} {} rssi={} name={:?}",
            event.label(),
            device.mac,
            device.rssi,
            device.display_name()
        ),
        ScanEvent::BleScanStarted(summary) => format!(
            "EVT {} duration={}ms at={}ms",
            event.label(),
            summary.duration_ms,
            summary.timestamp_ms
        ),
        ScanEvent::WifiScanDone(summary)
        | ScanEvent::BleScanCompleted(summary)
        | ScanEvent::BleScanCanceled(summary) => format!(
            "EVT {} count={} duration={}ms",
            event.label(),
            summary.count,
            summary.duration_ms
        ),
        ScanEvent::BleScanUnavailable {
            free_bytes,
            largest_block,
        } => format!(
            "EVT {} free={free_bytes}B largest-block={largest_block}B",
            event.label()
        ),
    }
}

fn describe_ble_status(status: BleStatus) -> String {
    match status {
        BleStatus::Ready => "ready".to_string(),
        BleStatus::ChooseDuration => "choose duration (ble 10|20|30)".to_string(),
        BleStatus::Scanning { remaining_s } => format!("scanning {remaining_s}s left"),
        BleStatus::Finishing => "finishing".to_string(),
        BleStatus::Complete { count } => format!("complete, {count} device(s)"),
        BleStatus::Canceled { count } => format!("canceled, {count} device(s)"),
        BleStatus::Unavailable => "unavailable: not enough memory".to_string(),
    }
}

fn help_lines(topic: Option<&str>) -> Vec<String> {
    let mut lines = Vec::new();
    match topic {
        Some(target) => {
            if let Some((_, detail)) = HELP_TOPICS
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(target))
            {
                lines.push((*detail).to_string());
            } else {
                lines.push(format!("No help available for `{target}`."));
                lines.push(format!("Available topics: {}", help_topic_list()));
            }
        }
        None => {
            lines.push("Available commands:".to_string());
            for (_, detail) in HELP_TOPICS {
                lines.push(format!("  {detail}"));
            }
            lines.push("Type `help <topic>` for a specific command.".to_string());
        }
    }
    lines
}

fn help_topic_list() -> String {
    HELP_TOPICS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

pub struct TranscriptLogger {
    writer: BufWriter<File>,
}

impl TranscriptLogger {
    pub fn create(path: &Path, profile: Profile) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut logger = Self {
            writer: BufWriter::new(file),
        };
        writeln!(
            logger.writer,
            "# Scan emulator transcript ({} environment)",
            profile.tag()
        )?;
        writeln!(
            logger.writer,
            "# Timestamps are milliseconds since session start"
        )?;
        writeln!(logger.writer)?;
        logger.writer.flush()?;
        Ok(logger)
    }

    fn append_line(
        &mut self,
        elapsed: Duration,
        role: TranscriptRole,
        line: &str,
    ) -> io::Result<()> {
        writeln!(
            self.writer,
            "[+{:>6} ms] {} {}",
            elapsed.as_millis(),
            role.prefix(),
            line
        )?;
        self.writer.flush()
    }
}

#[derive(Clone, Copy)]
enum TranscriptRole {
    Host,
    Emulator,
}

impl TranscriptRole {
    fn prefix(self) -> &'static str {
        match self {
            TranscriptRole::Host => "HOST>",
            TranscriptRole::Emulator => "EMU <",
        }
    }
}
