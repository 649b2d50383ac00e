//! Maps opaque UI events onto [`ScanCommand`]s.

use core::fmt;

use crate::messages::ScanCommand;
use crate::queue::{QueueError, QueueProducer};

/// Scan lengths offered on the duration picker.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ScanDuration {
    Short10s,
    Medium20s,
    Long30s,
}

impl ScanDuration {
    pub const ALL: [ScanDuration; 3] = [
        ScanDuration::Short10s,
        ScanDuration::Medium20s,
        ScanDuration::Long30s,
    ];

    #[must_use]
    pub const fn millis(self) -> u32 {
        match self {
            ScanDuration::Short10s => 10_000,
            ScanDuration::Medium20s => 20_000,
            ScanDuration::Long30s => 30_000,
        }
    }

    /// Button caption.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            ScanDuration::Short10s => "10s",
            ScanDuration::Medium20s => "20s",
            ScanDuration::Long30s => "30s",
        }
    }
}

/// Events raised by the display/touch layer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum UiEvent {
    WifiScanRequested,
    WifiStopRequested,
    /// Opens the duration picker; no command is sent yet.
    BleScanRequested,
    BleDurationSelected(ScanDuration),
    BleCancelRequested,
    /// Dismisses a finished scan's status line.
    BleScanAcknowledged,
}

/// Translates a UI event into the command it implies, if any.
#[must_use]
pub const fn route(event: UiEvent) -> Option<ScanCommand> {
    match event {
        UiEvent::WifiScanRequested => Some(ScanCommand::WifiStart),
        UiEvent::WifiStopRequested => Some(ScanCommand::WifiStop),
        UiEvent::BleDurationSelected(duration) => Some(ScanCommand::BleStart {
            duration_ms: duration.millis(),
        }),
        UiEvent::BleCancelRequested => Some(ScanCommand::BleCancel),
        UiEvent::BleScanRequested | UiEvent::BleScanAcknowledged => None,
    }
}

/// Failure to hand a routed command to the orchestrator.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RequestError {
    pub command: ScanCommand,
    pub error: QueueError,
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} dropped: {}", self.command.label(), self.error)
    }
}

/// Posts routed UI events onto the command queue.
#[derive(Debug)]
pub struct ScanRequester<P>
where
    P: QueueProducer<Item = ScanCommand>,
{
    producer: P,
    dropped: u32,
}

impl<P> ScanRequester<P>
where
    P: QueueProducer<Item = ScanCommand>,
{
    #[must_use]
    pub const fn new(producer: P) -> Self {
        Self {
            producer,
            dropped: 0,
        }
    }

    #[must_use]
    pub fn producer(&self) -> &P {
        &self.producer
    }

    /// Commands lost to a full queue since construction.
    #[must_use]
    pub const fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Routes `event` and enqueues the resulting command without blocking.
    ///
    /// Returns the command that was sent, or `None` for view-only events.
    ///
    /// # Errors
    ///
    /// Returns the command and queue error when the send fails. The caller
    /// logs it and carries on; no command is guaranteed delivery.
    pub fn submit(&mut self, event: UiEvent) -> Result<Option<ScanCommand>, RequestError> {
        let Some(command) = route(event) else {
            return Ok(None);
        };

        match self.producer.try_enqueue(command) {
            Ok(()) => Ok(Some(command)),
            Err(error) => {
                self.dropped = self.dropped.saturating_add(1);
                Err(RequestError { command, error })
            }
        }
    }
}
