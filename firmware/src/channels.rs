//! Bounded queues between the UI, the orchestrator, and the BLE worker.
//!
//! [`ScanChannels`] is built once by the composition root and lent out by
//! reference; nothing here is a global.

use embassy_sync::channel::{Channel, Receiver, Sender, TrySendError};
#[cfg(not(target_os = "none"))]
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
#[cfg(target_os = "none")]
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use portable_atomic::{AtomicU32, Ordering};
use scan_core::config::{COMMAND_QUEUE_DEPTH, EVENT_QUEUE_DEPTH};
use scan_core::messages::{ScanCommand, ScanEvent};
use scan_core::queue::{QueueError, QueueProducer};

use crate::log;

#[cfg(target_os = "none")]
pub type ScanMutex = ThreadModeRawMutex;
#[cfg(not(target_os = "none"))]
pub type ScanMutex = NoopRawMutex;

/// UI → orchestrator queue.
pub type CommandQueue = Channel<ScanMutex, ScanCommand, COMMAND_QUEUE_DEPTH>;
pub type CommandSender<'a> = Sender<'a, ScanMutex, ScanCommand, COMMAND_QUEUE_DEPTH>;
pub type CommandReceiver<'a> = Receiver<'a, ScanMutex, ScanCommand, COMMAND_QUEUE_DEPTH>;

/// Orchestrator → UI queue.
pub type EventQueue = Channel<ScanMutex, ScanEvent, EVENT_QUEUE_DEPTH>;
pub type EventReceiver<'a> = Receiver<'a, ScanMutex, ScanEvent, EVENT_QUEUE_DEPTH>;

/// The two scan queues plus drop counters.
pub struct ScanChannels {
    commands: CommandQueue,
    events: EventQueue,
    dropped_commands: AtomicU32,
    dropped_events: AtomicU32,
}

impl ScanChannels {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            commands: Channel::new(),
            events: Channel::new(),
            dropped_commands: AtomicU32::new(0),
            dropped_events: AtomicU32::new(0),
        }
    }

    #[must_use]
    pub fn command_port(&self) -> CommandPort<'_> {
        CommandPort { channels: self }
    }

    #[must_use]
    pub fn command_receiver(&self) -> CommandReceiver<'_> {
        self.commands.receiver()
    }

    #[must_use]
    pub fn event_port(&self) -> EventPort<'_> {
        EventPort { channels: self }
    }

    #[must_use]
    pub fn event_receiver(&self) -> EventReceiver<'_> {
        self.events.receiver()
    }

    /// Commands lost because the queue was full.
    #[must_use]
    pub fn dropped_commands(&self) -> u32 {
        self.dropped_commands.load(Ordering::Relaxed)
    }

    /// Per-item events shed because the queue was full.
    #[must_use]
    pub fn dropped_events(&self) -> u32 {
        self.dropped_events.load(Ordering::Relaxed)
    }
}

impl Default for ScanChannels {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-blocking command sender used by the UI.
#[derive(Copy, Clone)]
pub struct CommandPort<'a> {
    channels: &'a ScanChannels,
}

impl<'a> CommandPort<'a> {
    #[must_use]
    pub fn sender(&self) -> CommandSender<'a> {
        self.channels.commands.sender()
    }
}

impl QueueProducer for CommandPort<'_> {
    type Item = ScanCommand;

    fn try_enqueue(&mut self, command: ScanCommand) -> Result<(), QueueError> {
        match self.channels.commands.try_send(command) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(command)) => {
                self.channels.dropped_commands.fetch_add(1, Ordering::Relaxed);
                log::command_dropped(command.label());
                Err(QueueError::Full)
            }
        }
    }

    fn capacity(&self) -> Option<usize> {
        Some(COMMAND_QUEUE_DEPTH)
    }

    fn len(&self) -> Option<usize> {
        Some(self.channels.commands.len())
    }
}

/// Event sender shared by the orchestrator and the BLE worker.
#[derive(Copy, Clone)]
pub struct EventPort<'a> {
    channels: &'a ScanChannels,
}

impl EventPort<'_> {
    /// Posts an event using its delivery class.
    ///
    /// Lifecycle events wait for queue space; per-item events are dropped
    /// when the queue is full.
    pub async fn post(&self, event: ScanEvent) {
        if event.is_lifecycle() {
            self.channels.events.send(event).await;
        } else {
            // Dropped items are counted and logged inside.
            let _ = self.try_post(event);
        }
    }

    /// Non-blocking send; counts and logs a drop on a full queue.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Full`] when the event was dropped.
    pub fn try_post(&self, event: ScanEvent) -> Result<(), QueueError> {
        match self.channels.events.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(event)) => {
                self.channels.dropped_events.fetch_add(1, Ordering::Relaxed);
                log::event_dropped(event.label());
                Err(QueueError::Full)
            }
        }
    }
}
