//! # Access Event Bus
//!
//! Observability channel between workers and external logging.
//!
//! ```text
//! ┌─────────────┐      ┌─────────────┐      ┌─────────────┐
//! │   Workers   │─────>│   Event     │─────>│   Logger /  │
//! │ (R/W pools) │      │   Channel   │      │   Summary   │
//! └─────────────┘      └─────────────┘      └─────────────┘
//! ```
//!
//! Events are diagnostics only: dropping every one of them changes nothing
//! about the arbitration. The channel is bounded and sends are
//! drop-on-full, so a slow consumer can never stall a worker.

use crossbeam_channel::{bounded, Receiver, Sender};
use turngate_core::Phase;

use crate::worker::Role;

/// One entry/exit observation from a worker's section.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccessEvent {
    /// Numeric id of the worker.
    pub id: u32,
    /// The worker's role.
    pub role: Role,
    /// Whether the worker entered or exited its section.
    pub kind: AccessKind,
    /// Phase observed right after the entry or exit completed.
    pub phase: Phase,
    /// Active-reader count observed right after the entry or exit.
    pub active_readers: u32,
}

/// Entry or exit of a section.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessKind {
    /// The worker completed its enter call.
    Entered,
    /// The worker completed its exit.
    Exited,
}

/// Owner of the event channel's two ends.
///
/// Hand [`sender`](Self::sender) clones to as many workers as needed and
/// keep one [`receiver`](Self::receiver) wherever the run is observed.
/// The bus itself can be dropped once the handles are out; the channel
/// lives as long as any handle does.
pub struct EventBus {
    tx: Sender<AccessEvent>,
    rx: Receiver<AccessEvent>,
}

impl EventBus {
    /// Allocates the channel with a fixed capacity, chosen once at
    /// startup. Capacity bounds memory; overflow drops events, never
    /// blocks workers.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        Self { tx, rx }
    }

    /// A producer handle. Clone freely, one per worker.
    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender { tx: self.tx.clone() }
    }

    /// A consumer handle for draining what the workers emitted.
    #[must_use]
    pub fn receiver(&self) -> EventReceiver {
        EventReceiver { rx: self.rx.clone() }
    }
}

/// Handle for emitting access events.
#[derive(Clone)]
pub struct EventSender {
    tx: Sender<AccessEvent>,
}

impl EventSender {
    /// Emits an event without ever blocking.
    ///
    /// Returns `false` when the event was dropped - channel full or the
    /// consumer is gone. Either way the worker moves on.
    #[inline]
    pub fn send(&self, event: AccessEvent) -> bool {
        self.tx.try_send(event).is_ok()
    }
}

/// Handle for draining access events.
#[derive(Clone)]
pub struct EventReceiver {
    rx: Receiver<AccessEvent>,
}

impl EventReceiver {
    /// Receives one buffered event, if any.
    #[inline]
    #[must_use]
    pub fn try_recv(&self) -> Option<AccessEvent> {
        self.rx.try_recv().ok()
    }

    /// Drains everything currently buffered.
    #[must_use]
    pub fn drain(&self) -> Vec<AccessEvent> {
        self.rx.try_iter().collect()
    }
}
