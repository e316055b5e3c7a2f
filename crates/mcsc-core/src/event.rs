//! Frame lifecycle events
//!
//! Interrupt handlers never call back into the frame owner directly. They
//! enqueue a [`FrameEvent`] on a bounded channel that the owning pipeline
//! drains from task context.

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::frame::{DoneType, FrameId};
use crate::types::{EngineId, OutputMask};

/// Default number of events buffered before new ones are dropped
pub const FRAME_EVENT_QUEUE_CAPACITY: usize = 64;

/// Notification sent to the frame owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    /// First sub-frame of a request started
    Start {
        engine: EngineId,
        instance: u32,
        fcount: u32,
        frame: FrameId,
    },
    /// Outputs of a request completed
    Done {
        engine: EngineId,
        instance: u32,
        fcount: u32,
        frame: FrameId,
        outputs: OutputMask,
        result: DoneType,
    },
    /// The engine finished a request that had no output to report
    CoreEnd {
        engine: EngineId,
        instance: u32,
        fcount: u32,
        result: DoneType,
    },
}

/// The sender side, held by each engine
#[derive(Clone)]
pub struct FrameEventSender {
    tx: Sender<FrameEvent>,
    dropped: Arc<AtomicU64>,
}

impl FrameEventSender {
    /// Enqueue an event without blocking. Returns false if it was dropped.
    pub fn send(&self, event: FrameEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("frame event queue full, dropping {:?}", event);
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::debug!("frame event receiver gone");
                false
            }
        }
    }
}

/// The receiver side, held by the pipeline that owns the frames
pub struct FrameEventReceiver {
    rx: Receiver<FrameEvent>,
    dropped: Arc<AtomicU64>,
}

impl FrameEventReceiver {
    pub fn try_recv(&self) -> Option<FrameEvent> {
        self.rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<FrameEvent> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Take every pending event
    pub fn drain(&self) -> Vec<FrameEvent> {
        self.rx.try_iter().collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.rx.is_empty()
    }

    /// Events lost to a full queue
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Create a bounded event channel
pub fn create_frame_event_channel(capacity: usize) -> (FrameEventSender, FrameEventReceiver) {
    let (tx, rx) = channel::bounded(capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));
    (
        FrameEventSender {
            tx,
            dropped: Arc::clone(&dropped),
        },
        FrameEventReceiver { rx, dropped },
    )
}
