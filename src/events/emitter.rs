//! Bridge-facing delivery of state changes.
//!
//! The bridge listener usually attaches some time after the native side has
//! started processing events (the JS runtime boots later than the first
//! startup check). [`BufferedEventSender`] holds changes until a sink is
//! attached and then replays them in order.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::publisher::StateChangeEvent;

/// Consumer of state changes, typically a JS bridge event emitter.
///
/// [`BufferedEventSender`] replays its queue to a newly attached sink while
/// holding its lock, so a sink must not call back into the sender it is
/// being attached to from that replay. Live sends are made outside the lock.
pub trait StateChangeSender: Send + Sync {
    fn send_state_change(&self, event: &StateChangeEvent);
}

struct BufferState {
    sink: Option<Arc<dyn StateChangeSender>>,
    queued: VecDeque<StateChangeEvent>,
}

/// Sender that queues changes while no sink is attached
pub struct BufferedEventSender {
    state: Mutex<BufferState>,
    limit: usize,
}

impl BufferedEventSender {
    /// Create a sender that keeps at most `limit` undelivered events
    pub fn new(limit: usize) -> Self {
        Self {
            state: Mutex::new(BufferState {
                sink: None,
                queued: VecDeque::new(),
            }),
            limit: limit.max(1),
        }
    }

    /// Attach a sink, replaying queued events to it first.
    ///
    /// The sink must not call back into this sender.
    pub fn attach(&self, sink: Arc<dyn StateChangeSender>) {
        let mut state = self.state.lock();
        if !state.queued.is_empty() {
            info!(count = state.queued.len(), "Replaying queued state changes to bridge");
        }
        for event in state.queued.drain(..) {
            sink.send_state_change(&event);
        }
        state.sink = Some(sink);
    }

    /// Detach the current sink; later events are queued again
    pub fn detach(&self) {
        self.state.lock().sink = None;
    }

    pub fn is_attached(&self) -> bool {
        self.state.lock().sink.is_some()
    }

    /// Number of events waiting for a sink
    pub fn buffered_len(&self) -> usize {
        self.state.lock().queued.len()
    }
}

impl StateChangeSender for BufferedEventSender {
    fn send_state_change(&self, event: &StateChangeEvent) {
        let mut state = self.state.lock();

        let attached = state.sink.clone();
        if let Some(sink) = attached {
            drop(state);
            sink.send_state_change(event);
            return;
        }

        if state.queued.len() >= self.limit {
            if let Some(dropped) = state.queued.pop_front() {
                warn!(
                    limit = self.limit,
                    sequence_number = dropped.context.sequence_number,
                    "State change buffer full; dropping oldest event"
                );
            }
        }
        debug!(
            state = %event.state,
            "No bridge sink attached; state change added to queue"
        );
        state.queued.push_back(event.clone());
    }
}

impl Default for BufferedEventSender {
    fn default() -> Self {
        Self::new(64)
    }
}
