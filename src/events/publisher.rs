use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::broadcast;

use crate::state_machine::{EventType, StateValue, UpdatesStateContext};

/// Name under which state changes are emitted to the bridge
pub const STATE_CHANGE_EVENT_NAME: &str = "updates.state_change";

/// A state change that has been accepted by the state machine holder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChangeEvent {
    /// Event that caused the change; `None` for a reset
    pub event_type: Option<EventType>,
    pub state: StateValue,
    pub context: UpdatesStateContext,
    pub published_at: DateTime<Utc>,
}

impl StateChangeEvent {
    pub fn new(
        event_type: Option<EventType>,
        state: StateValue,
        context: UpdatesStateContext,
    ) -> Self {
        Self {
            event_type,
            state,
            context,
            published_at: Utc::now(),
        }
    }

    /// Flat payload handed to the JS bridge listener
    pub fn to_bridge_payload(&self) -> Value {
        json!({
            "type": self.event_type.map_or("reset", |t| t.as_str()),
            "state": self.state.to_string(),
            "context": self.context,
            "timestamp": self.published_at.to_rfc3339(),
        })
    }
}

/// Broadcast publisher for state changes
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<StateChangeEvent>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish a state change to every current subscriber
    pub fn publish(&self, event: StateChangeEvent) {
        // send() only fails when nobody is subscribed, which is not an error here
        let _ = self.sender.send(event);
    }

    /// Subscribe to state changes published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<StateChangeEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(256)
    }
}
