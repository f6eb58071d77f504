use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

use super::context::UpdatesStateContext;
use super::errors::StateMachineResult;
use super::events::{EventType, StateEvent};
use super::persistence::{InMemoryErrorStore, LastErrorStore};
use super::states::StateValue;
use super::transitions;
use crate::events::{EventPublisher, StateChangeEvent, StateChangeSender};
use crate::execution::ProcedureContext;
use crate::logging::{log_error, log_state_transition};

/// What to do with an event that is not legal for the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IllegalTransitionPolicy {
    /// Log a warning and return `InvalidTransition`
    #[default]
    Reject,
    /// Panic in debug builds; behave like `Reject` in release builds
    DebugAssert,
}

struct MachineState {
    value: StateValue,
    context: UpdatesStateContext,
}

/// Owner of the current updates state.
///
/// Mutated only through [`ProcedureContext`], i.e. from the procedure the
/// serial executor is currently running. Every accepted change is published
/// to the broadcast publisher and, when one is configured, the bridge sender.
pub struct UpdatesStateMachine {
    inner: Mutex<MachineState>,
    publisher: EventPublisher,
    bridge: Option<Arc<dyn StateChangeSender>>,
    error_store: Arc<dyn LastErrorStore>,
    policy: IllegalTransitionPolicy,
}

impl UpdatesStateMachine {
    /// Create a new state machine starting in `Idle`
    pub fn new(publisher: EventPublisher, error_store: Arc<dyn LastErrorStore>) -> Self {
        Self {
            inner: Mutex::new(MachineState {
                value: StateValue::default(),
                context: UpdatesStateContext::default(),
            }),
            publisher,
            bridge: None,
            error_store,
            policy: IllegalTransitionPolicy::default(),
        }
    }

    /// Also deliver state changes to a bridge sender
    pub fn with_bridge(mut self, bridge: Arc<dyn StateChangeSender>) -> Self {
        self.bridge = Some(bridge);
        self
    }

    pub fn with_policy(mut self, policy: IllegalTransitionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Current state, for observers outside the executor
    pub fn state(&self) -> StateValue {
        self.inner.lock().value
    }

    /// Snapshot of the published context
    pub fn context(&self) -> UpdatesStateContext {
        self.inner.lock().context.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateChangeEvent> {
        self.publisher.subscribe()
    }

    /// Replay the error persisted by a previous session, once.
    ///
    /// The error is folded into the context and published; the state itself
    /// is left untouched. Returns the restored event.
    pub fn restore_last_error(&self) -> StateMachineResult<Option<StateEvent>> {
        let Some(event) = self.error_store.consume_last_error()? else {
            return Ok(None);
        };

        let change = {
            let mut inner = self.inner.lock();
            match event.event_type() {
                EventType::CheckError => inner.context.check_error = event.error(),
                EventType::DownloadError => inner.context.download_error = event.error(),
                _ => {}
            }
            inner.context.next_sequence();
            StateChangeEvent::new(Some(event.event_type()), inner.value, inner.context.clone())
        };

        info!(
            event_type = %event.event_type(),
            error = event.error_message().unwrap_or_default(),
            "Restored last error from previous session"
        );
        self.publish(change);
        Ok(Some(event))
    }

    fn publish(&self, change: StateChangeEvent) {
        if let Some(bridge) = &self.bridge {
            bridge.send_state_change(&change);
        }
        self.publisher.publish(change);
    }

    fn persist_error(&self, event: &StateEvent) {
        if let Err(e) = self.error_store.save(event) {
            log_error(
                "updates_state_machine",
                "persist_error",
                &e.to_string(),
                Some(event.event_type().as_str()),
            );
        }
    }
}

impl ProcedureContext for UpdatesStateMachine {
    fn process_state_event(&self, event: StateEvent) -> StateMachineResult<StateValue> {
        let event_type = event.event_type();

        let (from, to, change) = {
            let mut inner = self.inner.lock();
            let from = inner.value;

            let to = match transitions::transition(from, &event) {
                Ok(to) => to,
                Err(err) => {
                    warn!(
                        from = %from,
                        event_type = %event_type,
                        "Rejected illegal updates state transition"
                    );
                    if self.policy == IllegalTransitionPolicy::DebugAssert
                        && cfg!(debug_assertions)
                    {
                        panic!("{err}");
                    }
                    return Err(err);
                }
            };

            inner.value = to;
            inner.context.apply(&event);
            inner.context.next_sequence();
            (
                from,
                to,
                StateChangeEvent::new(Some(event_type), to, inner.context.clone()),
            )
        };

        log_state_transition(from, to, event_type, change.context.sequence_number);

        if event_type.is_error() {
            self.persist_error(&event);
        }
        self.publish(change);

        Ok(to)
    }

    fn current_state(&self) -> StateValue {
        self.state()
    }

    fn reset_state(&self) {
        let (from, change) = {
            let mut inner = self.inner.lock();
            let from = inner.value;
            inner.value = StateValue::Idle;
            inner.context.reset();
            inner.context.next_sequence();
            (
                from,
                StateChangeEvent::new(None, StateValue::Idle, inner.context.clone()),
            )
        };

        info!(from = %from, "Updates state reset to idle");
        self.publish(change);
    }
}

impl Default for UpdatesStateMachine {
    fn default() -> Self {
        Self::new(EventPublisher::default(), Arc::new(InMemoryErrorStore::new()))
    }
}
