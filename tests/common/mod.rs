#![allow(dead_code)]

pub mod mock_service;
pub mod strategies;

pub use mock_service::*;
pub use strategies::*;

use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::broadcast;

use updates_core::events::{StateChangeEvent, StateChangeSender};
use updates_core::execution::ProcedureContext;
use updates_core::state_machine::{EventType, Manifest, StateEvent, StateValue, UpdatesStateMachine};

/// A manifest carrying only an id
pub fn manifest(id: &str) -> Manifest {
    Manifest::new(json!({ "id": id, "createdAt": "2026-10-01T00:00:00Z" }))
}

/// A representative event for each event type
pub fn event_of(event_type: EventType) -> StateEvent {
    match event_type {
        EventType::Check => StateEvent::check(),
        EventType::CheckCompleteAvailable => StateEvent::check_complete_with_update(manifest("u1")),
        EventType::CheckCompleteUnavailable => StateEvent::check_complete_unavailable(),
        EventType::CheckError => StateEvent::check_error("network down"),
        EventType::Download => StateEvent::download(),
        EventType::DownloadComplete => StateEvent::download_complete_with_update(manifest("u1")),
        EventType::DownloadError => StateEvent::download_error("disk full"),
        EventType::Restart => StateEvent::restart(),
    }
}

/// A fresh machine driven into `state` through legal events
pub fn machine_in(state: StateValue) -> UpdatesStateMachine {
    let machine = UpdatesStateMachine::default();
    let setup = match state {
        StateValue::Idle => None,
        StateValue::Checking => Some(StateEvent::check()),
        StateValue::Downloading => Some(StateEvent::download()),
        StateValue::Restarting => Some(StateEvent::restart()),
    };
    if let Some(event) = setup {
        machine
            .process_state_event(event)
            .expect("setup event should be legal from idle");
    }
    assert_eq!(machine.state(), state);
    machine
}

/// Everything currently buffered on a state change subscription
pub fn drain_changes(rx: &mut broadcast::Receiver<StateChangeEvent>) -> Vec<StateChangeEvent> {
    let mut changes = Vec::new();
    while let Ok(change) = rx.try_recv() {
        changes.push(change);
    }
    changes
}

/// Event types of a list of changes; resets show up as `None`
pub fn event_types(changes: &[StateChangeEvent]) -> Vec<Option<EventType>> {
    changes.iter().map(|c| c.event_type).collect()
}

/// Bridge sink that keeps every change it is handed
#[derive(Default)]
pub struct RecordingSink {
    received: Mutex<Vec<StateChangeEvent>>,
}

impl RecordingSink {
    pub fn received(&self) -> Vec<StateChangeEvent> {
        self.received.lock().clone()
    }
}

impl StateChangeSender for RecordingSink {
    fn send_state_change(&self, event: &StateChangeEvent) {
        self.received.lock().push(event.clone());
    }
}

/// Wrap a machine as the executor's context
pub fn as_context(machine: &Arc<UpdatesStateMachine>) -> Arc<dyn ProcedureContext> {
    machine.clone()
}
