//! State machine holder tests
//!
//! Transition table completeness, context flags and publication, checked
//! through the same `ProcedureContext` facade procedures use.

mod common;

use common::*;
use std::sync::Arc;

use updates_core::events::EventPublisher;
use updates_core::execution::ProcedureContext;
use updates_core::state_machine::{
    EventType, InMemoryErrorStore, StateEvent, StateMachineError, StateValue, UpdatesStateMachine,
};

/// Legal pairs, written out independently of the implementation
fn expected_next(from: StateValue, event_type: EventType) -> Option<StateValue> {
    use EventType::*;
    use StateValue::*;

    match (from, event_type) {
        (_, Restart) => Some(Restarting),
        (Idle, Check) => Some(Checking),
        (Idle | Checking, Download) => Some(Downloading),
        (Checking, CheckCompleteAvailable | CheckCompleteUnavailable | CheckError) => Some(Idle),
        (Downloading, DownloadComplete | DownloadError) => Some(Idle),
        _ => None,
    }
}

#[test]
fn test_transition_table_is_complete() {
    for from in StateValue::ALL {
        for event_type in EventType::ALL {
            let machine = machine_in(from);
            let result = machine.process_state_event(event_of(event_type));

            match expected_next(from, event_type) {
                Some(to) => {
                    assert_eq!(result.unwrap(), to, "{from} + {event_type}");
                    assert_eq!(machine.state(), to);
                }
                None => {
                    assert!(
                        matches!(
                            result,
                            Err(StateMachineError::InvalidTransition { from: f, event: e })
                                if f == from && e == event_type
                        ),
                        "{from} + {event_type} should be rejected"
                    );
                    assert_eq!(machine.state(), from, "{from} + {event_type} changed state");
                }
            }
        }
    }
}

#[test]
fn test_idle_checking_idle_round_trip() {
    let machine = UpdatesStateMachine::default();
    let mut changes = machine.subscribe();

    machine.process_state_event(StateEvent::check()).unwrap();
    assert_eq!(machine.state(), StateValue::Checking);
    machine
        .process_state_event(StateEvent::check_complete_unavailable())
        .unwrap();
    assert_eq!(machine.state(), StateValue::Idle);

    let states: Vec<_> = drain_changes(&mut changes).iter().map(|c| c.state).collect();
    assert_eq!(states, vec![StateValue::Checking, StateValue::Idle]);
}

#[test]
fn test_check_error_returns_to_idle_without_rollback() {
    let machine = machine_in(StateValue::Checking);
    let event = StateEvent::check_error("network down");

    assert_eq!(event.error_message(), Some("network down"));
    assert!(!event.is_rollback());

    machine.process_state_event(event).unwrap();
    assert_eq!(machine.state(), StateValue::Idle);

    let context = machine.context();
    assert_eq!(
        context.check_error.as_ref().map(|e| e.message()),
        Some("network down")
    );
    assert!(!context.is_rollback);
    assert!(!context.is_checking);
}

#[test]
fn test_rollback_flags_propagate() {
    let machine = machine_in(StateValue::Checking);
    machine
        .process_state_event(StateEvent::check_complete_with_rollback())
        .unwrap();
    assert_eq!(machine.state(), StateValue::Idle);
    assert!(machine.context().is_rollback);
    assert!(machine.context().is_update_available);

    let machine = machine_in(StateValue::Downloading);
    machine
        .process_state_event(StateEvent::download_complete_with_rollback())
        .unwrap();
    assert_eq!(machine.state(), StateValue::Idle);
    assert!(machine.context().is_rollback);
    assert!(machine.context().is_update_pending);
}

#[test]
fn test_restart_reachable_from_every_state() {
    for from in [StateValue::Idle, StateValue::Checking, StateValue::Downloading] {
        let machine = machine_in(from);
        assert_eq!(
            machine.process_state_event(StateEvent::restart()).unwrap(),
            StateValue::Restarting
        );
        assert!(machine.context().is_restarting);
    }
}

#[test]
fn test_duplicate_check_and_download_are_rejected() {
    let machine = machine_in(StateValue::Checking);
    assert!(machine
        .process_state_event(StateEvent::check())
        .unwrap_err()
        .is_invalid_transition());

    let machine = machine_in(StateValue::Downloading);
    assert!(machine
        .process_state_event(StateEvent::download())
        .unwrap_err()
        .is_invalid_transition());
}

#[test]
fn test_rejected_events_are_not_published() {
    let machine = UpdatesStateMachine::default();
    let mut changes = machine.subscribe();

    let _ = machine.process_state_event(StateEvent::download_complete());
    let _ = machine.process_state_event(StateEvent::check_error("late"));

    assert!(drain_changes(&mut changes).is_empty());
    assert_eq!(machine.context().sequence_number, 0);
}

#[test]
fn test_every_change_reaches_bridge_with_increasing_sequence() {
    let sink = Arc::new(RecordingSink::default());
    let machine = UpdatesStateMachine::new(
        EventPublisher::default(),
        Arc::new(InMemoryErrorStore::new()),
    )
    .with_bridge(sink.clone());

    machine.process_state_event(StateEvent::check()).unwrap();
    machine
        .process_state_event(StateEvent::check_complete_with_update(manifest("u7")))
        .unwrap();
    machine.process_state_event(StateEvent::restart()).unwrap();
    machine.reset_state();

    let received = sink.received();
    assert_eq!(
        event_types(&received),
        vec![
            Some(EventType::Check),
            Some(EventType::CheckCompleteAvailable),
            Some(EventType::Restart),
            None,
        ]
    );
    let sequence: Vec<_> = received.iter().map(|c| c.context.sequence_number).collect();
    assert_eq!(sequence, vec![1, 2, 3, 4]);

    let payload = received[1].to_bridge_payload();
    assert_eq!(payload["context"]["latestManifest"]["id"], "u7");
}

#[test]
#[allow(deprecated)]
fn test_current_state_matches_holder() {
    let machine = machine_in(StateValue::Downloading);
    let context: &dyn ProcedureContext = &machine;
    assert_eq!(context.current_state(), StateValue::Downloading);
}
