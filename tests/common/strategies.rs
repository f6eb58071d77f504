use proptest::prelude::*;

use updates_core::state_machine::{EventType, StateEvent};

use super::manifest;

/// Strategy for generating any event type
pub fn event_type_strategy() -> impl Strategy<Value = EventType> {
    prop::sample::select(EventType::ALL.to_vec())
}

/// Strategy for generating events, including rollback and payload variants
pub fn state_event_strategy() -> impl Strategy<Value = StateEvent> {
    prop_oneof![
        Just(StateEvent::check()),
        Just(StateEvent::download()),
        Just(StateEvent::restart()),
        Just(StateEvent::check_complete_unavailable()),
        "[a-z0-9]{1,8}".prop_map(|id| StateEvent::check_complete_with_update(manifest(&id))),
        Just(StateEvent::check_complete_with_rollback()),
        "[a-zA-Z ]{1,24}".prop_map(|message| StateEvent::check_error(message)),
        Just(StateEvent::download_complete()),
        "[a-z0-9]{1,8}".prop_map(|id| StateEvent::download_complete_with_update(manifest(&id))),
        Just(StateEvent::download_complete_with_rollback()),
        "[a-zA-Z ]{1,24}".prop_map(|message| StateEvent::download_error(message)),
    ]
}

/// Strategy for generating event sequences, with occasional resets (`None`)
pub fn event_sequence_strategy() -> impl Strategy<Value = Vec<Option<StateEvent>>> {
    prop::collection::vec(
        prop_oneof![9 => state_event_strategy().prop_map(Some), 1 => Just(None)],
        0..40,
    )
}
