//! Pure transition function for the updates state machine.
//!
//! ```text
//! Idle ──check──► Checking ──check_complete_* / check_error──► Idle
//! Idle | Checking ──download──► Downloading ──download_complete / download_error──► Idle
//! any ──restart──► Restarting
//! ```
//!
//! Every pair not listed is illegal and is reported as
//! [`StateMachineError::InvalidTransition`]; it is never applied.

use super::errors::{invalid_transition, StateMachineResult};
use super::events::{EventType, StateEvent};
use super::states::StateValue;

/// Look up the next state for a `(state, event type)` pair.
///
/// Returns `None` when the pair is not in the legality table.
pub fn next_state(current: StateValue, event_type: EventType) -> Option<StateValue> {
    use EventType as E;
    use StateValue as S;

    let next = match (current, event_type) {
        (S::Idle, E::Check) => S::Checking,

        (S::Checking, E::CheckCompleteAvailable) => S::Idle,
        (S::Checking, E::CheckCompleteUnavailable) => S::Idle,
        (S::Checking, E::CheckError) => S::Idle,

        (S::Idle, E::Download) => S::Downloading,
        (S::Checking, E::Download) => S::Downloading,

        (S::Downloading, E::DownloadComplete) => S::Idle,
        (S::Downloading, E::DownloadError) => S::Idle,

        (_, E::Restart) => S::Restarting,

        _ => return None,
    };

    Some(next)
}

/// Check whether an event type is legal from the given state
pub fn is_legal(current: StateValue, event_type: EventType) -> bool {
    next_state(current, event_type).is_some()
}

/// Compute the state that results from applying `event` to `current`
pub fn transition(current: StateValue, event: &StateEvent) -> StateMachineResult<StateValue> {
    next_state(current, event.event_type())
        .ok_or_else(|| invalid_transition(current, event.event_type()))
}

/// All legal `(from, event, to)` triples
pub fn legal_transitions() -> Vec<(StateValue, EventType, StateValue)> {
    StateValue::ALL
        .into_iter()
        .flat_map(|from| {
            EventType::ALL
                .into_iter()
                .filter_map(move |event| next_state(from, event).map(|to| (from, event, to)))
        })
        .collect()
}
