// State machine module for the updates lifecycle
//
// A flat four-state machine (idle, checking, downloading, restarting) with a
// pure transition function, the context published alongside each state, and
// the holder that procedures mutate through their ProcedureContext.

pub mod context;
pub mod errors;
pub mod events;
pub mod persistence;
pub mod states;
pub mod transitions;
pub mod updates_state_machine;

// Re-export main types for convenient access
pub use context::UpdatesStateContext;
pub use errors::{PersistenceError, StateMachineError, StateMachineResult};
pub use events::{EventType, Manifest, StateEvent, UpdateError};
pub use persistence::{FileErrorStore, InMemoryErrorStore, LastErrorStore};
pub use states::StateValue;
pub use transitions::{is_legal, next_state, transition};
pub use updates_state_machine::{IllegalTransitionPolicy, UpdatesStateMachine};
