use super::events::EventType;
use super::states::StateValue;
use thiserror::Error;

/// Error types for state machine operations
#[derive(Error, Debug)]
pub enum StateMachineError {
    #[error("Invalid state transition: {event} is not legal from {from}")]
    InvalidTransition { from: StateValue, event: EventType },

    #[error("Persistence operation failed: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StateMachineError {
    /// Check if this error was caused by an event that is illegal for the current state
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::InvalidTransition { .. })
    }
}

/// Error type for last-error persistence
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Error store I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for state machine operations
pub type StateMachineResult<T> = Result<T, StateMachineError>;
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Helper function to create invalid transition errors
pub fn invalid_transition(from: StateValue, event: EventType) -> StateMachineError {
    StateMachineError::InvalidTransition { from, event }
}
