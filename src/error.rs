use thiserror::Error;

use crate::config::ConfigurationError;
use crate::execution::ExecutorError;
use crate::procedures::ServiceError;
use crate::state_machine::{PersistenceError, StateMachineError};

/// Top-level error for the updates core
#[derive(Error, Debug)]
pub enum UpdatesCoreError {
    #[error("State machine error: {0}")]
    StateMachine(#[from] StateMachineError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Executor error: {0}")]
    Executor(#[from] ExecutorError),

    #[error("Update service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Procedure {0} finished without replying")]
    NoReply(String),
}

pub type Result<T> = std::result::Result<T, UpdatesCoreError>;
