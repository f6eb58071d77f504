use thiserror::Error;

/// Errors raised by the serial executor itself
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("Serial executor requires a running Tokio runtime")]
    NoRuntime,

    #[error("Serial executor worker has stopped; procedure {procedure} was not queued")]
    WorkerStopped { procedure: String },
}

pub type ExecutorResult<T> = Result<T, ExecutorError>;
