//! # Execution
//!
//! The serial executor and the procedure contract it runs.

pub mod errors;
pub mod procedure;
pub mod serial_queue;

pub use errors::{ExecutorError, ExecutorResult};
pub use procedure::{
    procedure_fn, FnProcedure, Procedure, ProcedureCompletion, ProcedureContext, ProcedureId,
};
pub use serial_queue::SerialExecutorQueue;
