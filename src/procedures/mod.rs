//! # Built-in Procedures
//!
//! Procedures that drive an external [`UpdatesService`] and report progress
//! as state events. Each one is event-driven: it emits the events matching
//! its own phase and never branches on the current state.

pub mod check_for_update;
pub mod fetch_update;
pub mod relaunch;
pub mod service;
pub mod startup;

pub use check_for_update::CheckForUpdateProcedure;
pub use fetch_update::FetchUpdateProcedure;
pub use relaunch::RelaunchProcedure;
pub use service::{
    CheckOutcome, FetchOutcome, ServiceError, ServiceResult, UpdatesService,
};
pub use startup::StartupProcedure;

use tracing::debug;

use crate::execution::ProcedureContext;
use crate::state_machine::StateEvent;

/// Forward an event, noting rejections against the emitting procedure
fn emit(context: &dyn ProcedureContext, procedure: &str, event: StateEvent) {
    let event_type = event.event_type();
    if let Err(e) = context.process_state_event(event) {
        debug!(
            procedure = %procedure,
            event_type = %event_type,
            error = %e,
            "Procedure event was not applied"
        );
    }
}
