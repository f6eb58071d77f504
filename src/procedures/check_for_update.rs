use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::oneshot;

use super::emit;
use super::service::{CheckOutcome, ServiceResult, UpdatesService};
use crate::execution::{Procedure, ProcedureCompletion, ProcedureContext};
use crate::state_machine::StateEvent;

/// Ask the update server whether a newer update (or a rollback) is available
pub struct CheckForUpdateProcedure {
    service: Arc<dyn UpdatesService>,
    reply: Option<oneshot::Sender<ServiceResult<CheckOutcome>>>,
}

impl CheckForUpdateProcedure {
    pub fn new(service: Arc<dyn UpdatesService>) -> Self {
        Self {
            service,
            reply: None,
        }
    }

    /// Send the outcome to `reply` once the check has finished
    pub fn with_reply(mut self, reply: oneshot::Sender<ServiceResult<CheckOutcome>>) -> Self {
        self.reply = Some(reply);
        self
    }
}

/// Map a check result to the event that closes the `Checking` phase
pub(crate) fn check_result_event(result: &ServiceResult<CheckOutcome>) -> StateEvent {
    match result {
        Ok(CheckOutcome::NoUpdateAvailable) => StateEvent::check_complete_unavailable(),
        Ok(CheckOutcome::UpdateAvailable(manifest)) => {
            StateEvent::check_complete_with_update(manifest.clone())
        }
        Ok(CheckOutcome::RollBackToEmbedded) => StateEvent::check_complete_with_rollback(),
        Err(e) => StateEvent::check_error(e.message()),
    }
}

#[async_trait]
impl Procedure for CheckForUpdateProcedure {
    fn name(&self) -> &str {
        "check_for_update"
    }

    async fn run(self: Box<Self>, context: Arc<dyn ProcedureContext>, completion: ProcedureCompletion) {
        let Self { service, reply } = *self;

        emit(context.as_ref(), "check_for_update", StateEvent::check());
        let result = service.check_for_update().await;
        emit(context.as_ref(), "check_for_update", check_result_event(&result));

        if let Some(reply) = reply {
            // The caller may have stopped waiting
            let _ = reply.send(result);
        }
        completion.complete();
    }
}
