use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::oneshot;

use super::emit;
use super::service::{FetchOutcome, ServiceResult, UpdatesService};
use crate::execution::{Procedure, ProcedureCompletion, ProcedureContext};
use crate::state_machine::StateEvent;

/// Download the update the server currently offers
pub struct FetchUpdateProcedure {
    service: Arc<dyn UpdatesService>,
    reply: Option<oneshot::Sender<ServiceResult<FetchOutcome>>>,
}

impl FetchUpdateProcedure {
    pub fn new(service: Arc<dyn UpdatesService>) -> Self {
        Self {
            service,
            reply: None,
        }
    }

    pub fn with_reply(mut self, reply: oneshot::Sender<ServiceResult<FetchOutcome>>) -> Self {
        self.reply = Some(reply);
        self
    }
}

/// Map a fetch result to the event that closes the `Downloading` phase
pub(crate) fn fetch_result_event(result: &ServiceResult<FetchOutcome>) -> StateEvent {
    match result {
        Ok(FetchOutcome::NoNewUpdate) => StateEvent::download_complete(),
        Ok(FetchOutcome::Fetched(manifest)) => {
            StateEvent::download_complete_with_update(manifest.clone())
        }
        Ok(FetchOutcome::RollBackToEmbedded) => StateEvent::download_complete_with_rollback(),
        Err(e) => StateEvent::download_error(e.message()),
    }
}

#[async_trait]
impl Procedure for FetchUpdateProcedure {
    fn name(&self) -> &str {
        "fetch_update"
    }

    async fn run(self: Box<Self>, context: Arc<dyn ProcedureContext>, completion: ProcedureCompletion) {
        let Self { service, reply } = *self;

        emit(context.as_ref(), "fetch_update", StateEvent::download());
        let result = service.fetch_update().await;
        emit(context.as_ref(), "fetch_update", fetch_result_event(&result));

        if let Some(reply) = reply {
            let _ = reply.send(result);
        }
        completion.complete();
    }
}
