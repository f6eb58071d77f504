use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::info;

use super::emit;
use super::service::{ServiceResult, UpdatesService};
use crate::execution::{Procedure, ProcedureCompletion, ProcedureContext};
use crate::logging::log_error;
use crate::state_machine::StateEvent;

/// Relaunch into the downloaded update.
///
/// The state returns to `Idle` afterwards whether or not the relaunch
/// succeeded; `Restarting` has no outgoing transition of its own.
///
/// The reset also clears the context, so after a failed relaunch
/// `downloaded_manifest` and `is_update_pending` no longer report the update
/// that is still on disk. Callers that retry should run a fresh check first.
pub struct RelaunchProcedure {
    service: Arc<dyn UpdatesService>,
    reply: Option<oneshot::Sender<ServiceResult<()>>>,
}

impl RelaunchProcedure {
    pub fn new(service: Arc<dyn UpdatesService>) -> Self {
        Self {
            service,
            reply: None,
        }
    }

    pub fn with_reply(mut self, reply: oneshot::Sender<ServiceResult<()>>) -> Self {
        self.reply = Some(reply);
        self
    }
}

#[async_trait]
impl Procedure for RelaunchProcedure {
    fn name(&self) -> &str {
        "relaunch"
    }

    async fn run(self: Box<Self>, context: Arc<dyn ProcedureContext>, completion: ProcedureCompletion) {
        let Self { service, reply } = *self;

        emit(context.as_ref(), "relaunch", StateEvent::restart());
        let result = service.relaunch().await;

        match &result {
            Ok(()) => info!("Relaunched into downloaded update"),
            Err(e) => log_error("relaunch_procedure", "relaunch", e.message(), None),
        }
        context.reset_state();

        if let Some(reply) = reply {
            let _ = reply.send(result);
        }
        completion.complete();
    }
}
