use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::check_for_update::check_result_event;
use super::emit;
use super::fetch_update::fetch_result_event;
use super::service::UpdatesService;
use crate::execution::{Procedure, ProcedureCompletion, ProcedureContext};
use crate::state_machine::StateEvent;

/// Launch-time check, followed by a download when the check finds something.
///
/// Each phase emits its own closing event, so a failure during the check is
/// reported as `CheckError` and a failure during the download as
/// `DownloadError` without consulting the current state.
pub struct StartupProcedure {
    service: Arc<dyn UpdatesService>,
}

impl StartupProcedure {
    pub fn new(service: Arc<dyn UpdatesService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Procedure for StartupProcedure {
    fn name(&self) -> &str {
        "startup"
    }

    async fn run(self: Box<Self>, context: Arc<dyn ProcedureContext>, completion: ProcedureCompletion) {
        let service = self.service;

        emit(context.as_ref(), "startup", StateEvent::check());
        let check = service.check_for_update().await;
        emit(context.as_ref(), "startup", check_result_event(&check));

        if !matches!(&check, Ok(outcome) if outcome.has_update()) {
            debug!("Startup check found nothing to download");
            completion.complete();
            return;
        }

        emit(context.as_ref(), "startup", StateEvent::download());
        let fetch = service.fetch_update().await;
        emit(context.as_ref(), "startup", fetch_result_event(&fetch));

        completion.complete();
    }
}
