//! # Updates System Bootstrap
//!
//! Wires one session's worth of components together from configuration:
//! the state machine holder, the bridge sender it publishes through, the
//! last-error store, and the single serial executor every trigger shares.
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use updates_core::config::UpdatesConfig;
//! # use updates_core::procedures::UpdatesService;
//! # use updates_core::bootstrap::UpdatesSystem;
//! # async fn example(service: Arc<dyn UpdatesService>) -> updates_core::Result<()> {
//! let system = UpdatesSystem::start(&UpdatesConfig::default(), service)?;
//! system.run_startup()?;
//!
//! // Later, from a manual JS call
//! let outcome = system.check_for_update().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::info;

use crate::config::{ConfigurationError, ErrorStoreConfig, ErrorStoreKind, UpdatesConfig};
use crate::error::{Result, UpdatesCoreError};
use crate::events::{BufferedEventSender, EventPublisher, StateChangeSender};
use crate::execution::{ProcedureId, SerialExecutorQueue};
use crate::logging::log_error;
use crate::procedures::{
    CheckForUpdateProcedure, CheckOutcome, FetchOutcome, FetchUpdateProcedure, RelaunchProcedure,
    StartupProcedure, UpdatesService,
};
use crate::state_machine::{FileErrorStore, InMemoryErrorStore, LastErrorStore, UpdatesStateMachine};

/// Build the last-error store described by the configuration
pub fn build_error_store(config: &ErrorStoreConfig) -> Result<Arc<dyn LastErrorStore>> {
    match config.kind {
        ErrorStoreKind::Memory => Ok(Arc::new(InMemoryErrorStore::new())),
        ErrorStoreKind::File => {
            let path = config.path.clone().ok_or_else(|| {
                ConfigurationError::missing_required_field("error_store.path", "a file error store")
            })?;
            Ok(Arc::new(FileErrorStore::new(path)))
        }
    }
}

/// A running updates core for one app session
pub struct UpdatesSystem {
    machine: Arc<UpdatesStateMachine>,
    queue: SerialExecutorQueue,
    bridge: Arc<BufferedEventSender>,
    service: Arc<dyn UpdatesService>,
}

impl UpdatesSystem {
    /// Build every component and start the executor worker.
    ///
    /// Must be called from within a Tokio runtime. An error left by the
    /// previous session is restored and queued for the bridge.
    pub fn start(config: &UpdatesConfig, service: Arc<dyn UpdatesService>) -> Result<Self> {
        config.validate()?;

        let error_store = build_error_store(&config.error_store)?;
        let bridge = Arc::new(BufferedEventSender::new(config.events.buffer_limit));
        let machine = Arc::new(
            UpdatesStateMachine::new(
                EventPublisher::new(config.events.channel_capacity),
                error_store,
            )
            .with_bridge(bridge.clone())
            .with_policy(config.state_machine.illegal_transition_policy),
        );

        // A bad record from the last session must not prevent startup
        if let Err(e) = machine.restore_last_error() {
            log_error("bootstrap", "restore_last_error", &e.to_string(), None);
        }

        let queue = SerialExecutorQueue::new(machine.clone())?;

        info!(
            environment = %config.environment,
            error_store = ?config.error_store.kind,
            "Updates system started"
        );

        Ok(Self {
            machine,
            queue,
            bridge,
            service,
        })
    }

    pub fn machine(&self) -> &Arc<UpdatesStateMachine> {
        &self.machine
    }

    /// The shared executor; every trigger queues through it
    pub fn queue(&self) -> &SerialExecutorQueue {
        &self.queue
    }

    /// Attach the bridge listener, replaying changes it missed
    pub fn attach_bridge(&self, sink: Arc<dyn StateChangeSender>) {
        self.bridge.attach(sink);
    }

    /// Queue the launch-time check-then-download
    pub fn run_startup(&self) -> Result<ProcedureId> {
        Ok(self
            .queue
            .queue_execution(StartupProcedure::new(self.service.clone()))?)
    }

    /// Queue a check and wait for its outcome
    pub async fn check_for_update(&self) -> Result<CheckOutcome> {
        let (tx, rx) = oneshot::channel();
        self.queue
            .queue_execution(CheckForUpdateProcedure::new(self.service.clone()).with_reply(tx))?;
        let outcome = rx
            .await
            .map_err(|_| UpdatesCoreError::NoReply("check_for_update".to_string()))??;
        Ok(outcome)
    }

    /// Queue a download and wait for its outcome
    pub async fn fetch_update(&self) -> Result<FetchOutcome> {
        let (tx, rx) = oneshot::channel();
        self.queue
            .queue_execution(FetchUpdateProcedure::new(self.service.clone()).with_reply(tx))?;
        let outcome = rx
            .await
            .map_err(|_| UpdatesCoreError::NoReply("fetch_update".to_string()))??;
        Ok(outcome)
    }

    /// Queue a relaunch and wait for it to finish
    pub async fn relaunch(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.queue
            .queue_execution(RelaunchProcedure::new(self.service.clone()).with_reply(tx))?;
        rx.await
            .map_err(|_| UpdatesCoreError::NoReply("relaunch".to_string()))??;
        Ok(())
    }
}
