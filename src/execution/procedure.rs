//! # Procedures
//!
//! A [`Procedure`] is one unit of update work (check, download, relaunch)
//! handed to the [`SerialExecutorQueue`](super::SerialExecutorQueue). It is
//! given two things when it runs:
//!
//! - a [`ProcedureContext`], the only way it can touch update state, and
//! - a [`ProcedureCompletion`], which it must fire exactly once to let the
//!   next procedure start.
//!
//! Completion is separate from `run` returning. A procedure may hand its
//! completion to a callback or spawned task and return early, and the queue
//! still waits for the signal. It may also signal first and keep running,
//! and the next procedure starts right away.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use updates_core::execution::{procedure_fn, ProcedureContext, ProcedureCompletion};
//! use updates_core::state_machine::StateEvent;
//!
//! let check = procedure_fn("check", |ctx: Arc<dyn ProcedureContext>, done: ProcedureCompletion| async move {
//!     let _ = ctx.process_state_event(StateEvent::check());
//!     let _ = ctx.process_state_event(StateEvent::check_complete_unavailable());
//!     done.complete();
//! });
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::warn;
use uuid::Uuid;

use crate::state_machine::{StateEvent, StateMachineResult, StateValue};

/// Capabilities granted to a running procedure
pub trait ProcedureContext: Send + Sync {
    /// Apply an event to the state machine and publish the resulting state.
    ///
    /// Illegal events are rejected without changing state.
    fn process_state_event(&self, event: StateEvent) -> StateMachineResult<StateValue>;

    /// Read the current state.
    ///
    /// Branching on this reintroduces read-then-act races; procedures should
    /// emit the events that match their own progress instead.
    #[deprecated(note = "procedures should be event-driven instead of polling state")]
    fn current_state(&self) -> StateValue;

    /// Force the state back to `Idle`, bypassing the transition table
    fn reset_state(&self);
}

/// Unique identifier assigned to each queued procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcedureId(Uuid);

impl ProcedureId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ProcedureId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProcedureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Single-fire completion signal for a running procedure.
///
/// Consumed by [`complete`](Self::complete). Dropping the handle without
/// completing (an early return, a `?`, a panic) also releases the queue so
/// that no exit path can stall it, but is logged as a contract violation.
#[must_use = "a procedure must signal completion for the queue to advance"]
pub struct ProcedureCompletion {
    id: ProcedureId,
    name: String,
    sender: Option<oneshot::Sender<()>>,
}

impl ProcedureCompletion {
    pub(crate) fn new(id: ProcedureId, name: String, sender: oneshot::Sender<()>) -> Self {
        Self {
            id,
            name,
            sender: Some(sender),
        }
    }

    /// Signal that the procedure has finished
    pub fn complete(mut self) {
        if let Some(sender) = self.sender.take() {
            // The queue may already be gone at process teardown
            let _ = sender.send(());
        }
    }

    pub fn procedure_id(&self) -> ProcedureId {
        self.id
    }
}

impl fmt::Debug for ProcedureCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcedureCompletion")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("pending", &self.sender.is_some())
            .finish()
    }
}

impl Drop for ProcedureCompletion {
    fn drop(&mut self) {
        if self.sender.is_some() {
            warn!(
                procedure_id = %self.id,
                procedure = %self.name,
                "Procedure dropped its completion handle without completing"
            );
        }
    }
}

/// A unit of work run by the serial executor
#[async_trait]
pub trait Procedure: Send + 'static {
    /// Short name used in log records
    fn name(&self) -> &str;

    /// Execute the procedure. `completion` must be fired once the work is
    /// done, whether or not `run` has returned by then.
    async fn run(self: Box<Self>, context: Arc<dyn ProcedureContext>, completion: ProcedureCompletion);
}

/// Procedure backed by an async closure
pub struct FnProcedure<F> {
    name: String,
    body: F,
}

/// Wrap an async closure as a [`Procedure`]
pub fn procedure_fn<F, Fut>(name: impl Into<String>, body: F) -> FnProcedure<F>
where
    F: FnOnce(Arc<dyn ProcedureContext>, ProcedureCompletion) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    FnProcedure {
        name: name.into(),
        body,
    }
}

#[async_trait]
impl<F, Fut> Procedure for FnProcedure<F>
where
    F: FnOnce(Arc<dyn ProcedureContext>, ProcedureCompletion) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(self: Box<Self>, context: Arc<dyn ProcedureContext>, completion: ProcedureCompletion) {
        let FnProcedure { body, .. } = *self;
        body(context, completion).await;
    }
}
