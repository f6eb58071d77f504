//! # Serial Executor Queue
//!
//! Runs [`Procedure`]s one at a time, in the order they were queued.
//!
//! Submissions go into an unbounded channel that any thread or task can send
//! on. A single worker task owns the receiving end: it takes the head of the
//! queue, spawns its `run` future as a task of its own, and then waits only
//! for that procedure's completion signal before taking the next one.
//! Procedure N+1 therefore starts exactly when procedure N signals: never
//! before, however the procedure schedules its own async work, and never
//! later, even if N's `run` future keeps going after signalling (for
//! example to await follow-up work it queued behind itself).
//!
//! The worker is a loop rather than a completion callback that re-enters the
//! scheduler, so procedures that complete synchronously never grow the stack.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, Notify};
use tracing::{debug, error};

use super::errors::{ExecutorError, ExecutorResult};
use super::procedure::{Procedure, ProcedureCompletion, ProcedureContext, ProcedureId};
use crate::logging::log_procedure_operation;

struct QueuedProcedure {
    id: ProcedureId,
    procedure: Box<dyn Procedure>,
    queued_at: Instant,
}

#[derive(Default)]
struct QueueStats {
    pending: AtomicUsize,
    running: AtomicBool,
    completed: AtomicU64,
    idle: Notify,
}

impl QueueStats {
    fn is_idle(&self) -> bool {
        self.pending.load(Ordering::SeqCst) == 0 && !self.running.load(Ordering::SeqCst)
    }
}

/// FIFO, mutually exclusive scheduler for update procedures.
///
/// Cloning yields another handle to the same queue and worker, so a running
/// procedure can hold a clone and queue follow-up work.
#[derive(Clone)]
pub struct SerialExecutorQueue {
    sender: mpsc::UnboundedSender<QueuedProcedure>,
    stats: Arc<QueueStats>,
}

impl SerialExecutorQueue {
    /// Create a queue whose worker runs on the current Tokio runtime
    pub fn new(context: Arc<dyn ProcedureContext>) -> ExecutorResult<Self> {
        let handle = Handle::try_current().map_err(|_| ExecutorError::NoRuntime)?;
        Ok(Self::with_handle(context, &handle))
    }

    /// Create a queue whose worker runs on the given runtime
    pub fn with_handle(context: Arc<dyn ProcedureContext>, handle: &Handle) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let stats = Arc::new(QueueStats::default());

        handle.spawn(run_worker(receiver, context, stats.clone()));

        Self { sender, stats }
    }

    /// Append a procedure to the tail of the queue.
    ///
    /// Safe to call from any thread or task, including from inside a running
    /// procedure. Never blocks and never runs the procedure on the caller.
    pub fn queue_execution<P: Procedure>(&self, procedure: P) -> ExecutorResult<ProcedureId> {
        self.queue_boxed(Box::new(procedure))
    }

    /// Same as [`queue_execution`](Self::queue_execution) for an already boxed procedure
    pub fn queue_boxed(&self, procedure: Box<dyn Procedure>) -> ExecutorResult<ProcedureId> {
        let id = ProcedureId::new();
        let name = procedure.name().to_string();

        self.stats.pending.fetch_add(1, Ordering::SeqCst);
        let queued = QueuedProcedure {
            id,
            procedure,
            queued_at: Instant::now(),
        };

        if self.sender.send(queued).is_err() {
            self.stats.pending.fetch_sub(1, Ordering::SeqCst);
            error!(procedure = %name, "Serial executor worker has stopped; dropping procedure");
            return Err(ExecutorError::WorkerStopped { procedure: name });
        }

        debug!(procedure_id = %id, procedure = %name, "Procedure queued");
        Ok(id)
    }

    /// Number of procedures waiting behind the running one
    pub fn pending_count(&self) -> usize {
        self.stats.pending.load(Ordering::SeqCst)
    }

    /// Whether a procedure is between start and completion
    pub fn is_running(&self) -> bool {
        self.stats.running.load(Ordering::SeqCst)
    }

    /// Number of procedures that have run to completion
    pub fn completed_count(&self) -> u64 {
        self.stats.completed.load(Ordering::SeqCst)
    }

    /// Wait until nothing is running and nothing is pending
    pub async fn wait_until_idle(&self) {
        loop {
            let notified = self.stats.idle.notified();
            if self.stats.is_idle() {
                return;
            }
            notified.await;
        }
    }
}

async fn run_worker(
    mut receiver: mpsc::UnboundedReceiver<QueuedProcedure>,
    context: Arc<dyn ProcedureContext>,
    stats: Arc<QueueStats>,
) {
    while let Some(queued) = receiver.recv().await {
        let QueuedProcedure {
            id,
            procedure,
            queued_at,
        } = queued;
        let name = procedure.name().to_string();

        stats.running.store(true, Ordering::SeqCst);
        stats.pending.fetch_sub(1, Ordering::SeqCst);

        debug!(
            procedure_id = %id,
            procedure = %name,
            queued_ms = queued_at.elapsed().as_millis() as u64,
            "Procedure starting"
        );

        let (done_tx, done_rx) = oneshot::channel();
        let completion = ProcedureCompletion::new(id, name.clone(), done_tx);
        let started = Instant::now();

        let run = procedure.run(context.clone(), completion);
        let task_name = name.clone();
        tokio::spawn(async move {
            // Unwinding drops the completion handle, which releases the queue
            if let Err(panic) = AssertUnwindSafe(run).catch_unwind().await {
                error!(
                    procedure_id = %id,
                    procedure = %task_name,
                    panic = %panic_message(panic.as_ref()),
                    "Procedure panicked"
                );
            }
        });

        // A dropped handle resolves this with RecvError, which also counts as done
        let _ = done_rx.await;

        stats.completed.fetch_add(1, Ordering::SeqCst);
        stats.running.store(false, Ordering::SeqCst);

        log_procedure_operation(
            "run",
            &id.to_string(),
            &name,
            "completed",
            Some(started.elapsed().as_millis() as u64),
        );

        if stats.is_idle() {
            stats.idle.notify_waiters();
        }
    }

    debug!("Serial executor worker stopped: all queue handles dropped");
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::procedure_fn;
    use crate::state_machine::{StateEvent, StateMachineResult, StateValue};
    use parking_lot::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct NoopContext;

    impl ProcedureContext for NoopContext {
        fn process_state_event(&self, _event: StateEvent) -> StateMachineResult<StateValue> {
            Ok(StateValue::Idle)
        }

        fn current_state(&self) -> StateValue {
            StateValue::Idle
        }

        fn reset_state(&self) {}
    }

    fn queue() -> SerialExecutorQueue {
        SerialExecutorQueue::new(Arc::new(NoopContext)).unwrap()
    }

    #[test]
    fn test_requires_runtime() {
        assert!(matches!(
            SerialExecutorQueue::new(Arc::new(NoopContext)),
            Err(ExecutorError::NoRuntime)
        ));
    }

    #[tokio::test]
    async fn test_runs_in_submission_order() {
        let queue = queue();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5 {
            let order = order.clone();
            queue
                .queue_execution(procedure_fn(format!("p{i}"), move |_ctx, done| async move {
                    order.lock().push(i);
                    done.complete();
                }))
                .unwrap();
        }

        queue.wait_until_idle().await;
        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
        assert_eq!(queue.completed_count(), 5);
    }

    #[tokio::test]
    async fn test_waits_for_completion_signal_not_return() {
        let queue = queue();
        let log = Arc::new(Mutex::new(Vec::new()));

        let first_log = log.clone();
        queue
            .queue_execution(procedure_fn("deferred", move |_ctx, done| async move {
                // Return immediately and complete later from a spawned task
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    first_log.lock().push("first done");
                    done.complete();
                });
            }))
            .unwrap();

        let second_log = log.clone();
        queue
            .queue_execution(procedure_fn("second", move |_ctx, done| async move {
                second_log.lock().push("second start");
                done.complete();
            }))
            .unwrap();

        queue.wait_until_idle().await;
        assert_eq!(*log.lock(), vec!["first done", "second start"]);
    }

    #[tokio::test]
    async fn test_signal_releases_queue_while_run_continues() {
        let queue = queue();
        let (hold_tx, hold_rx) = oneshot::channel::<()>();

        queue
            .queue_execution(procedure_fn("lingers", move |_ctx, done| async move {
                done.complete();
                let _ = hold_rx.await;
            }))
            .unwrap();

        queue.wait_until_idle().await;
        assert!(!queue.is_running());
        assert_eq!(queue.completed_count(), 1);
        let _ = hold_tx.send(());
    }

    #[tokio::test]
    async fn test_panicking_procedure_does_not_stall_queue() {
        let queue = queue();
        let ran = Arc::new(AtomicBool::new(false));

        queue
            .queue_execution(procedure_fn("panics", |_ctx, _done| async move {
                panic!("boom");
            }))
            .unwrap();

        let ran_flag = ran.clone();
        queue
            .queue_execution(procedure_fn("after", move |_ctx, done| async move {
                ran_flag.store(true, Ordering::SeqCst);
                done.complete();
            }))
            .unwrap();

        queue.wait_until_idle().await;
        assert!(ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_idle_queue_reports_no_work() {
        let queue = queue();
        queue.wait_until_idle().await;
        assert!(!queue.is_running());
        assert_eq!(queue.pending_count(), 0);
        assert_eq!(queue.completed_count(), 0);
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("static message");
        assert_eq!(panic_message(payload.as_ref()), "static message");

        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
    }
}
