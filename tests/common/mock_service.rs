use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

use updates_core::procedures::{CheckOutcome, FetchOutcome, ServiceError, ServiceResult, UpdatesService};

/// Scripted update service.
///
/// Each call pops the next scripted result; once a script runs out the
/// service reports that nothing is available.
#[derive(Default)]
pub struct MockUpdatesService {
    checks: Mutex<VecDeque<ServiceResult<CheckOutcome>>>,
    fetches: Mutex<VecDeque<ServiceResult<FetchOutcome>>>,
    relaunch_error: Mutex<Option<ServiceError>>,
    calls: Mutex<Vec<&'static str>>,
    delay: Option<Duration>,
}

impl MockUpdatesService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_check(self, result: ServiceResult<CheckOutcome>) -> Self {
        self.checks.lock().push_back(result);
        self
    }

    pub fn with_fetch(self, result: ServiceResult<FetchOutcome>) -> Self {
        self.fetches.lock().push_back(result);
        self
    }

    pub fn with_relaunch_error(self, message: &str) -> Self {
        *self.relaunch_error.lock() = Some(ServiceError::new(message));
        self
    }

    /// Make every call take `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    async fn record(&self, call: &'static str) {
        self.calls.lock().push(call);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl UpdatesService for MockUpdatesService {
    async fn check_for_update(&self) -> ServiceResult<CheckOutcome> {
        self.record("check_for_update").await;
        self.checks
            .lock()
            .pop_front()
            .unwrap_or(Ok(CheckOutcome::NoUpdateAvailable))
    }

    async fn fetch_update(&self) -> ServiceResult<FetchOutcome> {
        self.record("fetch_update").await;
        self.fetches
            .lock()
            .pop_front()
            .unwrap_or(Ok(FetchOutcome::NoNewUpdate))
    }

    async fn relaunch(&self) -> ServiceResult<()> {
        self.record("relaunch").await;
        match self.relaunch_error.lock().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
