use async_trait::async_trait;
use thiserror::Error;

use crate::state_machine::Manifest;

/// Failure reported by the external update service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ServiceError {
    message: String,
}

impl ServiceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result of asking the update server whether something newer exists
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    NoUpdateAvailable,
    UpdateAvailable(Manifest),
    /// The server directs the app back to its embedded build
    RollBackToEmbedded,
}

impl CheckOutcome {
    /// Whether a fetch would produce something to launch
    pub fn has_update(&self) -> bool {
        !matches!(self, Self::NoUpdateAvailable)
    }
}

/// Result of downloading the update the server currently offers
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    NoNewUpdate,
    Fetched(Manifest),
    RollBackToEmbedded,
}

/// Manifest, asset and launcher operations the procedures drive.
///
/// Network transport, signature checks and asset storage live behind this
/// trait; the procedures only translate outcomes into state events.
#[async_trait]
pub trait UpdatesService: Send + Sync {
    async fn check_for_update(&self) -> ServiceResult<CheckOutcome>;

    async fn fetch_update(&self) -> ServiceResult<FetchOutcome>;

    /// Relaunch the app into the most recently downloaded update
    async fn relaunch(&self) -> ServiceResult<()>;
}
