//! # Updates State Context
//!
//! Snapshot of everything observers need alongside the bare [`StateValue`]:
//! whether an update is available or pending, the latest and downloaded
//! manifests, the last check/download errors and a monotonic sequence number.
//!
//! The context is reduced from the same events that drive the transition
//! function, and only after the transition was accepted as legal.
//!
//! [`StateValue`]: super::states::StateValue

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::events::{EventType, Manifest, StateEvent, UpdateError};

/// Observable payload published with every state change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatesStateContext {
    pub is_update_available: bool,
    pub is_update_pending: bool,
    pub is_checking: bool,
    pub is_downloading: bool,
    pub is_restarting: bool,
    pub is_rollback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_manifest: Option<Manifest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloaded_manifest: Option<Manifest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_error: Option<UpdateError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_error: Option<UpdateError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_check_for_update_time: Option<DateTime<Utc>>,
    pub sequence_number: u64,
}

impl UpdatesStateContext {
    /// Fold an accepted event into the context
    pub fn apply(&mut self, event: &StateEvent) {
        self.apply_at(event, Utc::now());
    }

    /// Same as [`apply`](Self::apply) with an explicit clock reading
    pub fn apply_at(&mut self, event: &StateEvent, now: DateTime<Utc>) {
        match event.event_type() {
            EventType::Check => {
                self.is_checking = true;
            }
            EventType::CheckCompleteUnavailable => {
                self.is_checking = false;
                self.check_error = None;
                self.latest_manifest = None;
                self.is_rollback = false;
                self.is_update_available = false;
                self.last_check_for_update_time = Some(now);
            }
            EventType::CheckCompleteAvailable => {
                self.is_checking = false;
                self.check_error = None;
                self.latest_manifest = event.manifest().cloned();
                self.is_rollback = event.is_rollback();
                self.is_update_available = true;
                self.last_check_for_update_time = Some(now);
            }
            EventType::CheckError => {
                self.is_checking = false;
                self.check_error = event.error();
                self.last_check_for_update_time = Some(now);
            }
            EventType::Download => {
                self.is_downloading = true;
            }
            EventType::DownloadComplete => {
                self.is_downloading = false;
                self.download_error = None;
                if let Some(manifest) = event.manifest() {
                    self.latest_manifest = Some(manifest.clone());
                    self.downloaded_manifest = Some(manifest.clone());
                }
                self.is_rollback = event.is_rollback();
                self.is_update_pending = self.downloaded_manifest.is_some() || self.is_rollback;
                self.is_update_available = self.is_update_available
                    || self.latest_manifest.is_some()
                    || self.is_rollback;
            }
            EventType::DownloadError => {
                self.is_downloading = false;
                self.download_error = event.error();
            }
            EventType::Restart => {
                self.is_restarting = true;
            }
        }
    }

    /// Return to defaults, keeping the sequence number monotonic
    pub fn reset(&mut self) {
        *self = Self {
            sequence_number: self.sequence_number,
            ..Self::default()
        };
    }

    /// Advance the sequence number and return the new value
    pub fn next_sequence(&mut self) -> u64 {
        self.sequence_number += 1;
        self.sequence_number
    }
}
