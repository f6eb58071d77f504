use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Kinds of events that can trigger an updates state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Check,
    CheckCompleteAvailable,
    CheckCompleteUnavailable,
    CheckError,
    Download,
    DownloadComplete,
    DownloadError,
    Restart,
}

impl EventType {
    /// Every event type, in declaration order
    pub const ALL: [EventType; 8] = [
        Self::Check,
        Self::CheckCompleteAvailable,
        Self::CheckCompleteUnavailable,
        Self::CheckError,
        Self::Download,
        Self::DownloadComplete,
        Self::DownloadError,
        Self::Restart,
    ];

    /// Get a string representation of the event type for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Check => "check",
            Self::CheckCompleteAvailable => "check_complete_available",
            Self::CheckCompleteUnavailable => "check_complete_unavailable",
            Self::CheckError => "check_error",
            Self::Download => "download",
            Self::DownloadComplete => "download_complete",
            Self::DownloadError => "download_error",
            Self::Restart => "restart",
        }
    }

    /// Check if this event type carries an error message
    pub fn is_error(&self) -> bool {
        matches!(self, Self::CheckError | Self::DownloadError)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque update descriptor attached to completion events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(Value);

impl Manifest {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    /// Raw JSON body of the manifest
    pub fn as_json(&self) -> &Value {
        &self.0
    }

    pub fn into_inner(self) -> Value {
        self.0
    }

    /// The `id` field, when the manifest has one
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }
}

impl From<Value> for Manifest {
    fn from(raw: Value) -> Self {
        Self(raw)
    }
}

/// Structured error value derived from an event's error message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct UpdateError {
    message: String,
}

impl UpdateError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Immutable description of a single transition trigger.
///
/// Instances are only built through the named constructors below (or through
/// deserialization, which re-checks the same rules), so the payload always
/// matches the event type: error events carry a message and nothing else,
/// `Check`/`Download`/`Restart` carry nothing, and only completion events may
/// carry a manifest or the rollback flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawStateEvent")]
pub struct StateEvent {
    #[serde(rename = "type")]
    event_type: EventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    manifest: Option<Manifest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    is_rollback: bool,
}

impl StateEvent {
    fn bare(event_type: EventType) -> Self {
        Self {
            event_type,
            manifest: None,
            error_message: None,
            is_rollback: false,
        }
    }

    pub fn check() -> Self {
        Self::bare(EventType::Check)
    }

    pub fn download() -> Self {
        Self::bare(EventType::Download)
    }

    pub fn restart() -> Self {
        Self::bare(EventType::Restart)
    }

    pub fn check_complete_unavailable() -> Self {
        Self::bare(EventType::CheckCompleteUnavailable)
    }

    pub fn check_complete_with_update(manifest: Manifest) -> Self {
        Self {
            manifest: Some(manifest),
            ..Self::bare(EventType::CheckCompleteAvailable)
        }
    }

    pub fn check_complete_with_rollback() -> Self {
        Self {
            is_rollback: true,
            ..Self::bare(EventType::CheckCompleteAvailable)
        }
    }

    pub fn check_error(message: impl Into<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            ..Self::bare(EventType::CheckError)
        }
    }

    /// Download finished without producing a new update
    pub fn download_complete() -> Self {
        Self::bare(EventType::DownloadComplete)
    }

    pub fn download_complete_with_update(manifest: Manifest) -> Self {
        Self {
            manifest: Some(manifest),
            ..Self::bare(EventType::DownloadComplete)
        }
    }

    pub fn download_complete_with_rollback() -> Self {
        Self {
            is_rollback: true,
            ..Self::bare(EventType::DownloadComplete)
        }
    }

    pub fn download_error(message: impl Into<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            ..Self::bare(EventType::DownloadError)
        }
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn manifest(&self) -> Option<&Manifest> {
        self.manifest.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Structured error, present only when the event carries an error message
    pub fn error(&self) -> Option<UpdateError> {
        self.error_message.as_deref().map(UpdateError::new)
    }

    pub fn is_rollback(&self) -> bool {
        self.is_rollback
    }
}

/// Wire shape accepted by deserialization before validation
#[derive(Deserialize)]
struct RawStateEvent {
    #[serde(rename = "type")]
    event_type: EventType,
    #[serde(default)]
    manifest: Option<Manifest>,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    is_rollback: bool,
}

impl TryFrom<RawStateEvent> for StateEvent {
    type Error = String;

    fn try_from(raw: RawStateEvent) -> Result<Self, Self::Error> {
        let RawStateEvent {
            event_type,
            manifest,
            error_message,
            is_rollback,
        } = raw;

        let valid = match event_type {
            EventType::Check
            | EventType::Download
            | EventType::Restart
            | EventType::CheckCompleteUnavailable => {
                manifest.is_none() && error_message.is_none() && !is_rollback
            }
            EventType::CheckError | EventType::DownloadError => {
                error_message.is_some() && manifest.is_none() && !is_rollback
            }
            EventType::CheckCompleteAvailable => {
                error_message.is_none() && (manifest.is_some() != is_rollback)
            }
            EventType::DownloadComplete => {
                error_message.is_none() && !(manifest.is_some() && is_rollback)
            }
        };

        if !valid {
            return Err(format!("Invalid payload for {event_type} event"));
        }

        Ok(Self {
            event_type,
            manifest,
            error_message,
            is_rollback,
        })
    }
}
