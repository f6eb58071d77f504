use parking_lot::Mutex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::errors::{PersistenceError, PersistenceResult};
use super::events::StateEvent;

/// Durable record of the last unrecoverable error, replayed once after relaunch
pub trait LastErrorStore: Send + Sync {
    /// Record an error event, replacing any previous one
    fn save(&self, event: &StateEvent) -> PersistenceResult<()>;

    /// Take the stored error event, leaving the store empty
    fn consume_last_error(&self) -> PersistenceResult<Option<StateEvent>>;
}

/// Process-local store, used in tests and when no durable location is configured
#[derive(Debug, Default)]
pub struct InMemoryErrorStore {
    last_error: Mutex<Option<StateEvent>>,
}

impl InMemoryErrorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LastErrorStore for InMemoryErrorStore {
    fn save(&self, event: &StateEvent) -> PersistenceResult<()> {
        *self.last_error.lock() = Some(event.clone());
        Ok(())
    }

    fn consume_last_error(&self) -> PersistenceResult<Option<StateEvent>> {
        Ok(self.last_error.lock().take())
    }
}

/// Store backed by a single JSON document on disk
#[derive(Debug)]
pub struct FileErrorStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileErrorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl LastErrorStore for FileErrorStore {
    fn save(&self, event: &StateEvent) -> PersistenceResult<()> {
        let _guard = self.lock.lock();

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }

        let body = serde_json::to_vec_pretty(event)?;
        // The record on disk is always complete: staged, then renamed into place
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, body).map_err(|e| self.io_error(e))?;
        fs::rename(&staging, &self.path).map_err(|e| self.io_error(e))?;

        debug!(path = %self.path.display(), event_type = %event.event_type(), "Saved last error");
        Ok(())
    }

    fn consume_last_error(&self) -> PersistenceResult<Option<StateEvent>> {
        let _guard = self.lock.lock();

        let body = match fs::read(&self.path) {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        // Consumed even when unparseable
        fs::remove_file(&self.path).map_err(|e| self.io_error(e))?;

        let event = serde_json::from_slice(&body)?;
        Ok(Some(event))
    }
}
