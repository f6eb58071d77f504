//! # Updates Configuration
//!
//! Typed configuration for the state machine holder, state-change delivery,
//! last-error persistence and logging.
//!
//! ## Sources
//!
//! Layered, later sources overriding earlier ones:
//!
//! 1. `updates-config.yaml` in the configuration directory
//! 2. `updates-config.<environment>.yaml` in the same directory
//! 3. Environment variables prefixed `UPDATES__`, nested with `__`
//!    (e.g. `UPDATES__EVENTS__CHANNEL_CAPACITY=512`)
//!
//! Every field has a default, so all files are optional.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use updates_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let capacity = manager.config().events.channel_capacity;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

use crate::state_machine::IllegalTransitionPolicy;

/// Root configuration structure mirroring updates-config.yaml
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct UpdatesConfig {
    /// Environment the configuration was resolved for (set by the loader)
    pub environment: String,

    pub state_machine: StateMachineConfig,

    pub events: EventsConfig,

    pub error_store: ErrorStoreConfig,

    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StateMachineConfig {
    pub illegal_transition_policy: IllegalTransitionPolicy,
}

/// State-change delivery settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Capacity of the in-process broadcast channel
    pub channel_capacity: usize,
    /// Maximum changes held while no bridge sink is attached
    pub buffer_limit: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
            buffer_limit: 64,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorStoreKind {
    #[default]
    Memory,
    File,
}

/// Where the last unrecoverable error is kept between sessions
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ErrorStoreConfig {
    pub kind: ErrorStoreKind,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; defaults by environment when unset
    pub level: Option<String>,
    /// Emit JSON records instead of human-readable lines
    pub json: bool,
}

impl Default for UpdatesConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            state_machine: StateMachineConfig::default(),
            events: EventsConfig::default(),
            error_store: ErrorStoreConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl UpdatesConfig {
    /// Validate cross-field constraints
    pub fn validate(&self) -> ConfigResult<()> {
        if self.events.channel_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "events.channel_capacity",
                self.events.channel_capacity,
                "must be greater than zero",
            ));
        }

        if self.events.buffer_limit == 0 {
            return Err(ConfigurationError::invalid_value(
                "events.buffer_limit",
                self.events.buffer_limit,
                "must be greater than zero",
            ));
        }

        if self.error_store.kind == ErrorStoreKind::File && self.error_store.path.is_none() {
            return Err(ConfigurationError::missing_required_field(
                "error_store.path",
                "a file error store",
            ));
        }

        Ok(())
    }
}
