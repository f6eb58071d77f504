#![allow(clippy::doc_markdown)] // Allow technical terms like JSON, OTA in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Updates Core
//!
//! State management and serialized execution for over-the-air update checks,
//! downloads and relaunches.
//!
//! ## Overview
//!
//! The host application triggers update work from several places: a check on
//! launch, manual calls from the JS layer, and a relaunch once an update is
//! ready. This crate keeps those triggers from interleaving. Every unit of
//! work is a [`execution::Procedure`] queued on one
//! [`execution::SerialExecutorQueue`]; each procedure reports its progress
//! as state events to the single [`state_machine::UpdatesStateMachine`],
//! which accepts only legal transitions and publishes every change.
//!
//! ## Key Features
//!
//! - **Four-state machine**: `idle`, `checking`, `downloading`, `restarting`
//!   with a pure transition function
//! - **Strict serialization**: a procedure starts as soon as the previous one
//!   signals completion and not before, whether that signal comes before or
//!   after its `run` future returns
//! - **Published context**: availability, pending update, manifests and
//!   errors travel with each state change
//! - **Buffered bridge delivery**: changes are held until the JS layer
//!   attaches
//! - **Last-error persistence**: an unrecoverable error survives a restart
//!
//! ## Module Organization
//!
//! - [`state_machine`] - States, events, transitions and the holder
//! - [`execution`] - The procedure contract and the serial executor
//! - [`procedures`] - Check, download, relaunch and startup procedures
//! - [`events`] - State-change publication and bridge buffering
//! - [`bootstrap`] - Wiring from configuration
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use updates_core::config::ConfigManager;
//! use updates_core::logging::init_structured_logging;
//! use updates_core::procedures::UpdatesService;
//! use updates_core::UpdatesSystem;
//!
//! # async fn example(service: Arc<dyn UpdatesService>) -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! init_structured_logging(&manager.config().logging);
//!
//! let system = UpdatesSystem::start(manager.config(), service)?;
//! system.run_startup()?;
//!
//! let mut changes = system.machine().subscribe();
//! while let Ok(change) = changes.recv().await {
//!     println!("{} -> {:?}", change.state, change.event_type);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # All tests
//! ```

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod events;
pub mod execution;
pub mod logging;
pub mod procedures;
pub mod state_machine;

pub use bootstrap::UpdatesSystem;
pub use config::{ConfigManager, UpdatesConfig};
pub use error::{Result, UpdatesCoreError};
pub use events::{BufferedEventSender, EventPublisher, StateChangeEvent, StateChangeSender};
pub use execution::{
    Procedure, ProcedureCompletion, ProcedureContext, ProcedureId, SerialExecutorQueue,
};
pub use state_machine::{
    EventType, Manifest, StateEvent, StateValue, UpdatesStateContext, UpdatesStateMachine,
};
