pub mod emitter;
pub mod publisher;

// Re-export key types for convenience
pub use emitter::{BufferedEventSender, StateChangeSender};
pub use publisher::{EventPublisher, StateChangeEvent, STATE_CHANGE_EVENT_NAME};
