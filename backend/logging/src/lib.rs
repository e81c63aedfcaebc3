//! Telemetry and structured logging for StarDeck.
//!
//! Installs the tracing subscriber, scrubs presenter tokens from logged text
//! and records presentation events under their own target.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{EventLogEntry, EventLogger, PresentationEvent, EVENT_TARGET};
pub use logger::{init_logger, LogOptions};
pub use redact::redact_sensitive_data;
