//! Structured logging for sink-audit.
//!
//! Handles subscriber setup (stderr console plus optional JSON file), token
//! redaction, and the per-run outcome event.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{RunEvent, RunEventEntry, RunEventLogger};
pub use logger::{init_logger, LoggerGuard};
pub use redact::redact_sensitive_data;
