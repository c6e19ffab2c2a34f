//! Audit Run Event Logger
//!
//! One structured event per run (completed or failed), emitted on the
//! `audit_events` target so it can be filtered out of the JSON log.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum RunEvent {
    Completed {
        writer_identity: String,
        destination: String,
        bindings: usize,
        findings: usize,
    },
    Failed {
        stage: String,
        error_msg: String,
    },
}

#[derive(Debug, Serialize)]
pub struct RunEventEntry {
    pub sink: String,
    pub project: String,
    pub timestamp: DateTime<Utc>,
    pub event: RunEvent,
}

pub struct RunEventLogger;

impl RunEventLogger {
    /// Build the entry for one run, redacting error text.
    pub fn entry(sink: &str, project: &str, mut event: RunEvent) -> RunEventEntry {
        if let RunEvent::Failed { error_msg, .. } = &mut event {
            *error_msg = redact_sensitive_data(error_msg);
        }
        RunEventEntry {
            sink: sink.into(),
            project: project.into(),
            timestamp: Utc::now(),
            event,
        }
    }

    pub fn log_event(sink: &str, project: &str, event: RunEvent) {
        let entry = Self::entry(sink, project, event);
        let json = serde_json::to_string(&entry).unwrap_or_default();
        info!(target: "audit_events", event = %json, "Audit run event");
    }
}
