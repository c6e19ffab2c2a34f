use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::destination::DestinationKind;

/// Pipeline step an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Credential and client setup, before any provider call.
    Setup,
    /// Reading the sink and classifying its destination.
    Resolution,
    /// Reading the destination's access-control policy.
    Fetch,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Setup => f.write_str("setup"),
            Stage::Resolution => f.write_str("sink resolution"),
            Stage::Fetch => f.write_str("policy fetch"),
        }
    }
}

/// Top-level error type for a sink audit run.
///
/// Every variant is fatal: the pipeline never produces a partial report once
/// one of these is raised.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("sink resolution failed: sink '{sink}' not found in project '{project}'")]
    SinkNotFound { sink: String, project: String },

    #[error("sink resolution failed: sink '{sink}' has no writer identity")]
    MissingWriterIdentity { sink: String },

    #[error("sink resolution failed: unsupported destination type '{destination}'")]
    UnsupportedDestination { destination: String },

    #[error("sink resolution failed: malformed destination '{destination}': {reason}")]
    MalformedDestination { destination: String, reason: String },

    #[error("policy fetch failed: resource '{resource}' not found")]
    ResourceNotFound { resource: String },

    #[error("{stage} failed: permission denied reading '{resource}' (this is not a clean audit): {message}")]
    PermissionDenied {
        stage: Stage,
        resource: String,
        message: String,
    },

    #[error("{stage} failed for '{resource}': {message}")]
    Transport {
        stage: Stage,
        resource: String,
        message: String,
    },

    #[error("setup failed: no credentials available: {0}")]
    Credentials(String),

    #[error("policy fetch failed for '{resource}': no policy fetcher registered for {kind} destinations")]
    NoFetcher {
        kind: DestinationKind,
        resource: String,
    },
}

impl AuditError {
    /// The step this error aborted.
    pub fn stage(&self) -> Stage {
        match self {
            AuditError::SinkNotFound { .. }
            | AuditError::MissingWriterIdentity { .. }
            | AuditError::UnsupportedDestination { .. }
            | AuditError::MalformedDestination { .. } => Stage::Resolution,
            AuditError::ResourceNotFound { .. } | AuditError::NoFetcher { .. } => Stage::Fetch,
            AuditError::PermissionDenied { stage, .. } | AuditError::Transport { stage, .. } => {
                *stage
            }
            AuditError::Credentials(_) => Stage::Setup,
        }
    }

    pub(crate) fn malformed(destination: &str, reason: impl Into<String>) -> Self {
        AuditError::MalformedDestination {
            destination: destination.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_errors_name_their_stage() {
        let err = AuditError::SinkNotFound {
            sink: "audit-sink".into(),
            project: "acme-prod".into(),
        };
        assert_eq!(err.stage(), Stage::Resolution);
        let msg = err.to_string();
        assert!(msg.starts_with("sink resolution failed"));
        assert!(msg.contains("audit-sink"));
        assert!(msg.contains("acme-prod"));
    }

    #[test]
    fn permission_denied_is_distinguishable_from_clean_audit() {
        let err = AuditError::PermissionDenied {
            stage: Stage::Fetch,
            resource: "storage.googleapis.com/logs-bucket".into(),
            message: "caller lacks storage.buckets.getIamPolicy".into(),
        };
        assert_eq!(err.stage(), Stage::Fetch);
        let msg = err.to_string();
        assert!(msg.starts_with("policy fetch failed"));
        assert!(msg.contains("permission denied"));
        assert!(msg.contains("logs-bucket"));
    }

    #[test]
    fn transport_errors_keep_their_stage() {
        let err = AuditError::Transport {
            stage: Stage::Resolution,
            resource: "projects/p/sinks/s".into(),
            message: "503 Service Unavailable".into(),
        };
        assert_eq!(err.stage(), Stage::Resolution);
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn missing_fetcher_is_a_fetch_error() {
        let err = AuditError::NoFetcher {
            kind: DestinationKind::Topic,
            resource: "pubsub.googleapis.com/projects/p/topics/t".into(),
        };
        assert_eq!(err.stage(), Stage::Fetch);
        let msg = err.to_string();
        assert!(msg.contains("pubsub topic"));
        assert!(msg.contains("projects/p/topics/t"));
    }
}
