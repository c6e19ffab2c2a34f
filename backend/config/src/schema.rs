//! sink-audit configuration schema.
//!
//! Every section is optional in the file; [`crate::defaults`] fills in what
//! is missing after loading.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditConfig {
    /// Log level and optional JSON log directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,

    /// Explicit credentials (normally taken from the environment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthConfig>,

    /// HTTP client settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpConfig>,

    /// API base URLs, overridable for emulators
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<EndpointsConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpConfig {
    /// Per-request timeout; unset means no timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bigquery: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pubsub: Option<String>,
}

impl AuditConfig {
    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or(crate::defaults::DEFAULT_LOG_LEVEL)
    }

    pub fn log_dir(&self) -> Option<&std::path::Path> {
        self.logging.as_ref().and_then(|l| l.dir.as_deref())
    }

    pub fn access_token(&self) -> Option<&str> {
        self.auth.as_ref().and_then(|a| a.access_token.as_deref())
    }

    pub fn request_timeout_secs(&self) -> Option<u64> {
        self.http.as_ref().and_then(|h| h.request_timeout_secs)
    }

    /// Base URL for `service` (`logging`, `storage`, `bigquery`, `pubsub`),
    /// falling back to the public Google endpoint.
    pub fn endpoint(&self, service: &str) -> String {
        let configured = self.endpoints.as_ref().and_then(|e| match service {
            "logging" => e.logging.clone(),
            "storage" => e.storage.clone(),
            "bigquery" => e.bigquery.clone(),
            "pubsub" => e.pubsub.clone(),
            _ => None,
        });
        configured.unwrap_or_else(|| crate::defaults::default_endpoint(service))
    }
}
