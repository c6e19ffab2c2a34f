//! Config defaults: fills the sections a config file left out.

use crate::schema::{AuditConfig, EndpointsConfig, LoggingConfig};

/// Quiet by default so stdout carries only the report.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

pub const SERVICES: [&str; 4] = ["logging", "storage", "bigquery", "pubsub"];

/// Public Google API base URL for a service.
pub fn default_endpoint(service: &str) -> String {
    format!("https://{service}.googleapis.com")
}

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: AuditConfig) -> AuditConfig {
    let config = apply_logging_defaults(config);
    apply_endpoint_defaults(config)
}

fn apply_logging_defaults(mut config: AuditConfig) -> AuditConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    if logging.level.is_none() {
        logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    config
}

fn apply_endpoint_defaults(mut config: AuditConfig) -> AuditConfig {
    let endpoints = config.endpoints.get_or_insert_with(EndpointsConfig::default);
    for (slot, service) in [
        (&mut endpoints.logging, "logging"),
        (&mut endpoints.storage, "storage"),
        (&mut endpoints.bigquery, "bigquery"),
        (&mut endpoints.pubsub, "pubsub"),
    ] {
        if slot.is_none() {
            *slot = Some(default_endpoint(service));
        }
    }
    config
}
