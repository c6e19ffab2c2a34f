//! Config validation with field paths in every message.

use crate::defaults::SERVICES;
use crate::schema::AuditConfig;
use thiserror::Error;

const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// Errors and warnings found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &AuditConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_logging(config, &mut report);
    validate_http(config, &mut report);
    validate_endpoints(config, &mut report);
    report
}

/// A bare level must be known; filter directives (`target=level`) pass through.
fn validate_logging(config: &AuditConfig, report: &mut ValidationReport) {
    let level = config.log_level();
    if !level.contains('=') && !LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
        report.warn(
            "logging.level",
            format!("Unknown log level '{level}'; expected one of {}", LEVELS.join(", ")),
        );
    }
}

fn validate_http(config: &AuditConfig, report: &mut ValidationReport) {
    if config.request_timeout_secs() == Some(0) {
        report.error(
            "http.requestTimeoutSecs",
            "Timeout must be at least 1 second; omit it to disable timeouts",
        );
    }
}

fn validate_endpoints(config: &AuditConfig, report: &mut ValidationReport) {
    for service in SERVICES {
        let path = format!("endpoints.{service}");
        let url = config.endpoint(service);
        if let Some(rest) = url.strip_prefix("http://") {
            if !is_local(rest) {
                report.warn(&path, "Plain-http endpoint will send the access token unencrypted");
            }
        } else if !url.starts_with("https://") {
            report.error(&path, format!("Endpoint must be an http(s) URL, got '{url}'"));
        }
    }
}

fn is_local(rest: &str) -> bool {
    let authority = rest.split('/').next().unwrap_or("");
    authority == "localhost"
        || authority.starts_with("localhost:")
        || authority.starts_with("127.0.0.1")
        || authority.starts_with("[::1]")
}
