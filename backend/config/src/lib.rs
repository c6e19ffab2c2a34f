//! `sinkaudit-config`: sink-audit configuration management.
//!
//! Provides:
//! - Typed config schema (logging, credentials, HTTP, API endpoints)
//! - YAML loading with `${ENV_VAR}` substitution
//! - `SINK_AUDIT_*` environment overrides
//! - Default value application
//! - Validation with field paths
//! - Redaction for safe display

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{apply_env_overrides, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config, parse_config};
pub use redact::redact;
pub use schema::AuditConfig;
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use std::path::Path;

/// Load, override, default, and validate the config.
///
/// An explicit `path` must exist; without one the default location is used
/// if present. Validation errors fail the load; warnings are returned for the
/// caller to log once logging is up.
pub async fn load_and_prepare(path: Option<&Path>) -> Result<(AuditConfig, ValidationReport)> {
    let config = match path {
        Some(path) => {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            load_config(path).await?
        }
        None => load_config(&config_file_path(&config_dir())).await?,
    };

    let config = apply_env_overrides(config).context("Invalid SINK_AUDIT_* override")?;
    let config = apply_all_defaults(config);

    let report = validate(&config);
    if !report.is_valid() {
        let messages: Vec<String> = report.errors.iter().map(ToString::to_string).collect();
        bail!(messages.join("; "));
    }
    Ok((config, report))
}

/// Redacted JSON view of `config`, safe to print.
pub fn redacted_view(config: &AuditConfig) -> Result<serde_json::Value> {
    let value = serde_json::to_value(config).context("Failed to serialize config")?;
    Ok(redact(&value))
}
