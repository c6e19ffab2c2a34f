//! Environment handling for config values.
//!
//! Two mechanisms:
//! - `${VAR_NAME}` references inside string values, resolved at load time.
//!   Only uppercase `[A-Z_][A-Z0-9_]*` names are matched; `$${VAR}` is kept
//!   as a literal `${VAR}`.
//! - `SINK_AUDIT_*` variables that override individual settings after the
//!   file is loaded.

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::schema::{AuditConfig, AuthConfig, EndpointsConfig, HttpConfig, LoggingConfig};

/// `$${VAR}` (escaped) or `${VAR}` (reference).
static REFERENCE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\$?)\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

/// Error returned for missing env vars.
#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references from the process environment.
pub fn resolve_env_vars(value: &Value) -> Result<Value> {
    resolve_env_vars_with(value, &|name| std::env::var(name).ok())
}

/// Substitute `${VAR}` references using `lookup`.
///
/// Walks the whole value tree; only string leaves change. Fails on the
/// first reference that is unset or empty.
pub fn resolve_env_vars_with(
    value: &Value,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<Value> {
    substitute_value(value, lookup, "")
}

fn substitute_value(
    value: &Value,
    lookup: &dyn Fn(&str) -> Option<String>,
    path: &str,
) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, lookup, path)?)),
        Value::Array(arr) => arr
            .iter()
            .enumerate()
            .map(|(i, v)| substitute_value(v, lookup, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map {
                let child = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                out.insert(k.clone(), substitute_value(v, lookup, &child)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(
    s: &str,
    lookup: &dyn Fn(&str) -> Option<String>,
    path: &str,
) -> Result<String> {
    if !s.contains('$') {
        return Ok(s.to_string());
    }

    let mut missing: Option<MissingEnvVarError> = None;
    let replaced = REFERENCE_PATTERN.replace_all(s, |caps: &Captures| {
        let name = &caps[2];
        if !caps[1].is_empty() {
            return format!("${{{name}}}");
        }
        match lookup(name).filter(|v| !v.is_empty()) {
            Some(v) => v,
            None => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    if let Some(err) = missing {
        bail!(err);
    }
    Ok(replaced.into_owned())
}

/// Apply `SINK_AUDIT_*` overrides from the process environment.
pub fn apply_env_overrides(config: AuditConfig) -> Result<AuditConfig> {
    apply_env_overrides_with(config, &|name| std::env::var(name).ok())
}

/// Apply `SINK_AUDIT_*` overrides using `lookup`.
///
/// | variable | setting |
/// |---|---|
/// | `SINK_AUDIT_LOG` | `logging.level` |
/// | `SINK_AUDIT_LOG_DIR` | `logging.dir` |
/// | `SINK_AUDIT_ACCESS_TOKEN` | `auth.accessToken` |
/// | `SINK_AUDIT_TIMEOUT_SECS` | `http.requestTimeoutSecs` |
/// | `SINK_AUDIT_<SERVICE>_ENDPOINT` | `endpoints.<service>` |
pub fn apply_env_overrides_with(
    mut config: AuditConfig,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<AuditConfig> {
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(level) = get("SINK_AUDIT_LOG") {
        config.logging.get_or_insert_with(LoggingConfig::default).level = Some(level);
    }
    if let Some(dir) = get("SINK_AUDIT_LOG_DIR") {
        config.logging.get_or_insert_with(LoggingConfig::default).dir = Some(dir.into());
    }
    if let Some(token) = get("SINK_AUDIT_ACCESS_TOKEN") {
        config.auth.get_or_insert_with(AuthConfig::default).access_token = Some(token);
    }
    if let Some(raw) = get("SINK_AUDIT_TIMEOUT_SECS") {
        let secs: u64 = match raw.trim().parse() {
            Ok(secs) => secs,
            Err(_) => bail!("SINK_AUDIT_TIMEOUT_SECS must be a whole number of seconds, got {raw:?}"),
        };
        config.http.get_or_insert_with(HttpConfig::default).request_timeout_secs = Some(secs);
    }

    let endpoints = &mut config.endpoints;
    for service in crate::defaults::SERVICES {
        let var = format!("SINK_AUDIT_{}_ENDPOINT", service.to_ascii_uppercase());
        if let Some(url) = get(&var) {
            let e = endpoints.get_or_insert_with(EndpointsConfig::default);
            let slot = match service {
                "logging" => &mut e.logging,
                "storage" => &mut e.storage,
                "bigquery" => &mut e.bigquery,
                _ => &mut e.pubsub,
            };
            *slot = Some(url);
        }
    }

    Ok(config)
}
