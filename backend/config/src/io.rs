//! Config file discovery and loading.

use crate::env::resolve_env_vars;
use crate::schema::AuditConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Resolve the sink-audit config directory.
/// Priority: `SINK_AUDIT_CONFIG_DIR` env > `~/.sink-audit/`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SINK_AUDIT_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".sink-audit"),
        None => PathBuf::from(".sink-audit"),
    }
}

/// Resolve the full path to the main config file.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Load and parse a config file, substituting `${VAR}` references.
///
/// Returns `Ok(Default::default())` if the file doesn't exist.
pub async fn load_config(path: &Path) -> Result<AuditConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(AuditConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&raw)
        .with_context(|| format!("Failed to load config at: {}", path.display()))?;
    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Parse YAML config text and resolve env references from the process environment.
pub fn parse_config(raw: &str) -> Result<AuditConfig> {
    if raw.trim().is_empty() {
        return Ok(AuditConfig::default());
    }
    let yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("Invalid config YAML")?;
    let value = serde_json::to_value(yaml).context("Config is not representable as JSON")?;
    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;
    serde_json::from_value(value).context("Config does not match the expected schema")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("sink-audit-does-not-exist/config.yaml");
        assert_eq!(load_config(&path).await.unwrap(), AuditConfig::default());
    }

    #[tokio::test]
    async fn loads_yaml_from_disk() {
        let dir = std::env::temp_dir().join(format!("sink-audit-cfg-{}", std::process::id()));
        fs::create_dir_all(&dir).await.unwrap();
        let path = config_file_path(&dir);
        fs::write(&path, "logging:\n  level: info\nhttp:\n  requestTimeoutSecs: 20\n")
            .await
            .unwrap();

        let config = load_config(&path).await.unwrap();
        let _ = fs::remove_dir_all(&dir).await;
        assert_eq!(config.log_level(), "info");
        assert_eq!(config.request_timeout_secs(), Some(20));
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(parse_config("\n").unwrap(), AuditConfig::default());
    }

    #[test]
    fn unknown_shape_is_rejected() {
        assert!(parse_config("logging: 5").is_err());
    }
}
