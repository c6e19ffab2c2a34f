//! Access-token discovery from the hosting environment.
//!
//! Credentials are only read, never created or stored. Sources, in order:
//! an explicitly configured token, `SINK_AUDIT_ACCESS_TOKEN`,
//! `GOOGLE_OAUTH_ACCESS_TOKEN`, `gcloud auth print-access-token`, and the
//! GCE metadata server.

use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info};

use sinkaudit_core::AuditError;

pub const TOKEN_ENV_VARS: [&str; 2] = ["SINK_AUDIT_ACCESS_TOKEN", "GOOGLE_OAUTH_ACCESS_TOKEN"];

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Where the access token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Configured,
    Environment(&'static str),
    Gcloud,
    MetadataServer,
}

impl std::fmt::Display for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenSource::Configured => f.write_str("config file"),
            TokenSource::Environment(var) => write!(f, "${var}"),
            TokenSource::Gcloud => f.write_str("gcloud CLI"),
            TokenSource::MetadataServer => f.write_str("GCE metadata server"),
        }
    }
}

#[derive(Deserialize)]
struct MetadataToken {
    access_token: String,
}

/// Find an access token, trying each source in turn.
pub async fn discover_access_token(
    configured: Option<&str>,
) -> Result<(String, TokenSource), AuditError> {
    if let Some(token) = configured.map(str::trim).filter(|t| !t.is_empty()) {
        return Ok((token.to_string(), TokenSource::Configured));
    }

    if let Some((token, var)) = token_from_env(|k| std::env::var(k).ok()) {
        info!(source = var, "Using access token from environment");
        return Ok((token, TokenSource::Environment(var)));
    }

    match gcloud_token().await {
        Ok(token) => {
            info!("Using access token from gcloud");
            return Ok((token, TokenSource::Gcloud));
        }
        Err(e) => debug!(error = %e, "gcloud token unavailable"),
    }

    match metadata_token().await {
        Ok(token) => {
            info!("Using access token from metadata server");
            Ok((token, TokenSource::MetadataServer))
        }
        Err(e) => {
            debug!(error = %e, "metadata server token unavailable");
            Err(AuditError::Credentials(format!(
                "set {} or {}, log in with `gcloud auth login`, or run on GCE",
                TOKEN_ENV_VARS[0], TOKEN_ENV_VARS[1]
            )))
        }
    }
}

/// First non-empty token among [`TOKEN_ENV_VARS`].
pub fn token_from_env(
    get: impl Fn(&str) -> Option<String>,
) -> Option<(String, &'static str)> {
    TOKEN_ENV_VARS.into_iter().find_map(|var| {
        get(var)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(|v| (v, var))
    })
}

/// Whether the `gcloud` CLI can be spawned.
pub async fn gcloud_available() -> bool {
    Command::new("gcloud")
        .arg("--version")
        .output()
        .await
        .map(|o| o.status.success())
        .unwrap_or(false)
}

async fn gcloud_token() -> anyhow::Result<String> {
    let output = Command::new("gcloud")
        .args(["auth", "print-access-token"])
        .output()
        .await?;
    if !output.status.success() {
        anyhow::bail!(
            "gcloud exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    let token = String::from_utf8(output.stdout)?.trim().to_string();
    if token.is_empty() {
        anyhow::bail!("gcloud printed an empty token");
    }
    Ok(token)
}

async fn metadata_token() -> anyhow::Result<String> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()?;
    let response = client
        .get(METADATA_TOKEN_URL)
        .header("Metadata-Flavor", "Google")
        .send()
        .await?;
    if !response.status().is_success() {
        anyhow::bail!("metadata server returned {}", response.status());
    }
    let token: MetadataToken = response.json().await?;
    Ok(token.access_token)
}
