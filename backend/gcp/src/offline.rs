//! Offline sources: audit an exported policy file instead of calling the APIs.
//!
//! The file is the output of `gcloud ... get-iam-policy` in either JSON or
//! YAML form.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use sinkaudit_core::{
    AuditError, Destination, DestinationKind, PolicyFetcher, ResolvedSink, RoleBinding,
    SinkLookup, WriterIdentity,
};
use sinkaudit_security::FetcherRegistry;

use crate::policy::IamPolicy;

/// A sink whose writer identity and destination are already known.
pub struct StaticSinkLookup {
    writer_identity: String,
    destination_uri: String,
}

impl StaticSinkLookup {
    pub fn new(writer_identity: impl Into<String>, destination_uri: impl Into<String>) -> Self {
        Self {
            writer_identity: writer_identity.into(),
            destination_uri: destination_uri.into(),
        }
    }
}

#[async_trait]
impl SinkLookup for StaticSinkLookup {
    async fn resolve(&self, sink: &str, _project: &str) -> Result<ResolvedSink, AuditError> {
        let writer_identity = WriterIdentity::new(&self.writer_identity).ok_or_else(|| {
            AuditError::MissingWriterIdentity {
                sink: sink.to_string(),
            }
        })?;
        let destination = Destination::parse(&self.destination_uri)?;
        Ok(ResolvedSink {
            writer_identity,
            destination,
            destination_uri: self.destination_uri.clone(),
        })
    }
}

/// Serves a fixed policy for one destination kind.
pub struct StaticPolicyFetcher {
    kind: DestinationKind,
    bindings: Vec<RoleBinding>,
}

impl StaticPolicyFetcher {
    pub fn new(kind: DestinationKind, bindings: Vec<RoleBinding>) -> Self {
        Self { kind, bindings }
    }
}

#[async_trait]
impl PolicyFetcher for StaticPolicyFetcher {
    fn kind(&self) -> DestinationKind {
        self.kind
    }

    async fn fetch_policy(&self, _destination: &Destination) -> Result<Vec<RoleBinding>, AuditError> {
        Ok(self.bindings.clone())
    }
}

/// Registry that answers every destination kind with the same bindings.
pub fn static_fetchers(bindings: Vec<RoleBinding>) -> FetcherRegistry {
    let mut registry = FetcherRegistry::new();
    for kind in DestinationKind::ALL {
        registry.register(Arc::new(StaticPolicyFetcher::new(kind, bindings.clone())));
    }
    registry
}

/// Parse an exported IAM policy; `.yaml`/`.yml` files are read as YAML,
/// anything else as JSON.
pub fn parse_policy(text: &str, yaml: bool) -> Result<Vec<RoleBinding>> {
    let policy: IamPolicy = if yaml {
        serde_yaml::from_str(text).context("Failed to parse policy YAML")?
    } else {
        serde_json::from_str(text).context("Failed to parse policy JSON")?
    };
    Ok(policy.into_bindings())
}

pub async fn load_policy_file(path: &Path) -> Result<Vec<RoleBinding>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read policy file: {}", path.display()))?;
    let yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let bindings = parse_policy(&text, yaml)
        .with_context(|| format!("Invalid policy file: {}", path.display()))?;
    info!(path = %path.display(), bindings = bindings.len(), "Loaded exported policy");
    Ok(bindings)
}
