use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use sinkaudit_core::{AuditError, Destination, ResolvedSink, SinkLookup, Stage, WriterIdentity};

use crate::client::{CallSite, GcpClient, NotFound};

/// Cloud Logging sink resource, as far as the audit needs it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogSink {
    #[serde(default)]
    name: Option<String>,
    destination: String,
    #[serde(default)]
    writer_identity: Option<String>,
}

/// Resolves sinks through the Cloud Logging v2 API.
pub struct LoggingSinkLookup {
    client: Arc<GcpClient>,
}

impl LoggingSinkLookup {
    pub fn new(client: Arc<GcpClient>) -> Self {
        Self { client }
    }

    fn sink_url(&self, sink: &str, project: &str) -> String {
        format!(
            "{}/v2/projects/{}/sinks/{}",
            self.client.endpoints().logging.trim_end_matches('/'),
            project,
            sink
        )
    }
}

#[async_trait]
impl SinkLookup for LoggingSinkLookup {
    async fn resolve(&self, sink: &str, project: &str) -> Result<ResolvedSink, AuditError> {
        let resource = format!("projects/{project}/sinks/{sink}");
        let url = self.sink_url(sink, project);

        let log_sink: LogSink = self
            .client
            .get_json(
                &url,
                CallSite {
                    stage: Stage::Resolution,
                    resource: &resource,
                    not_found: NotFound::Sink {
                        sink: sink.to_string(),
                        project: project.to_string(),
                    },
                },
            )
            .await?;
        debug!(name = ?log_sink.name, destination = %log_sink.destination, "Fetched sink");

        let writer_identity = log_sink
            .writer_identity
            .as_deref()
            .and_then(WriterIdentity::new)
            .ok_or_else(|| AuditError::MissingWriterIdentity {
                sink: resource.clone(),
            })?;
        let destination = Destination::parse(&log_sink.destination)?;

        info!(writer = %writer_identity, kind = ?destination.kind(), "Classified sink destination");
        Ok(ResolvedSink {
            writer_identity,
            destination,
            destination_uri: log_sink.destination,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{spawn_stub, stub_client, StubRoute};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn resolves_writer_identity_and_destination() {
        let base = spawn_stub(vec![StubRoute::new(
            Method::GET,
            "/v2/projects/acme/sinks/audit-sink",
            StatusCode::OK,
            json!({
                "name": "audit-sink",
                "destination": "bigquery.googleapis.com/projects/acme-logs/datasets/audit",
                "filter": "logName:\"cloudaudit.googleapis.com\"",
                "writerIdentity": "serviceAccount:service-77@gcp-sa-logging.iam.gserviceaccount.com"
            }),
        )])
        .await;

        let lookup = LoggingSinkLookup::new(stub_client(&base));
        let resolved = lookup.resolve("audit-sink", "acme").await.unwrap();
        assert_eq!(
            resolved.writer_identity.as_str(),
            "serviceAccount:service-77@gcp-sa-logging.iam.gserviceaccount.com"
        );
        assert_eq!(
            resolved.destination,
            Destination::Warehouse {
                project: "acme-logs".into(),
                dataset: "audit".into()
            }
        );
    }

    #[tokio::test]
    async fn unknown_sink_is_sink_not_found() {
        let base = spawn_stub(Vec::new()).await;
        let lookup = LoggingSinkLookup::new(stub_client(&base));
        let err = lookup.resolve("nope", "acme").await.unwrap_err();
        match err {
            AuditError::SinkNotFound { sink, project } => {
                assert_eq!(sink, "nope");
                assert_eq!(project, "acme");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn sink_without_writer_identity_fails_resolution() {
        let base = spawn_stub(vec![StubRoute::new(
            Method::GET,
            "/v2/projects/acme/sinks/audit-sink",
            StatusCode::OK,
            json!({"name": "audit-sink", "destination": "storage.googleapis.com/acme-logs"}),
        )])
        .await;

        let lookup = LoggingSinkLookup::new(stub_client(&base));
        let err = lookup.resolve("audit-sink", "acme").await.unwrap_err();
        assert!(matches!(err, AuditError::MissingWriterIdentity { .. }));
        assert_eq!(err.stage(), Stage::Resolution);
    }

    #[tokio::test]
    async fn log_bucket_destination_is_unsupported() {
        let base = spawn_stub(vec![StubRoute::new(
            Method::GET,
            "/v2/projects/acme/sinks/_Default",
            StatusCode::OK,
            json!({
                "name": "_Default",
                "destination": "logging.googleapis.com/projects/acme/locations/global/buckets/_Default",
                "writerIdentity": "serviceAccount:service-77@gcp-sa-logging.iam.gserviceaccount.com"
            }),
        )])
        .await;

        let lookup = LoggingSinkLookup::new(stub_client(&base));
        let err = lookup.resolve("_Default", "acme").await.unwrap_err();
        assert!(matches!(err, AuditError::UnsupportedDestination { .. }));
    }

    #[tokio::test]
    async fn forbidden_sink_read_is_permission_denied_at_resolution() {
        let base = spawn_stub(vec![StubRoute::new(
            Method::GET,
            "/v2/projects/acme/sinks/audit-sink",
            StatusCode::FORBIDDEN,
            json!({"error": {"code": 403, "message": "Permission 'logging.sinks.get' denied"}}),
        )])
        .await;

        let lookup = LoggingSinkLookup::new(stub_client(&base));
        let err = lookup.resolve("audit-sink", "acme").await.unwrap_err();
        assert!(matches!(
            err,
            AuditError::PermissionDenied { stage: Stage::Resolution, .. }
        ));
        assert!(err.to_string().contains("projects/acme/sinks/audit-sink"));
    }
}
