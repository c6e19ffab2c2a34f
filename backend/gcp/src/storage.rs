use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use sinkaudit_core::{AuditError, Destination, DestinationKind, PolicyFetcher, RoleBinding, Stage};

use crate::client::{CallSite, GcpClient, NotFound};
use crate::policy::{IamPolicy, REQUESTED_POLICY_VERSION};

/// Reads bucket IAM policies from the Cloud Storage JSON API.
pub struct StoragePolicyFetcher {
    client: Arc<GcpClient>,
}

impl StoragePolicyFetcher {
    pub fn new(client: Arc<GcpClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PolicyFetcher for StoragePolicyFetcher {
    fn kind(&self) -> DestinationKind {
        DestinationKind::Storage
    }

    async fn fetch_policy(&self, destination: &Destination) -> Result<Vec<RoleBinding>, AuditError> {
        let Destination::Storage { bucket } = destination else {
            return Err(AuditError::NoFetcher {
                kind: DestinationKind::Storage,
                resource: destination.uri(),
            });
        };
        let url = format!(
            "{}/storage/v1/b/{}/iam?optionsRequestedPolicyVersion={}",
            self.client.endpoints().storage.trim_end_matches('/'),
            bucket,
            REQUESTED_POLICY_VERSION
        );
        let resource = destination.uri();

        let policy: IamPolicy = self
            .client
            .get_json(
                &url,
                CallSite {
                    stage: Stage::Fetch,
                    resource: &resource,
                    not_found: NotFound::Resource,
                },
            )
            .await?;
        debug!(bucket = %bucket, bindings = policy.bindings.len(), "Fetched bucket policy");
        Ok(policy.into_bindings())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{spawn_stub, stub_client, StubRoute};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    const WRITER: &str = "serviceAccount:service-1@gcp-sa-logging.iam.gserviceaccount.com";

    fn bucket() -> Destination {
        Destination::Storage {
            bucket: "acme-logs".into(),
        }
    }

    #[tokio::test]
    async fn fetches_and_normalizes_bucket_policy() {
        let base = spawn_stub(vec![StubRoute::new(
            Method::GET,
            "/storage/v1/b/acme-logs/iam",
            StatusCode::OK,
            json!({
                "bindings": [
                    {"role": "roles/storage.objectCreator", "members": [WRITER]},
                    {"role": "roles/storage.admin", "members": ["user:ops@example.com"]}
                ]
            }),
        )])
        .await;

        let fetcher = StoragePolicyFetcher::new(stub_client(&base));
        let bindings = fetcher.fetch_policy(&bucket()).await.unwrap();
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0], RoleBinding::new("roles/storage.objectCreator", [WRITER]));
    }

    #[tokio::test]
    async fn missing_bucket_is_resource_not_found() {
        let base = spawn_stub(Vec::new()).await;
        let fetcher = StoragePolicyFetcher::new(stub_client(&base));
        let err = fetcher.fetch_policy(&bucket()).await.unwrap_err();
        match err {
            AuditError::ResourceNotFound { resource } => {
                assert_eq!(resource, "storage.googleapis.com/acme-logs");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn forbidden_is_permission_denied() {
        let base = spawn_stub(vec![StubRoute::new(
            Method::GET,
            "/storage/v1/b/acme-logs/iam",
            StatusCode::FORBIDDEN,
            json!({"error": {"code": 403, "message": "missing storage.buckets.getIamPolicy"}}),
        )])
        .await;

        let fetcher = StoragePolicyFetcher::new(stub_client(&base));
        let err = fetcher.fetch_policy(&bucket()).await.unwrap_err();
        match err {
            AuditError::PermissionDenied { stage, message, .. } => {
                assert_eq!(stage, Stage::Fetch);
                assert_eq!(message, "missing storage.buckets.getIamPolicy");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_error_is_propagated_as_transport() {
        let base = spawn_stub(vec![StubRoute::new(
            Method::GET,
            "/storage/v1/b/acme-logs/iam",
            StatusCode::SERVICE_UNAVAILABLE,
            json!({"error": {"code": 503, "message": "backend unavailable"}}),
        )])
        .await;

        let fetcher = StoragePolicyFetcher::new(stub_client(&base));
        let err = fetcher.fetch_policy(&bucket()).await.unwrap_err();
        assert!(matches!(err, AuditError::Transport { stage: Stage::Fetch, .. }));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn rejects_destinations_of_other_kinds() {
        let fetcher = StoragePolicyFetcher::new(stub_client("http://127.0.0.1:1"));
        let topic = Destination::Topic {
            project: "p".into(),
            topic: "t".into(),
        };
        assert!(fetcher.fetch_policy(&topic).await.is_err());
    }
}
