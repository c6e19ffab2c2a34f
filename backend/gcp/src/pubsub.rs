use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use sinkaudit_core::{AuditError, Destination, DestinationKind, PolicyFetcher, RoleBinding, Stage};

use crate::client::{CallSite, GcpClient, NotFound};
use crate::policy::{IamPolicy, REQUESTED_POLICY_VERSION};

/// Reads topic IAM policies from the Pub/Sub v1 API.
pub struct PubSubPolicyFetcher {
    client: Arc<GcpClient>,
}

impl PubSubPolicyFetcher {
    pub fn new(client: Arc<GcpClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PolicyFetcher for PubSubPolicyFetcher {
    fn kind(&self) -> DestinationKind {
        DestinationKind::Topic
    }

    async fn fetch_policy(&self, destination: &Destination) -> Result<Vec<RoleBinding>, AuditError> {
        let Destination::Topic { project, topic } = destination else {
            return Err(AuditError::NoFetcher {
                kind: DestinationKind::Topic,
                resource: destination.uri(),
            });
        };
        let url = format!(
            "{}/v1/projects/{}/topics/{}:getIamPolicy?options.requestedPolicyVersion={}",
            self.client.endpoints().pubsub.trim_end_matches('/'),
            project,
            topic,
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
        debug!(project = %project, topic = %topic, bindings = policy.bindings.len(), "Fetched topic policy");
        Ok(policy.into_bindings())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{spawn_stub, stub_client, StubRoute};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    const WRITER: &str = "serviceAccount:service-3@gcp-sa-logging.iam.gserviceaccount.com";

    fn topic() -> Destination {
        Destination::Topic {
            project: "acme".into(),
            topic: "log-stream".into(),
        }
    }

    #[tokio::test]
    async fn duplicate_publisher_entries_collapse_to_one_binding() {
        let base = spawn_stub(vec![StubRoute::new(
            Method::GET,
            "/v1/projects/acme/topics/log-stream:getIamPolicy",
            StatusCode::OK,
            json!({
                "bindings": [
                    {"role": "roles/pubsub.publisher", "members": [WRITER]},
                    {"role": "roles/pubsub.publisher", "members": [WRITER]}
                ]
            }),
        )])
        .await;

        let fetcher = PubSubPolicyFetcher::new(stub_client(&base));
        let bindings = fetcher.fetch_policy(&topic()).await.unwrap();
        assert_eq!(bindings, vec![RoleBinding::new("roles/pubsub.publisher", [WRITER])]);
    }

    #[tokio::test]
    async fn unauthorized_is_permission_denied() {
        let base = spawn_stub(vec![StubRoute::new(
            Method::GET,
            "/v1/projects/acme/topics/log-stream:getIamPolicy",
            StatusCode::UNAUTHORIZED,
            json!({"error": {"code": 401, "message": "Request had invalid authentication credentials."}}),
        )])
        .await;

        let fetcher = PubSubPolicyFetcher::new(stub_client(&base));
        let err = fetcher.fetch_policy(&topic()).await.unwrap_err();
        assert!(matches!(err, AuditError::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn empty_policy_has_no_bindings() {
        let base = spawn_stub(vec![StubRoute::new(
            Method::GET,
            "/v1/projects/acme/topics/log-stream:getIamPolicy",
            StatusCode::OK,
            json!({"etag": "ACAB"}),
        )])
        .await;

        let fetcher = PubSubPolicyFetcher::new(stub_client(&base));
        assert!(fetcher.fetch_policy(&topic()).await.unwrap().is_empty());
    }
}
