//! Google Cloud implementations of the sink lookup and policy fetchers.

pub mod auth;
pub mod bigquery;
pub mod client;
pub mod offline;
pub mod policy;
pub mod pubsub;
pub mod sinks;
pub mod storage;

use std::sync::Arc;

use sinkaudit_security::FetcherRegistry;

pub use auth::{discover_access_token, TokenSource};
pub use bigquery::BigQueryPolicyFetcher;
pub use client::{Endpoints, GcpClient};
pub use offline::{load_policy_file, static_fetchers, StaticPolicyFetcher, StaticSinkLookup};
pub use pubsub::PubSubPolicyFetcher;
pub use sinks::LoggingSinkLookup;
pub use storage::StoragePolicyFetcher;

/// Registry with the storage, BigQuery and Pub/Sub fetchers sharing `client`.
pub fn google_fetchers(client: Arc<GcpClient>) -> FetcherRegistry {
    FetcherRegistry::new()
        .with(Arc::new(StoragePolicyFetcher::new(Arc::clone(&client))))
        .with(Arc::new(BigQueryPolicyFetcher::new(Arc::clone(&client))))
        .with(Arc::new(PubSubPolicyFetcher::new(client)))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{spawn_stub, stub_client, StubRoute};
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use sinkaudit_core::DestinationKind;
    use sinkaudit_security::run_audit;

    #[test]
    fn google_registry_covers_every_destination_kind() {
        let registry = google_fetchers(stub_client("http://127.0.0.1:1"));
        assert!(registry.missing().is_empty());
        for kind in DestinationKind::ALL {
            assert_eq!(registry.get(kind).unwrap().kind(), kind);
        }
    }

    #[tokio::test]
    async fn end_to_end_audit_against_stub_apis() {
        let writer = "serviceAccount:service-12@gcp-sa-logging.iam.gserviceaccount.com";
        let base = spawn_stub(vec![
            StubRoute::new(
                Method::GET,
                "/v2/projects/acme/sinks/audit-sink",
                StatusCode::OK,
                json!({
                    "name": "audit-sink",
                    "destination": "storage.googleapis.com/acme-audit",
                    "writerIdentity": writer
                }),
            ),
            StubRoute::new(
                Method::GET,
                "/storage/v1/b/acme-audit/iam",
                StatusCode::OK,
                json!({
                    "bindings": [
                        {"role": "roles/storage.objectCreator", "members": [writer]},
                        {"role": "roles/storage.objectAdmin", "members": [writer, "user:ops@example.com"]}
                    ]
                }),
            ),
        ])
        .await;

        let client = stub_client(&base);
        let lookup = LoggingSinkLookup::new(Arc::clone(&client));
        let report = run_audit(&lookup, &google_fetchers(client), "audit-sink", "acme")
            .await
            .unwrap();

        assert_eq!(report.writer_identity.as_str(), writer);
        assert_eq!(report.required_role, "roles/storage.objectCreator");
        assert_eq!(report.bindings.len(), 2);
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].role, "roles/storage.objectAdmin");
    }
}
