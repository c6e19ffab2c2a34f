//! BigQuery dataset access, read from the `access[]` list of `datasets.get`.
//!
//! Datasets have no IAM policy endpoint of their own. Each access entry
//! carries one role (legacy `OWNER`/`WRITER`/`READER` or a full `roles/...`
//! name) and exactly one principal field.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use sinkaudit_core::{
    normalize_bindings, AuditError, Destination, DestinationKind, PolicyFetcher, RoleBinding,
    Stage,
};

use crate::client::{CallSite, GcpClient, NotFound};
use crate::policy::REQUESTED_POLICY_VERSION;

#[derive(Debug, Deserialize)]
struct Dataset {
    #[serde(default)]
    access: Vec<AccessEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessEntry {
    role: Option<String>,
    user_by_email: Option<String>,
    group_by_email: Option<String>,
    domain: Option<String>,
    special_group: Option<String>,
    iam_member: Option<String>,
}

/// Reads dataset access lists from the BigQuery v2 API.
pub struct BigQueryPolicyFetcher {
    client: Arc<GcpClient>,
}

impl BigQueryPolicyFetcher {
    pub fn new(client: Arc<GcpClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PolicyFetcher for BigQueryPolicyFetcher {
    fn kind(&self) -> DestinationKind {
        DestinationKind::Warehouse
    }

    async fn fetch_policy(&self, destination: &Destination) -> Result<Vec<RoleBinding>, AuditError> {
        let Destination::Warehouse { project, dataset } = destination else {
            return Err(AuditError::NoFetcher {
                kind: DestinationKind::Warehouse,
                resource: destination.uri(),
            });
        };
        let url = format!(
            "{}/bigquery/v2/projects/{}/datasets/{}?accessPolicyVersion={}",
            self.client.endpoints().bigquery.trim_end_matches('/'),
            project,
            dataset,
            REQUESTED_POLICY_VERSION
        );
        let resource = destination.uri();

        let ds: Dataset = self
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
        debug!(project = %project, dataset = %dataset, entries = ds.access.len(), "Fetched dataset access list");
        Ok(access_bindings(project, ds.access))
    }
}

/// Turn access entries into role bindings, one per role.
///
/// Entries without a role (authorized views, routines and datasets) grant
/// no principal anything and are skipped.
fn access_bindings(project: &str, entries: Vec<AccessEntry>) -> Vec<RoleBinding> {
    normalize_bindings(entries.into_iter().filter_map(|entry| {
        let role = iam_role(entry.role.as_deref()?);
        let member = principal(project, &entry)?;
        Some(RoleBinding::new(role, [member]))
    }))
}

fn iam_role(role: &str) -> String {
    match role {
        "OWNER" => "roles/bigquery.dataOwner".to_string(),
        "WRITER" => "roles/bigquery.dataEditor".to_string(),
        "READER" => "roles/bigquery.dataViewer".to_string(),
        other => other.to_string(),
    }
}

/// IAM principal string for an access entry.
fn principal(project: &str, entry: &AccessEntry) -> Option<String> {
    if let Some(email) = &entry.user_by_email {
        let kind = if email.ends_with(".gserviceaccount.com") {
            "serviceAccount"
        } else {
            "user"
        };
        return Some(format!("{kind}:{email}"));
    }
    if let Some(email) = &entry.group_by_email {
        return Some(format!("group:{email}"));
    }
    if let Some(domain) = &entry.domain {
        return Some(format!("domain:{domain}"));
    }
    if let Some(member) = &entry.iam_member {
        return Some(member.clone());
    }
    entry.special_group.as_deref().map(|group| match group {
        "projectOwners" => format!("projectOwner:{project}"),
        "projectWriters" => format!("projectEditor:{project}"),
        "projectReaders" => format!("projectViewer:{project}"),
        "allAuthenticatedUsers" => "allAuthenticatedUsers".to_string(),
        other => format!("specialGroup:{other}"),
    })
}
