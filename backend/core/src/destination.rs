//! Sink destinations and the parser that classifies a sink's destination URI.
//!
//! Recognized forms:
//! - `storage.googleapis.com/<bucket>`
//! - `bigquery.googleapis.com/projects/<project>/datasets/<dataset>`
//! - `pubsub.googleapis.com/projects/<project>/topics/<topic>`

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AuditError;

const STORAGE_PREFIX: &str = "storage.googleapis.com";
const BIGQUERY_PREFIX: &str = "bigquery.googleapis.com";
const PUBSUB_PREFIX: &str = "pubsub.googleapis.com";

/// Variant tag of a [`Destination`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationKind {
    Storage,
    Warehouse,
    Topic,
}

impl DestinationKind {
    pub const ALL: [DestinationKind; 3] = [
        DestinationKind::Storage,
        DestinationKind::Warehouse,
        DestinationKind::Topic,
    ];

    /// Service host that prefixes destination URIs of this kind.
    pub fn service(&self) -> &'static str {
        match self {
            DestinationKind::Storage => STORAGE_PREFIX,
            DestinationKind::Warehouse => BIGQUERY_PREFIX,
            DestinationKind::Topic => PUBSUB_PREFIX,
        }
    }
}

impl fmt::Display for DestinationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DestinationKind::Storage => f.write_str("storage bucket"),
            DestinationKind::Warehouse => f.write_str("bigquery dataset"),
            DestinationKind::Topic => f.write_str("pubsub topic"),
        }
    }
}

/// The resource a sink writes into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Destination {
    Storage { bucket: String },
    Warehouse { project: String, dataset: String },
    Topic { project: String, topic: String },
}

impl Destination {
    pub fn kind(&self) -> DestinationKind {
        match self {
            Destination::Storage { .. } => DestinationKind::Storage,
            Destination::Warehouse { .. } => DestinationKind::Warehouse,
            Destination::Topic { .. } => DestinationKind::Topic,
        }
    }

    /// Classify a sink destination URI.
    ///
    /// Fails with [`AuditError::UnsupportedDestination`] when the service
    /// prefix is not one of the three known ones, and with
    /// [`AuditError::MalformedDestination`] when the prefix is known but the
    /// path does not have the shape that kind requires.
    pub fn parse(uri: &str) -> Result<Self, AuditError> {
        let trimmed = uri.trim().trim_end_matches('/');
        let (service, path) = match trimmed.split_once('/') {
            Some((service, path)) => (service, path),
            None => (trimmed, ""),
        };

        match service {
            STORAGE_PREFIX => parse_storage(uri, path),
            BIGQUERY_PREFIX => {
                let (project, dataset) = parse_project_scoped(uri, path, "datasets")?;
                Ok(Destination::Warehouse { project, dataset })
            }
            PUBSUB_PREFIX => {
                let (project, topic) = parse_project_scoped(uri, path, "topics")?;
                Ok(Destination::Topic { project, topic })
            }
            _ => Err(AuditError::UnsupportedDestination {
                destination: uri.trim().to_string(),
            }),
        }
    }

    /// Canonical URI, in the same form a sink reports it.
    pub fn uri(&self) -> String {
        match self {
            Destination::Storage { bucket } => format!("{STORAGE_PREFIX}/{bucket}"),
            Destination::Warehouse { project, dataset } => {
                format!("{BIGQUERY_PREFIX}/projects/{project}/datasets/{dataset}")
            }
            Destination::Topic { project, topic } => {
                format!("{PUBSUB_PREFIX}/projects/{project}/topics/{topic}")
            }
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri())
    }
}

fn parse_storage(uri: &str, path: &str) -> Result<Destination, AuditError> {
    if path.is_empty() {
        return Err(AuditError::malformed(uri, "missing bucket name"));
    }
    if path.contains('/') {
        return Err(AuditError::malformed(
            uri,
            "bucket name must be a single path segment",
        ));
    }
    Ok(Destination::Storage {
        bucket: path.to_string(),
    })
}

/// Split `projects/<project>/<collection>/<name>` into (project, name).
fn parse_project_scoped(
    uri: &str,
    path: &str,
    collection: &str,
) -> Result<(String, String), AuditError> {
    let segments: Vec<&str> = path.split('/').collect();
    match segments.as_slice() {
        ["projects", project, coll, name]
            if *coll == collection && !project.is_empty() && !name.is_empty() =>
        {
            Ok((project.to_string(), name.to_string()))
        }
        ["projects", project, coll, _] if *coll == collection && project.is_empty() => {
            Err(AuditError::malformed(uri, "missing project segment"))
        }
        ["projects", _, coll, _] if *coll == collection => Err(AuditError::malformed(
            uri,
            format!("missing {} segment", singular(collection)),
        )),
        ["projects", _, coll] if *coll == collection => Err(AuditError::malformed(
            uri,
            format!("missing {} segment", singular(collection)),
        )),
        ["projects", ..] if segments.len() > 4 => Err(AuditError::malformed(
            uri,
            "unexpected trailing path segments",
        )),
        _ => Err(AuditError::malformed(
            uri,
            format!("expected projects/<project>/{collection}/<name>"),
        )),
    }
}

fn singular(collection: &str) -> &str {
    collection.trim_end_matches('s')
}
