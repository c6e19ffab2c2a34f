use async_trait::async_trait;

use crate::destination::{Destination, DestinationKind};
use crate::error::AuditError;
use crate::types::{ResolvedSink, RoleBinding};

/// Reads a sink's configuration from the logging provider.
#[async_trait]
pub trait SinkLookup: Send + Sync {
    /// Return the sink's writer identity and classified destination.
    async fn resolve(&self, sink: &str, project: &str) -> Result<ResolvedSink, AuditError>;
}

/// Reads the access-control policy of one kind of destination.
///
/// Implementations return bindings with unique roles (see
/// [`crate::types::normalize_bindings`]).
#[async_trait]
pub trait PolicyFetcher: Send + Sync {
    /// Destination kind this fetcher serves.
    fn kind(&self) -> DestinationKind;

    /// Fetch the current policy snapshot for `destination`.
    async fn fetch_policy(&self, destination: &Destination)
        -> Result<Vec<RoleBinding>, AuditError>;
}
