use std::collections::HashMap;
use std::sync::Arc;

use sinkaudit_core::{AuditError, Destination, DestinationKind, PolicyFetcher, RoleBinding};
use tracing::debug;

/// Policy fetchers keyed by the destination kind they serve.
///
/// This is the single place a destination is routed to its fetcher.
pub struct FetcherRegistry {
    fetchers: HashMap<DestinationKind, Arc<dyn PolicyFetcher>>,
}

impl FetcherRegistry {
    pub fn new() -> Self {
        Self {
            fetchers: HashMap::new(),
        }
    }

    /// Register a fetcher under the kind it reports, replacing any earlier one.
    pub fn register(&mut self, fetcher: Arc<dyn PolicyFetcher>) {
        self.fetchers.insert(fetcher.kind(), fetcher);
    }

    pub fn with(mut self, fetcher: Arc<dyn PolicyFetcher>) -> Self {
        self.register(fetcher);
        self
    }

    pub fn get(&self, kind: DestinationKind) -> Option<Arc<dyn PolicyFetcher>> {
        self.fetchers.get(&kind).cloned()
    }

    /// Kinds with no registered fetcher.
    pub fn missing(&self) -> Vec<DestinationKind> {
        DestinationKind::ALL
            .into_iter()
            .filter(|k| !self.fetchers.contains_key(k))
            .collect()
    }

    /// Fetch the policy of `destination` with the fetcher for its kind.
    pub async fn fetch_policy(
        &self,
        destination: &Destination,
    ) -> Result<Vec<RoleBinding>, AuditError> {
        let kind = destination.kind();
        let fetcher = self.get(kind).ok_or_else(|| AuditError::NoFetcher {
            kind,
            resource: destination.uri(),
        })?;
        debug!(kind = ?kind, destination = %destination, "Dispatching policy fetch");
        fetcher.fetch_policy(destination).await
    }
}

impl Default for FetcherRegistry {
    fn default() -> Self {
        Self::new()
    }
}
