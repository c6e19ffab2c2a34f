//! Audit pipeline: resolve the sink, fetch its destination's policy, and
//! evaluate the writer's bindings against the baseline.
//!
//! Steps run strictly in order. The first resolver or fetcher error aborts
//! the run and no report is produced.

use chrono::Utc;
use sinkaudit_core::{AuditError, AuditReport, SinkLookup};
use tracing::info;

use crate::baseline::required_role;
use crate::evaluator::evaluate;
use crate::registry::FetcherRegistry;

pub async fn run_audit(
    lookup: &dyn SinkLookup,
    fetchers: &FetcherRegistry,
    sink: &str,
    project: &str,
) -> Result<AuditReport, AuditError> {
    let resolved = lookup.resolve(sink, project).await?;
    info!(
        sink,
        project,
        writer = %resolved.writer_identity,
        destination = %resolved.destination,
        "Resolved sink"
    );

    let bindings = fetchers.fetch_policy(&resolved.destination).await?;
    info!(bindings = bindings.len(), "Fetched destination policy");

    let required = required_role(resolved.destination.kind());
    let findings = evaluate(&bindings, &resolved.writer_identity, required);
    info!(findings = findings.len(), required_role = required, "Audit complete");

    Ok(AuditReport {
        sink: sink.to_string(),
        project: project.to_string(),
        writer_identity: resolved.writer_identity,
        destination: resolved.destination,
        destination_uri: resolved.destination_uri,
        required_role: required.to_string(),
        bindings,
        findings,
        audited_at: Utc::now(),
    })
}
