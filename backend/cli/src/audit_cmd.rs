//! `audit` and `check` commands: run the pipeline and print the report.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use logging::{RunEvent, RunEventLogger};
use sinkaudit_config::AuditConfig;
use sinkaudit_core::{AuditError, AuditReport, SinkLookup};
use sinkaudit_gcp::{
    discover_access_token, google_fetchers, load_policy_file, static_fetchers, Endpoints,
    GcpClient, LoggingSinkLookup, StaticSinkLookup,
};
use sinkaudit_security::{run_audit, FetcherRegistry};
use tracing::info;

use crate::report::{render_json, render_text};
use crate::terminal_output::supports_color;

/// Audit a live sink through the Google Cloud APIs.
pub async fn run(config: &AuditConfig, sink: &str, project: &str, json: bool) -> Result<()> {
    let client = match build_client(config).await {
        Ok(client) => Arc::new(client),
        Err(e) => {
            record_failure(sink, project, &e);
            return Err(e.into());
        }
    };
    let lookup = LoggingSinkLookup::new(Arc::clone(&client));
    let fetchers = google_fetchers(client);

    let report = audit_and_record(&lookup, &fetchers, sink, project).await?;
    print_report(&report, json)
}

/// Audit an exported policy file without calling any API.
pub async fn run_offline(
    writer_identity: &str,
    destination: &str,
    policy: &Path,
    sink: &str,
    project: &str,
    json: bool,
) -> Result<()> {
    let bindings = load_policy_file(policy).await?;
    let lookup = StaticSinkLookup::new(writer_identity, destination);
    let fetchers = static_fetchers(bindings);

    let report = audit_and_record(&lookup, &fetchers, sink, project).await?;
    print_report(&report, json)
}

async fn build_client(config: &AuditConfig) -> Result<GcpClient, AuditError> {
    let (token, source) = discover_access_token(config.access_token()).await?;
    info!(source = %source, "Obtained access token");

    let endpoints = Endpoints {
        logging: config.endpoint("logging"),
        storage: config.endpoint("storage"),
        bigquery: config.endpoint("bigquery"),
        pubsub: config.endpoint("pubsub"),
    };
    match config.request_timeout_secs() {
        Some(secs) => GcpClient::with_timeout(token, endpoints, Duration::from_secs(secs))
            .map_err(|e| AuditError::Credentials(format!("failed to build HTTP client: {e}"))),
        None => Ok(GcpClient::new(token, endpoints)),
    }
}

async fn audit_and_record(
    lookup: &dyn SinkLookup,
    fetchers: &FetcherRegistry,
    sink: &str,
    project: &str,
) -> Result<AuditReport> {
    match run_audit(lookup, fetchers, sink, project).await {
        Ok(report) => {
            RunEventLogger::log_event(
                sink,
                project,
                RunEvent::Completed {
                    writer_identity: report.writer_identity.to_string(),
                    destination: report.destination.uri(),
                    bindings: report.bindings.len(),
                    findings: report.findings.len(),
                },
            );
            Ok(report)
        }
        Err(e) => {
            record_failure(sink, project, &e);
            Err(e.into())
        }
    }
}

fn record_failure(sink: &str, project: &str, error: &AuditError) {
    RunEventLogger::log_event(
        sink,
        project,
        RunEvent::Failed {
            stage: error.stage().to_string(),
            error_msg: error.to_string(),
        },
    );
}

fn print_report(report: &AuditReport, json: bool) -> Result<()> {
    if json {
        println!("{}", render_json(report)?);
    } else {
        print!("{}", render_text(report, supports_color()));
    }
    Ok(())
}
