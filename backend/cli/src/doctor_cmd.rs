//! CLI Doctor Command
//!
//! Checks that credentials and endpoints are in place before a live audit.

use anyhow::Result;
use sinkaudit_config::{redacted_view, AuditConfig};
use sinkaudit_gcp::auth::{gcloud_available, TOKEN_ENV_VARS};
use sinkaudit_gcp::discover_access_token;
use sinkaudit_security::baseline_table;
use std::env;

/// Executes the full doctor diagnosis.
pub async fn run(config: &AuditConfig) -> Result<()> {
    println!("\n🔍 Running sink-audit doctor...\n");

    check_env_vars();
    let gcloud = check_gcloud().await;
    let token = check_token(config).await;
    check_endpoints(config);
    print_baseline();
    print_config(config)?;

    println!();
    if token {
        println!("✅ All checks passed! Ready to audit sinks.");
    } else {
        println!("❌ No access token could be found. Please fix the errors above.");
        if !gcloud {
            println!("   Hint: install the Google Cloud SDK and run `gcloud auth login`.");
        }
    }

    Ok(())
}

fn check_env_vars() {
    println!("Checking Environment Variables:");

    for var in TOKEN_ENV_VARS {
        match env::var(var) {
            Ok(val) if !val.trim().is_empty() => println!("  🟢 {var} is set"),
            _ => println!("  🟡 {var} is missing (optional)"),
        }
    }

    // Service-account key files are not exchanged for tokens here.
    if env::var("GOOGLE_APPLICATION_CREDENTIALS").is_ok_and(|v| !v.is_empty()) {
        println!(
            "  🟡 GOOGLE_APPLICATION_CREDENTIALS is set but not used; \
             run `gcloud auth activate-service-account` with it instead"
        );
    }
}

async fn check_gcloud() -> bool {
    println!("Checking gcloud CLI:");
    let available = gcloud_available().await;
    if available {
        println!("  🟢 gcloud is installed");
    } else {
        println!("  🟡 gcloud was not found on PATH");
    }
    available
}

async fn check_token(config: &AuditConfig) -> bool {
    println!("Checking Access Token:");
    match discover_access_token(config.access_token()).await {
        Ok((_, source)) => {
            println!("  🟢 Token available from {source}");
            true
        }
        Err(e) => {
            println!("  🔴 {e}");
            false
        }
    }
}

fn check_endpoints(config: &AuditConfig) {
    println!("Checking API Endpoints:");
    for service in sinkaudit_config::defaults::SERVICES {
        println!("  🟢 {service:<9} {}", config.endpoint(service));
    }
}

fn print_baseline() {
    println!("Least-Privilege Writer Roles:");
    for line in baseline_lines() {
        println!("{line}");
    }
}

fn baseline_lines() -> Vec<String> {
    baseline_table()
        .into_iter()
        .map(|(kind, role)| format!("  {:<17} {role}", kind.to_string()))
        .collect()
}

fn print_config(config: &AuditConfig) -> Result<()> {
    println!("Effective Config (secrets redacted):");
    let view = redacted_view(config)?;
    for line in serde_json::to_string_pretty(&view)?.lines() {
        println!("  {line}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_lines_cover_every_destination_kind() {
        let lines = baseline_lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "  storage bucket    roles/storage.objectCreator");
        assert!(lines[1].ends_with("roles/bigquery.dataEditor"));
        assert!(lines[2].starts_with("  pubsub topic "));
    }
}
