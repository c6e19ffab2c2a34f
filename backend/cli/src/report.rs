//! Report rendering: text for terminals, JSON for machines.

use anyhow::{Context, Result};
use sinkaudit_core::AuditReport;

use crate::terminal_output::{paint, render_table, Column, BOLD, CYAN, DIM, GREEN, RED};

pub const CLEAN_MESSAGE: &str = "No excessive permissions found for the writer identity.";

pub fn render_json(report: &AuditReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize audit report")
}

pub fn render_text(report: &AuditReport, color: bool) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{} {}\n",
        paint("Writer Identity:", BOLD, color),
        report.writer_identity
    ));
    out.push_str(&format!(
        "{} {}\n",
        paint("Destination:", BOLD, color),
        report.destination_uri
    ));
    out.push_str(&format!(
        "{} {}\n",
        paint("Required Role:", BOLD, color),
        report.required_role
    ));
    out.push_str(&paint(
        &format!(
            "Audited sink {} in project {} at {}",
            report.sink,
            report.project,
            report.audited_at.to_rfc3339()
        ),
        DIM,
        color,
    ));
    out.push('\n');

    out.push('\n');
    out.push_str(&paint("Destination IAM Bindings:", CYAN, color));
    out.push('\n');
    if report.bindings.is_empty() {
        out.push_str("  (no bindings)\n");
    } else {
        let rows: Vec<Vec<String>> = report
            .bindings
            .iter()
            .map(|b| vec![b.role.clone(), b.members.join(", ")])
            .collect();
        let columns = [Column::left("ROLE"), Column::left("MEMBERS").max_width(60)];
        out.push_str(&render_table(&columns, &rows, color));
    }

    out.push('\n');
    if report.findings.is_empty() {
        out.push_str(&paint(CLEAN_MESSAGE, GREEN, color));
        out.push('\n');
        return out;
    }

    out.push_str(&paint("IAM Policy Audit Findings:", RED, color));
    out.push('\n');
    for finding in &report.findings {
        for (i, line) in finding.to_string().lines().enumerate() {
            out.push_str(if i == 0 { "- " } else { "  " });
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}
