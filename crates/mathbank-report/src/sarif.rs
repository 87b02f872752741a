//! SARIF (Static Analysis Results Interchange Format) output.
//!
//! Generates SARIF 2.1.0 documents so curriculum issues show up in GitHub
//! Code Scanning next to the document they were found in.

use std::path::Path;

use anyhow::Result;
use serde_json::json;

use mathbank_core::issue::{IssueCategory, Severity};
use mathbank_core::report::AuditReport;

fn level(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical | Severity::High => "error",
        Severity::Medium => "warning",
        Severity::Low => "note",
    }
}

/// Generate a SARIF 2.1.0 JSON document from an audit report.
pub fn generate_sarif(report: &AuditReport) -> serde_json::Value {
    let rules: Vec<serde_json::Value> = IssueCategory::ALL
        .iter()
        .map(|category| {
            json!({
                "id": category.code(),
                "shortDescription": { "text": category.description() },
                "defaultConfiguration": { "level": level(category.severity()) },
            })
        })
        .collect();

    let results: Vec<serde_json::Value> = report
        .issues
        .iter()
        .map(|issue| {
            let mut text = format!("[{}] {}", issue.location(), issue.message);
            if let (Some(expected), Some(actual)) = (&issue.expected, &issue.actual) {
                text.push_str(&format!(" (expected {expected}, found {actual})"));
            }
            json!({
                "ruleId": issue.category.code(),
                "level": level(issue.severity),
                "message": { "text": text },
                "locations": [{
                    "physicalLocation": {
                        "artifactLocation": { "uri": report.document.path }
                    },
                    "logicalLocations": [{
                        "fullyQualifiedName": issue.location(),
                        "kind": if issue.question_index.is_some() { "member" } else { "namespace" },
                    }]
                }]
            })
        })
        .collect();

    json!({
        "$schema": "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/main/sarif-2.1/schema/sarif-schema-2.1.0.json",
        "version": "2.1.0",
        "runs": [{
            "tool": {
                "driver": {
                    "name": "mathbank",
                    "version": env!("CARGO_PKG_VERSION"),
                    "informationUri": "https://github.com/mathbank/mathbank",
                    "rules": rules
                }
            },
            "results": results
        }]
    })
}

/// Write a SARIF report to a file.
pub fn write_sarif_report(report: &AuditReport, path: &Path) -> Result<()> {
    let sarif = generate_sarif(report);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(&sarif)?;
    std::fs::write(path, json)?;
    Ok(())
}
