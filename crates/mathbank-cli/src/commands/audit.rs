//! The `mathbank audit` command.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use mathbank_core::audit::audit_document;
use mathbank_core::document::CurriculumDocument;
use mathbank_core::issue::Severity;
use mathbank_core::report::{AuditReport, DocumentSummary};
use mathbank_report::html::{generate_html, write_html_report};
use mathbank_report::sarif::{generate_sarif, write_sarif_report};

pub fn execute(
    document: Option<PathBuf>,
    format: String,
    output: Option<PathBuf>,
    fail_on: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let start = Instant::now();
    let threshold = fail_on
        .as_deref()
        .map(str::parse::<Severity>)
        .transpose()
        .map_err(anyhow::Error::msg)
        .context("invalid --fail-on")?;

    let (config, document_path) = super::settings(config_path.as_deref(), document)?;
    let doc = CurriculumDocument::load(&document_path)?;

    let audit = audit_document(&doc.sets, config.tolerance);
    let mut report = AuditReport::new("audit", DocumentSummary::of(&document_path, &doc))
        .with_issues(audit.issues)
        .with_completeness(audit.completeness);
    report.duration_ms = start.elapsed().as_millis() as u64;

    match (format.as_str(), output.as_ref()) {
        ("json", Some(path)) => report.save_json(path)?,
        ("json", None) => println!("{}", serde_json::to_string_pretty(&report)?),
        ("markdown" | "md", Some(path)) => write_text(path, &report.to_markdown())?,
        ("markdown" | "md", None) => println!("{}", report.to_markdown()),
        ("html", Some(path)) => write_html_report(&report, path)?,
        ("html", None) => println!("{}", generate_html(&report)),
        ("sarif", Some(path)) => write_sarif_report(&report, path)?,
        ("sarif", None) => println!("{}", serde_json::to_string_pretty(&generate_sarif(&report))?),
        ("text", _) => {
            print_summary(&report);
            if let Some(path) = &output {
                report.save_json(path)?;
            }
        }
        (other, _) => anyhow::bail!("unknown format '{other}' (expected text, json, markdown, html or sarif)"),
    }
    if let Some(path) = &output {
        eprintln!("Report saved to {}", path.display());
    }

    if let Some(threshold) = threshold {
        let failing = report.issues.iter().filter(|i| i.severity <= threshold).count();
        if failing > 0 {
            eprintln!("{failing} issue(s) at or above {threshold} severity");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn write_text(path: &std::path::Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("failed to write report to {}", path.display()))
}

fn print_summary(report: &AuditReport) {
    println!(
        "Audited {}: {} sets, {} questions",
        report.document.path, report.document.set_count, report.document.question_count
    );

    super::print_issues(&report.sorted_issues().into_iter().cloned().collect::<Vec<_>>());

    let mut table = Table::new();
    table.set_header(vec!["Severity", "Issues"]);
    for (severity, count) in report.severity_counts() {
        table.add_row(vec![Cell::new(severity), Cell::new(count)]);
    }
    println!("{table}");

    if let Some(c) = &report.completeness {
        println!(
            "Completeness: explanations {:.1}%, hints {:.1}%, images {:.1}%",
            c.explanation_ratio() * 100.0,
            c.hints_ratio() * 100.0,
            c.image_ratio() * 100.0
        );
    }
    if report.issues.is_empty() {
        println!("No issues found.");
    } else {
        println!("{} issue(s) found.", report.issues.len());
    }
}
