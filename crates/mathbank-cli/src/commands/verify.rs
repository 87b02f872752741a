//! The `mathbank verify` command.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;

use mathbank_core::document::CurriculumDocument;
use mathbank_core::issue::IssueCategory;
use mathbank_core::report::{AuditReport, DocumentSummary};
use mathbank_core::verify::{verify_document, FixPolicy};

pub fn execute(
    document: Option<PathBuf>,
    fix: bool,
    delete_unfixable: bool,
    tolerance: Option<f64>,
    report_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let start = Instant::now();
    let (config, document_path) = super::settings(config_path.as_deref(), document)?;
    let mut doc = CurriculumDocument::load(&document_path)?;
    let summary = DocumentSummary::of(&document_path, &doc);

    let policy = FixPolicy {
        fix,
        delete_unfixable,
        tolerance: tolerance.unwrap_or(config.tolerance),
    };
    let outcome = verify_document(&mut doc.sets, &policy);

    super::print_issues(&outcome.issues);
    super::print_changes(&outcome.changes);
    let mismatches = outcome
        .issues
        .iter()
        .filter(|i| i.category == IssueCategory::AnswerMismatch)
        .count();
    println!(
        "Checked {} question(s), skipped {} non-computational, {mismatches} mismatch(es), {} fixed, {} deleted",
        outcome.checked, outcome.skipped, outcome.fixed, outcome.deleted
    );

    if fix && !outcome.changes.is_empty() {
        doc.save(&document_path)?;
        println!("Wrote {}", document_path.display());
    }

    if let Some(path) = report_path {
        let mut report = AuditReport::new("verify", summary)
            .with_issues(outcome.issues)
            .with_changes(outcome.changes);
        report.duration_ms = start.elapsed().as_millis() as u64;
        report.save_json(&path)?;
        println!("Report saved to {}", path.display());
    }

    Ok(())
}
