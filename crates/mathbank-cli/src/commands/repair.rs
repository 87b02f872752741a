//! The `mathbank repair` command.

use std::path::PathBuf;

use anyhow::Result;

use mathbank_core::document::CurriculumDocument;
use mathbank_core::normalize::repair_document;

pub fn execute(document: Option<PathBuf>, dry_run: bool, config_path: Option<PathBuf>) -> Result<()> {
    let (_, document_path) = super::settings(config_path.as_deref(), document)?;
    let mut doc = CurriculumDocument::load(&document_path)?;

    let report = repair_document(&mut doc.sets);

    super::print_changes(&report.changes);
    super::print_issues(&report.issues);
    println!(
        "Repaired {} question(s), {} unrepairable",
        report.repaired, report.unrepairable
    );

    if report.changes.is_empty() {
        return Ok(());
    }
    if dry_run {
        println!("Dry run, document not written.");
    } else {
        doc.save(&document_path)?;
        println!("Wrote {}", document_path.display());
    }

    Ok(())
}
