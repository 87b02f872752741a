//! The `mathbank dedupe` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use mathbank_core::document::CurriculumDocument;
use mathbank_core::normalize::dedupe_with_report;

pub fn execute(document: Option<PathBuf>, dry_run: bool, config_path: Option<PathBuf>) -> Result<()> {
    let (_, document_path) = super::settings(config_path.as_deref(), document)?;
    let doc = CurriculumDocument::load(&document_path)?;
    let sets_before = doc.sets.len();

    let (sets, merges) = dedupe_with_report(doc.sets);
    let doc = CurriculumDocument::new(sets);

    if merges.is_empty() {
        println!("No duplicate sets in {}", document_path.display());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Kept", "Merged", "Questions before", "Questions after"]);
    for m in &merges {
        table.add_row(vec![
            Cell::new(&m.kept_id),
            Cell::new(m.merged_ids.join(", ")),
            Cell::new(m.questions_before),
            Cell::new(m.questions_after),
        ]);
    }
    println!("{table}");
    println!(
        "Merged {} group(s): {} sets -> {} sets",
        merges.len(),
        sets_before,
        doc.sets.len()
    );

    if dry_run {
        println!("Dry run, document not written.");
    } else {
        doc.save(&document_path)?;
        println!("Wrote {}", document_path.display());
    }

    Ok(())
}
