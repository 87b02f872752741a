//! The `mathbank stats` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use mathbank_core::document::CurriculumDocument;
use mathbank_core::model::GradeLabel;

pub fn execute(document: Option<PathBuf>, format: String, config_path: Option<PathBuf>) -> Result<()> {
    let (_, document_path) = super::settings(config_path.as_deref(), document)?;
    let doc = CurriculumDocument::load(&document_path)?;
    let stats = doc.stats();

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!(
        "{}: {} sets, {} questions",
        document_path.display(),
        stats.sets,
        stats.questions
    );

    let mut by_grade = Table::new();
    by_grade.set_header(vec!["Grade", "Sets", "Questions"]);
    for (grade, group) in &stats.by_grade {
        by_grade.add_row(vec![
            Cell::new(GradeLabel(*grade)),
            Cell::new(group.sets),
            Cell::new(group.questions),
        ]);
    }
    if stats.invalid_grade.sets > 0 {
        by_grade.add_row(vec![
            Cell::new("invalid"),
            Cell::new(stats.invalid_grade.sets),
            Cell::new(stats.invalid_grade.questions),
        ]);
    }
    println!("{by_grade}");

    let mut by_topic = Table::new();
    by_topic.set_header(vec!["Topic", "Sets", "Questions"]);
    for (topic, group) in &stats.by_topic {
        by_topic.add_row(vec![
            Cell::new(topic),
            Cell::new(group.sets),
            Cell::new(group.questions),
        ]);
    }
    println!("{by_topic}");

    let duplicates = doc.duplicate_ids();
    if !duplicates.is_empty() {
        println!("Duplicate ids: {}", duplicates.join(", "));
    }

    Ok(())
}
