pub mod audit;
pub mod compare;
pub mod dedupe;
pub mod generate;
pub mod init;
pub mod repair;
pub mod stats;
pub mod validate;
pub mod verify;

use std::path::{Path, PathBuf};

use anyhow::Result;
use comfy_table::{Cell, Table};

use mathbank_core::config::{load_config_from, MathbankConfig};
use mathbank_core::issue::{Change, Issue};

/// Load config and pick the document path: the flag wins over the config.
pub(crate) fn settings(
    config_path: Option<&Path>,
    document: Option<PathBuf>,
) -> Result<(MathbankConfig, PathBuf)> {
    let config = load_config_from(config_path)?;
    let document = document.unwrap_or_else(|| config.document.clone());
    Ok((config, document))
}

pub(crate) fn print_issues(issues: &[Issue]) {
    if issues.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec!["Severity", "Location", "Category", "Message"]);
    for issue in issues {
        table.add_row(vec![
            Cell::new(issue.severity),
            Cell::new(issue.location()),
            Cell::new(issue.category),
            Cell::new(&issue.message),
        ]);
    }
    println!("{table}");
}

pub(crate) fn print_changes(changes: &[Change]) {
    if changes.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec!["Location", "Field", "Before", "After", "Reason"]);
    for c in changes {
        table.add_row(vec![
            Cell::new(c.location()),
            Cell::new(&c.field),
            Cell::new(&c.before),
            Cell::new(&c.after),
            Cell::new(&c.reason),
        ]);
    }
    println!("{table}");
}
