//! The `mathbank compare` command.

use std::path::PathBuf;

use anyhow::Result;

use mathbank_core::report::AuditReport;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    fail_on_new_issues: bool,
    format: String,
) -> Result<()> {
    let baseline = AuditReport::load_json(&baseline_path)?;
    let current = AuditReport::load_json(&current_path)?;

    let diff = current.compare(&baseline);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", diff.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&diff)?);
        }
        _ => {
            println!(
                "Comparison: {} new, {} resolved, {} unchanged",
                diff.new_issues.len(),
                diff.resolved_issues.len(),
                diff.unchanged
            );

            if !diff.new_issues.is_empty() {
                println!("\nNew issues:");
                for i in &diff.new_issues {
                    println!("  [{}] {} {}: {}", i.severity, i.location(), i.category, i.message);
                }
            }

            if !diff.resolved_issues.is_empty() {
                println!("\nResolved issues:");
                for i in &diff.resolved_issues {
                    println!("  [{}] {} {}: {}", i.severity, i.location(), i.category, i.message);
                }
            }
        }
    }

    if fail_on_new_issues && diff.has_new_issues() {
        std::process::exit(1);
    }

    Ok(())
}
