//! The `mathbank validate` command.

use std::path::PathBuf;

use anyhow::Result;

use mathbank_core::skills::{load_skills, validate_skill_file};

pub fn execute(skills_path: PathBuf) -> Result<()> {
    let files = load_skills(&skills_path)?;

    let mut total_warnings = 0;
    let mut total_errors = 0;

    for file in &files {
        println!(
            "Skill set: {} ({} skills)",
            file.skill_set.name,
            file.skills.len()
        );

        for w in validate_skill_file(file) {
            let prefix = w
                .skill
                .as_ref()
                .map(|title| format!("  [{title}]"))
                .unwrap_or_else(|| "  ".to_string());
            if w.fatal {
                println!("{prefix} ERROR: {}", w.message);
                total_errors += 1;
            } else {
                println!("{prefix} WARNING: {}", w.message);
                total_warnings += 1;
            }
        }
    }

    if total_errors > 0 {
        anyhow::bail!("{total_errors} error(s) and {total_warnings} warning(s) found");
    }
    if total_warnings == 0 {
        println!("All skill files valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
