//! The `mathbank generate` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};
use rand::rngs::StdRng;
use rand::SeedableRng;

use mathbank_core::document::CurriculumDocument;
use mathbank_core::generator::{generate_skill, GenerateOptions};
use mathbank_core::skills::load_skills;

pub fn execute(
    skills_path: PathBuf,
    document: Option<PathBuf>,
    seed: Option<u64>,
    count: Option<usize>,
    dry_run: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let (config, document_path) = super::settings(config_path.as_deref(), document)?;
    let files = load_skills(&skills_path)?;
    if files.is_empty() {
        anyhow::bail!("no skill files found in {}", skills_path.display());
    }

    let options = GenerateOptions {
        max_attempts: config.max_attempts,
        option_count: config.option_count,
    };
    let mut doc = CurriculumDocument::load_or_default(&document_path)?;
    let mut generated = Vec::new();

    let mut table = Table::new();
    table.set_header(vec!["Id", "Grade", "Topic", "Family", "Questions", "Skipped"]);

    for file in &files {
        let file_seed = seed.or(file.skill_set.seed).or(config.seed);
        let mut rng = match file_seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let default_count = file.skill_set.default_count.unwrap_or(config.default_count);

        for skill in &file.skills {
            let fatal: Vec<String> = skill
                .check()
                .iter()
                .filter(|fault| fault.is_fatal())
                .map(ToString::to_string)
                .collect();
            if !fatal.is_empty() {
                tracing::warn!(skill = %skill.title, "skipping skill: {}", fatal.join("; "));
                continue;
            }

            // A skill's own seed applies unless --seed pins the whole run.
            let mut skill_rng = skill
                .seed
                .filter(|_| seed.is_none())
                .map(StdRng::seed_from_u64);
            let rng = skill_rng.as_mut().unwrap_or(&mut rng);
            let skill_count = count.or(skill.count).unwrap_or(default_count);
            let mut skill = skill.clone();
            skill.count = Some(skill_count);

            let result = generate_skill(&skill, default_count, &options, rng)?;
            if result.skipped > 0 {
                tracing::warn!(
                    id = %result.set.id,
                    requested = result.requested,
                    skipped = result.skipped,
                    "generated fewer questions than requested"
                );
            }

            table.add_row(vec![
                Cell::new(&result.set.id),
                Cell::new(&result.set.grade_level),
                Cell::new(&result.set.topic),
                Cell::new(skill.family.name()),
                Cell::new(format!("{}/{}", result.set.questions.len(), result.requested)),
                Cell::new(result.skipped),
            ]);
            generated.push(result.set);
        }
    }

    eprintln!("\n{table}");

    if dry_run {
        println!("{}", serde_json::to_string_pretty(&generated)?);
        return Ok(());
    }

    let total = generated.len();
    for set in generated {
        doc.append(set);
    }
    doc.save(&document_path)?;
    println!(
        "Appended {total} set(s) to {} ({} sets, {} questions)",
        document_path.display(),
        doc.sets.len(),
        doc.question_count()
    );

    Ok(())
}
