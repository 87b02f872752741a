//! The `mathbank init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("mathbank.toml").exists() {
        println!("mathbank.toml already exists, skipping.");
    } else {
        std::fs::write("mathbank.toml", SAMPLE_CONFIG)?;
        println!("Created mathbank.toml");
    }

    std::fs::create_dir_all("skills")?;
    let example_path = std::path::Path::new("skills/example.toml");
    if example_path.exists() {
        println!("skills/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_SKILLS)?;
        println!("Created skills/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: mathbank validate --skills skills/example.toml");
    println!("  2. Run: mathbank generate --skills skills/example.toml");
    println!("  3. Run: mathbank audit");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# mathbank configuration

document = "curriculum.json"
default_count = 10
max_attempts = 100
tolerance = 0.01
option_count = 4
output_dir = "./mathbank-reports"
# seed = 42
"#;

const EXAMPLE_SKILLS: &str = r#"[skill_set]
name = "Getting Started"
description = "A few skills to try the generator"
seed = 42

[[skills]]
title = "Two-digit addition with regrouping"
grade_level = 2
topic = "Addition"
count = 5

[skills.family]
kind = "addition"
min = 10
max = 99
regrouping = true

[[skills]]
title = "Divide by 4"
grade_level = 3
topic = "Division"
count = 5

[skills.family]
kind = "division"
divisors = [4]
max_quotient = 10

[[skills]]
title = "Adding like fractions"
grade_level = 4
topic = "Fractions"
count = 5

[skills.family]
kind = "fraction"
op = "add_like"
max_denominator = 12
"#;
