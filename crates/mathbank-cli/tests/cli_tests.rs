//! CLI integration tests using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn mathbank(dir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("mathbank").unwrap();
    cmd.current_dir(dir)
        .env_remove("MATHBANK_DOCUMENT")
        .env_remove("MATHBANK_SEED")
        .env("HOME", dir);
    cmd
}

fn skills(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../skills")
        .join(name)
}

fn write_document(dir: &TempDir, json: &str) -> PathBuf {
    let path = dir.path().join("curriculum.json");
    std::fs::write(&path, json).unwrap();
    path
}

fn read_document(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

const MISMATCH_DOC: &str = r#"[
  {
    "id": "2-addition-two-digit",
    "title": "Two-digit addition",
    "grade_level": 2,
    "topic": "Addition",
    "questions": [
      {
        "question": "What is 45 + 23?",
        "options": ["66", "67", "68", "69"],
        "answer": "67",
        "explanation": "Add the ones, then the tens.",
        "hints": ["Line up the digits."],
        "type": "multiple-choice"
      },
      {
        "question": "What is 10 + 5?",
        "options": ["1", "2", "3"],
        "answer": "7",
        "explanation": "Count on.",
        "hints": ["Start at 10."]
      },
      {
        "question": "Which array shows 3 rows of 4?",
        "options": ["A", "B"],
        "answer": "A"
      }
    ]
  }
]"#;

// ---------------------------------------------------------------------------
// validate / init
// ---------------------------------------------------------------------------

#[test]
fn validate_valid_skill_file() {
    let dir = TempDir::new().unwrap();
    mathbank(dir.path())
        .arg("validate")
        .arg("--skills")
        .arg(skills("grade-3-facts.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("4 skills"))
        .stdout(predicate::str::contains("All skill files valid"));
}

#[test]
fn validate_directory() {
    let dir = TempDir::new().unwrap();
    mathbank(dir.path())
        .arg("validate")
        .arg("--skills")
        .arg(skills(""))
        .assert()
        .success()
        .stdout(predicate::str::contains("Grade 2 Addition and Subtraction"))
        .stdout(predicate::str::contains("Grade 3 Facts"))
        .stdout(predicate::str::contains("Geometry and the Coordinate Plane"));
}

#[test]
fn validate_nonexistent_file() {
    let dir = TempDir::new().unwrap();
    mathbank(dir.path())
        .arg("validate")
        .arg("--skills")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn validate_reports_fatal_faults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(
        &path,
        r#"
[skill_set]
name = "Broken"

[[skills]]
title = "Divide by nothing"
grade_level = 3
topic = "Division"

[skills.family]
kind = "division"
divisors = [0]
"#,
    )
    .unwrap();

    mathbank(dir.path())
        .arg("validate")
        .arg("--skills")
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("[Divide by nothing] ERROR: divisor set contains zero"))
        .stderr(predicate::str::contains("1 error(s)"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    mathbank(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created mathbank.toml"))
        .stdout(predicate::str::contains("Created skills/example.toml"));

    assert!(dir.path().join("mathbank.toml").exists());

    mathbank(dir.path())
        .arg("validate")
        .arg("--skills")
        .arg("skills/example.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("All skill files valid"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("mathbank.toml"), "# existing").unwrap();

    mathbank(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    let content = std::fs::read_to_string(dir.path().join("mathbank.toml")).unwrap();
    assert_eq!(content, "# existing");
}

// ---------------------------------------------------------------------------
// generate
// ---------------------------------------------------------------------------

#[test]
fn generate_writes_document() {
    let dir = TempDir::new().unwrap();
    let doc = dir.path().join("out").join("curriculum.json");

    mathbank(dir.path())
        .arg("generate")
        .arg("--skills")
        .arg(skills("grade-3-facts.toml"))
        .arg("--document")
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("Appended 4 set(s)"));

    let value = read_document(&doc);
    let sets = value.as_array().unwrap();
    assert_eq!(sets.len(), 4);
    assert_eq!(sets[0]["id"], "3-multiplication-multiply-by-6");
    assert_eq!(sets[0]["questions"].as_array().unwrap().len(), 10);
    assert_eq!(sets[1]["questions"].as_array().unwrap().len(), 12);

    for set in sets {
        for q in set["questions"].as_array().unwrap() {
            let answer = q["answer"].as_str().unwrap();
            let options: Vec<&str> = q["options"]
                .as_array()
                .unwrap()
                .iter()
                .map(|o| o.as_str().unwrap())
                .collect();
            assert_eq!(options.iter().filter(|o| **o == answer).count(), 1);
            assert!(q["explanation"].is_string());
            assert_eq!(q["hints"].as_array().unwrap().len(), 2);
        }
    }
}

#[test]
fn generate_is_deterministic_with_seed() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("a.json");
    let second = dir.path().join("b.json");

    for doc in [&first, &second] {
        mathbank(dir.path())
            .args(["generate", "--seed", "99", "--count", "5", "--skills"])
            .arg(skills("grade-4-fractions.toml"))
            .arg("--document")
            .arg(doc)
            .assert()
            .success();
    }

    assert_eq!(
        std::fs::read_to_string(&first).unwrap(),
        std::fs::read_to_string(&second).unwrap()
    );
}

#[test]
fn generate_twice_disambiguates_ids() {
    let dir = TempDir::new().unwrap();
    let doc = dir.path().join("curriculum.json");

    for _ in 0..2 {
        mathbank(dir.path())
            .args(["generate", "--count", "3", "--skills"])
            .arg(skills("grade-6-geometry.toml"))
            .arg("--document")
            .arg(&doc)
            .assert()
            .success();
    }

    let value = read_document(&doc);
    let ids: Vec<&str> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids.len(), 8);
    assert!(ids.contains(&"7-geometry-complementary-angles"));
    assert!(ids.contains(&"7-geometry-complementary-angles-2"));
}

#[test]
fn generate_dry_run_prints_sets() {
    let dir = TempDir::new().unwrap();
    let doc = dir.path().join("curriculum.json");

    let output = mathbank(dir.path())
        .args(["generate", "--dry-run", "--count", "2", "--skills"])
        .arg(skills("grade-2-addition.toml"))
        .arg("--document")
        .arg(&doc)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(!doc.exists());

    let sets: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(sets.as_array().unwrap().len(), 3);
    assert_eq!(sets[0]["questions"].as_array().unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// verify
// ---------------------------------------------------------------------------

#[test]
fn verify_reports_without_changing_document() {
    let dir = TempDir::new().unwrap();
    let doc = write_document(&dir, MISMATCH_DOC);

    mathbank(dir.path())
        .arg("verify")
        .arg("--document")
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("answer-mismatch"))
        .stdout(predicate::str::contains("Checked 2 question(s), skipped 1"));

    assert_eq!(std::fs::read_to_string(&doc).unwrap(), MISMATCH_DOC);
}

#[test]
fn verify_fix_rewrites_answers_and_keeps_unknown_fields() {
    let dir = TempDir::new().unwrap();
    let doc = write_document(&dir, MISMATCH_DOC);

    mathbank(dir.path())
        .args(["verify", "--fix", "--document"])
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("unfixable-answer"))
        .stdout(predicate::str::contains("1 fixed, 0 deleted"));

    let value = read_document(&doc);
    let questions = value[0]["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 3);
    assert_eq!(questions[0]["answer"], "68");
    assert_eq!(questions[0]["type"], "multiple-choice");
    assert_eq!(questions[1]["answer"], "7");
}

#[test]
fn verify_deletes_unfixable_only_when_asked() {
    let dir = TempDir::new().unwrap();
    let doc = write_document(&dir, MISMATCH_DOC);
    let report = dir.path().join("reports").join("verify.json");

    mathbank(dir.path())
        .args(["verify", "--fix", "--delete-unfixable", "--document"])
        .arg(&doc)
        .arg("--report")
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 deleted"));

    let value = read_document(&doc);
    let questions = value[0]["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[1]["question"], "Which array shows 3 rows of 4?");

    let saved = read_document(&report);
    assert_eq!(saved["tool"], "verify");
    assert!(saved["changes"]
        .as_array()
        .unwrap()
        .iter()
        .any(|c| c["field"] == "questions"));
}

#[test]
fn delete_unfixable_requires_fix() {
    let dir = TempDir::new().unwrap();
    let doc = write_document(&dir, MISMATCH_DOC);

    mathbank(dir.path())
        .args(["verify", "--delete-unfixable", "--document"])
        .arg(&doc)
        .assert()
        .failure();
}

#[test]
fn verify_missing_document_fails() {
    let dir = TempDir::new().unwrap();
    mathbank(dir.path())
        .args(["verify", "--document", "missing.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.json"));
}

// ---------------------------------------------------------------------------
// dedupe / repair
// ---------------------------------------------------------------------------

#[test]
fn dedupe_merges_matching_sets() {
    let dir = TempDir::new().unwrap();
    let doc = write_document(
        &dir,
        r#"[
  {"id": "a", "title": "Multiply by 6", "grade_level": 3, "topic": "Multiplication",
   "questions": [
     {"question": "What is 6 × 1?", "answer": "6"},
     {"question": "What is 6 × 2?", "answer": "12"}
   ]},
  {"id": "b", "title": "multiply by 6 ", "grade_level": 3, "topic": "multiplication",
   "questions": [
     {"question": "What is 6 × 2?", "answer": "12"},
     {"question": "What is 6 × 3?", "answer": "18"}
   ]},
  {"id": "c", "title": "Multiply by 6", "grade_level": 4, "topic": "Multiplication", "questions": []}
]"#,
    );

    mathbank(dir.path())
        .args(["dedupe", "--document"])
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("3 sets -> 2 sets"));

    let value = read_document(&doc);
    assert_eq!(value.as_array().unwrap().len(), 2);
    assert_eq!(value[0]["id"], "a");
    assert_eq!(value[0]["questions"].as_array().unwrap().len(), 3);

    mathbank(dir.path())
        .args(["dedupe", "--document"])
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("No duplicate sets"));
}

#[test]
fn dedupe_dry_run_leaves_document() {
    let dir = TempDir::new().unwrap();
    let json = r#"[
  {"id": "a", "title": "T", "grade_level": 1, "topic": "X", "questions": []},
  {"id": "b", "title": "T", "grade_level": 1, "topic": "X", "questions": []}
]"#;
    let doc = write_document(&dir, json);

    mathbank(dir.path())
        .args(["dedupe", "--dry-run", "--document"])
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"));

    assert_eq!(std::fs::read_to_string(&doc).unwrap(), json);
}

#[test]
fn repair_decodes_letter_answers() {
    let dir = TempDir::new().unwrap();
    let doc = write_document(
        &dir,
        r#"[
  {"id": "s", "title": "T", "grade_level": 1, "topic": "Addition",
   "questions": [
     {"question": "What is 2 + 3?", "options": ["A) 4", "B) 5", "C) 6", "D) 7"], "answer": "B"},
     {"question": "What is 2 + 2?", "options": ["1", "2", "3"], "answer": "four"}
   ]}
]"#,
    );

    mathbank(dir.path())
        .args(["repair", "--document"])
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 unrepairable"));

    let value = read_document(&doc);
    let q = &value[0]["questions"][0];
    assert_eq!(q["answer"], "5");
    assert_eq!(q["options"], serde_json::json!(["4", "5", "6", "7"]));
    assert_eq!(value[0]["questions"].as_array().unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// audit / compare / stats
// ---------------------------------------------------------------------------

#[test]
fn audit_text_summary() {
    let dir = TempDir::new().unwrap();
    let doc = write_document(&dir, MISMATCH_DOC);

    mathbank(dir.path())
        .args(["audit", "--document"])
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 sets, 3 questions"))
        .stdout(predicate::str::contains("answer-mismatch"))
        .stdout(predicate::str::contains("too-few-options"))
        .stdout(predicate::str::contains("Completeness"));
}

#[test]
fn audit_writes_each_format() {
    let dir = TempDir::new().unwrap();
    let doc = write_document(&dir, MISMATCH_DOC);

    for (format, file, needle) in [
        ("json", "audit.json", "\"tool\": \"audit\""),
        ("markdown", "audit.md", "# mathbank audit report"),
        ("html", "audit.html", "<html"),
        ("sarif", "audit.sarif", "\"version\": \"2.1.0\""),
    ] {
        let out = dir.path().join("reports").join(file);
        mathbank(dir.path())
            .args(["audit", "--format", format, "--document"])
            .arg(&doc)
            .arg("--output")
            .arg(&out)
            .assert()
            .success();
        let content = std::fs::read_to_string(&out).unwrap();
        assert!(content.contains(needle), "{format} output missing {needle}");
    }
}

#[test]
fn audit_unknown_format_fails() {
    let dir = TempDir::new().unwrap();
    let doc = write_document(&dir, MISMATCH_DOC);

    mathbank(dir.path())
        .args(["audit", "--format", "pdf", "--document"])
        .arg(&doc)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format"));
}

#[test]
fn audit_fail_on_severity() {
    let dir = TempDir::new().unwrap();
    let doc = write_document(
        &dir,
        r#"[
  {"id": "dup", "title": "A", "grade_level": 1, "topic": "X",
   "questions": [{"question": "What is 1 + 1?", "answer": "2", "explanation": "e", "hints": ["h"]}]},
  {"id": "dup", "title": "B", "grade_level": 1, "topic": "X",
   "questions": [{"question": "What is 1 + 2?", "answer": "3", "explanation": "e", "hints": ["h"]}]}
]"#,
    );

    mathbank(dir.path())
        .args(["audit", "--fail-on", "critical", "--document"])
        .arg(&doc)
        .assert()
        .failure()
        .stderr(predicate::str::contains("at or above critical"));

    mathbank(dir.path())
        .args(["audit", "--fail-on", "urgent", "--document"])
        .arg(&doc)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid --fail-on"));
}

#[test]
fn compare_detects_new_issues() {
    let dir = TempDir::new().unwrap();
    let clean = dir.path().join("clean.json");
    std::fs::write(
        &clean,
        r#"[{"id": "s", "title": "T", "grade_level": 2, "topic": "Addition",
  "questions": [{"question": "What is 45 + 23?", "answer": "68", "explanation": "e", "hints": ["h"]}]}]"#,
    )
    .unwrap();
    let broken = write_document(&dir, MISMATCH_DOC);
    let baseline = dir.path().join("baseline.json");
    let current = dir.path().join("current.json");

    for (doc, out) in [(&clean, &baseline), (&broken, &current)] {
        mathbank(dir.path())
            .args(["audit", "--format", "json", "--document"])
            .arg(doc)
            .arg("--output")
            .arg(out)
            .assert()
            .success();
    }

    mathbank(dir.path())
        .args(["compare", "--baseline"])
        .arg(&baseline)
        .arg("--current")
        .arg(&current)
        .assert()
        .success()
        .stdout(predicate::str::contains("New issues:"));

    mathbank(dir.path())
        .args(["compare", "--fail-on-new-issues", "--baseline"])
        .arg(&baseline)
        .arg("--current")
        .arg(&current)
        .assert()
        .failure();

    mathbank(dir.path())
        .args(["compare", "--fail-on-new-issues", "--format", "markdown", "--baseline"])
        .arg(&baseline)
        .arg("--current")
        .arg(&baseline)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 new"));
}

#[test]
fn stats_uses_config_document() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(
        data.join("lessons.json"),
        r#"[
  {"id": "k-counting", "title": "Counting", "grade_level": 0, "topic": "Counting",
   "questions": [{"question": "How many apples are there?", "answer": "3"}]},
  {"id": "2-addition", "title": "Adding", "grade_level": 2, "topic": "Addition"}
]"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("mathbank.toml"),
        "document = \"data/lessons.json\"\n",
    )
    .unwrap();

    mathbank(dir.path())
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 sets, 1 questions"))
        .stdout(predicate::str::contains("Counting"));

    let output = mathbank(dir.path())
        .args(["stats", "--format", "json"])
        .output()
        .unwrap();
    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["sets"], 2);
    assert_eq!(stats["by_grade"]["0"]["questions"], 1);
}

#[test]
fn explicit_missing_config_fails() {
    let dir = TempDir::new().unwrap();
    mathbank(dir.path())
        .args(["stats", "--config", "nope.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}
