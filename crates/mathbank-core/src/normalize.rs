//! Dataset normalizer: merge duplicate question sets and repair malformed
//! multiple-choice questions.
//!
//! Repair runs each question through three stages in order: letter decoding,
//! option dedupe, answer reconciliation. Every stage is idempotent and leaves
//! a question it can't improve untouched, so running the whole pass twice
//! changes nothing the second time.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::issue::{Change, Issue, IssueCategory};
use crate::model::{normalize_key, Question, QuestionSet};
use crate::value::parse_numeric;

/// `A) `, `(b) `, `C. `, `d: ` style option labels.
static LETTER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\(?[A-Da-d][).:]\s*").expect("letter prefix regex is valid"));

/// An answer given as a bare option letter.
static LETTER_ANSWER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(?([A-Da-d])[).:]?$").expect("letter answer regex is valid"));

/// Sets sharing this key are the same skill.
type SetKey = (String, String, String);

fn set_key(set: &QuestionSet) -> SetKey {
    (
        set.grade_level.to_string(),
        normalize_key(&set.topic),
        normalize_key(&set.title),
    )
}

/// A group of duplicate sets folded into one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeRecord {
    /// Id of the surviving set (the first of the group).
    pub kept_id: String,
    /// Ids of the sets folded into it.
    pub merged_ids: Vec<String>,
    /// Questions across the group before merging.
    pub questions_before: usize,
    pub questions_after: usize,
}

impl From<&MergeRecord> for Change {
    fn from(m: &MergeRecord) -> Self {
        Change {
            set_id: m.kept_id.clone(),
            question_index: None,
            field: "questions".into(),
            before: format!("{} questions in {} sets", m.questions_before, m.merged_ids.len() + 1),
            after: format!("{} questions", m.questions_after),
            reason: format!("merged duplicate sets {}", m.merged_ids.join(", ")),
        }
    }
}

/// Merge sets with the same grade, topic and title.
pub fn dedupe(sets: Vec<QuestionSet>) -> Vec<QuestionSet> {
    dedupe_with_report(sets).0
}

/// [`dedupe`], also describing every merge it made.
///
/// Groups are emitted in order of first appearance. A merged set keeps the
/// first member's id, title, topic and extra fields, and the concatenation of
/// all members' questions with repeated question text dropped.
pub fn dedupe_with_report(sets: Vec<QuestionSet>) -> (Vec<QuestionSet>, Vec<MergeRecord>) {
    let mut groups: Vec<(QuestionSet, Vec<QuestionSet>)> = Vec::new();
    let mut index: HashMap<SetKey, usize> = HashMap::new();

    for set in sets {
        let key = set_key(&set);
        match index.get(&key) {
            Some(&g) => groups[g].1.push(set),
            None => {
                index.insert(key, groups.len());
                groups.push((set, Vec::new()));
            }
        }
    }

    let mut merges = Vec::new();
    let merged = groups
        .into_iter()
        .map(|(first, rest)| {
            if rest.is_empty() {
                return first;
            }
            let (set, record) = merge_group(first, rest);
            tracing::info!(
                kept = %record.kept_id,
                merged = ?record.merged_ids,
                before = record.questions_before,
                after = record.questions_after,
                "merged duplicate question sets"
            );
            merges.push(record);
            set
        })
        .collect();

    (merged, merges)
}

fn merge_group(mut first: QuestionSet, rest: Vec<QuestionSet>) -> (QuestionSet, MergeRecord) {
    let questions_before =
        first.questions.len() + rest.iter().map(|s| s.questions.len()).sum::<usize>();
    let merged_ids = rest.iter().map(|s| s.id.clone()).collect();

    let mut seen = HashSet::new();
    let questions: Vec<Question> = std::mem::take(&mut first.questions)
        .into_iter()
        .chain(rest.into_iter().flat_map(|s| s.questions))
        .filter(|q| seen.insert(normalize_key(&q.question)))
        .collect();

    let record = MergeRecord {
        kept_id: first.id.clone(),
        merged_ids,
        questions_before,
        questions_after: questions.len(),
    };
    first.questions = questions;
    (first, record)
}

/// Where a question ended up after repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairStatus {
    /// Free response, or the answer appears among the options exactly once.
    Valid,
    /// The answer still can't be matched to an option.
    Unrepairable,
}

/// Result of repairing a set or a document.
#[derive(Debug, Clone, Default)]
pub struct RepairReport {
    pub changes: Vec<Change>,
    /// One issue per unrepairable question.
    pub issues: Vec<Issue>,
    /// Questions changed by at least one stage.
    pub repaired: usize,
    pub unrepairable: usize,
}

impl RepairReport {
    fn absorb(&mut self, other: RepairReport) {
        self.changes.extend(other.changes);
        self.issues.extend(other.issues);
        self.repaired += other.repaired;
        self.unrepairable += other.unrepairable;
    }
}

fn strip_letter(text: &str) -> String {
    LETTER_PREFIX.replace(text, "").trim().to_string()
}

fn has_letter_labels(options: &[String]) -> bool {
    !options.is_empty() && options.iter().all(|o| LETTER_PREFIX.is_match(o))
}

/// Resolve a letter answer ("B") to the option it names, dropping `A) `
/// labels from the options and the answer.
pub fn decode_letter(q: &mut Question) -> bool {
    if !q.has_options() {
        return false;
    }
    let labelled = has_letter_labels(&q.options);
    let answer = q.answer.trim();
    let letter = LETTER_ANSWER
        .captures(answer)
        .and_then(|c| c[1].chars().next())
        .map(|c| c.to_ascii_lowercase());

    let names_option = letter.is_some() && (labelled || !q.options.iter().any(|o| o.trim() == answer));
    if !labelled && !names_option {
        return false;
    }

    let options: Vec<String> = if labelled {
        q.options.iter().map(|o| strip_letter(o)).collect()
    } else {
        q.options.clone()
    };

    let answer = match letter {
        Some(l) if names_option => {
            let slot = (l as u8 - b'a') as usize;
            match options.get(slot) {
                Some(option) => option.clone(),
                None => q.answer.clone(),
            }
        }
        _ if labelled => strip_letter(&q.answer),
        _ => q.answer.clone(),
    };

    let changed = options != q.options || answer != q.answer;
    q.options = options;
    q.answer = answer;
    changed
}

/// Drop repeated options, keeping the first occurrence of each.
pub fn dedupe_options(q: &mut Question) -> bool {
    let mut seen = HashSet::new();
    let before = q.options.len();
    q.options.retain(|o| seen.insert(o.trim().to_string()));
    q.options.len() != before
}

/// Find the single option the answer refers to, if any.
fn reconcile_target(q: &Question) -> Option<usize> {
    let answer = q.answer.trim();
    if answer.is_empty() {
        return None;
    }
    let lowered = answer.to_lowercase();

    if let Some(i) = q.options.iter().position(|o| o.trim().to_lowercase() == lowered) {
        return Some(i);
    }
    if let Some(value) = parse_numeric(answer) {
        if let Some(i) = q
            .options
            .iter()
            .position(|o| parse_numeric(o).is_some_and(|v| (v - value).abs() < 1e-9))
        {
            return Some(i);
        }
    }
    // Containment must be unambiguous: "5" alone would otherwise claim "15".
    let contained: Vec<usize> = q
        .options
        .iter()
        .enumerate()
        .filter(|(_, o)| {
            let o = o.trim().to_lowercase();
            !o.is_empty() && (o.contains(&lowered) || lowered.contains(&o))
        })
        .map(|(i, _)| i)
        .collect();
    match contained.as_slice() {
        [i] => Some(*i),
        _ => None,
    }
}

/// Canonicalize the answer to the exact text of the option it matches.
pub fn reconcile_answer(q: &mut Question) -> bool {
    if !q.has_options() || q.answer_in_options() {
        return false;
    }
    match reconcile_target(q) {
        Some(i) if q.options[i] != q.answer => {
            q.answer = q.options[i].clone();
            true
        }
        _ => false,
    }
}

/// Run every repair stage over one question.
pub fn repair_question(set_id: &str, index: usize, q: &mut Question) -> (RepairStatus, Vec<Change>) {
    type Stage = fn(&mut Question) -> bool;
    const STAGES: [(&str, Stage); 3] = [
        ("decoded letter answer", decode_letter),
        ("removed duplicate options", dedupe_options),
        ("matched answer to option", reconcile_answer),
    ];

    let mut changes = Vec::new();
    for (reason, stage) in STAGES {
        let before = q.clone();
        if !stage(q) {
            continue;
        }
        if before.options != q.options {
            changes.push(Change {
                set_id: set_id.to_string(),
                question_index: Some(index),
                field: "options".into(),
                before: before.options.join(" | "),
                after: q.options.join(" | "),
                reason: reason.into(),
            });
        }
        if before.answer != q.answer {
            changes.push(Change {
                set_id: set_id.to_string(),
                question_index: Some(index),
                field: "answer".into(),
                before: before.answer,
                after: q.answer.clone(),
                reason: reason.into(),
            });
        }
        tracing::info!(set_id, index, stage = reason, "repaired question");
    }

    let status = if !q.has_options() || q.answer_in_options() {
        RepairStatus::Valid
    } else {
        RepairStatus::Unrepairable
    };
    (status, changes)
}

/// Repair every question in `set`, reporting what changed and what couldn't
/// be fixed. Unrepairable questions stay in the set.
pub fn repair_set(set: &mut QuestionSet) -> RepairReport {
    let mut report = RepairReport::default();
    for (index, q) in set.questions.iter_mut().enumerate() {
        let (status, changes) = repair_question(&set.id, index, q);
        if !changes.is_empty() {
            report.repaired += 1;
        }
        report.changes.extend(changes);

        if status == RepairStatus::Unrepairable {
            report.unrepairable += 1;
            let category = if q.answer.trim().is_empty() {
                IssueCategory::MissingAnswer
            } else {
                IssueCategory::AnswerNotInOptions
            };
            tracing::warn!(set_id = %set.id, index, answer = %q.answer, "answer could not be matched to an option");
            report.issues.push(
                Issue::new(
                    &set.id,
                    Some(index),
                    category,
                    format!("answer '{}' matches none of {} options", q.answer, q.options.len()),
                )
                .with_values(q.options.join(" | "), q.answer.clone()),
            );
        }
    }
    report
}

/// Repair a set by value.
pub fn repair(mut set: QuestionSet) -> QuestionSet {
    repair_set(&mut set);
    set
}

/// Repair every set in the document.
pub fn repair_document(sets: &mut [QuestionSet]) -> RepairReport {
    let mut report = RepairReport::default();
    for set in sets.iter_mut() {
        report.absorb(repair_set(set));
    }
    report
}
