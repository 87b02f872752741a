//! Quality audit of a curriculum document.
//!
//! The audit never modifies the document. It combines structural checks
//! (ids, grades, empty sets), multiple-choice consistency, presentation
//! checks and answer verification into one flat list of issues, plus
//! completeness statistics for the optional teaching fields.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::issue::{Issue, IssueCategory};
use crate::model::{GradeLevel, Question, QuestionSet, MAX_GRADE};
use crate::verify::verify;

/// Shortest question text considered complete.
pub const MIN_QUESTION_CHARS: usize = 10;
/// Longest question text that still fits the UI.
pub const MAX_QUESTION_CHARS: usize = 500;
/// Fewest options a choice question should offer.
pub const MIN_OPTIONS: usize = 3;

/// How many questions carry each optional teaching field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completeness {
    pub questions: usize,
    pub with_explanation: usize,
    pub with_hints: usize,
    pub with_image: usize,
}

impl Completeness {
    fn record(&mut self, q: &Question) {
        self.questions += 1;
        if has_text(q.explanation.as_deref()) {
            self.with_explanation += 1;
        }
        if q.hints.iter().any(|h| !h.trim().is_empty()) {
            self.with_hints += 1;
        }
        if has_text(q.image.as_deref()) {
            self.with_image += 1;
        }
    }

    fn ratio(&self, part: usize) -> f64 {
        if self.questions == 0 {
            0.0
        } else {
            part as f64 / self.questions as f64
        }
    }

    pub fn explanation_ratio(&self) -> f64 {
        self.ratio(self.with_explanation)
    }

    pub fn hints_ratio(&self) -> f64 {
        self.ratio(self.with_hints)
    }

    pub fn image_ratio(&self) -> f64 {
        self.ratio(self.with_image)
    }
}

fn has_text(field: Option<&str>) -> bool {
    field.is_some_and(|s| !s.trim().is_empty())
}

/// Result of auditing a document.
#[derive(Debug, Clone, Default)]
pub struct Audit {
    pub issues: Vec<Issue>,
    pub completeness: Completeness,
    pub sets: usize,
}

/// Audit every set and question in the document.
pub fn audit_document(sets: &[QuestionSet], tolerance: f64) -> Audit {
    let mut audit = Audit {
        sets: sets.len(),
        ..Default::default()
    };

    let mut id_counts: HashMap<&str, usize> = HashMap::new();
    for set in sets {
        *id_counts.entry(set.id.as_str()).or_default() += 1;
    }

    for set in sets {
        audit.issues.extend(check_set(set, id_counts.get(set.id.as_str()).copied().unwrap_or(0)));
        for (index, q) in set.questions.iter().enumerate() {
            audit.completeness.record(q);
            audit.issues.extend(check_question(&set.id, index, q));
            audit.issues.extend(verify(&set.id, index, q, tolerance));
        }
    }

    tracing::debug!(
        sets = audit.sets,
        questions = audit.completeness.questions,
        issues = audit.issues.len(),
        "audit complete"
    );
    audit
}

fn check_set(set: &QuestionSet, id_count: usize) -> Vec<Issue> {
    let mut issues = Vec::new();

    if set.id.trim().is_empty() {
        issues.push(Issue::new(
            &set.id,
            None,
            IssueCategory::InvalidSetId,
            format!("set '{}' has no id", set.title),
        ));
    } else if id_count > 1 {
        issues.push(Issue::new(
            &set.id,
            None,
            IssueCategory::InvalidSetId,
            format!("id '{}' is used by {id_count} sets", set.id),
        ));
    }
    if set.grade_level.grade().is_none() {
        let (message, actual) = match &set.grade_level {
            GradeLevel::Level(n) => (
                format!("grade level {n} is outside 0..={MAX_GRADE}"),
                n.to_string(),
            ),
            GradeLevel::Invalid(value) => (
                format!("grade level {value} is not a whole number"),
                value.to_string(),
            ),
        };
        issues.push(
            Issue::new(&set.id, None, IssueCategory::GradeOutOfRange, message)
                .with_values(format!("0..={MAX_GRADE}"), actual),
        );
    }
    if set.questions.is_empty() {
        issues.push(Issue::new(
            &set.id,
            None,
            IssueCategory::EmptySet,
            "set has no questions",
        ));
    }
    issues
}

/// Per-question checks that don't need to recompute the answer.
pub fn check_question(set_id: &str, index: usize, q: &Question) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut flag = |category: IssueCategory, message: String| {
        issues.push(Issue::new(set_id, Some(index), category, message));
    };

    if q.answer.trim().is_empty() {
        flag(IssueCategory::MissingAnswer, "question has no answer".into());
    }

    if q.has_options() {
        let occurrences = q.answer_occurrences();
        if !q.answer.trim().is_empty() && occurrences == 0 {
            flag(
                IssueCategory::AnswerNotInOptions,
                format!("answer '{}' is not one of the options", q.answer),
            );
        }
        let mut distinct: Vec<&str> = q.options.iter().map(|o| o.trim()).collect();
        distinct.sort_unstable();
        distinct.dedup();
        if distinct.len() < q.options.len() {
            flag(
                IssueCategory::DuplicateOptions,
                format!("{} of {} options are repeats", q.options.len() - distinct.len(), q.options.len()),
            );
        }
        if q.options.len() < MIN_OPTIONS {
            flag(
                IssueCategory::TooFewOptions,
                format!("only {} options, expected at least {MIN_OPTIONS}", q.options.len()),
            );
        }
    }

    let length = q.question.trim().chars().count();
    if length < MIN_QUESTION_CHARS {
        flag(
            IssueCategory::QuestionTooShort,
            format!("question is {length} characters"),
        );
    } else if length > MAX_QUESTION_CHARS {
        flag(
            IssueCategory::QuestionTooLong,
            format!("question is {length} characters"),
        );
    }
    if !q.question.contains('?') && !q.question.contains(':') {
        flag(
            IssueCategory::MissingPunctuation,
            "question has neither '?' nor ':'".into(),
        );
    }

    if !has_text(q.explanation.as_deref()) {
        flag(IssueCategory::MissingExplanation, "no explanation".into());
    }
    if q.hints.iter().all(|h| h.trim().is_empty()) {
        flag(IssueCategory::MissingHints, "no hints".into());
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::Severity;
    use crate::verify::DEFAULT_TOLERANCE;

    fn complete(text: &str, options: &[&str], answer: &str) -> Question {
        Question::new(text, options.iter().map(|o| o.to_string()).collect(), answer)
            .with_explanation("Because.")
            .with_hints(vec!["Think.".into()])
    }

    fn categories(issues: &[Issue]) -> Vec<IssueCategory> {
        issues.iter().map(|i| i.category).collect()
    }

    #[test]
    fn clean_question_has_no_issues() {
        let q = complete("What is 45 + 23?", &["66", "67", "68", "69"], "68");
        assert!(check_question("s", 0, &q).is_empty());
    }

    #[test]
    fn choice_consistency_checks() {
        let q = complete("What is 45 + 23?", &["67", "67"], "68");
        let found = categories(&check_question("s", 0, &q));
        assert!(found.contains(&IssueCategory::AnswerNotInOptions));
        assert!(found.contains(&IssueCategory::DuplicateOptions));
        assert!(found.contains(&IssueCategory::TooFewOptions));
    }

    #[test]
    fn presentation_checks() {
        let q = Question::new("2 + 2", Vec::new(), "");
        let found = categories(&check_question("s", 0, &q));
        assert_eq!(
            found,
            vec![
                IssueCategory::MissingAnswer,
                IssueCategory::QuestionTooShort,
                IssueCategory::MissingPunctuation,
                IssueCategory::MissingExplanation,
                IssueCategory::MissingHints,
            ]
        );
        let long = complete(&format!("{}?", "x".repeat(600)), &[], "1");
        assert_eq!(categories(&check_question("s", 0, &long)), vec![IssueCategory::QuestionTooLong]);
    }

    #[test]
    fn document_checks_include_sets_and_verification() {
        let sets = vec![
            QuestionSet::new("dup", "A", 2, "Addition")
                .with_questions(vec![complete("What is 45 + 23?", &[], "67")]),
            QuestionSet::new("dup", "B", 9, "Addition"),
        ];
        let audit = audit_document(&sets, DEFAULT_TOLERANCE);
        let found = categories(&audit.issues);
        assert_eq!(found.iter().filter(|c| **c == IssueCategory::InvalidSetId).count(), 2);
        assert!(found.contains(&IssueCategory::GradeOutOfRange));
        assert!(found.contains(&IssueCategory::EmptySet));
        assert!(found.contains(&IssueCategory::AnswerMismatch));
        assert_eq!(audit.sets, 2);
        assert_eq!(audit.completeness.questions, 1);
    }

    #[test]
    fn unreadable_grades_are_reported() {
        let sets: Vec<QuestionSet> = serde_json::from_str(
            r#"[{"id": "a", "title": "A", "grade_level": "third", "topic": "T"},
                {"id": "b", "title": "B", "grade_level": -2, "topic": "T"},
                {"id": "c", "title": "C", "grade_level": "5", "topic": "T"}]"#,
        )
        .unwrap();
        let grades: Vec<_> = audit_document(&sets, DEFAULT_TOLERANCE)
            .issues
            .into_iter()
            .filter(|i| i.category == IssueCategory::GradeOutOfRange)
            .collect();
        assert_eq!(grades.len(), 2);
        assert_eq!(grades[0].set_id, "a");
        assert_eq!(grades[0].actual.as_deref(), Some(r#""third""#));
        assert_eq!(grades[1].actual.as_deref(), Some("-2"));
    }

    #[test]
    fn severities_come_from_categories() {
        let sets = vec![QuestionSet::new("", "Untitled", 1, "Counting")];
        let audit = audit_document(&sets, DEFAULT_TOLERANCE);
        let id_issue = audit
            .issues
            .iter()
            .find(|i| i.category == IssueCategory::InvalidSetId)
            .unwrap();
        assert_eq!(id_issue.severity, Severity::Critical);
    }

    #[test]
    fn completeness_ratios() {
        let mut bare = Question::new("What is 1 + 1?", Vec::new(), "2");
        bare.image = Some("  ".into());
        let sets = vec![QuestionSet::new("s", "S", 1, "Addition").with_questions(vec![
            complete("What is 1 + 2?", &[], "3"),
            bare,
        ])];
        let c = audit_document(&sets, DEFAULT_TOLERANCE).completeness;
        assert_eq!(c.questions, 2);
        assert_eq!(c.with_explanation, 1);
        assert_eq!(c.with_image, 0);
        assert!((c.explanation_ratio() - 0.5).abs() < 1e-9);
        assert_eq!(Completeness::default().hints_ratio(), 0.0);
    }
}
