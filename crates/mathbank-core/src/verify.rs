//! Answer verification and the auto-fix pass.

use crate::extract::{extract, Expected};
use crate::issue::{Change, Issue, IssueCategory};
use crate::model::{Question, QuestionSet};
use crate::value::parse_numeric;

/// Largest absolute difference between a stored and a recomputed answer
/// that still counts as correct.
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// Slack for binary rounding, so `68.01` sits within 0.01 of `68`.
const ROUNDING_SLACK: f64 = 1e-9;

/// Whether `stored` counts as `expected`, the bound itself included.
pub fn within_tolerance(expected: f64, stored: f64, tolerance: f64) -> bool {
    (expected - stored).abs() <= tolerance + ROUNDING_SLACK
}

/// Recompute the answer of an arithmetic question.
///
/// `None` when the question is not recognized as arithmetic or divides by
/// zero.
pub fn expected_answer(q: &Question) -> Option<Expected> {
    extract(&q.question)?.evaluate()
}

/// Check a question's stored answer against the recomputed one.
///
/// Returns `None` when the answer is within `tolerance`, or when the question
/// can't be checked. A stored answer that isn't a number is a mismatch.
pub fn verify(set_id: &str, index: usize, q: &Question, tolerance: f64) -> Option<Issue> {
    let expected = expected_answer(q)?;
    check_against(set_id, index, q, expected, tolerance)
}

fn check_against(
    set_id: &str,
    index: usize,
    q: &Question,
    expected: Expected,
    tolerance: f64,
) -> Option<Issue> {
    let message = match parse_numeric(&q.answer) {
        Some(stored) if within_tolerance(expected.value(), stored, tolerance) => return None,
        Some(_) => format!("answer does not match '{}'", q.question.trim()),
        None => format!("stored answer is not a number for '{}'", q.question.trim()),
    };
    Some(
        Issue::new(set_id, Some(index), IssueCategory::AnswerMismatch, message)
            .with_values(expected.render(), q.answer.clone()),
    )
}

/// What a verification pass may do to the document.
#[derive(Debug, Clone)]
pub struct FixPolicy {
    /// Overwrite mismatched answers.
    pub fix: bool,
    /// Remove questions that can't be fixed. Only honored with `fix`.
    pub delete_unfixable: bool,
    pub tolerance: f64,
}

impl Default for FixPolicy {
    fn default() -> Self {
        Self {
            fix: false,
            delete_unfixable: false,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl FixPolicy {
    pub fn report_only() -> Self {
        Self::default()
    }

    pub fn fix() -> Self {
        Self {
            fix: true,
            ..Self::default()
        }
    }
}

/// Result of a verification pass over a document.
#[derive(Debug, Clone, Default)]
pub struct VerifyOutcome {
    pub issues: Vec<Issue>,
    pub changes: Vec<Change>,
    /// Questions recognized as arithmetic.
    pub checked: usize,
    /// Questions with no recognizable computation.
    pub skipped: usize,
    pub fixed: usize,
    pub deleted: usize,
}

enum Fix {
    Applied(Vec<Change>),
    Unfixable,
}

/// Bring the question in line with `expected`, keeping options consistent.
fn fix_question(set_id: &str, index: usize, q: &mut Question, expected: Expected, tolerance: f64) -> Fix {
    let rendered = expected.render();
    let change = |field: &str, before: &str, after: &str, reason: &str| Change {
        set_id: set_id.to_string(),
        question_index: Some(index),
        field: field.to_string(),
        before: before.to_string(),
        after: after.to_string(),
        reason: reason.to_string(),
    };

    if !q.has_options() {
        let c = change("answer", &q.answer, &rendered, "recomputed answer");
        q.answer = rendered;
        return Fix::Applied(vec![c]);
    }

    let matching_option = q.options.iter().find(|o| {
        parse_numeric(o).is_some_and(|v| within_tolerance(expected.value(), v, tolerance))
    });
    if let Some(option) = matching_option.cloned() {
        let c = change("answer", &q.answer, &option, "answer set to the matching option");
        q.answer = option;
        return Fix::Applied(vec![c]);
    }

    if let Some(slot) = q.options.iter().position(|o| *o == q.answer) {
        let options_before = q.options.join(" | ");
        q.options[slot] = rendered.clone();
        let changes = vec![
            change("options", &options_before, &q.options.join(" | "), "replaced stale option"),
            change("answer", &q.answer, &rendered, "recomputed answer"),
        ];
        q.answer = rendered;
        return Fix::Applied(changes);
    }

    Fix::Unfixable
}

/// Verify every question in the document, fixing per `policy`.
///
/// Question indices in issues and changes refer to positions before any
/// deletion.
pub fn verify_document(sets: &mut [QuestionSet], policy: &FixPolicy) -> VerifyOutcome {
    let mut outcome = VerifyOutcome::default();

    for set in sets.iter_mut() {
        let mut doomed: Vec<usize> = Vec::new();

        for (index, q) in set.questions.iter_mut().enumerate() {
            let Some(expected) = expected_answer(q) else {
                outcome.skipped += 1;
                continue;
            };
            outcome.checked += 1;

            let Some(issue) = check_against(&set.id, index, q, expected, policy.tolerance) else {
                continue;
            };
            outcome.issues.push(issue);
            if !policy.fix {
                continue;
            }

            match fix_question(&set.id, index, q, expected, policy.tolerance) {
                Fix::Applied(changes) => {
                    for c in &changes {
                        tracing::info!(
                            location = %c.location(),
                            field = %c.field,
                            before = %c.before,
                            after = %c.after,
                            "fixed answer"
                        );
                    }
                    outcome.fixed += 1;
                    outcome.changes.extend(changes);
                }
                Fix::Unfixable => {
                    outcome.issues.push(
                        Issue::new(
                            &set.id,
                            Some(index),
                            IssueCategory::UnfixableAnswer,
                            format!(
                                "expected {} is not among the options and the stored answer has no option slot",
                                expected.render()
                            ),
                        )
                        .with_values(expected.render(), q.answer.clone()),
                    );
                    if policy.delete_unfixable {
                        doomed.push(index);
                    }
                }
            }
        }

        if doomed.is_empty() {
            continue;
        }
        let mut position = 0;
        set.questions.retain(|q| {
            let keep = !doomed.contains(&position);
            if !keep {
                tracing::info!(
                    set_id = %set.id,
                    index = position,
                    question = %q.question,
                    "deleted unfixable question"
                );
                outcome.changes.push(Change {
                    set_id: set.id.clone(),
                    question_index: Some(position),
                    field: "questions".into(),
                    before: q.question.clone(),
                    after: String::new(),
                    reason: "deleted unfixable question".into(),
                });
            }
            position += 1;
            keep
        });
        outcome.deleted += doomed.len();
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::format_fixed;
    use proptest::prelude::*;

    fn q(text: &str, answer: &str) -> Question {
        Question::new(text, Vec::new(), answer)
    }

    fn choice(text: &str, options: &[&str], answer: &str) -> Question {
        Question::new(text, options.iter().map(|o| o.to_string()).collect(), answer)
    }

    #[test]
    fn correct_answer_has_no_issue() {
        assert_eq!(verify("s", 0, &q("What is 45 + 23?", "68"), DEFAULT_TOLERANCE), None);
    }

    #[test]
    fn wrong_answer_reports_expected_and_actual() {
        let issue = verify("add-2", 3, &q("What is 45 + 23?", "67"), DEFAULT_TOLERANCE).unwrap();
        assert_eq!(issue.category, IssueCategory::AnswerMismatch);
        assert_eq!(issue.set_id, "add-2");
        assert_eq!(issue.question_index, Some(3));
        assert_eq!(issue.expected.as_deref(), Some("68"));
        assert_eq!(issue.actual.as_deref(), Some("67"));
    }

    #[test]
    fn decorated_answers_are_normalized() {
        assert_eq!(verify("s", 0, &q("What is $3.50 + $1.25?", "$4.75"), DEFAULT_TOLERANCE), None);
        assert_eq!(verify("s", 0, &q("What is 1,200 + 34?", "1,234"), DEFAULT_TOLERANCE), None);
        assert_eq!(verify("s", 0, &q("What is 1/4 + 1/4?", "2/4"), DEFAULT_TOLERANCE), None);
        assert_eq!(verify("s", 0, &q("What is 1/4 + 1/4?", "1/2"), DEFAULT_TOLERANCE), None);
        assert_eq!(verify("s", 0, &q("What is 10 ÷ 4?", "2.5"), DEFAULT_TOLERANCE), None);
    }

    #[test]
    fn non_numeric_answer_is_a_mismatch() {
        let issue = verify("s", 0, &q("What is 2 + 2?", "four"), DEFAULT_TOLERANCE).unwrap();
        assert_eq!(issue.expected.as_deref(), Some("4"));
    }

    #[test]
    fn unrecognized_and_divide_by_zero_are_skipped() {
        assert_eq!(verify("s", 0, &q("Which array shows 3 × 4?", "B"), DEFAULT_TOLERANCE), None);
        assert_eq!(verify("s", 0, &q("What is 5 ÷ 0?", "0"), DEFAULT_TOLERANCE), None);
    }

    #[test]
    fn report_only_leaves_document_untouched() {
        let mut sets = vec![QuestionSet::new("s", "S", 2, "Addition")
            .with_questions(vec![q("What is 45 + 23?", "67"), q("What is 1 + 1?", "2")])];
        let before = sets.clone();
        let outcome = verify_document(&mut sets, &FixPolicy::report_only());
        assert_eq!(outcome.issues.len(), 1);
        assert!(outcome.changes.is_empty());
        assert_eq!(outcome.checked, 2);
        assert_eq!(sets, before);
    }

    #[test]
    fn fix_overwrites_free_response_answer() {
        let mut sets = vec![QuestionSet::new("s", "S", 2, "Addition")
            .with_questions(vec![q("What is 45 + 23?", "67")])];
        let outcome = verify_document(&mut sets, &FixPolicy::fix());
        assert_eq!(sets[0].questions[0].answer, "68");
        assert_eq!(outcome.fixed, 1);
        assert_eq!(outcome.changes[0].before, "67");
        assert_eq!(outcome.changes[0].after, "68");
    }

    #[test]
    fn fix_prefers_matching_option() {
        let mut sets = vec![QuestionSet::new("s", "S", 2, "Addition").with_questions(vec![
            choice("What is 45 + 23?", &["66", "67", "68", "69"], "67"),
        ])];
        verify_document(&mut sets, &FixPolicy::fix());
        let fixed = &sets[0].questions[0];
        assert_eq!(fixed.answer, "68");
        assert_eq!(fixed.options, vec!["66", "67", "68", "69"]);
        assert!(fixed.answer_in_options());
    }

    #[test]
    fn fix_replaces_stale_option_slot() {
        let mut sets = vec![QuestionSet::new("s", "S", 2, "Addition").with_questions(vec![
            choice("What is 45 + 23?", &["65", "66", "67", "70"], "67"),
        ])];
        let outcome = verify_document(&mut sets, &FixPolicy::fix());
        let fixed = &sets[0].questions[0];
        assert_eq!(fixed.options, vec!["65", "66", "68", "70"]);
        assert_eq!(fixed.answer, "68");
        assert_eq!(outcome.changes.len(), 2);
    }

    #[test]
    fn unfixable_kept_unless_deletion_requested() {
        let broken = || {
            vec![QuestionSet::new("s", "S", 2, "Addition").with_questions(vec![
                choice("What is 45 + 23?", &["1", "2", "3"], "7"),
                q("What is 1 + 1?", "2"),
            ])]
        };

        let mut sets = broken();
        let outcome = verify_document(&mut sets, &FixPolicy::fix());
        assert_eq!(sets[0].questions.len(), 2);
        assert!(outcome
            .issues
            .iter()
            .any(|i| i.category == IssueCategory::UnfixableAnswer));

        let mut sets = broken();
        let policy = FixPolicy {
            delete_unfixable: true,
            ..FixPolicy::fix()
        };
        let outcome = verify_document(&mut sets, &policy);
        assert_eq!(sets[0].questions.len(), 1);
        assert_eq!(sets[0].questions[0].question, "What is 1 + 1?");
        assert_eq!(outcome.deleted, 1);
    }

    #[test]
    fn fix_renders_fractions_over_common_denominator() {
        let mut sets = vec![QuestionSet::new("s", "S", 5, "Fractions")
            .with_questions(vec![q("What is 1/4 + 1/6?", "2/10")])];
        verify_document(&mut sets, &FixPolicy::fix());
        assert_eq!(sets[0].questions[0].answer, "5/12");
    }

    #[test]
    fn tolerance_bound_is_inclusive() {
        assert_eq!(verify("s", 0, &q("What is 45 + 23?", "68.01"), DEFAULT_TOLERANCE), None);
        assert_eq!(verify("s", 0, &q("What is 45 + 23?", "67.99"), DEFAULT_TOLERANCE), None);
        assert!(verify("s", 0, &q("What is 45 + 23?", "68.02"), DEFAULT_TOLERANCE).is_some());
    }

    #[test]
    fn huge_fraction_operands_are_skipped() {
        let text = "What is 5000000000/5000000001 + 1/5000000003?";
        assert_eq!(verify("s", 0, &q(text, "1"), DEFAULT_TOLERANCE), None);

        let mut sets = vec![QuestionSet::new("s", "S", 5, "Fractions")
            .with_questions(vec![q(text, "1"), q("What is 45 + 23?", "67")])];
        let outcome = verify_document(&mut sets, &FixPolicy::report_only());
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.checked, 1);
        assert_eq!(outcome.issues.len(), 1);
    }

    proptest! {
        #[test]
        fn flags_exactly_outside_tolerance(a in 0i64..1000, b in 0i64..1000, hundredths in -300i64..300) {
            let stored = format_fixed((a + b) * 100 + hundredths, 2);
            let question = q(&format!("What is {a} + {b}?"), &stored);
            let flagged = verify("s", 0, &question, DEFAULT_TOLERANCE).is_some();
            prop_assert_eq!(flagged, hundredths.abs() > 1);
        }
    }
}
