//! Issues found in a curriculum document and the changes made to fix them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How urgently an issue needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            other => Err(format!(
                "unknown severity '{other}' (expected critical, high, medium or low)"
            )),
        }
    }
}

/// What kind of defect an issue describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueCategory {
    /// Empty or repeated set id.
    InvalidSetId,
    /// A question with no answer.
    MissingAnswer,
    /// The stored answer differs from the value derived from the question text.
    AnswerMismatch,
    /// A mismatch the fixer could not reconcile with the options.
    UnfixableAnswer,
    /// A set with no questions.
    EmptySet,
    /// The answer is not among the options.
    AnswerNotInOptions,
    DuplicateOptions,
    TooFewOptions,
    GradeOutOfRange,
    QuestionTooShort,
    QuestionTooLong,
    /// Display text without a question mark or colon.
    MissingPunctuation,
    MissingExplanation,
    MissingHints,
}

impl IssueCategory {
    pub fn severity(self) -> Severity {
        use IssueCategory::*;
        match self {
            InvalidSetId | MissingAnswer => Severity::Critical,
            AnswerMismatch | UnfixableAnswer | EmptySet | AnswerNotInOptions => Severity::High,
            DuplicateOptions | TooFewOptions | GradeOutOfRange => Severity::Medium,
            QuestionTooShort | QuestionTooLong | MissingPunctuation | MissingExplanation
            | MissingHints => Severity::Low,
        }
    }

    /// Stable identifier, also used as the SARIF rule id.
    pub fn code(self) -> &'static str {
        use IssueCategory::*;
        match self {
            InvalidSetId => "invalid-set-id",
            MissingAnswer => "missing-answer",
            AnswerMismatch => "answer-mismatch",
            UnfixableAnswer => "unfixable-answer",
            EmptySet => "empty-set",
            AnswerNotInOptions => "answer-not-in-options",
            DuplicateOptions => "duplicate-options",
            TooFewOptions => "too-few-options",
            GradeOutOfRange => "grade-out-of-range",
            QuestionTooShort => "question-too-short",
            QuestionTooLong => "question-too-long",
            MissingPunctuation => "missing-punctuation",
            MissingExplanation => "missing-explanation",
            MissingHints => "missing-hints",
        }
    }

    pub fn description(self) -> &'static str {
        use IssueCategory::*;
        match self {
            InvalidSetId => "Question set id is empty or not unique",
            MissingAnswer => "Question has no answer",
            AnswerMismatch => "Stored answer does not match the computed result",
            UnfixableAnswer => "Computed answer cannot be reconciled with the options",
            EmptySet => "Question set has no questions",
            AnswerNotInOptions => "Answer is not exactly one of the options",
            DuplicateOptions => "Options contain duplicates",
            TooFewOptions => "Choice question has fewer than three options",
            GradeOutOfRange => "Grade level is outside K-8",
            QuestionTooShort => "Question text is shorter than 10 characters",
            QuestionTooLong => "Question text is longer than 500 characters",
            MissingPunctuation => "Question text has no question mark or colon",
            MissingExplanation => "Question has no explanation",
            MissingHints => "Question has no hints",
        }
    }

    pub const ALL: [IssueCategory; 14] = [
        IssueCategory::InvalidSetId,
        IssueCategory::MissingAnswer,
        IssueCategory::AnswerMismatch,
        IssueCategory::UnfixableAnswer,
        IssueCategory::EmptySet,
        IssueCategory::AnswerNotInOptions,
        IssueCategory::DuplicateOptions,
        IssueCategory::TooFewOptions,
        IssueCategory::GradeOutOfRange,
        IssueCategory::QuestionTooShort,
        IssueCategory::QuestionTooLong,
        IssueCategory::MissingPunctuation,
        IssueCategory::MissingExplanation,
        IssueCategory::MissingHints,
    ];
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A reportable defect in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub set_id: String,
    /// Index of the question within its set, `None` for set-level issues.
    #[serde(default)]
    pub question_index: Option<usize>,
    pub category: IssueCategory,
    pub severity: Severity,
    pub message: String,
    /// Value the check expected, when it computed one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// Value found in the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl Issue {
    pub fn new(
        set_id: impl Into<String>,
        question_index: Option<usize>,
        category: IssueCategory,
        message: impl Into<String>,
    ) -> Self {
        Self {
            set_id: set_id.into(),
            question_index,
            category,
            severity: category.severity(),
            message: message.into(),
            expected: None,
            actual: None,
        }
    }

    pub fn with_values(mut self, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self.actual = Some(actual.into());
        self
    }

    /// `set-id` or `set-id#3`.
    pub fn location(&self) -> String {
        question_ref(&self.set_id, self.question_index)
    }
}

/// A mutation applied to the document by a fix pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub set_id: String,
    #[serde(default)]
    pub question_index: Option<usize>,
    /// Field that changed (`answer`, `options`, `questions`, ...).
    pub field: String,
    pub before: String,
    pub after: String,
    pub reason: String,
}

impl Change {
    pub fn location(&self) -> String {
        question_ref(&self.set_id, self.question_index)
    }
}

pub(crate) fn question_ref(set_id: &str, index: Option<usize>) -> String {
    match index {
        Some(i) => format!("{set_id}#{i}"),
        None => set_id.to_string(),
    }
}
