//! Core data model types for mathbank.
//!
//! A curriculum document is a flat array of [`QuestionSet`]s, each owning an
//! ordered list of [`Question`]s. Field names are the persisted contract
//! shared with the UI and the database import step, so unknown fields are
//! carried through verbatim in `extra`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Highest grade level the curriculum covers (0 is kindergarten).
pub const MAX_GRADE: u8 = 8;

/// A named, graded collection of questions on one topic (a "skill").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSet {
    /// Stable unique key, `grade-topic-slug[-n]`.
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    /// Human-readable skill name.
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    /// 0 (kindergarten) through 8.
    #[serde(default)]
    pub grade_level: GradeLevel,
    /// Free-text category such as "Addition" or "Fractions".
    #[serde(default, deserialize_with = "lenient_string")]
    pub topic: String,
    /// Ordered questions. A missing or null array loads as empty and is
    /// reported by the audit.
    #[serde(default, deserialize_with = "lenient_questions")]
    pub questions: Vec<Question>,
    /// Fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QuestionSet {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        grade_level: u8,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            grade_level: GradeLevel::from(grade_level),
            topic: topic.into(),
            questions: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_questions(mut self, questions: Vec<Question>) -> Self {
        self.questions = questions;
        self
    }
}

/// A single question as rendered by the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Display text.
    #[serde(default, deserialize_with = "lenient_string")]
    pub question: String,
    /// Candidate answers for choice-type questions.
    #[serde(
        default,
        deserialize_with = "lenient_string_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub options: Vec<String>,
    /// The correct value, always stored as a string.
    #[serde(default, deserialize_with = "lenient_string")]
    pub answer: String,
    #[serde(
        default,
        deserialize_with = "lenient_optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub explanation: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub hints: Vec<String>,
    #[serde(
        default,
        deserialize_with = "lenient_optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub image: Option<String>,
    /// Widget type used by the UI; absent means multiple choice.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Question {
    pub fn new(question: impl Into<String>, options: Vec<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            options,
            answer: answer.into(),
            explanation: None,
            hints: Vec::new(),
            image: None,
            kind: None,
            extra: Map::new(),
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    pub fn with_hints(mut self, hints: Vec<String>) -> Self {
        self.hints = hints;
        self
    }

    /// Whether this is a choice-type question.
    pub fn has_options(&self) -> bool {
        !self.options.is_empty()
    }

    /// Number of options exactly equal to the stored answer.
    pub fn answer_occurrences(&self) -> usize {
        self.options.iter().filter(|o| **o == self.answer).count()
    }

    /// True when the options contain the answer exactly once.
    pub fn answer_in_options(&self) -> bool {
        self.answer_occurrences() == 1
    }
}

/// Lowercase and trim, the key normalization used for dedupe.
pub fn normalize_key(s: &str) -> String {
    s.trim().to_lowercase()
}

/// A set's grade as stored in the document.
///
/// Whole numbers, including numeric strings such as `"3"`, load as
/// [`GradeLevel::Level`] whatever their range. Anything else is kept verbatim
/// as [`GradeLevel::Invalid`] so the audit can report it and a save writes it
/// back unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum GradeLevel {
    Level(i64),
    Invalid(Value),
}

impl GradeLevel {
    /// The grade when it lies in `0..=MAX_GRADE`.
    pub fn grade(&self) -> Option<u8> {
        match self {
            GradeLevel::Level(n) => u8::try_from(*n).ok().filter(|g| *g <= MAX_GRADE),
            GradeLevel::Invalid(_) => None,
        }
    }

    pub fn level(&self) -> Option<i64> {
        match self {
            GradeLevel::Level(n) => Some(*n),
            GradeLevel::Invalid(_) => None,
        }
    }
}

impl Default for GradeLevel {
    fn default() -> Self {
        GradeLevel::Level(0)
    }
}

impl From<u8> for GradeLevel {
    fn from(grade: u8) -> Self {
        GradeLevel::Level(grade.into())
    }
}

impl From<Value> for GradeLevel {
    fn from(value: Value) -> Self {
        let whole = match &value {
            Value::Null => Some(0),
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < 1e15)
                    .map(|f| f as i64)
            }),
            Value::String(s) => {
                let s = s.trim();
                if s.eq_ignore_ascii_case("k") {
                    Some(0)
                } else {
                    s.parse().ok()
                }
            }
            _ => None,
        };
        match whole {
            Some(n) => GradeLevel::Level(n),
            None => GradeLevel::Invalid(value),
        }
    }
}

impl Serialize for GradeLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            GradeLevel::Level(n) => serializer.serialize_i64(*n),
            GradeLevel::Invalid(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for GradeLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Value::deserialize(deserializer)?.into())
    }
}

/// Shown as "K" for kindergarten; invalid values as their JSON text.
impl fmt::Display for GradeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradeLevel::Level(n) => write!(f, "{}", GradeLabel(*n)),
            GradeLevel::Invalid(value) => write!(f, "{value}"),
        }
    }
}

/// Grade label as shown to people ("K" for kindergarten).
pub struct GradeLabel(pub i64);

impl fmt::Display for GradeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0 => write!(f, "K"),
            g => write!(f, "{g}"),
        }
    }
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Accept strings, numbers, booleans, or null and store them as a string.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_string(Value::deserialize(deserializer)?))
}

fn lenient_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        other => Some(value_to_string(other)),
    })
}

fn lenient_questions<'de, D>(deserializer: D) -> Result<Vec<Question>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Question>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept an array of scalars, a single scalar, or null.
fn lenient_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::Array(items) => items.into_iter().map(value_to_string).collect(),
        scalar => vec![value_to_string(scalar)],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_answers_and_options_become_strings() {
        let json = r#"{"question": "What is 2 + 2?", "options": [3, 4, 5], "answer": 4}"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.answer, "4");
        assert_eq!(q.options, vec!["3", "4", "5"]);
        assert!(q.answer_in_options());
    }

    #[test]
    fn missing_fields_default() {
        let set: QuestionSet = serde_json::from_str(r#"{"id": "x", "title": "X"}"#).unwrap();
        assert!(set.questions.is_empty());
        assert_eq!(set.grade_level, GradeLevel::Level(0));

        let q: Question = serde_json::from_str(r#"{"question": "Hi?"}"#).unwrap();
        assert!(q.answer.is_empty());
        assert!(!q.has_options());
    }

    #[test]
    fn unknown_fields_and_type_survive_roundtrip() {
        let json = r#"{"question":"Where is 3 on the line?","answer":"3","type":"number_line","range":[0,10]}"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.kind.as_deref(), Some("number_line"));
        let out = serde_json::to_value(&q).unwrap();
        assert_eq!(out["type"], "number_line");
        assert_eq!(out["range"], serde_json::json!([0, 10]));
        assert!(out.get("options").is_none());
    }

    #[test]
    fn single_hint_string_is_accepted() {
        let q: Question =
            serde_json::from_str(r#"{"question":"Q?","answer":"1","hints":"Count up"}"#).unwrap();
        assert_eq!(q.hints, vec!["Count up"]);
    }

    #[test]
    fn duplicate_answer_is_not_in_options_once() {
        let q = Question::new("Q?", vec!["5".into(), "5".into(), "6".into()], "5");
        assert_eq!(q.answer_occurrences(), 2);
        assert!(!q.answer_in_options());
    }

    #[test]
    fn loose_set_fields_load() {
        let json = r#"{"id": 17, "title": null, "grade_level": "3", "topic": "Addition",
            "questions": [{"question": null, "answer": 4, "explanation": 12}]}"#;
        let set: QuestionSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.id, "17");
        assert_eq!(set.title, "");
        assert_eq!(set.grade_level, GradeLevel::Level(3));
        assert_eq!(set.grade_level.grade(), Some(3));
        assert_eq!(set.questions[0].question, "");
        assert_eq!(set.questions[0].explanation.as_deref(), Some("12"));

        let set: QuestionSet =
            serde_json::from_str(r#"{"id": "x", "questions": null}"#).unwrap();
        assert!(set.questions.is_empty());
    }

    #[test]
    fn bad_grades_stay_reportable() {
        let grade = |json: &str| serde_json::from_str::<GradeLevel>(json).unwrap();
        assert_eq!(grade("300"), GradeLevel::Level(300));
        assert_eq!(grade("300").grade(), None);
        assert_eq!(grade("-1").grade(), None);
        assert_eq!(grade("4.0"), GradeLevel::Level(4));
        assert_eq!(grade(r#""K""#), GradeLevel::Level(0));
        assert_eq!(grade("3.5"), GradeLevel::Invalid(serde_json::json!(3.5)));
        assert_eq!(grade(r#""third""#).to_string(), r#""third""#);

        let set: QuestionSet =
            serde_json::from_str(r#"{"id": "x", "grade_level": "third"}"#).unwrap();
        let out = serde_json::to_value(&set).unwrap();
        assert_eq!(out["grade_level"], "third");
        let set: QuestionSet = serde_json::from_str(r#"{"id": "x", "grade_level": 300}"#).unwrap();
        assert_eq!(serde_json::to_value(&set).unwrap()["grade_level"], 300);
    }

    #[test]
    fn grade_label() {
        assert_eq!(GradeLabel(0).to_string(), "K");
        assert_eq!(GradeLabel(4).to_string(), "4");
        assert_eq!(GradeLevel::Level(0).to_string(), "K");
        assert_eq!(normalize_key("  Multiply By 6 "), "multiply by 6");
    }
}
