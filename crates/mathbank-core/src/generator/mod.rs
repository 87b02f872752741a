//! Question template generator.
//!
//! Each operation family draws a [`Draft`] from a seedable RNG under its
//! numeric constraints. Draws that violate a constraint return `None` and are
//! retried through [`try_generate`] up to a fixed budget; an item that
//! exhausts the budget is skipped, so generation always terminates and may
//! come back short of the requested count.

mod arithmetic;
mod fraction;
mod lookup;

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::distractor::{assemble_options, distractors, DistractorContext};
use crate::document::skill_id;
use crate::error::SkillError;
use crate::model::{normalize_key, Question, QuestionSet};
use crate::skills::{Family, SkillConfig};

/// Attempts per item before it is skipped.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;
/// Options per multiple-choice question, answer included.
pub const DEFAULT_OPTION_COUNT: usize = 4;

/// Knobs shared by every family.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub max_attempts: u32,
    pub option_count: usize,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            option_count: DEFAULT_OPTION_COUNT,
        }
    }
}

/// A question before options are attached.
#[derive(Debug, Clone)]
pub struct Draft {
    pub question: String,
    pub answer: String,
    pub explanation: String,
    pub hints: Vec<String>,
    pub distractors: DistractorContext,
}

/// What a generation run produced.
#[derive(Debug, Clone, Default)]
pub struct GenerationOutcome {
    pub questions: Vec<Question>,
    pub requested: usize,
    /// Items dropped after exhausting their attempt budget.
    pub skipped: usize,
}

/// A generated question set and its run statistics.
#[derive(Debug, Clone)]
pub struct GeneratedSet {
    pub set: QuestionSet,
    pub requested: usize,
    pub skipped: usize,
}

/// Run `attempt` until it yields a value or `max_attempts` runs are spent.
pub fn try_generate<R, T, F>(rng: &mut R, max_attempts: u32, mut attempt: F) -> Option<T>
where
    R: Rng + ?Sized,
    F: FnMut(&mut R) -> Option<T>,
{
    (0..max_attempts).find_map(|_| attempt(rng))
}

/// Draw one draft for `family`; `None` means the draw violated a constraint.
pub fn draw<R: Rng + ?Sized>(family: &Family, rng: &mut R) -> Option<Draft> {
    match family {
        Family::Addition {
            min,
            max,
            regrouping,
        } => arithmetic::addition(rng, *min, *max, *regrouping),
        Family::Subtraction {
            min,
            max,
            regrouping,
        } => arithmetic::subtraction(rng, *min, *max, *regrouping),
        Family::Multiplication { factors, min, max } => {
            arithmetic::multiplication(rng, factors, *min, *max)
        }
        Family::Division {
            divisors,
            min_quotient,
            max_quotient,
            remainder,
        } => arithmetic::division(rng, divisors, *min_quotient, *max_quotient, *remainder),
        Family::Fraction {
            op,
            max_denominator,
        } => fraction::fraction(rng, *op, *max_denominator),
        Family::Decimal { op, places, max } => fraction::decimal(rng, *op, *places, *max),
        Family::Ratio { max_term } => fraction::ratio(rng, *max_term),
        Family::AnglePair { pair } => lookup::angle_pair(rng, *pair),
        Family::Quadrant { max_coordinate } => lookup::quadrant(rng, *max_coordinate),
        Family::ShapeSides => lookup::shape_sides(rng),
    }
}

/// Generate up to `count` distinct questions for `family`.
pub fn generate<R: Rng + ?Sized>(
    family: &Family,
    count: usize,
    options: &GenerateOptions,
    rng: &mut R,
) -> Result<GenerationOutcome, SkillError> {
    family.validate()?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut outcome = GenerationOutcome {
        requested: count,
        ..Default::default()
    };

    for item in 0..count {
        let drafted = try_generate(rng, options.max_attempts, |rng| {
            draw(family, rng).filter(|d| !seen.contains(&normalize_key(&d.question)))
        });

        let Some(draft) = drafted else {
            tracing::debug!(
                family = family.name(),
                item,
                attempts = options.max_attempts,
                "constraints not satisfied, skipping item"
            );
            outcome.skipped += 1;
            continue;
        };

        seen.insert(normalize_key(&draft.question));
        outcome.questions.push(finish(draft, options, rng));
    }

    Ok(outcome)
}

fn finish<R: Rng + ?Sized>(draft: Draft, options: &GenerateOptions, rng: &mut R) -> Question {
    let wanted = options.option_count.saturating_sub(1);
    let wrong = distractors(&draft.answer, wanted, &draft.distractors, rng);
    let choices = assemble_options(&draft.answer, wrong, rng);
    Question::new(draft.question, choices, draft.answer)
        .with_explanation(draft.explanation)
        .with_hints(draft.hints)
}

/// Generate the question set described by `skill`.
pub fn generate_skill<R: Rng + ?Sized>(
    skill: &SkillConfig,
    default_count: usize,
    options: &GenerateOptions,
    rng: &mut R,
) -> Result<GeneratedSet, SkillError> {
    let count = skill.count.unwrap_or(default_count);
    let outcome = generate(&skill.family, count, options, rng)?;
    let id = skill
        .id
        .clone()
        .unwrap_or_else(|| skill_id(skill.grade_level, &skill.topic, &skill.title));

    tracing::info!(
        id = %id,
        family = skill.family.name(),
        generated = outcome.questions.len(),
        skipped = outcome.skipped,
        "generated question set"
    );

    Ok(GeneratedSet {
        set: QuestionSet::new(id, &skill.title, skill.grade_level, &skill.topic)
            .with_questions(outcome.questions),
        requested: outcome.requested,
        skipped: outcome.skipped,
    })
}

/// Render `a op b` with one of the standard phrasings.
pub(crate) fn phrase<R: Rng + ?Sized>(rng: &mut R, a: &str, symbol: &str, b: &str) -> String {
    const TEMPLATES: [&str; 3] = ["What is {}?", "Calculate: {}", "Solve: {} = ?"];
    let expr = format!("{a} {symbol} {b}");
    let template = TEMPLATES.choose(rng).copied().unwrap_or(TEMPLATES[0]);
    template.replace("{}", &expr)
}

pub(crate) fn int_in<R: Rng + ?Sized>(rng: &mut R, min: i64, max: i64) -> i64 {
    rng.gen_range(min..=max)
}
