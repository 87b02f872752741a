//! Distractor synthesis: plausible wrong options for a correct answer.
//!
//! Candidates come from three places, in order of preference: the caller's
//! domain-specific common mistakes, perturbations of the answer's own
//! representation, and finally widening offsets until enough distinct
//! options exist. Every candidate is checked against the answer (by text and
//! by value) and against the distractors already accepted.

use std::collections::HashSet;
use std::sync::LazyLock;

use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;

use crate::value::{format_fixed, Fraction};

/// Upper bound on padding rounds, so a degenerate answer can't spin forever.
const MAX_PADDING_ROUNDS: i64 = 200;

static NUMBER_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<prefix>[$€£]?)(?P<sign>-?)(?P<int>\d{1,3}(?:,\d{3})+|\d+)(?:\.(?P<frac>\d+))?(?P<suffix>\s*(?:°|%|[A-Za-z]+)?)$")
        .expect("number shape regex is valid")
});
static FRACTION_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s*/\s*(\d+)$").expect("fraction shape regex is valid"));
static RATIO_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s*:\s*(\d+)$").expect("ratio shape regex is valid"));

/// Domain knowledge supplied by the generator.
#[derive(Debug, Clone, Default)]
pub struct DistractorContext {
    /// Whether negative values are plausible answers.
    pub allow_negative: bool,
    /// Whether zero is a plausible answer.
    pub allow_zero: bool,
    /// Classic errors for this question, tried first.
    pub mistakes: Vec<String>,
    /// Alternatives for answers drawn from an enumerated domain.
    pub pool: Vec<String>,
}

impl DistractorContext {
    pub fn with_mistakes<I, S>(mut self, mistakes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.mistakes = mistakes.into_iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn with_pool<I, S>(mut self, pool: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.pool = pool.into_iter().map(|p| p.to_string()).collect();
        self
    }
}

/// The representation an answer is written in.
#[derive(Debug, Clone, PartialEq)]
enum Shape {
    /// Fixed-point number: `units / 10^places`, with decoration kept for rendering.
    Number {
        units: i64,
        places: u32,
        prefix: String,
        suffix: String,
        grouped: bool,
    },
    Fraction(Fraction),
    Ratio(i64, i64),
    Text,
}

impl Shape {
    fn parse(answer: &str) -> Shape {
        let text = answer.trim();
        if let Some(c) = FRACTION_SHAPE.captures(text) {
            if let (Ok(n), Ok(d)) = (c[1].parse(), c[2].parse()) {
                if let Some(f) = Fraction::new(n, d) {
                    return Shape::Fraction(f);
                }
            }
        }
        if let Some(c) = RATIO_SHAPE.captures(text) {
            if let (Ok(a), Ok(b)) = (c[1].parse(), c[2].parse()) {
                return Shape::Ratio(a, b);
            }
        }
        if let Some(c) = NUMBER_SHAPE.captures(text) {
            let int_text = &c["int"];
            let frac = c.name("frac").map(|m| m.as_str()).unwrap_or("");
            let places = frac.len() as u32;
            let digits = format!("{}{}", int_text.replace(',', ""), frac);
            if places <= 6 {
                if let Ok(magnitude) = digits.parse::<i64>() {
                    let units = if &c["sign"] == "-" { -magnitude } else { magnitude };
                    return Shape::Number {
                        units,
                        places,
                        prefix: c["prefix"].to_string(),
                        suffix: c["suffix"].to_string(),
                        grouped: int_text.contains(','),
                    };
                }
            }
        }
        Shape::Text
    }

    /// Numeric value used for same-value checks.
    fn value(&self) -> Option<f64> {
        match self {
            Shape::Number { units, places, .. } => {
                Some(*units as f64 / 10f64.powi(*places as i32))
            }
            Shape::Fraction(f) => Some(f.value()),
            Shape::Ratio(a, b) if *b != 0 => Some(*a as f64 / *b as f64),
            _ => None,
        }
    }
}

fn render_number(units: i64, places: u32, prefix: &str, suffix: &str, grouped: bool) -> String {
    let mut body = format_fixed(units, places);
    if grouped {
        body = group_thousands(&body);
    }
    match body.strip_prefix('-') {
        Some(rest) => format!("-{prefix}{rest}{suffix}"),
        None => format!("{prefix}{body}{suffix}"),
    }
}

fn group_thousands(number: &str) -> String {
    let (sign, rest) = match number.strip_prefix('-') {
        Some(r) => ("-", r),
        None => ("", number),
    };
    let (int, frac) = match rest.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rest, None),
    };
    let mut grouped = String::new();
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    match frac {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Offset unit for a number: 1 below 1000, otherwise a tenth of the leading place.
fn magnitude_step(units: i64) -> i64 {
    let digits = units.unsigned_abs().max(1).ilog10();
    if digits >= 3 {
        10i64.pow(digits - 2)
    } else {
        1
    }
}

/// Accumulates distinct, valid distractors.
struct Collector<'a> {
    correct: &'a str,
    correct_value: Option<f64>,
    ctx: &'a DistractorContext,
    seen: HashSet<String>,
    accepted: Vec<String>,
    count: usize,
}

impl<'a> Collector<'a> {
    fn new(correct: &'a str, shape: &Shape, ctx: &'a DistractorContext, count: usize) -> Self {
        let mut seen = HashSet::new();
        seen.insert(correct.trim().to_lowercase());
        Self {
            correct,
            correct_value: shape.value(),
            ctx,
            seen,
            accepted: Vec::new(),
            count,
        }
    }

    fn full(&self) -> bool {
        self.accepted.len() >= self.count
    }

    fn offer(&mut self, candidate: String) {
        if self.full() {
            return;
        }
        let trimmed = candidate.trim();
        if trimmed.is_empty() || trimmed == self.correct.trim() {
            return;
        }
        let shape = Shape::parse(trimmed);
        if let Some(v) = shape.value() {
            if !v.is_finite() {
                return;
            }
            if v < 0.0 && !self.ctx.allow_negative {
                return;
            }
            if v == 0.0 && !self.ctx.allow_zero {
                return;
            }
            if let Some(correct) = self.correct_value {
                if (v - correct).abs() < 1e-9 {
                    return;
                }
            }
        }
        if self.seen.insert(trimmed.to_lowercase()) {
            self.accepted.push(trimmed.to_string());
        }
    }
}

/// Produce up to `count` wrong-but-plausible options for `correct`.
///
/// The result never contains `correct` (by text or by value) and never
/// repeats itself. Numeric, fraction and ratio answers always yield `count`
/// distractors; text answers are limited by the context's pool.
pub fn distractors<R: Rng + ?Sized>(
    correct: &str,
    count: usize,
    ctx: &DistractorContext,
    rng: &mut R,
) -> Vec<String> {
    let shape = Shape::parse(correct);
    let mut collector = Collector::new(correct, &shape, ctx, count);

    for mistake in &ctx.mistakes {
        collector.offer(mistake.clone());
    }

    match &shape {
        Shape::Number {
            units,
            places,
            prefix,
            suffix,
            grouped,
        } => {
            let step = magnitude_step(*units);
            let mut offsets: Vec<i64> = [1, 2, 10, 3]
                .iter()
                .flat_map(|&o| [o * step, -o * step])
                .collect();
            offsets.shuffle(rng);
            for offset in offsets {
                collector.offer(render_number(units + offset, *places, prefix, suffix, *grouped));
            }
            for k in 4..MAX_PADDING_ROUNDS {
                if collector.full() {
                    break;
                }
                let sign = if rng.gen_bool(0.5) { 1 } else { -1 };
                for offset in [sign * k * step, -sign * k * step] {
                    collector.offer(render_number(units + offset, *places, prefix, suffix, *grouped));
                }
            }
        }
        Shape::Fraction(f) => {
            let (n, d) = (f.num, f.den);
            let mut candidates = vec![
                (n + 1, d),
                (n - 1, d),
                (n, d + 1),
                (n, d - 1),
                (d, n),
                (n + 2, d),
                (n, d + 2),
            ];
            candidates.shuffle(rng);
            for (cn, cd) in candidates {
                offer_pair(&mut collector, cn, cd, '/');
            }
            for k in 3..MAX_PADDING_ROUNDS {
                if collector.full() {
                    break;
                }
                offer_pair(&mut collector, n + k, d, '/');
                offer_pair(&mut collector, n, d + k, '/');
            }
        }
        Shape::Ratio(a, b) => {
            let (a, b) = (*a, *b);
            let mut candidates = vec![(b, a), (a + 1, b), (a, b + 1), (a - 1, b), (a, b - 1)];
            candidates.shuffle(rng);
            for (ca, cb) in candidates {
                offer_pair(&mut collector, ca, cb, ':');
            }
            for k in 2..MAX_PADDING_ROUNDS {
                if collector.full() {
                    break;
                }
                offer_pair(&mut collector, a + k, b, ':');
                offer_pair(&mut collector, a, b + k, ':');
            }
        }
        Shape::Text => {
            let mut pool = ctx.pool.clone();
            pool.shuffle(rng);
            for candidate in pool {
                collector.offer(candidate);
            }
        }
    }

    if !collector.full() {
        tracing::debug!(
            answer = correct,
            wanted = count,
            got = collector.accepted.len(),
            "could not build a full distractor list"
        );
    }
    collector.accepted
}

fn offer_pair(collector: &mut Collector<'_>, a: i64, b: i64, sep: char) {
    if a <= 0 || b <= 0 {
        return;
    }
    collector.offer(format!("{a}{sep}{b}"));
}

/// The correct answer plus its distractors in random order.
pub fn assemble_options<R: Rng + ?Sized>(
    answer: &str,
    distractors: Vec<String>,
    rng: &mut R,
) -> Vec<String> {
    let mut options = distractors;
    options.push(answer.to_string());
    options.shuffle(rng);
    options
}
