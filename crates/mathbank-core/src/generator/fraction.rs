//! Part-of-whole families: fractions, decimals, ratios.
//!
//! Answers keep the representation of the inputs. Like-denominator sums and
//! differences stay unreduced; only the simplify skills reduce.

use rand::Rng;

use super::{int_in, phrase, Draft};
use crate::distractor::DistractorContext;
use crate::skills::{DecimalOp, FractionOp};
use crate::value::{format_fixed, gcd};

pub(super) fn fraction<R: Rng + ?Sized>(
    rng: &mut R,
    op: FractionOp,
    max_denominator: i64,
) -> Option<Draft> {
    match op {
        FractionOp::AddLike => {
            let d = int_in(rng, 2, max_denominator);
            let a = int_in(rng, 1, d - 1);
            let b = int_in(rng, 1, d - 1);
            if a + b >= d {
                return None;
            }
            let sum = a + b;
            Some(Draft {
                question: phrase(rng, &format!("{a}/{d}"), "+", &format!("{b}/{d}")),
                answer: format!("{sum}/{d}"),
                explanation: format!(
                    "The denominators are the same, so add the numerators: {a} + {b} = {sum}. The answer is {sum}/{d}."
                ),
                hints: vec![
                    "When the denominators match, keep the denominator.".into(),
                    "Add only the numerators.".into(),
                ],
                distractors: DistractorContext::default()
                    .with_mistakes([format!("{sum}/{}", d + d)]),
            })
        }
        FractionOp::SubtractLike => {
            let d = int_in(rng, 3, max_denominator.max(3));
            let a = int_in(rng, 1, d - 1);
            let b = int_in(rng, 1, d - 1);
            if a <= b {
                return None;
            }
            let diff = a - b;
            Some(Draft {
                question: phrase(rng, &format!("{a}/{d}"), "-", &format!("{b}/{d}")),
                answer: format!("{diff}/{d}"),
                explanation: format!(
                    "The denominators are the same, so subtract the numerators: {a} - {b} = {diff}. The answer is {diff}/{d}."
                ),
                hints: vec![
                    "When the denominators match, keep the denominator.".into(),
                    "Subtract only the numerators.".into(),
                ],
                distractors: DistractorContext::default()
                    .with_mistakes([format!("{}/{d}", a + b)]),
            })
        }
        FractionOp::Simplify => {
            let q = int_in(rng, 2, max_denominator);
            let p = int_in(rng, 1, q - 1);
            if gcd(p, q) != 1 {
                return None;
            }
            let k = int_in(rng, 2, 5);
            let (kp, kq) = (k * p, k * q);
            let question = if rng.gen_bool(0.5) {
                format!("What is {kp}/{kq} in simplest form?")
            } else {
                format!("Simplify: {kp}/{kq}")
            };
            Some(Draft {
                question,
                answer: format!("{p}/{q}"),
                explanation: format!(
                    "The greatest common factor of {kp} and {kq} is {k}. Divide both by {k} to get {p}/{q}."
                ),
                hints: vec![
                    "Find a number that divides both the numerator and denominator.".into(),
                    "Keep dividing until the only common factor is 1.".into(),
                ],
                distractors: DistractorContext::default()
                    .with_mistakes([format!("{p}/{kq}"), format!("{kp}/{q}")]),
            })
        }
        FractionOp::Equivalent => {
            let q = int_in(rng, 2, max_denominator);
            let p = int_in(rng, 1, q - 1);
            if gcd(p, q) != 1 {
                return None;
            }
            let k = int_in(rng, 2, 5);
            Some(Draft {
                question: format!("Which fraction is equivalent to {p}/{q}?"),
                answer: format!("{}/{}", k * p, k * q),
                explanation: format!(
                    "Multiply the numerator and denominator by {k}: {p}/{q} = {}/{}.",
                    k * p,
                    k * q
                ),
                hints: vec![
                    "Equivalent fractions name the same amount.".into(),
                    "Multiply the top and bottom by the same number.".into(),
                ],
                distractors: DistractorContext::default()
                    .with_mistakes([format!("{}/{}", p + k, q + k), format!("{}/{q}", k * p)]),
            })
        }
    }
}

pub(super) fn decimal<R: Rng + ?Sized>(
    rng: &mut R,
    op: DecimalOp,
    places: u32,
    max: i64,
) -> Option<Draft> {
    let scale = 10i64.pow(places);
    let a = int_in(rng, 0, max * scale);
    let b = int_in(rng, 0, max * scale);
    if a == 0 || b == 0 || (op == DecimalOp::Subtract && a <= b) {
        return None;
    }

    let (symbol, result, verb) = match op {
        DecimalOp::Add => ("+", a + b, "add"),
        DecimalOp::Subtract => ("-", a - b, "subtract"),
    };
    let (a_text, b_text, answer) = (
        format_fixed(a, places),
        format_fixed(b, places),
        format_fixed(result, places),
    );

    Some(Draft {
        question: phrase(rng, &a_text, symbol, &b_text),
        explanation: format!(
            "Line up the decimal points, then {verb} as with whole numbers: {a_text} {symbol} {b_text} = {answer}."
        ),
        answer,
        hints: vec![
            "Line up the decimal points.".into(),
            "Write zeros in empty places if it helps.".into(),
        ],
        distractors: DistractorContext::default()
            .with_mistakes([format_fixed(result * 10, places)]),
    })
}

pub(super) fn ratio<R: Rng + ?Sized>(rng: &mut R, max_term: i64) -> Option<Draft> {
    let a = int_in(rng, 1, max_term);
    let b = int_in(rng, 1, max_term);
    if a == b || gcd(a, b) != 1 {
        return None;
    }
    let k = int_in(rng, 2, 5);
    Some(Draft {
        question: format!("What is the ratio {}:{} in simplest form?", k * a, k * b),
        answer: format!("{a}:{b}"),
        explanation: format!(
            "Both terms share the factor {k}. Divide each by {k}: {}:{} = {a}:{b}.",
            k * a,
            k * b
        ),
        hints: vec![
            "Find the greatest common factor of both terms.".into(),
            "Keep the terms in the same order.".into(),
        ],
        distractors: DistractorContext::default(),
    })
}
