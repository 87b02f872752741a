//! Whole-number families: addition, subtraction, multiplication, division.

use rand::seq::SliceRandom;
use rand::Rng;

use super::{int_in, phrase, Draft};
use crate::distractor::DistractorContext;

/// Column-wise sum that drops every carry, the classic regrouping mistake.
fn sum_without_carry(mut a: i64, mut b: i64) -> i64 {
    let (mut result, mut place) = (0, 1);
    while a > 0 || b > 0 {
        result += ((a % 10 + b % 10) % 10) * place;
        a /= 10;
        b /= 10;
        place *= 10;
    }
    result
}

/// Column-wise "smaller from larger" difference, the classic borrowing mistake.
fn difference_without_borrow(mut a: i64, mut b: i64) -> i64 {
    let (mut result, mut place) = (0, 1);
    while a > 0 || b > 0 {
        result += (a % 10 - b % 10).abs() * place;
        a /= 10;
        b /= 10;
        place *= 10;
    }
    result
}

pub(super) fn addition<R: Rng + ?Sized>(
    rng: &mut R,
    min: i64,
    max: i64,
    regrouping: bool,
) -> Option<Draft> {
    let a = int_in(rng, min, max);
    let b = int_in(rng, min, max);
    let ones = a % 10 + b % 10;
    if regrouping && ones < 10 {
        return None;
    }
    let sum = a + b;

    let explanation = if ones >= 10 {
        format!(
            "Add the ones first: {} + {} = {ones}. Write {} and carry 1 to the tens. So {a} + {b} = {sum}.",
            a % 10,
            b % 10,
            ones % 10
        )
    } else {
        format!("Add the ones, then the tens: {a} + {b} = {sum}.")
    };

    Some(Draft {
        question: phrase(rng, &a.to_string(), "+", &b.to_string()),
        answer: sum.to_string(),
        explanation,
        hints: vec![
            "Line up the numbers by place value.".into(),
            if regrouping {
                "If the ones add up to 10 or more, carry to the tens.".into()
            } else {
                "Start adding from the ones place.".into()
            },
        ],
        distractors: DistractorContext::default().with_mistakes([sum_without_carry(a, b)]),
    })
}

pub(super) fn subtraction<R: Rng + ?Sized>(
    rng: &mut R,
    min: i64,
    max: i64,
    regrouping: bool,
) -> Option<Draft> {
    let x = int_in(rng, min, max);
    let y = int_in(rng, min, max);
    let (a, b) = if x >= y { (x, y) } else { (y, x) };
    let borrows = a % 10 < b % 10;
    if regrouping && !borrows {
        return None;
    }
    let difference = a - b;

    let explanation = if borrows {
        format!(
            "{} is smaller than {}, so borrow 1 ten to make {} ones. So {a} - {b} = {difference}.",
            a % 10,
            b % 10,
            a % 10 + 10
        )
    } else {
        format!("Subtract the ones, then the tens: {a} - {b} = {difference}.")
    };

    Some(Draft {
        question: phrase(rng, &a.to_string(), "-", &b.to_string()),
        answer: difference.to_string(),
        explanation,
        hints: vec![
            "Put the larger number on top.".into(),
            "If the top digit is smaller, borrow from the next place.".into(),
        ],
        distractors: DistractorContext {
            allow_zero: difference == 0,
            ..Default::default()
        }
        .with_mistakes([difference_without_borrow(a, b), a + b]),
    })
}

pub(super) fn multiplication<R: Rng + ?Sized>(
    rng: &mut R,
    factors: &[i64],
    min: i64,
    max: i64,
) -> Option<Draft> {
    let factor = *factors.choose(rng)?;
    let other = int_in(rng, min, max);
    let product = factor * other;

    Some(Draft {
        question: phrase(rng, &other.to_string(), "×", &factor.to_string()),
        answer: product.to_string(),
        explanation: format!(
            "{other} × {factor} means {other} groups of {factor}, which is {product}."
        ),
        hints: vec![
            format!("Skip count by {factor}."),
            format!("Think of {other} equal groups of {factor}."),
        ],
        distractors: DistractorContext::default().with_mistakes([
            factor + other,
            factor * (other + 1),
            factor * (other - 1),
        ]),
    })
}

pub(super) fn division<R: Rng + ?Sized>(
    rng: &mut R,
    divisors: &[i64],
    min_quotient: i64,
    max_quotient: i64,
    remainder: bool,
) -> Option<Draft> {
    let divisor = *divisors.choose(rng)?;
    if divisor == 0 {
        return None;
    }
    let quotient = int_in(rng, min_quotient, max_quotient);

    if !remainder {
        let dividend = quotient * divisor;
        return Some(Draft {
            question: phrase(rng, &dividend.to_string(), "÷", &divisor.to_string()),
            answer: quotient.to_string(),
            explanation: format!(
                "{divisor} × {quotient} = {dividend}, so {dividend} ÷ {divisor} = {quotient}."
            ),
            hints: vec![
                format!("What number times {divisor} makes {dividend}?"),
                "Use the related multiplication fact.".into(),
            ],
            distractors: DistractorContext {
                allow_zero: quotient == 0,
                ..Default::default()
            }
            .with_mistakes([quotient + 1, quotient - 1, divisor]),
        });
    }

    if divisor < 2 {
        return None;
    }
    let rem = int_in(rng, 1, divisor - 1);
    let dividend = quotient * divisor + rem;
    let answer = format!("{quotient} R {rem}");

    let mut pool = vec![
        format!("{} R {rem}", quotient + 1),
        format!("{quotient} R {divisor}"),
        format!("{} R {}", quotient + 1, rem + 1),
        format!("{quotient} R 0"),
    ];
    if quotient > 0 {
        pool.push(format!("{} R {rem}", quotient - 1));
    }
    if rem + 1 < divisor {
        pool.push(format!("{quotient} R {}", rem + 1));
    }

    Some(Draft {
        question: format!(
            "What is {dividend} ÷ {divisor}? Give the quotient and remainder."
        ),
        answer,
        explanation: format!(
            "{divisor} × {quotient} = {}, and {dividend} - {} = {rem}, so the answer is {quotient} R {rem}.",
            divisor * quotient,
            divisor * quotient
        ),
        hints: vec![
            format!("Find the largest multiple of {divisor} that is not more than {dividend}."),
            format!("The remainder must be less than {divisor}."),
        ],
        distractors: DistractorContext::default().with_pool(pool),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn carry_and_borrow_mistakes() {
        assert_eq!(sum_without_carry(47, 38), 75);
        assert_eq!(sum_without_carry(5, 5), 0);
        assert_eq!(difference_without_borrow(52, 17), 45);
        assert_eq!(difference_without_borrow(40, 3), 43);
    }

    #[test]
    fn regrouping_addition_always_carries() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            if let Some(d) = addition(&mut rng, 10, 99, true) {
                assert!(d.explanation.contains("carry"), "{}", d.explanation);
            }
        }
    }

    #[test]
    fn regrouping_subtraction_always_borrows_and_stays_non_negative() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut produced = 0;
        for _ in 0..200 {
            if let Some(d) = subtraction(&mut rng, 10, 99, true) {
                produced += 1;
                assert!(d.explanation.contains("borrow"));
                assert!(d.answer.parse::<i64>().unwrap() >= 0);
            }
        }
        assert!(produced > 0);
    }

    #[test]
    fn remainder_division_keeps_remainder_below_divisor() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let d = division(&mut rng, &[7], 1, 9, true).unwrap();
            let (q, r) = d.answer.split_once(" R ").unwrap();
            let (q, r): (i64, i64) = (q.parse().unwrap(), r.parse().unwrap());
            assert!((1..7).contains(&r));
            assert!((1..=9).contains(&q));
            assert!(d.question.contains(&format!("{} ÷ 7", q * 7 + r)));
        }
    }

    #[test]
    fn remainder_needs_divisor_above_one() {
        let mut rng = StdRng::seed_from_u64(4);
        assert!(division(&mut rng, &[1], 1, 9, true).is_none());
    }

    #[test]
    fn multiplication_offers_add_instead_of_multiply() {
        let mut rng = StdRng::seed_from_u64(5);
        let d = multiplication(&mut rng, &[6], 3, 3).unwrap();
        assert_eq!(d.answer, "18");
        assert_eq!(d.distractors.mistakes[0], "9");
    }
}
