//! Arithmetic extraction from question text.
//!
//! Questions are matched against an ordered list of phrasing patterns over
//! the trimmed, lowercased text; the first pattern that matches and yields
//! well-formed operands wins. Conceptual phrasings are rejected up front so a
//! stray number pair in "Which array shows 3 × 4?" is never graded as a sum.
//!
//! Patterns are anchored at both ends. A question that wraps an expression in
//! extra prose does not match, which keeps extraction conservative: an
//! unmatched question is simply not verified.

use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::value::{format_number, Fraction};

/// Leading instruction words, e.g. "What is", "Calculate:".
const LEAD: &str = r"^(?:(?:what is|what's|calculate|compute|evaluate|solve|find)\s*:?\s*)?";
/// Trailing `= ?`, blanks and terminal punctuation.
const TAIL: &str = r"\s*(?:=\s*(?:\?|_+|□)?)?\s*[?.!]?\s*$";

/// A number operand: plain, decimal, or comma-grouped, with an optional `$`.
fn num(name: &str) -> String {
    format!(r"\$?(?P<{name}>\d{{1,3}}(?:,\d{{3}})+(?:\.\d+)?|\d+(?:\.\d+)?)")
}

/// Phrasings that mention numbers without asking for a single computation.
static CONCEPTUAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:which array|true or false|compare|word problem|remainder|estimate|round(?:ed)? to|simplest form|simplify|equivalent|greater than|less than|which is (?:bigger|larger|smaller)|missing number|pattern|number line)\b",
    )
    .expect("conceptual phrase regex is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    pub fn symbol(self) -> &'static str {
        match self {
            Operation::Add => "+",
            Operation::Subtract => "-",
            Operation::Multiply => "×",
            Operation::Divide => "÷",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operands {
    Numbers(f64, f64),
    Fractions(Fraction, Fraction),
}

/// An arithmetic question recognized in text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extraction {
    pub op: Operation,
    pub operands: Operands,
    /// Name of the pattern that matched.
    pub pattern: &'static str,
}

/// The recomputed answer of an extraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expected {
    Number(f64),
    Fraction(Fraction),
}

impl Expected {
    pub fn value(self) -> f64 {
        match self {
            Expected::Number(v) => v,
            Expected::Fraction(f) => f.value(),
        }
    }

    /// Text written into the document when an answer is fixed.
    pub fn render(self) -> String {
        match self {
            Expected::Number(v) => format_number(v),
            Expected::Fraction(f) => f.to_string(),
        }
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl Extraction {
    /// Recompute the answer. `None` for division by zero or when exact
    /// fraction arithmetic overflows.
    pub fn evaluate(&self) -> Option<Expected> {
        match self.operands {
            Operands::Numbers(a, b) => {
                let v = match self.op {
                    Operation::Add => a + b,
                    Operation::Subtract => a - b,
                    Operation::Multiply => a * b,
                    Operation::Divide if b == 0.0 => return None,
                    Operation::Divide => a / b,
                };
                Some(Expected::Number(v))
            }
            Operands::Fractions(a, b) => {
                let f = match self.op {
                    Operation::Add => a.add(b)?,
                    Operation::Subtract => a.sub(b)?,
                    Operation::Multiply => a.mul(b)?,
                    Operation::Divide => a.div(b)?,
                };
                Some(Expected::Fraction(f))
            }
        }
    }
}

struct Pattern {
    name: &'static str,
    regex: Regex,
    build: fn(&Captures<'_>) -> Option<(Operation, Operands)>,
}

impl Pattern {
    fn new(
        name: &'static str,
        body: &str,
        build: fn(&Captures<'_>) -> Option<(Operation, Operands)>,
    ) -> Self {
        let regex = Regex::new(&format!("{LEAD}{body}{TAIL}"))
            .unwrap_or_else(|e| panic!("pattern {name} is invalid: {e}"));
        Self { name, regex, build }
    }

    fn apply(&self, text: &str) -> Option<Extraction> {
        let caps = self.regex.captures(text)?;
        let (op, operands) = (self.build)(&caps)?;
        Some(Extraction {
            op,
            operands,
            pattern: self.name,
        })
    }
}

fn number(caps: &Captures<'_>, name: &str) -> Option<f64> {
    caps.name(name)?.as_str().replace(',', "").parse().ok()
}

fn pair(caps: &Captures<'_>) -> Option<(f64, f64)> {
    Some((number(caps, "a")?, number(caps, "b")?))
}

fn numbers(op: Operation, caps: &Captures<'_>) -> Option<(Operation, Operands)> {
    let (a, b) = pair(caps)?;
    Some((op, Operands::Numbers(a, b)))
}

fn fraction_operand(caps: &Captures<'_>, num: &str, den: &str) -> Option<Fraction> {
    let n: i64 = caps.name(num)?.as_str().parse().ok()?;
    let d: i64 = caps.name(den)?.as_str().parse().ok()?;
    Fraction::new(n, d)
}

static PATTERNS: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    let (a, b) = (num("a"), num("b"));
    vec![
        Pattern::new(
            "fraction",
            r"(?P<an>\d+)\s*/\s*(?P<ad>\d+)\s*(?P<op>[+\-−–])\s*(?P<bn>\d+)\s*/\s*(?P<bd>\d+)",
            |caps| {
                let x = fraction_operand(caps, "an", "ad")?;
                let y = fraction_operand(caps, "bn", "bd")?;
                let op = if &caps["op"] == "+" {
                    Operation::Add
                } else {
                    Operation::Subtract
                };
                Some((op, Operands::Fractions(x, y)))
            },
        ),
        Pattern::new(
            "sum-of",
            &format!(r"(?:the\s+)?sum\s+of\s+{a}\s+and\s+{b}"),
            |caps| numbers(Operation::Add, caps),
        ),
        Pattern::new(
            "difference-of",
            &format!(r"(?:the\s+)?difference\s+(?:between|of)\s+{a}\s+and\s+{b}"),
            |caps| numbers(Operation::Subtract, caps),
        ),
        Pattern::new(
            "product-of",
            &format!(r"(?:the\s+)?product\s+of\s+{a}\s+and\s+{b}"),
            |caps| numbers(Operation::Multiply, caps),
        ),
        Pattern::new(
            "quotient-of",
            &format!(r"(?:the\s+)?quotient\s+of\s+{a}\s+and\s+{b}"),
            |caps| numbers(Operation::Divide, caps),
        ),
        Pattern::new(
            "divided-by",
            &format!(r"{a}\s+divided\s+by\s+{b}"),
            |caps| numbers(Operation::Divide, caps),
        ),
        Pattern::new(
            "addition",
            &format!(r"{a}\s*(?:\+|\bplus\b)\s*{b}"),
            |caps| numbers(Operation::Add, caps),
        ),
        Pattern::new(
            "subtraction",
            &format!(r"{a}\s*(?:-|−|–|\bminus\b)\s*{b}"),
            |caps| numbers(Operation::Subtract, caps),
        ),
        Pattern::new(
            "multiplication",
            &format!(r"{a}\s*(?:×|\*|\bx\b|\btimes\b|\bmultiplied\s+by\b)\s*{b}"),
            |caps| numbers(Operation::Multiply, caps),
        ),
        Pattern::new(
            "division",
            &format!(r"{a}\s*(?:÷|/)\s*{b}"),
            |caps| numbers(Operation::Divide, caps),
        ),
    ]
});

fn prepare(text: &str) -> Option<String> {
    let text = text.trim().to_lowercase();
    if text.is_empty() || CONCEPTUAL.is_match(&text) {
        return None;
    }
    Some(text)
}

/// Recognize a single binary arithmetic operation in `text`.
pub fn extract(text: &str) -> Option<Extraction> {
    let text = prepare(text)?;
    PATTERNS.iter().find_map(|p| p.apply(&text))
}

/// Every pattern's reading of `text`, in pattern order.
pub fn extract_all(text: &str) -> Vec<Extraction> {
    let Some(text) = prepare(text) else {
        return Vec::new();
    };
    PATTERNS.iter().filter_map(|p| p.apply(&text)).collect()
}

/// Names of the patterns in match order.
pub fn pattern_names() -> Vec<&'static str> {
    PATTERNS.iter().map(|p| p.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn numbers_of(text: &str) -> (Operation, f64, f64) {
        let e = extract(text).unwrap_or_else(|| panic!("no match for {text:?}"));
        match e.operands {
            Operands::Numbers(a, b) => (e.op, a, b),
            Operands::Fractions(..) => panic!("unexpected fractions for {text:?}"),
        }
    }

    #[test]
    fn symbolic_phrasings() {
        assert_eq!(numbers_of("What is 45 + 23?"), (Operation::Add, 45.0, 23.0));
        assert_eq!(numbers_of("Calculate: 90 - 17"), (Operation::Subtract, 90.0, 17.0));
        assert_eq!(numbers_of("Solve: 7 × 6 = ?"), (Operation::Multiply, 7.0, 6.0));
        assert_eq!(numbers_of("36 ÷ 4 = ___"), (Operation::Divide, 36.0, 4.0));
        assert_eq!(numbers_of("what's 8 x 3?"), (Operation::Multiply, 8.0, 3.0));
        assert_eq!(numbers_of("12 * 12"), (Operation::Multiply, 12.0, 12.0));
        assert_eq!(numbers_of("What is 10 − 4?"), (Operation::Subtract, 10.0, 4.0));
    }

    #[test]
    fn word_phrasings() {
        assert_eq!(numbers_of("What is the sum of 12 and 30?"), (Operation::Add, 12.0, 30.0));
        assert_eq!(
            numbers_of("Find the difference between 50 and 8."),
            (Operation::Subtract, 50.0, 8.0)
        );
        assert_eq!(numbers_of("What is the product of 6 and 7?"), (Operation::Multiply, 6.0, 7.0));
        assert_eq!(numbers_of("What is 81 divided by 9?"), (Operation::Divide, 81.0, 9.0));
        assert_eq!(numbers_of("What is 5 plus 4?"), (Operation::Add, 5.0, 4.0));
        assert_eq!(numbers_of("What is 9 minus 4?"), (Operation::Subtract, 9.0, 4.0));
        assert_eq!(numbers_of("What is 3 times 4?"), (Operation::Multiply, 3.0, 4.0));
    }

    #[test]
    fn grouped_and_decimal_operands() {
        assert_eq!(numbers_of("What is 1,250 + 3,400?"), (Operation::Add, 1250.0, 3400.0));
        assert_eq!(numbers_of("What is 4.5 + 2.25?"), (Operation::Add, 4.5, 2.25));
        assert_eq!(numbers_of("What is $3.50 + $1.25?"), (Operation::Add, 3.5, 1.25));
    }

    #[test]
    fn fractions_are_exact() {
        let e = extract("What is 1/4 + 1/6?").unwrap();
        assert_eq!(e.pattern, "fraction");
        assert_eq!(e.evaluate().unwrap().render(), "5/12");
        let e = extract("Calculate: 5/8 - 3/8").unwrap();
        assert_eq!(e.evaluate().unwrap().render(), "2/8");
    }

    #[test]
    fn conceptual_questions_are_skipped() {
        assert!(extract("Which array shows 3 × 4?").is_none());
        assert!(extract("True or false: 5 + 5 = 10").is_none());
        assert!(extract("Compare 45 and 54.").is_none());
        assert!(extract("What is 17 ÷ 3? Give the quotient and remainder.").is_none());
        assert!(extract("What is 6/8 in simplest form?").is_none());
        assert!(extract("Estimate 48 + 31 by rounding to the nearest ten.").is_none());
    }

    #[test]
    fn prose_around_the_expression_does_not_match() {
        assert!(extract("Sam has 3 apples and buys 4 more. How many now?").is_none());
        assert!(extract("What is 2 + 3 + 4?").is_none());
        assert!(extract("").is_none());
    }

    #[test]
    fn division_by_zero_is_not_evaluated() {
        let e = extract("What is 5 ÷ 0?").unwrap();
        assert!(e.evaluate().is_none());
        assert!(extract("What is 1/0 + 1/2?").is_none());
    }

    #[test]
    fn huge_fractions_are_not_evaluated() {
        let e = extract("What is 5000000000/5000000001 + 1/5000000003?").unwrap();
        assert_eq!(e.pattern, "fraction");
        assert!(e.evaluate().is_none());
        assert!(extract("What is 99999999999999999999/2 + 1/2?").is_none());
    }

    #[test]
    fn first_pattern_wins() {
        assert_eq!(extract("the sum of 2 and 3").unwrap().pattern, "sum-of");
        assert_eq!(pattern_names()[0], "fraction");
        assert_eq!(pattern_names().len(), 10);
    }

    fn phrasings(a: u32, b: u32) -> Vec<(Operation, String)> {
        vec![
            (Operation::Add, format!("What is {a} + {b}?")),
            (Operation::Add, format!("What is the sum of {a} and {b}?")),
            (Operation::Add, format!("Calculate: {a} plus {b}")),
            (Operation::Subtract, format!("Solve: {a} - {b} = ?")),
            (Operation::Subtract, format!("What is the difference between {a} and {b}?")),
            (Operation::Multiply, format!("What is {a} × {b}?")),
            (Operation::Multiply, format!("What is the product of {a} and {b}?")),
            (Operation::Multiply, format!("{a} multiplied by {b}")),
            (Operation::Divide, format!("What is {a} ÷ {b}?")),
            (Operation::Divide, format!("What is {a} divided by {b}?")),
            (Operation::Divide, format!("What is the quotient of {a} and {b}?")),
            (Operation::Divide, format!("{a}/{b} =")),
        ]
    }

    proptest! {
        #[test]
        fn patterns_agree_on_every_shape(a in 0u32..10_000, b in 1u32..10_000) {
            for (op, text) in phrasings(a, b) {
                let readings = extract_all(&text);
                prop_assert!(!readings.is_empty(), "no pattern matched {}", text);
                for r in &readings {
                    prop_assert_eq!(r.op, op, "{} read by {}", text, r.pattern);
                    prop_assert_eq!(r.operands, Operands::Numbers(a as f64, b as f64));
                }
            }
        }

        #[test]
        fn fraction_shapes_have_a_single_reading(
            an in 1i64..20, ad in 1i64..20, bn in 1i64..20, bd in 1i64..20, plus: bool
        ) {
            let sign = if plus { "+" } else { "-" };
            let text = format!("What is {an}/{ad} {sign} {bn}/{bd}?");
            let readings = extract_all(&text);
            prop_assert_eq!(readings.len(), 1);
            prop_assert_eq!(readings[0].pattern, "fraction");
        }
    }
}
