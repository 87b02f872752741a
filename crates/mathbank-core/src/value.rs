//! Numeric answer values: parsing stored answers and exact fractions.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

/// Matches an answer with an optional currency prefix and a trailing unit,
/// e.g. `$4.50`, `1,234`, `55°`, `12 cm`, `3/4`, `1 1/2`.
static NUMERIC_ANSWER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[$€£]\s*)?(?P<sign>-)?(?:(?P<whole>\d+)\s+(?P<mnum>\d+)\s*/\s*(?P<mden>\d+)|(?P<num>\d+)\s*/\s*(?P<den>\d+)|(?P<dec>\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?|\.\d+))\s*(?:°|%|[a-z]+\.?(?:\s+[a-z]+\.?)*)?$",
    )
    .expect("numeric answer regex is valid")
});

/// Parse a stored answer into a number, stripping currency and unit decorations.
///
/// Returns `None` when the answer is not a plain quantity.
pub fn parse_numeric(answer: &str) -> Option<f64> {
    let text = answer.trim().trim_start_matches('=').trim().to_lowercase();
    let caps = NUMERIC_ANSWER.captures(&text)?;
    let sign = if caps.name("sign").is_some() { -1.0 } else { 1.0 };

    let magnitude = if let Some(dec) = caps.name("dec") {
        dec.as_str().replace(',', "").parse::<f64>().ok()?
    } else if let (Some(num), Some(den)) = (caps.name("num"), caps.name("den")) {
        ratio(num.as_str(), den.as_str())?
    } else {
        let whole: f64 = caps.name("whole")?.as_str().parse().ok()?;
        whole + ratio(caps.name("mnum")?.as_str(), caps.name("mden")?.as_str())?
    };
    Some(sign * magnitude)
}

fn ratio(num: &str, den: &str) -> Option<f64> {
    let num: f64 = num.parse().ok()?;
    let den: f64 = den.parse().ok()?;
    if den == 0.0 {
        return None;
    }
    Some(num / den)
}

/// Render a computed value the way answers are stored: integers without a
/// decimal point, other values trimmed to at most six places.
pub fn format_number(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        return format!("{}", value.round() as i64);
    }
    let s = format!("{value:.6}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Render `units / 10^places` with exactly `places` decimals.
pub fn format_fixed(units: i64, places: u32) -> String {
    if places == 0 {
        return units.to_string();
    }
    let scale = 10i64.pow(places);
    let sign = if units < 0 { "-" } else { "" };
    let abs = units.abs();
    format!(
        "{sign}{}.{:0width$}",
        abs / scale,
        abs % scale,
        width = places as usize
    )
}

pub fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// `None` when the result does not fit in an `i64`.
pub fn lcm(a: i64, b: i64) -> Option<i64> {
    if a == 0 || b == 0 {
        return Some(0);
    }
    (a / gcd(a, b)).checked_mul(b)?.checked_abs()
}

/// An exact fraction with a positive denominator. Not reduced unless asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fraction {
    pub num: i64,
    pub den: i64,
}

impl Fraction {
    /// Returns `None` for a zero denominator.
    pub fn new(num: i64, den: i64) -> Option<Self> {
        if den == 0 {
            return None;
        }
        let sign = if den < 0 { -1 } else { 1 };
        Some(Self {
            num: num.checked_mul(sign)?,
            den: den.checked_mul(sign)?,
        })
    }

    pub fn reduced(self) -> Self {
        let g = gcd(self.num, self.den).max(1);
        Self {
            num: self.num / g,
            den: self.den / g,
        }
    }

    pub fn value(self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /// Same quantity regardless of representation.
    pub fn same_value(self, other: Fraction) -> bool {
        self.num as i128 * other.den as i128 == other.num as i128 * self.den as i128
    }

    /// Sum over the least common denominator, `None` on overflow.
    pub fn add(self, other: Fraction) -> Option<Fraction> {
        let den = lcm(self.den, other.den)?;
        let left = self.num.checked_mul(den / self.den)?;
        let right = other.num.checked_mul(den / other.den)?;
        Some(Fraction {
            num: left.checked_add(right)?,
            den,
        })
    }

    /// Difference over the least common denominator, `None` on overflow.
    pub fn sub(self, other: Fraction) -> Option<Fraction> {
        self.add(Fraction {
            num: other.num.checked_neg()?,
            den: other.den,
        })
    }

    /// Product, `None` on overflow.
    pub fn mul(self, other: Fraction) -> Option<Fraction> {
        Fraction::new(
            self.num.checked_mul(other.num)?,
            self.den.checked_mul(other.den)?,
        )
    }

    /// Quotient, `None` for a zero divisor or on overflow.
    pub fn div(self, other: Fraction) -> Option<Fraction> {
        Fraction::new(
            self.num.checked_mul(other.den)?,
            self.den.checked_mul(other.num)?,
        )
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl FromStr for Fraction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (num, den) = s
            .split_once('/')
            .ok_or_else(|| format!("not a fraction: {s}"))?;
        let num: i64 = num
            .trim()
            .parse()
            .map_err(|_| format!("bad numerator: {s}"))?;
        let den: i64 = den
            .trim()
            .parse()
            .map_err(|_| format!("bad denominator: {s}"))?;
        Fraction::new(num, den).ok_or_else(|| format!("zero denominator: {s}"))
    }
}
