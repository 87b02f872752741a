//! Skill configuration error types.
//!
//! Raised when a skill's generator parameters cannot produce any valid
//! question. Data defects in the curriculum document are never errors; they
//! are reported as [`crate::issue::Issue`] values instead.

use thiserror::Error;

/// Errors in a skill's generator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkillError {
    /// A numeric range whose lower bound exceeds its upper bound.
    #[error("empty range: min {min} is greater than max {max}")]
    EmptyRange { min: i64, max: i64 },

    /// A range that includes negative operands.
    #[error("negative bound {0} is not supported")]
    NegativeBound(i64),

    /// A bound past the largest operand the generators handle.
    #[error("bound {value} is larger than the supported maximum {limit}")]
    BoundTooLarge { value: i64, limit: i64 },

    /// A multiplication or division skill without factors.
    #[error("{0} set is empty")]
    EmptyFactorSet(&'static str),

    /// A division skill listing zero as a divisor.
    #[error("divisor set contains zero")]
    ZeroDivisor,

    /// A remainder skill whose only divisor is 1.
    #[error("remainders need a divisor greater than 1")]
    NoRemainderPossible,

    /// Fraction and ratio skills need room for at least one proper value.
    #[error("max denominator {0} is too small (need at least 2)")]
    DenominatorTooSmall(i64),

    /// Decimal skills support up to three places.
    #[error("{0} decimal places is not supported (1-3)")]
    UnsupportedPlaces(u32),

    /// Grade level outside kindergarten through grade 8.
    #[error("grade level {0} is out of range (0-8)")]
    GradeOutOfRange(u8),

    /// A skill asking for zero questions.
    #[error("question count is zero")]
    ZeroCount,
}

impl SkillError {
    /// Returns `true` if the generator cannot run with this configuration.
    ///
    /// Non-fatal faults are reported as warnings and generation proceeds.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SkillError::GradeOutOfRange(_) | SkillError::ZeroCount)
    }
}
