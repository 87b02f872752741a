//! TOML skill file parser.
//!
//! A skill file describes which question sets to generate: a `[skill_set]`
//! header and one `[[skills]]` entry per question set, each with a
//! `[skills.family]` table selecting the generator.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::SkillError;
use crate::model::MAX_GRADE;

/// Largest bound a skill may set on an operand, factor or denominator.
pub const MAX_BOUND: i64 = 1_000_000;

/// A parsed skill file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillFile {
    pub skill_set: SkillSetHeader,
    #[serde(default)]
    pub skills: Vec<SkillConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillSetHeader {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Seed shared by every skill in the file unless a skill overrides it.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Question count for skills that don't specify one.
    #[serde(default)]
    pub default_count: Option<usize>,
}

/// One question set to generate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillConfig {
    /// Explicit id; derived from grade, topic and title when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub grade_level: u8,
    pub topic: String,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub seed: Option<u64>,
    pub family: Family,
}

/// Operation family and its numeric constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Family {
    Addition {
        min: i64,
        max: i64,
        /// Force a carry out of the ones column.
        #[serde(default)]
        regrouping: bool,
    },
    Subtraction {
        min: i64,
        max: i64,
        /// Force a borrow from the tens column.
        #[serde(default)]
        regrouping: bool,
    },
    Multiplication {
        factors: Vec<i64>,
        #[serde(default = "default_min")]
        min: i64,
        #[serde(default = "default_max_factor")]
        max: i64,
    },
    Division {
        divisors: Vec<i64>,
        #[serde(default = "default_min")]
        min_quotient: i64,
        #[serde(default = "default_max_factor")]
        max_quotient: i64,
        /// Ask for quotient and remainder instead of an exact quotient.
        #[serde(default)]
        remainder: bool,
    },
    Fraction {
        op: FractionOp,
        #[serde(default = "default_max_denominator")]
        max_denominator: i64,
    },
    Decimal {
        op: DecimalOp,
        #[serde(default = "default_places")]
        places: u32,
        /// Largest whole-number part of an operand.
        #[serde(default = "default_max_whole")]
        max: i64,
    },
    Ratio {
        #[serde(default = "default_max_term")]
        max_term: i64,
    },
    AnglePair {
        pair: AnglePairKind,
    },
    Quadrant {
        #[serde(default = "default_max_coordinate")]
        max_coordinate: i64,
    },
    ShapeSides,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FractionOp {
    /// `a/d + b/d`, answer left unreduced.
    AddLike,
    /// `a/d - b/d`, answer left unreduced.
    SubtractLike,
    /// Reduce to lowest terms.
    Simplify,
    /// Pick an equivalent fraction.
    Equivalent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecimalOp {
    Add,
    Subtract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnglePairKind {
    Complementary,
    Supplementary,
}

impl AnglePairKind {
    pub fn total(self) -> i64 {
        match self {
            AnglePairKind::Complementary => 90,
            AnglePairKind::Supplementary => 180,
        }
    }

    pub fn noun(self) -> &'static str {
        match self {
            AnglePairKind::Complementary => "complement",
            AnglePairKind::Supplementary => "supplement",
        }
    }
}

fn default_min() -> i64 {
    1
}
fn default_max_factor() -> i64 {
    10
}
fn default_max_denominator() -> i64 {
    12
}
fn default_places() -> u32 {
    1
}
fn default_max_whole() -> i64 {
    20
}
fn default_max_term() -> i64 {
    10
}
fn default_max_coordinate() -> i64 {
    10
}

impl Family {
    /// Check that the constraints admit at least one question.
    pub fn validate(&self) -> Result<(), SkillError> {
        match self {
            Family::Addition { min, max, .. } | Family::Subtraction { min, max, .. } => {
                check_range(*min, *max)
            }
            Family::Multiplication { factors, min, max } => {
                if factors.is_empty() {
                    return Err(SkillError::EmptyFactorSet("factor"));
                }
                if let Some(&f) = factors.iter().find(|&&f| f < 0) {
                    return Err(SkillError::NegativeBound(f));
                }
                factors.iter().try_for_each(|&f| check_bound(f))?;
                check_range(*min, *max)
            }
            Family::Division {
                divisors,
                min_quotient,
                max_quotient,
                remainder,
            } => {
                if divisors.is_empty() {
                    return Err(SkillError::EmptyFactorSet("divisor"));
                }
                if divisors.contains(&0) {
                    return Err(SkillError::ZeroDivisor);
                }
                if let Some(&d) = divisors.iter().find(|&&d| d < 0) {
                    return Err(SkillError::NegativeBound(d));
                }
                divisors.iter().try_for_each(|&d| check_bound(d))?;
                if *remainder && divisors.iter().all(|&d| d < 2) {
                    return Err(SkillError::NoRemainderPossible);
                }
                check_range(*min_quotient, *max_quotient)
            }
            Family::Fraction {
                max_denominator, ..
            } => {
                if *max_denominator < 2 {
                    return Err(SkillError::DenominatorTooSmall(*max_denominator));
                }
                check_bound(*max_denominator)
            }
            Family::Decimal { places, max, .. } => {
                if !(1..=3).contains(places) {
                    return Err(SkillError::UnsupportedPlaces(*places));
                }
                check_range(0, *max)
            }
            Family::Ratio { max_term } => {
                if *max_term < 2 {
                    return Err(SkillError::DenominatorTooSmall(*max_term));
                }
                check_bound(*max_term)
            }
            Family::Quadrant { max_coordinate } => check_range(1, *max_coordinate),
            Family::AnglePair { .. } | Family::ShapeSides => Ok(()),
        }
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Family::Addition { .. } => "addition",
            Family::Subtraction { .. } => "subtraction",
            Family::Multiplication { .. } => "multiplication",
            Family::Division { .. } => "division",
            Family::Fraction { .. } => "fraction",
            Family::Decimal { .. } => "decimal",
            Family::Ratio { .. } => "ratio",
            Family::AnglePair { .. } => "angle_pair",
            Family::Quadrant { .. } => "quadrant",
            Family::ShapeSides => "shape_sides",
        }
    }
}

fn check_range(min: i64, max: i64) -> Result<(), SkillError> {
    if min < 0 {
        return Err(SkillError::NegativeBound(min));
    }
    if min > max {
        return Err(SkillError::EmptyRange { min, max });
    }
    check_bound(max)
}

fn check_bound(value: i64) -> Result<(), SkillError> {
    if value > MAX_BOUND {
        return Err(SkillError::BoundTooLarge {
            value,
            limit: MAX_BOUND,
        });
    }
    Ok(())
}

impl SkillConfig {
    /// All configuration faults, fatal or not.
    pub fn check(&self) -> Vec<SkillError> {
        let mut faults = Vec::new();
        if self.grade_level > MAX_GRADE {
            faults.push(SkillError::GradeOutOfRange(self.grade_level));
        }
        if self.count == Some(0) {
            faults.push(SkillError::ZeroCount);
        }
        if let Err(e) = self.family.validate() {
            faults.push(e);
        }
        faults
    }
}

/// Parse a single skill file.
pub fn parse_skill_file(path: &Path) -> Result<SkillFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read skill file: {}", path.display()))?;

    parse_skill_file_str(&content, path)
}

/// Parse a TOML string into a `SkillFile` (useful for testing).
pub fn parse_skill_file_str(content: &str, source_path: &Path) -> Result<SkillFile> {
    toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))
}

/// Recursively load all `.toml` skill files from a directory.
pub fn load_skill_directory(dir: &Path) -> Result<Vec<SkillFile>> {
    let mut files = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            files.extend(load_skill_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_skill_file(&path) {
                Ok(file) => files.push(file),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(files)
}

/// Load a skill file, or every skill file under a directory.
pub fn load_skills(path: &Path) -> Result<Vec<SkillFile>> {
    if path.is_dir() {
        load_skill_directory(path)
    } else {
        Ok(vec![parse_skill_file(path)?])
    }
}

/// A problem found while validating a skill file.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The skill title (if applicable).
    pub skill: Option<String>,
    pub message: String,
    /// Whether generation for this skill would fail outright.
    pub fatal: bool,
}

/// Validate a skill file for common issues.
pub fn validate_skill_file(file: &SkillFile) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen_ids = std::collections::HashSet::new();
    for skill in &file.skills {
        if let Some(id) = &skill.id {
            if !seen_ids.insert(id) {
                warnings.push(ValidationWarning {
                    skill: Some(skill.title.clone()),
                    message: format!("duplicate skill id: {id}"),
                    fatal: false,
                });
            }
        }
    }

    for skill in &file.skills {
        if skill.title.trim().is_empty() {
            warnings.push(ValidationWarning {
                skill: None,
                message: "skill title is empty".into(),
                fatal: false,
            });
        }
        for fault in skill.check() {
            warnings.push(ValidationWarning {
                skill: Some(skill.title.clone()),
                message: fault.to_string(),
                fatal: fault.is_fatal(),
            });
        }
    }

    if file.skills.is_empty() {
        warnings.push(ValidationWarning {
            skill: None,
            message: "skill file defines no skills".into(),
            fatal: false,
        });
    }

    warnings
}
