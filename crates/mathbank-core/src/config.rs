//! Tool configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::generator::{DEFAULT_MAX_ATTEMPTS, DEFAULT_OPTION_COUNT};
use crate::verify::DEFAULT_TOLERANCE;

/// Top-level mathbank configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MathbankConfig {
    /// Curriculum document the commands read and rewrite.
    #[serde(default = "default_document")]
    pub document: PathBuf,
    /// Questions per skill when neither the skill nor its file says otherwise.
    #[serde(default = "default_count")]
    pub default_count: usize,
    /// Draws per question before the item is skipped.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Absolute tolerance for answer verification.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Options per multiple-choice question.
    #[serde(default = "default_option_count")]
    pub option_count: usize,
    /// Seed used when neither the command line nor the skill file sets one.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Where audit reports are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_document() -> PathBuf {
    PathBuf::from("curriculum.json")
}
fn default_count() -> usize {
    10
}
fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}
fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}
fn default_option_count() -> usize {
    DEFAULT_OPTION_COUNT
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./mathbank-reports")
}

impl Default for MathbankConfig {
    fn default() -> Self {
        Self {
            document: default_document(),
            default_count: default_count(),
            max_attempts: default_max_attempts(),
            tolerance: default_tolerance(),
            option_count: default_option_count(),
            seed: None,
            output_dir: default_output_dir(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `mathbank.toml` in the current directory
/// 2. `~/.config/mathbank/config.toml`
///
/// Environment variable overrides: `MATHBANK_DOCUMENT`, `MATHBANK_SEED`.
pub fn load_config() -> Result<MathbankConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<MathbankConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("mathbank.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            parse_config(&path)?
        }
        None => MathbankConfig::default(),
    };

    if let Ok(document) = std::env::var("MATHBANK_DOCUMENT") {
        config.document = PathBuf::from(document);
    }
    if let Ok(seed) = std::env::var("MATHBANK_SEED") {
        let seed = seed
            .trim()
            .parse()
            .with_context(|| format!("MATHBANK_SEED is not a number: {seed}"))?;
        config.seed = Some(seed);
    }

    config.document = resolve_path(&config.document);
    config.output_dir = resolve_path(&config.output_dir);
    Ok(config)
}

/// Parse a config file without consulting the environment.
pub fn parse_config(path: &Path) -> Result<MathbankConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str::<MathbankConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("mathbank"))
}
