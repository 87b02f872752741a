//! The curriculum document: a JSON array of question sets.
//!
//! Commands read the whole document, transform it in memory and write it
//! back in one piece.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::QuestionSet;

/// An ordered collection of question sets, persisted as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurriculumDocument {
    pub sets: Vec<QuestionSet>,
}

impl CurriculumDocument {
    pub fn new(sets: Vec<QuestionSet>) -> Self {
        Self { sets }
    }

    /// Load a document from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read document from {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("failed to parse document {}", path.display()))
    }

    /// Load a document, or start an empty one if the file doesn't exist yet.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!(path = %path.display(), "document not found, starting empty");
            Ok(Self::default())
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("document must be a JSON array of question sets")
    }

    pub fn to_json_string(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self).context("failed to serialize document")?;
        json.push('\n');
        Ok(json)
    }

    /// Write the document as pretty-printed JSON, replacing the file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json_string()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write document to {}", path.display()))?;
        tracing::debug!(path = %path.display(), sets = self.sets.len(), "saved document");
        Ok(())
    }

    pub fn question_count(&self) -> usize {
        self.sets.iter().map(|s| s.questions.len()).sum()
    }

    /// Ids used by more than one set, in order of first appearance.
    pub fn duplicate_ids(&self) -> Vec<String> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for set in &self.sets {
            *counts.entry(set.id.as_str()).or_default() += 1;
        }
        let mut reported = HashSet::new();
        self.sets
            .iter()
            .map(|s| s.id.as_str())
            .filter(|id| counts[id] > 1 && reported.insert(*id))
            .map(str::to_string)
            .collect()
    }

    /// `base`, or `base-2`, `base-3`, ... whichever is not taken yet.
    pub fn unique_id(&self, base: &str) -> String {
        let taken: HashSet<&str> = self.sets.iter().map(|s| s.id.as_str()).collect();
        if !taken.contains(base) {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{base}-{n}"))
            .find(|candidate| !taken.contains(candidate.as_str()))
            .unwrap_or_else(|| base.to_string())
    }

    /// Append a set, renaming it if its id collides. Returns the final id.
    pub fn append(&mut self, mut set: QuestionSet) -> String {
        let id = self.unique_id(&set.id);
        if id != set.id {
            tracing::info!(requested = %set.id, assigned = %id, "set id already taken");
            set.id = id.clone();
        }
        self.sets.push(set);
        id
    }

    /// Set and question counts per grade and per topic.
    pub fn stats(&self) -> DocumentStats {
        let mut stats = DocumentStats {
            sets: self.sets.len(),
            questions: self.question_count(),
            ..Default::default()
        };
        for set in &self.sets {
            let n = set.questions.len();
            match set.grade_level.level() {
                Some(grade) => stats.by_grade.entry(grade).or_default().add(n),
                None => stats.invalid_grade.add(n),
            }
            stats
                .by_topic
                .entry(set.topic.trim().to_string())
                .or_default()
                .add(n);
        }
        stats
    }
}

/// Summary counts for a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentStats {
    pub sets: usize,
    pub questions: usize,
    pub by_grade: BTreeMap<i64, GroupStats>,
    /// Sets whose grade is not a whole number.
    pub invalid_grade: GroupStats,
    pub by_topic: BTreeMap<String, GroupStats>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupStats {
    pub sets: usize,
    pub questions: usize,
}

impl GroupStats {
    fn add(&mut self, questions: usize) {
        self.sets += 1;
        self.questions += questions;
    }
}

/// Lowercase ASCII alphanumerics joined by single hyphens.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Derive a set id from its grade, topic and title, e.g.
/// `3-multiplication-multiply-by-6`. Kindergarten is `k`.
pub fn skill_id(grade_level: u8, topic: &str, title: &str) -> String {
    let grade = if grade_level == 0 {
        "k".to_string()
    } else {
        grade_level.to_string()
    };
    [grade, slugify(topic), slugify(title)]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
