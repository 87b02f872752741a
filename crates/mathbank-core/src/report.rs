//! Audit report types with JSON persistence and issue comparison.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit::Completeness;
use crate::document::CurriculumDocument;
use crate::issue::{Change, Issue, IssueCategory, Severity};

/// A complete audit report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Command that produced the report (`audit`, `verify`, ...).
    pub tool: String,
    /// Summary of the audited document.
    pub document: DocumentSummary,
    /// Defects found.
    pub issues: Vec<Issue>,
    /// Mutations applied by a fix pass.
    #[serde(default)]
    pub changes: Vec<Change>,
    #[serde(default)]
    pub completeness: Option<Completeness>,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Summary of a curriculum document (without its questions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub path: String,
    pub set_count: usize,
    pub question_count: usize,
}

impl DocumentSummary {
    pub fn of(path: &Path, document: &CurriculumDocument) -> Self {
        Self {
            path: path.display().to_string(),
            set_count: document.sets.len(),
            question_count: document.question_count(),
        }
    }
}

impl AuditReport {
    pub fn new(tool: impl Into<String>, document: DocumentSummary) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            tool: tool.into(),
            document,
            issues: Vec::new(),
            changes: Vec::new(),
            completeness: None,
            duration_ms: 0,
        }
    }

    pub fn with_issues(mut self, issues: Vec<Issue>) -> Self {
        self.issues = issues;
        self
    }

    pub fn with_changes(mut self, changes: Vec<Change>) -> Self {
        self.changes = changes;
        self
    }

    pub fn with_completeness(mut self, completeness: Completeness) -> Self {
        self.completeness = Some(completeness);
        self
    }

    /// Issues per severity, every severity present.
    pub fn severity_counts(&self) -> BTreeMap<Severity, usize> {
        let mut counts: BTreeMap<Severity, usize> = Severity::ALL.iter().map(|s| (*s, 0)).collect();
        for issue in &self.issues {
            *counts.entry(issue.severity).or_default() += 1;
        }
        counts
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    /// Issues per category, only categories that occur, in declaration order.
    pub fn category_counts(&self) -> Vec<(IssueCategory, usize)> {
        IssueCategory::ALL
            .iter()
            .map(|c| (*c, self.issues.iter().filter(|i| i.category == *c).count()))
            .filter(|(_, n)| *n > 0)
            .collect()
    }

    /// Issues sorted most severe first, then by location.
    pub fn sorted_issues(&self) -> Vec<&Issue> {
        let mut issues: Vec<&Issue> = self.issues.iter().collect();
        issues.sort_by(|a, b| {
            a.severity
                .cmp(&b.severity)
                .then_with(|| a.set_id.cmp(&b.set_id))
                .then_with(|| a.question_index.cmp(&b.question_index))
        });
        issues
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: AuditReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Compare this report against a baseline to find new and resolved issues.
    ///
    /// Issues are matched on set id, question index and category; messages
    /// may change between runs without counting as new.
    pub fn compare(&self, baseline: &AuditReport) -> IssueDiff {
        type Key = (String, Option<usize>, IssueCategory);
        let key = |i: &Issue| -> Key { (i.set_id.clone(), i.question_index, i.category) };

        let count_keys = |report: &AuditReport| -> HashMap<Key, usize> {
            let mut map = HashMap::new();
            for issue in &report.issues {
                *map.entry(key(issue)).or_insert(0) += 1;
            }
            map
        };

        let mut baseline_left = count_keys(baseline);
        let mut new_issues = Vec::new();
        let mut unchanged = 0usize;
        for issue in &self.issues {
            match baseline_left.get_mut(&key(issue)) {
                Some(n) if *n > 0 => {
                    *n -= 1;
                    unchanged += 1;
                }
                _ => new_issues.push(issue.clone()),
            }
        }

        let mut current_left = count_keys(self);
        let mut resolved_issues = Vec::new();
        for issue in &baseline.issues {
            match current_left.get_mut(&key(issue)) {
                Some(n) if *n > 0 => *n -= 1,
                _ => resolved_issues.push(issue.clone()),
            }
        }

        IssueDiff {
            new_issues,
            resolved_issues,
            unchanged,
        }
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str("# mathbank audit report\n\n");
        md.push_str(&format!(
            "**Document:** `{}` ({} sets, {} questions)  \n",
            self.document.path, self.document.set_count, self.document.question_count
        ));
        md.push_str(&format!(
            "**Generated:** {} by `{}`\n\n",
            self.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.tool
        ));

        md.push_str("| Severity | Issues |\n");
        md.push_str("|----------|--------|\n");
        for (severity, count) in self.severity_counts() {
            md.push_str(&format!("| {severity} | {count} |\n"));
        }
        md.push('\n');

        if let Some(c) = &self.completeness {
            md.push_str("## Completeness\n\n");
            md.push_str(&format!(
                "- Explanations: {}/{} ({:.1}%)\n- Hints: {}/{} ({:.1}%)\n- Images: {}/{} ({:.1}%)\n\n",
                c.with_explanation,
                c.questions,
                c.explanation_ratio() * 100.0,
                c.with_hints,
                c.questions,
                c.hints_ratio() * 100.0,
                c.with_image,
                c.questions,
                c.image_ratio() * 100.0
            ));
        }

        if !self.issues.is_empty() {
            md.push_str("## Issues\n\n");
            md.push_str("| Severity | Location | Category | Message |\n");
            md.push_str("|----------|----------|----------|---------|\n");
            for issue in self.sorted_issues() {
                md.push_str(&format!(
                    "| {} | `{}` | {} | {} |\n",
                    issue.severity,
                    issue.location(),
                    issue.category,
                    escape_cell(&issue.message)
                ));
            }
            md.push('\n');
        }

        if !self.changes.is_empty() {
            md.push_str("## Changes\n\n");
            md.push_str("| Location | Field | Before | After | Reason |\n");
            md.push_str("|----------|-------|--------|-------|--------|\n");
            for c in &self.changes {
                md.push_str(&format!(
                    "| `{}` | {} | {} | {} | {} |\n",
                    c.location(),
                    c.field,
                    escape_cell(&c.before),
                    escape_cell(&c.after),
                    escape_cell(&c.reason)
                ));
            }
        }

        md
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Result of comparing two reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueDiff {
    /// Issues in the current report but not the baseline.
    pub new_issues: Vec<Issue>,
    /// Issues in the baseline that no longer occur.
    pub resolved_issues: Vec<Issue>,
    /// Issues present in both.
    pub unchanged: usize,
}

impl IssueDiff {
    /// Format the comparison as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** {} new, {} resolved, {} unchanged\n\n",
            self.new_issues.len(),
            self.resolved_issues.len(),
            self.unchanged
        ));

        for (title, issues) in [
            ("New issues", &self.new_issues),
            ("Resolved issues", &self.resolved_issues),
        ] {
            if issues.is_empty() {
                continue;
            }
            md.push_str(&format!("### {title}\n\n"));
            md.push_str("| Severity | Location | Category | Message |\n");
            md.push_str("|----------|----------|----------|---------|\n");
            for i in issues {
                md.push_str(&format!(
                    "| {} | `{}` | {} | {} |\n",
                    i.severity,
                    i.location(),
                    i.category,
                    escape_cell(&i.message)
                ));
            }
            md.push('\n');
        }

        md
    }

    /// Returns true if the current report has issues the baseline didn't.
    pub fn has_new_issues(&self) -> bool {
        !self.new_issues.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> DocumentSummary {
        DocumentSummary {
            path: "curriculum.json".into(),
            set_count: 2,
            question_count: 20,
        }
    }

    fn make_report(issues: Vec<Issue>) -> AuditReport {
        let mut report = AuditReport::new("audit", summary()).with_issues(issues);
        report.id = Uuid::nil();
        report
    }

    fn mismatch(set: &str, index: usize) -> Issue {
        Issue::new(set, Some(index), IssueCategory::AnswerMismatch, "wrong")
            .with_values("68", "67")
    }

    #[test]
    fn compare_identical_reports() {
        let baseline = make_report(vec![mismatch("a", 0)]);
        let current = make_report(vec![mismatch("a", 0)]);

        let diff = current.compare(&baseline);
        assert!(diff.new_issues.is_empty());
        assert!(diff.resolved_issues.is_empty());
        assert_eq!(diff.unchanged, 1);
        assert!(!diff.has_new_issues());
    }

    #[test]
    fn compare_with_new_and_resolved() {
        let baseline = make_report(vec![mismatch("old", 1)]);
        let current = make_report(vec![mismatch("new", 2)]);

        let diff = current.compare(&baseline);
        assert_eq!(diff.new_issues.len(), 1);
        assert_eq!(diff.new_issues[0].set_id, "new");
        assert_eq!(diff.resolved_issues.len(), 1);
        assert_eq!(diff.resolved_issues[0].set_id, "old");
    }

    #[test]
    fn compare_ignores_message_changes_but_counts_repeats() {
        let mut reworded = mismatch("a", 0);
        reworded.message = "different wording".into();
        let baseline = make_report(vec![mismatch("a", 0)]);
        let current = make_report(vec![reworded, mismatch("a", 0)]);

        let diff = current.compare(&baseline);
        assert_eq!(diff.unchanged, 1);
        assert_eq!(diff.new_issues.len(), 1);
    }

    #[test]
    fn severity_counts_cover_every_level() {
        let report = make_report(vec![
            mismatch("a", 0),
            Issue::new("a", Some(1), IssueCategory::MissingHints, "no hints"),
        ]);
        let counts = report.severity_counts();
        assert_eq!(counts.len(), 4);
        assert_eq!(counts[&Severity::High], 1);
        assert_eq!(counts[&Severity::Low], 1);
        assert_eq!(counts[&Severity::Critical], 0);
        assert_eq!(report.category_counts().len(), 2);
    }

    #[test]
    fn json_roundtrip() {
        let report = make_report(vec![mismatch("a", 0)]).with_completeness(Completeness {
            questions: 20,
            with_explanation: 10,
            with_hints: 5,
            with_image: 0,
        });
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("audit.json");

        report.save_json(&path).unwrap();
        let loaded = AuditReport::load_json(&path).unwrap();

        assert_eq!(loaded.document, summary());
        assert_eq!(loaded.issues, report.issues);
        assert_eq!(loaded.completeness.unwrap().with_hints, 5);
    }

    #[test]
    fn markdown_output() {
        let report = make_report(vec![mismatch("add-2", 3)]).with_changes(vec![Change {
            set_id: "add-2".into(),
            question_index: Some(3),
            field: "answer".into(),
            before: "67".into(),
            after: "68".into(),
            reason: "recomputed answer".into(),
        }]);
        let md = report.to_markdown();
        assert!(md.contains("## Issues"));
        assert!(md.contains("`add-2#3`"));
        assert!(md.contains("answer-mismatch"));
        assert!(md.contains("## Changes"));

        let diff = report.compare(&make_report(vec![]));
        let md = diff.to_markdown();
        assert!(md.contains("New issues"));
        assert!(md.contains("add-2"));
    }
}
