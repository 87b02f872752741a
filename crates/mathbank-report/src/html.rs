//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::Result;
use std::path::Path;

use mathbank_core::audit::Completeness;
use mathbank_core::issue::Severity;
use mathbank_core::report::AuditReport;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate an HTML page from an audit report.
pub fn generate_html(report: &AuditReport) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>mathbank {}: {}</title>\n",
        html_escape(&report.tool),
        html_escape(&report.document.path)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str(&format!("<h1>mathbank {} report</h1>\n", html_escape(&report.tool)));
    html.push_str(&format!(
        "<p class=\"meta\">Document: <strong>{}</strong> | {} sets | {} questions | {}</p>\n",
        html_escape(&report.document.path),
        report.document.set_count,
        report.document.question_count,
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Summary dashboard
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Severity</th><th>Issues</th></tr></thead>\n<tbody>\n");
    for (severity, count) in report.severity_counts() {
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td></tr>\n",
            severity_class(severity),
            severity,
            count
        ));
    }
    html.push_str("</tbody></table>\n");

    let categories = report.category_counts();
    if !categories.is_empty() {
        html.push_str("<table class=\"summary\">\n");
        html.push_str("<thead><tr><th>Category</th><th>Description</th><th>Issues</th></tr></thead>\n<tbody>\n");
        for (category, count) in categories {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                category.code(),
                html_escape(category.description()),
                count
            ));
        }
        html.push_str("</tbody></table>\n");
    }

    if let Some(completeness) = &report.completeness {
        html.push_str(&generate_completeness_chart(completeness));
    }
    html.push_str("</section>\n");

    // Issues
    if !report.issues.is_empty() {
        html.push_str("<section class=\"results\">\n");
        html.push_str("<h2>Issues</h2>\n");
        html.push_str("<table class=\"results-table\" id=\"issues\">\n");
        html.push_str("<thead><tr><th onclick=\"sortTable('issues', 0)\">Severity</th><th onclick=\"sortTable('issues', 1)\">Location</th><th onclick=\"sortTable('issues', 2)\">Category</th><th>Message</th><th>Expected</th><th>Actual</th></tr></thead>\n");
        html.push_str("<tbody>\n");
        for issue in report.sorted_issues() {
            html.push_str(&format!(
                "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                severity_class(issue.severity),
                issue.severity,
                html_escape(&issue.location()),
                issue.category,
                html_escape(&issue.message),
                html_escape(issue.expected.as_deref().unwrap_or("-")),
                html_escape(issue.actual.as_deref().unwrap_or("-")),
            ));
        }
        html.push_str("</tbody></table>\n");
        html.push_str("</section>\n");
    }

    // Changes
    if !report.changes.is_empty() {
        html.push_str("<section class=\"changes\">\n");
        html.push_str("<h2>Changes</h2>\n");
        html.push_str("<table class=\"results-table\" id=\"changes\">\n");
        html.push_str("<thead><tr><th onclick=\"sortTable('changes', 0)\">Location</th><th onclick=\"sortTable('changes', 1)\">Field</th><th>Before</th><th>After</th><th>Reason</th></tr></thead>\n");
        html.push_str("<tbody>\n");
        for change in &report.changes {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                html_escape(&change.location()),
                html_escape(&change.field),
                html_escape(&change.before),
                html_escape(&change.after),
                html_escape(&change.reason),
            ));
        }
        html.push_str("</tbody></table>\n");
        html.push_str("</section>\n");
    }

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &AuditReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

fn severity_class(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical | Severity::High => "fail",
        Severity::Medium => "warn",
        Severity::Low => "note",
    }
}

/// Horizontal bars for the share of questions carrying each teaching field.
fn generate_completeness_chart(c: &Completeness) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 140;

    let rows = [
        ("Explanations", c.explanation_ratio()),
        ("Hints", c.hints_ratio()),
        ("Images", c.image_ratio()),
    ];
    let total_height = rows.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<h3>Completeness ({} questions)</h3>\n<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        c.questions,
        label_width + max_width + 60,
        total_height
    );

    for (i, (label, ratio)) in rows.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let width = (ratio * max_width as f64) as usize;

        let color = if *ratio >= 0.8 {
            "#22c55e"
        } else if *ratio >= 0.5 {
            "#eab308"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            label
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.1}%</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            ratio * 100.0
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --fail: #fde2e2; --warn: #fef9c3; --note: #e0f2fe; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --fail: #7f1d1d; --warn: #713f12; --note: #0c4a6e; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.fail { background: var(--fail); }
.warn { background: var(--warn); }
.note { background: var(--note); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(id, col) {
  const table = document.getElementById(id);
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    return asc ? va.localeCompare(vb) : vb.localeCompare(va);
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;
