//! Markdown report posted as the PR comment.
//!
//! The first two lines are what the gate reads back on the next run:
//! the hidden marker and `Analyzed commit: <sha>`.

use crate::gate::{ANALYZED_COMMIT_LABEL, BOT_MARKER};
use crate::review::AiReview;
use crate::summary::AnalysisReport;

pub fn render_report(report: &AnalysisReport, ai: &AiReview, commit_sha: &str) -> String {
    let mut s = String::new();
    s.push_str(&format!("{BOT_MARKER}\n"));
    s.push_str(&format!("{ANALYZED_COMMIT_LABEL}{commit_sha}\n\n"));
    s.push_str("## 🤖 Pull Request Analysis\n\n");

    s.push_str("### 📊 Statistics\n");
    s.push_str(&format!("- Files changed: {}\n", report.files_changed));
    s.push_str(&format!("- Lines added: {}\n", report.additions));
    s.push_str(&format!("- Lines deleted: {}\n\n", report.deletions));

    s.push_str("### 🧠 AI Code Review\n");
    s.push_str(&format!("Analysis by {}:\n", ai.analysis.model));
    s.push_str(&format!("{}\n\n", ai.analysis.content));

    s.push_str("### 📚 Documentation Updates Needed\n");
    s.push_str(&format!("{}\n\n", ai.docs.content));

    if !report.summary.is_empty() {
        s.push_str("### 🔍 Notable Changes\n");
        for line in &report.summary {
            s.push_str(&format!("- {line}\n"));
        }
        s.push('\n');
    }

    s.push_str("### 📝 File Details\n");
    for f in &report.files {
        s.push_str(&format!("- **{}**\n", f.filename));
        s.push_str(&format!("  - Status: {}\n", f.status));
        s.push_str(&format!("  - Changes: +{}/-{}\n", f.additions, f.deletions));
    }
    s
}
