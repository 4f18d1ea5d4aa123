//! Conversation builders for the two completion calls.
//!
//! The review context is the full picture (stats, statuses, summary, inlined
//! patches); the docs context is condensed to summary lines and file names.

use ai_llm_service::Conversation;

use crate::git_providers::PullRequest;
use crate::summary::AnalysisReport;

/// Renders the user turn of the code-review call.
pub fn render_review_context(pr: &PullRequest, report: &AnalysisReport) -> String {
    let mut s = String::new();
    s.push_str(&format!("\nPull Request Title: {}\n", pr.title));
    s.push_str(&format!(
        "Description: {}\n",
        pr.body.as_deref().unwrap_or_default()
    ));

    s.push_str("\nChanges Overview:\n");
    s.push_str(&format!("- Files changed: {}\n", report.files_changed));
    s.push_str(&format!("- Lines added: {}\n", report.additions));
    s.push_str(&format!("- Lines deleted: {}\n", report.deletions));

    s.push_str("\nModified Files:\n");
    let statuses = report
        .files
        .iter()
        .map(|f| format!("- {}: {}", f.filename, f.status))
        .collect::<Vec<_>>()
        .join("\n");
    s.push_str(&statuses);
    s.push('\n');

    s.push_str("\nKey Changes:\n");
    s.push_str(&report.summary.join("\n"));
    s.push('\n');

    s.push_str("\nDetailed Changes:\n");
    for f in &report.files {
        if let Some(patch) = f.patch.as_deref().filter(|p| !p.is_empty()) {
            s.push_str(&format!("\n{} changes:\n{}\n", f.filename, patch));
        }
    }
    s
}

/// Renders the user turn of the documentation call.
pub fn render_docs_context(pr: &PullRequest, report: &AnalysisReport) -> String {
    let mut s = String::new();
    s.push_str(&format!("\nPull Request: {}\n", pr.title));
    s.push_str("Changes:\n");
    s.push_str(&report.summary.join("\n"));
    s.push_str("\n\nFiles changed:\n");
    let names = report
        .files
        .iter()
        .map(|f| format!("- {}", f.filename))
        .collect::<Vec<_>>()
        .join("\n");
    s.push_str(&names);
    s.push('\n');
    s
}

pub fn build_review_conversation(
    system_prompt: &str,
    pr: &PullRequest,
    report: &AnalysisReport,
) -> Conversation {
    Conversation::new()
        .system(system_prompt)
        .user(render_review_context(pr, report))
}

pub fn build_docs_conversation(
    system_prompt: &str,
    pr: &PullRequest,
    report: &AnalysisReport,
) -> Conversation {
    Conversation::new()
        .system(system_prompt)
        .user(render_docs_context(pr, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git_providers::{ChangeRecord, FileStatus, PullRequestId};
    use crate::summary::summarize;
    use ai_llm_service::Role;

    fn pr() -> PullRequest {
        PullRequest {
            id: PullRequestId::parse("o/r", 3).unwrap(),
            title: "Cache widgets".into(),
            body: Some("Adds an LRU.".into()),
            head_sha: "a".repeat(40),
            html_url: String::new(),
        }
    }

    fn report() -> AnalysisReport {
        summarize(vec![
            ChangeRecord {
                filename: "src/cache.rs".into(),
                status: FileStatus::Added,
                additions: 12,
                deletions: 0,
                changes: 12,
                patch: Some("@@ -0,0 +1 @@\n+pub struct Lru;".into()),
            },
            ChangeRecord {
                filename: "logo.png".into(),
                status: FileStatus::Modified,
                additions: 0,
                deletions: 0,
                changes: 0,
                patch: None,
            },
        ])
    }

    #[test]
    fn review_context_layout() {
        let ctx = render_review_context(&pr(), &report());
        let expected = "
Pull Request Title: Cache widgets
Description: Adds an LRU.

Changes Overview:
- Files changed: 2
- Lines added: 12
- Lines deleted: 0

Modified Files:
- src/cache.rs: added
- logo.png: modified

Key Changes:
New file: src/cache.rs

Detailed Changes:

src/cache.rs changes:
@@ -0,0 +1 @@
+pub struct Lru;
";
        assert_eq!(ctx, expected);
    }

    #[test]
    fn docs_context_layout() {
        let ctx = render_docs_context(&pr(), &report());
        assert_eq!(
            ctx,
            "\nPull Request: Cache widgets\nChanges:\nNew file: src/cache.rs\n\nFiles changed:\n- src/cache.rs\n- logo.png\n"
        );
    }

    #[test]
    fn conversations_are_system_then_user() {
        let conv = build_review_conversation("be strict", &pr(), &report());
        assert_eq!(conv.len(), 2);
        assert_eq!(conv.turns()[0].role, Role::System);
        assert_eq!(conv.turns()[0].content, "be strict");
        assert_eq!(conv.turns()[1].role, Role::User);

        let docs = build_docs_conversation("docs please", &pr(), &report());
        assert!(docs.turns()[1].content.contains("Files changed:"));
    }
}
