use ai_llm_service::config::LlmSettings;
use mockito::{Matcher, Mock, Server, ServerGuard};
use pr_reviewer::config::{GitHubSettings, PromptSettings, ReviewSettings};
use pr_reviewer::errors::{Error, ProviderError};
use pr_reviewer::gate::BOT_MARKER;
use pr_reviewer::git_providers::PullRequestId;
use pr_reviewer::{ReviewOutcome, run_review};
use serde_json::json;

const HEAD: &str = "9f2c1e0b7a6d5c4b3a29180f7e6d5c4b3a291807";
const OLD: &str = "0000000000000000000000000000000000000001";

fn settings(server: &ServerGuard, dry_run: bool) -> (ReviewSettings, LlmSettings) {
    let review = ReviewSettings {
        github: GitHubSettings {
            api_url: server.url(),
            ..GitHubSettings::new("ghp_test")
        },
        prompts: PromptSettings {
            review_system: "review-system".into(),
            docs_system: "docs-system".into(),
        },
        dry_run,
    };
    let mut llm = LlmSettings::default();
    llm.openrouter.api_key = Some("sk-or".into());
    llm.openrouter.base_url = server.url();
    (review, llm)
}

fn id() -> PullRequestId {
    PullRequestId::parse("acme/widgets", 12).unwrap()
}

async fn mock_pull(server: &mut ServerGuard) -> Mock {
    server
        .mock("GET", "/repos/acme/widgets/pulls/12")
        .with_status(200)
        .with_body(
            json!({
                "title": "Add widget cache",
                "body": "Speeds up lookups.",
                "html_url": "https://github.com/acme/widgets/pull/12",
                "head": {"sha": HEAD}
            })
            .to_string(),
        )
        .create_async()
        .await
}

async fn mock_comments(server: &mut ServerGuard, bodies: &[String]) -> Mock {
    let items: Vec<_> = bodies
        .iter()
        .enumerate()
        .map(|(i, b)| json!({"id": i + 1, "body": b}))
        .collect();
    server
        .mock("GET", "/repos/acme/widgets/issues/12/comments")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(serde_json::Value::Array(items).to_string())
        .create_async()
        .await
}

async fn mock_files_and_contents(server: &mut ServerGuard) {
    server
        .mock("GET", "/repos/acme/widgets/pulls/12/files")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!([
                {
                    "filename": "src/cache.rs",
                    "status": "added",
                    "additions": 80,
                    "deletions": 0,
                    "changes": 80,
                    "patch": "@@ -0,0 +1,80 @@\n+pub struct Cache;"
                },
                {
                    "filename": "src/old.rs",
                    "status": "removed",
                    "additions": 0,
                    "deletions": 4,
                    "changes": 4
                }
            ])
            .to_string(),
        )
        .create_async()
        .await;
    server
        .mock("GET", "/repos/acme/widgets/contents/src/cache.rs")
        .match_query(Matcher::UrlEncoded("ref".into(), HEAD.into()))
        .with_status(200)
        .with_body("pub struct Cache;\n")
        .create_async()
        .await;
}

async fn mock_llm(server: &mut ServerGuard, model: &str) -> (Mock, Mock) {
    let review = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({"model": model})),
            Matcher::Regex("Detailed Changes".into()),
        ]))
        .with_status(200)
        .with_body(
            json!({
                "model": "anthropic/claude-3.5-sonnet",
                "choices": [{"message": {"content": "The cache lacks eviction."}}]
            })
            .to_string(),
        )
        .create_async()
        .await;
    let docs = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({"model": model})),
            Matcher::Regex("Pull Request: ".into()),
        ]))
        .with_status(200)
        .with_body(
            json!({
                "model": "anthropic/claude-3.5-sonnet",
                "choices": [{"message": {"content": "Document the cache size knob."}}]
            })
            .to_string(),
        )
        .create_async()
        .await;
    (review, docs)
}

fn bot_comment(sha: &str) -> String {
    format!("{BOT_MARKER}\nAnalyzed commit: {sha}\n\n## previous report")
}

#[tokio::test]
async fn publishes_report_for_new_head() {
    let mut server = Server::new_async().await;
    mock_pull(&mut server).await;
    mock_comments(&mut server, &[bot_comment(OLD), "nice".to_string()]).await;
    mock_files_and_contents(&mut server).await;
    let (review, docs) = mock_llm(&mut server, "anthropic/claude-3.5-sonnet:beta").await;
    let post = server
        .mock("POST", "/repos/acme/widgets/issues/12/comments")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("PR-DIFF-BOT-COMMENT".into()),
            Matcher::Regex(format!("Analyzed commit: {HEAD}")),
            Matcher::Regex("The cache lacks eviction.".into()),
            Matcher::Regex("Document the cache size knob.".into()),
            Matcher::Regex("Major changes in src/cache.rs: \\+80/-0 lines".into()),
        ]))
        .with_status(201)
        .with_body(
            json!({"id": 555, "html_url": "https://github.com/acme/widgets/pull/12#issuecomment-555"})
                .to_string(),
        )
        .create_async()
        .await;

    let (review_settings, llm_settings) = settings(&server, false);
    let outcome = run_review(review_settings, &llm_settings, &id(), None)
        .await
        .unwrap();

    review.assert_async().await;
    docs.assert_async().await;
    post.assert_async().await;
    assert_eq!(
        outcome,
        ReviewOutcome::Published {
            head_sha: HEAD.into(),
            comment_id: 555,
            url: "https://github.com/acme/widgets/pull/12#issuecomment-555".into(),
        }
    );
}

#[tokio::test]
async fn skips_when_head_already_analyzed() {
    let mut server = Server::new_async().await;
    mock_pull(&mut server).await;
    mock_comments(&mut server, &[bot_comment(OLD), bot_comment(HEAD)]).await;
    let files = server
        .mock("GET", "/repos/acme/widgets/pulls/12/files")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;
    let chat = server
        .mock("POST", "/chat/completions")
        .expect(0)
        .create_async()
        .await;

    let (review_settings, llm_settings) = settings(&server, false);
    let outcome = run_review(review_settings, &llm_settings, &id(), None)
        .await
        .unwrap();

    files.assert_async().await;
    chat.assert_async().await;
    assert_eq!(outcome, ReviewOutcome::Skipped { head_sha: HEAD.into() });
}

#[tokio::test]
async fn dry_run_returns_report_without_posting() {
    let mut server = Server::new_async().await;
    mock_pull(&mut server).await;
    mock_comments(&mut server, &[]).await;
    mock_files_and_contents(&mut server).await;
    let (review, docs) = mock_llm(&mut server, "openai/gpt-4o").await;
    let post = server
        .mock("POST", "/repos/acme/widgets/issues/12/comments")
        .expect(0)
        .create_async()
        .await;

    let (review_settings, llm_settings) = settings(&server, true);
    let outcome = run_review(review_settings, &llm_settings, &id(), Some("openai/gpt-4o"))
        .await
        .unwrap();

    post.assert_async().await;
    review.assert_async().await;
    docs.assert_async().await;
    match outcome {
        ReviewOutcome::DryRun { head_sha, report } => {
            assert_eq!(head_sha, HEAD);
            assert!(report.starts_with(&format!("{BOT_MARKER}\nAnalyzed commit: {HEAD}\n")));
            assert!(report.contains("Analysis by anthropic/claude-3.5-sonnet:\nThe cache lacks eviction."));
            assert!(report.contains("- Deleted file: src/old.rs"));
        }
        other => panic!("expected dry run, got {other:?}"),
    }
}

#[tokio::test]
async fn unreadable_comment_history_aborts_the_run() {
    let mut server = Server::new_async().await;
    mock_pull(&mut server).await;
    server
        .mock("GET", "/repos/acme/widgets/issues/12/comments")
        .match_query(Matcher::Any)
        .with_status(502)
        .create_async()
        .await;
    let chat = server
        .mock("POST", "/chat/completions")
        .expect(0)
        .create_async()
        .await;

    let (review_settings, llm_settings) = settings(&server, false);
    let err = run_review(review_settings, &llm_settings, &id(), None)
        .await
        .unwrap_err();

    chat.assert_async().await;
    assert!(matches!(err, Error::Provider(ProviderError::Server(502))));
}

#[tokio::test]
async fn missing_llm_credential_fails_before_any_request() {
    let mut server = Server::new_async().await;
    let pull = server
        .mock("GET", "/repos/acme/widgets/pulls/12")
        .expect(0)
        .create_async()
        .await;

    let (review_settings, mut llm_settings) = settings(&server, false);
    llm_settings.openrouter.api_key = None;
    let err = run_review(review_settings, &llm_settings, &id(), None)
        .await
        .unwrap_err();

    pull.assert_async().await;
    assert_eq!(
        err.to_string(),
        "missing required configuration: OPENROUTER_API_KEY"
    );
}
