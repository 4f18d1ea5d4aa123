//! GitHub provider (REST v3) for PR metadata, files, contents and comments.
//!
//! Endpoints used:
//! - GET  /repos/:owner/:repo/pulls/:n
//! - GET  /repos/:owner/:repo/pulls/:n/files             (paginated; "patch" is unified diff)
//! - GET  /repos/:owner/:repo/contents/:path?ref=:sha    (raw media type)
//! - GET  /repos/:owner/:repo/issues/:n/comments         (paginated, oldest first)
//! - POST /repos/:owner/:repo/issues/:n/comments

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::{GitHubSettings, check_base_url};
use crate::errors::{ConfigError, MrResult, ProviderError};
use crate::git_providers::types::*;

const PER_PAGE: usize = 100;
const ACCEPT_JSON: &str = "application/vnd.github+json";
const ACCEPT_RAW: &str = "application/vnd.github.raw";
const API_VERSION: &str = "2022-11-28";

#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    base_api: String, // "https://api.github.com"
}

impl GitHubClient {
    /// Builds a client with auth, media type and API version preset.
    ///
    /// # Errors
    /// [`ConfigError`] for an unusable token or base URL; transport errors if
    /// the HTTP client cannot be built.
    pub fn new(cfg: &GitHubSettings) -> MrResult<Self> {
        let base_api = cfg.api_url.trim_end_matches('/').to_string();
        check_base_url(&base_api)?;

        let mut h = HeaderMap::new();
        h.insert(ACCEPT, HeaderValue::from_static(ACCEPT_JSON));
        h.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", cfg.token))
            .map_err(|_| ConfigError::InvalidToken)?;
        auth.set_sensitive(true);
        h.insert(AUTHORIZATION, auth);

        let http = Client::builder()
            .user_agent(concat!("pr-diff-bot/", env!("CARGO_PKG_VERSION")))
            .default_headers(h)
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;

        Ok(Self { http, base_api })
    }

    fn repo_url(&self, id: &PullRequestId) -> String {
        format!(
            "{}/repos/{}/{}",
            self.base_api,
            urlencoding::encode(&id.owner),
            urlencoding::encode(&id.repo)
        )
    }

    /// Fetches PR metadata, including the head SHA.
    pub async fn get_pull_request(&self, id: &PullRequestId) -> MrResult<PullRequest> {
        let url = format!("{}/pulls/{}", self.repo_url(id), id.number);
        debug!("GET {url}");
        let resp: GitHubPull = checked(self.http.get(&url).send().await?)
            .await?
            .json()
            .await?;

        Ok(PullRequest {
            id: id.clone(),
            title: resp.title,
            body: resp.body,
            head_sha: resp.head.sha,
            html_url: resp.html_url,
        })
    }

    /// Lists every changed file, following pagination.
    pub async fn list_files(&self, id: &PullRequestId) -> MrResult<Vec<ChangeRecord>> {
        let url = format!("{}/pulls/{}/files", self.repo_url(id), id.number);
        self.get_all_pages(&url).await
    }

    /// Lists every issue comment, oldest first.
    pub async fn list_issue_comments(&self, id: &PullRequestId) -> MrResult<Vec<IssueComment>> {
        let url = format!("{}/issues/{}/comments", self.repo_url(id), id.number);
        self.get_all_pages(&url).await
    }

    /// Fetches a file's text at a git ref. Non-UTF-8 bytes are replaced.
    pub async fn get_file_content(
        &self,
        id: &PullRequestId,
        path: &str,
        git_ref: &str,
    ) -> MrResult<String> {
        let encoded_path = path
            .split('/')
            .map(|seg| urlencoding::encode(seg).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        let url = format!("{}/contents/{}", self.repo_url(id), encoded_path);
        debug!("GET {url} ref={git_ref}");

        let bytes = checked(
            self.http
                .get(&url)
                .query(&[("ref", git_ref)])
                .header(ACCEPT, ACCEPT_RAW)
                .send()
                .await?,
        )
        .await?
        .bytes()
        .await?;

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Posts a new conversation comment.
    pub async fn create_issue_comment(
        &self,
        id: &PullRequestId,
        body: &str,
    ) -> MrResult<PostedComment> {
        let url = format!("{}/issues/{}/comments", self.repo_url(id), id.number);

        #[derive(serde::Serialize)]
        struct Req<'a> {
            body: &'a str,
        }

        debug!("POST {url} bytes={}", body.len());
        let posted: PostedComment = checked(self.http.post(&url).json(&Req { body }).send().await?)
            .await?
            .json()
            .await?;
        Ok(posted)
    }

    /// Reads `?per_page=100&page=k` until a short page.
    async fn get_all_pages<T: DeserializeOwned>(&self, url: &str) -> MrResult<Vec<T>> {
        let mut out = Vec::new();
        let per_page = PER_PAGE.to_string();
        for page in 1usize.. {
            let page_s = page.to_string();
            debug!("GET {url} page={page}");
            let items: Vec<T> = checked(
                self.http
                    .get(url)
                    .query(&[("per_page", per_page.as_str()), ("page", page_s.as_str())])
                    .send()
                    .await?,
            )
            .await?
            .json()
            .await?;

            let n = items.len();
            out.extend(items);
            if n < PER_PAGE {
                break;
            }
        }
        Ok(out)
    }
}

/// Maps a non-success status to [`ProviderError`], keeping `Retry-After`.
async fn checked(resp: Response) -> MrResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let retry_after = resp
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok());
    let body = resp.text().await.unwrap_or_default();
    debug!(%status, body = %body.chars().take(240).collect::<String>(), "github error response");
    Err(ProviderError::from_status(status.as_u16(), retry_after).into())
}

/// --- GitHub response shapes (subset of fields we actually use) ---

#[derive(Debug, Deserialize)]
struct GitHubPull {
    title: String,
    #[serde(default)]
    body: Option<String>,
    html_url: String,
    head: GitHubRef,
}

#[derive(Debug, Deserialize)]
struct GitHubRef {
    sha: String,
}
