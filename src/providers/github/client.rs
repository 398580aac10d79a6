use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::auth::Token;
use crate::dashboard::RateLimitInfo;
use crate::error::{PulseError, Result};
use crate::providers::WorkflowSource;

use super::types::{rate_limit_from_headers, GitHubRepository, GitHubWorkflowRun, Page};

pub(super) const DEFAULT_REPOS_PER_PAGE: usize = 100;
pub(super) const DEFAULT_MAX_REPO_PAGES: usize = 10;

/// GitHub REST API client for repository and workflow-run listings.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    api_url: Url,
    repos_per_page: usize,
    max_repo_pages: usize,
}

impl GitHubClient {
    /// Create a new GitHub API client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - GitHub API base URL (e.g., "https://api.github.com")
    /// * `token` - Optional GitHub personal access token
    /// * `timeout` - Per-request timeout
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the base URL or token is malformed.
    pub fn new(base_url: &str, token: Option<Token>, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("actions-pulse/0.1"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );

        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.as_str()))
                .map_err(|e| PulseError::Config(format!("Invalid token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| PulseError::Config(format!("Failed to create HTTP client: {e}")))?;

        let mut api_url = Url::parse(base_url)
            .map_err(|e| PulseError::Config(format!("Invalid base URL: {e}")))?;
        if api_url.cannot_be_a_base() {
            return Err(PulseError::Config(format!(
                "Invalid base URL: {base_url}"
            )));
        }
        if !api_url.path().ends_with('/') {
            let path = format!("{}/", api_url.path());
            api_url.set_path(&path);
        }

        Ok(Self {
            client,
            api_url,
            repos_per_page: DEFAULT_REPOS_PER_PAGE,
            max_repo_pages: DEFAULT_MAX_REPO_PAGES,
        })
    }

    /// Page size and page cap for organization repository listings.
    pub fn with_repo_pagination(mut self, per_page: usize, max_pages: usize) -> Self {
        self.repos_per_page = per_page.clamp(1, 100);
        self.max_repo_pages = max_pages.max(1);
        self
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|()| PulseError::Config(format!("Invalid base URL: {}", self.api_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Issue a GET and decode the body, returning the reported rate limit.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<(T, Option<RateLimitInfo>)> {
        debug!("GET {url}");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let rate_limit = rate_limit_from_headers(response.headers());

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            let message = error_message(&body);
            return Err(if status == reqwest::StatusCode::UNAUTHORIZED {
                PulseError::Unauthorized {
                    status: status.as_u16(),
                    message,
                }
            } else {
                PulseError::Api {
                    status: status.as_u16(),
                    message,
                }
            });
        }

        let body = response.json().await?;
        Ok((body, rate_limit))
    }
}

#[async_trait]
impl WorkflowSource for GitHubClient {
    async fn list_repositories(&self, organization: &str) -> Result<Page<GitHubRepository>> {
        let mut repositories = Vec::new();
        let mut rate_limit = None;

        for page in 1..=self.max_repo_pages {
            let mut url = self.endpoint(&["orgs", organization, "repos"])?;
            url.query_pairs_mut()
                .append_pair("type", "all")
                .append_pair("per_page", &self.repos_per_page.to_string())
                .append_pair("page", &page.to_string());

            let (batch, page_rate_limit): (Vec<GitHubRepository>, _) = self.get_json(url).await?;
            if page_rate_limit.is_some() {
                rate_limit = page_rate_limit;
            }

            let fetched = batch.len();
            repositories.extend(batch);

            if fetched < self.repos_per_page {
                break;
            }
        }

        Ok(Page::new(repositories, rate_limit))
    }

    async fn list_workflow_runs(
        &self,
        organization: &str,
        repository: &str,
        per_page: usize,
    ) -> Result<Page<GitHubWorkflowRun>> {
        let mut url = self.endpoint(&["repos", organization, repository, "actions", "runs"])?;
        url.query_pairs_mut()
            .append_pair("per_page", &per_page.clamp(1, 100).to_string());

        let (response, rate_limit): (WorkflowRunsResponse, _) = self.get_json(url).await?;

        Ok(Page::new(response.workflow_runs, rate_limit))
    }
}

/// Response from GitHub API for workflow runs.
#[derive(Deserialize)]
struct WorkflowRunsResponse {
    workflow_runs: Vec<GitHubWorkflowRun>,
}

/// GitHub error bodies look like `{"message": "Not Found", ...}`.
#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.trim().to_string())
}
