use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::dashboard::RateLimitInfo;

/// Repository entry from `GET /orgs/{org}/repos`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubRepository {
    /// Repository name without the owner prefix
    pub name: String,
    /// Last push to any branch
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,
    /// Last change to the repository object itself
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl GitHubRepository {
    /// Timestamp used to decide whether the repository saw recent activity.
    ///
    /// GitHub's web UI shows "Updated ..." from the last push, so that wins
    /// over `updated_at`.
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.pushed_at.or(self.updated_at)
    }
}

/// GitHub Actions workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubWorkflowRun {
    /// Unique identifier for the workflow run
    pub id: u64,
    /// Name of the workflow
    #[serde(default)]
    pub name: Option<String>,
    /// Display title for the run
    #[serde(default)]
    pub display_title: Option<String>,
    /// Run number within the workflow
    #[serde(default)]
    pub run_number: Option<u64>,
    /// Head branch or tag name
    #[serde(default)]
    pub head_branch: Option<String>,
    /// Status of the run (queued, in_progress, completed, ...)
    #[serde(default)]
    pub status: Option<String>,
    /// Conclusion of the run (success, failure, ...)
    #[serde(default)]
    pub conclusion: Option<String>,
    #[serde(default)]
    pub run_started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Web page of the run
    #[serde(default)]
    pub html_url: Option<String>,
}

impl GitHubWorkflowRun {
    /// Instant the run is filtered and aged by.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.run_started_at.or(self.created_at)
    }
}

/// Items returned by one logical listing call, with the quota reported by the
/// last response that carried rate-limit headers.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub rate_limit: Option<RateLimitInfo>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, rate_limit: Option<RateLimitInfo>) -> Self {
        Self { items, rate_limit }
    }
}

/// Reads `x-ratelimit-*` headers. Returns `None` unless all three are valid.
pub fn rate_limit_from_headers(headers: &HeaderMap) -> Option<RateLimitInfo> {
    let number = |name: &str| -> Option<i64> {
        headers.get(name)?.to_str().ok()?.trim().parse().ok()
    };

    let remaining = u32::try_from(number("x-ratelimit-remaining")?).ok()?;
    let limit = u32::try_from(number("x-ratelimit-limit")?).ok()?;
    let reset_at = Utc.timestamp_opt(number("x-ratelimit-reset")?, 0).single()?;

    Some(RateLimitInfo {
        remaining,
        limit,
        reset_at,
    })
}

/// Links for GitHub resources.
pub mod links {
    /// Generate the web URL of a workflow run.
    pub fn workflow_run_url(owner: &str, repo: &str, run_id: u64) -> String {
        format!("https://github.com/{owner}/{repo}/actions/runs/{run_id}")
    }
}
