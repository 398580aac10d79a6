mod github;

use async_trait::async_trait;

use crate::error::Result;

pub use github::{links, GitHubClient, GitHubRepository, GitHubWorkflowRun, Page};

/// Source of organization repositories and their workflow runs.
///
/// Every call reports the rate-limit snapshot of its last response so the
/// collector can keep the most recently observed quota.
#[async_trait]
pub trait WorkflowSource: Send + Sync {
    /// List all repositories of `organization`.
    async fn list_repositories(&self, organization: &str) -> Result<Page<GitHubRepository>>;

    /// List the most recent workflow runs of a repository, newest first.
    async fn list_workflow_runs(
        &self,
        organization: &str,
        repository: &str,
        per_page: usize,
    ) -> Result<Page<GitHubWorkflowRun>>;
}
