use anyhow::{Context, Result};
use chrono::{Local, Utc};
use chrono_tz::Tz;

use crate::config::Config;
use crate::error;
use crate::feed::{Dashboard, DashboardReport, Period};
use crate::providers::{GitHubClient, WorkflowSource};

/// Everything a request needs to run a fetch cycle, built once at startup.
///
/// Shared read-only between concurrent requests; no per-request data is kept.
pub struct AppState<S = GitHubClient> {
    dashboard: Dashboard<S>,
    timezone: Option<Tz>,
}

impl AppState<GitHubClient> {
    /// Build the GitHub client and dashboard from a validated configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = GitHubClient::new(
            &config.github.base_url,
            config.token(),
            config.request_timeout(),
        )
        .context("Failed to create GitHub client")?
        .with_repo_pagination(config.github.repos_per_page, config.github.max_repo_pages);

        let dashboard = Dashboard::new(client, config.github.organizations.clone())
            .with_runs_per_page(config.github.runs_per_page);

        Ok(Self::new(dashboard, config.reference_timezone()?))
    }
}

impl<S: WorkflowSource> AppState<S> {
    pub fn new(dashboard: Dashboard<S>, timezone: Option<Tz>) -> Self {
        Self {
            dashboard,
            timezone,
        }
    }

    pub fn organizations(&self) -> &[String] {
        self.dashboard.organizations()
    }

    /// Run one fetch cycle against the current time in the reference timezone.
    pub async fn build(&self, period: Period) -> error::Result<DashboardReport> {
        match self.timezone {
            Some(tz) => {
                let now = Utc::now().with_timezone(&tz);
                self.dashboard.build(period, &now).await
            }
            None => self.dashboard.build(period, &Local::now()).await,
        }
    }
}
