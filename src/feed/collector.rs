use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Utc};
use log::{debug, error, info, warn};

use crate::dashboard::{Job, RateLimitInfo};
use crate::error::Result;
use crate::providers::{links, GitHubWorkflowRun, WorkflowSource};

use super::format::{format_time_ago, run_duration, NOT_AVAILABLE};
use super::repo_filter::select_active_repositories;
use super::status::normalize_status;
use super::window::TimeWindow;

/// Result of one unit of collection work: an organization's repository
/// listing or a repository's run listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    Collected {
        organization: String,
        repository: Option<String>,
        jobs: usize,
    },
    Skipped {
        organization: String,
        repository: Option<String>,
        reason: String,
    },
}

impl UnitOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    /// `org` or `org/repo`.
    pub fn unit(&self) -> String {
        let (organization, repository) = match self {
            Self::Collected {
                organization,
                repository,
                ..
            }
            | Self::Skipped {
                organization,
                repository,
                ..
            } => (organization, repository),
        };
        match repository {
            Some(repository) => format!("{organization}/{repository}"),
            None => organization.clone(),
        }
    }
}

/// Keeps the most recently reported rate-limit snapshot.
#[derive(Debug, Default)]
pub struct RateLimitTracker {
    latest: Option<RateLimitInfo>,
}

impl RateLimitTracker {
    /// Record a snapshot; responses without rate-limit headers leave the
    /// previous snapshot in place.
    pub fn observe(&mut self, snapshot: Option<RateLimitInfo>) {
        if let Some(snapshot) = snapshot {
            debug!(
                "Rate limit: {}/{} remaining (resets at {})",
                snapshot.remaining, snapshot.limit, snapshot.reset_at
            );
            self.latest = Some(snapshot);
        }
    }

    pub fn latest(&self) -> Option<&RateLimitInfo> {
        self.latest.as_ref()
    }

    pub fn into_latest(self) -> Option<RateLimitInfo> {
        self.latest
    }
}

/// Unsorted output of one collection pass.
#[derive(Debug, Default)]
pub struct Collection {
    pub jobs: Vec<Job>,
    pub rate_limit: Option<RateLimitInfo>,
    pub outcomes: Vec<UnitOutcome>,
}

impl Collection {
    pub fn skipped(&self) -> impl Iterator<Item = &UnitOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.is_skipped())
    }
}

/// Walks organizations, their active repositories, and each repository's
/// recent runs, strictly in order.
pub struct Collector<'a, S: ?Sized> {
    source: &'a S,
    organizations: &'a [String],
    runs_per_page: usize,
}

impl<'a, S: WorkflowSource + ?Sized> Collector<'a, S> {
    pub fn new(source: &'a S, organizations: &'a [String], runs_per_page: usize) -> Self {
        Self {
            source,
            organizations,
            runs_per_page,
        }
    }

    /// Collect every in-window run as a [`Job`].
    ///
    /// Failures of individual units are recorded as [`UnitOutcome::Skipped`].
    ///
    /// # Errors
    ///
    /// Returns an error only when the first API call of the pass fails with a
    /// fatal error (see [`crate::error::PulseError::is_fatal`]).
    pub async fn collect<Tz: TimeZone>(
        &self,
        window: &TimeWindow<Tz>,
        now: DateTime<Utc>,
    ) -> Result<Collection> {
        let mut tracker = RateLimitTracker::default();
        let mut jobs = Vec::new();
        let mut outcomes = Vec::new();
        let mut seen_runs = HashSet::new();
        let mut first_call = true;

        for organization in self.organizations {
            info!("Fetching repositories for organization: {organization}");

            let listing = self.source.list_repositories(organization).await;
            let page = match listing {
                Ok(page) => page,
                Err(e) if first_call && e.is_fatal() => return Err(e),
                Err(e) => {
                    error!("Error listing repositories for organization {organization}: {e}");
                    outcomes.push(UnitOutcome::Skipped {
                        organization: organization.clone(),
                        repository: None,
                        reason: e.to_string(),
                    });
                    first_call = false;
                    continue;
                }
            };
            first_call = false;
            tracker.observe(page.rate_limit);

            let active = select_active_repositories(&page.items, window);
            info!(
                "Found {} repositories in {organization}, {} updated {}",
                page.items.len(),
                active.len(),
                window.period.describe()
            );

            let org_jobs_before = jobs.len();

            for (index, repository) in active.iter().enumerate() {
                let repository = repository.name.as_str();
                debug!(
                    "[{}/{}] Fetching workflow runs for {organization}/{repository}",
                    index + 1,
                    active.len()
                );

                let runs = match self
                    .source
                    .list_workflow_runs(organization, repository, self.runs_per_page)
                    .await
                {
                    Ok(runs) => runs,
                    Err(e) => {
                        error!("Error fetching workflow runs for {organization}/{repository}: {e}");
                        outcomes.push(UnitOutcome::Skipped {
                            organization: organization.clone(),
                            repository: Some(repository.to_string()),
                            reason: e.to_string(),
                        });
                        continue;
                    }
                };
                tracker.observe(runs.rate_limit);

                let repo_jobs_before = jobs.len();
                for run in &runs.items {
                    if !seen_runs.insert(run.id) {
                        continue;
                    }
                    if let Some(job) = project_run(organization, repository, run, window, now) {
                        jobs.push(job);
                    }
                }

                debug!(
                    "Found {} workflow runs in {organization}/{repository}, {} in window",
                    runs.items.len(),
                    jobs.len() - repo_jobs_before
                );
                outcomes.push(UnitOutcome::Collected {
                    organization: organization.clone(),
                    repository: Some(repository.to_string()),
                    jobs: jobs.len() - repo_jobs_before,
                });
            }

            outcomes.push(UnitOutcome::Collected {
                organization: organization.clone(),
                repository: None,
                jobs: jobs.len() - org_jobs_before,
            });
            info!(
                "Completed {organization}. Total jobs collected: {}",
                jobs.len()
            );
        }

        if let Some(rate_limit) = tracker.latest() {
            info!(
                "Rate limit after pass: {}/{} remaining",
                rate_limit.remaining, rate_limit.limit
            );
        }

        let collection = Collection {
            jobs,
            rate_limit: tracker.into_latest(),
            outcomes,
        };
        let skipped = collection.skipped().count();
        if skipped > 0 {
            warn!("{skipped} collection units skipped");
        }
        Ok(collection)
    }
}

/// Projects a workflow run into a [`Job`], or `None` when the run has no
/// usable timestamp or started outside the window.
pub fn project_run<Tz: TimeZone>(
    organization: &str,
    repository: &str,
    run: &GitHubWorkflowRun,
    window: &TimeWindow<Tz>,
    now: DateTime<Utc>,
) -> Option<Job> {
    let started_at = run.started_at()?;
    if !window.contains(&started_at) {
        return None;
    }

    let status = normalize_status(
        run.status.as_deref().unwrap_or_default(),
        run.conclusion.as_deref(),
    );

    let workflow = run
        .name
        .as_deref()
        .or(run.display_title.as_deref())
        .filter(|name| !name.is_empty())
        .unwrap_or("Workflow");
    let name = match run.run_number {
        Some(number) => format!("{workflow} #{number}"),
        None => workflow.to_string(),
    };

    let html_url = run
        .html_url
        .clone()
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| links::workflow_run_url(organization, repository, run.id));

    Some(Job {
        id: format!("JOB-{:06}", run.id),
        name,
        status,
        pipeline: repository.to_string(),
        branch: run
            .head_branch
            .clone()
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        duration: run_duration(run.run_started_at, run.created_at, run.updated_at, now),
        started: format_time_ago(started_at, now),
        organization: organization.to_string(),
        run_id: run.id,
        html_url,
        created_at: run.created_at.unwrap_or(now),
    })
}
