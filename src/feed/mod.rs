//! Aggregation pipeline turning organization workflow runs into a dashboard feed.

mod aggregate;
mod collector;
mod format;
mod repo_filter;
mod status;
mod window;

use chrono::{DateTime, Duration, TimeZone, Utc};
use log::info;

use crate::dashboard::{DashboardResponse, DashboardStats, Job, RateLimitInfo};
use crate::error::Result;
use crate::providers::WorkflowSource;

use aggregate::aggregate;
use collector::Collector;
use window::TimeWindow;

pub use collector::UnitOutcome;
pub use window::Period;

pub const DEFAULT_RUNS_PER_PAGE: usize = 50;

/// Quota reported when no API response carried rate-limit headers.
pub fn default_rate_limit(now: DateTime<Utc>) -> RateLimitInfo {
    RateLimitInfo {
        remaining: 5000,
        limit: 5000,
        reset_at: now + Duration::hours(1),
    }
}

/// Combines sorted jobs, their stats and the last observed quota.
pub fn assemble(
    jobs: Vec<Job>,
    stats: DashboardStats,
    rate_limit: Option<RateLimitInfo>,
    now: DateTime<Utc>,
) -> DashboardResponse {
    DashboardResponse {
        stats,
        jobs,
        rate_limit: rate_limit.unwrap_or_else(|| default_rate_limit(now)),
    }
}

/// Response plus the per-unit outcomes of the pass that produced it.
#[derive(Debug)]
pub struct DashboardReport {
    pub response: DashboardResponse,
    pub outcomes: Vec<UnitOutcome>,
}

impl DashboardReport {
    pub fn skipped(&self) -> impl Iterator<Item = &UnitOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.is_skipped())
    }
}

/// Builds dashboard responses for a fixed, ordered set of organizations.
///
/// Holds no state between builds; every call runs a full collection pass.
pub struct Dashboard<S> {
    source: S,
    organizations: Vec<String>,
    runs_per_page: usize,
}

impl<S: WorkflowSource> Dashboard<S> {
    pub fn new(source: S, organizations: Vec<String>) -> Self {
        Self {
            source,
            organizations,
            runs_per_page: DEFAULT_RUNS_PER_PAGE,
        }
    }

    pub fn with_runs_per_page(mut self, runs_per_page: usize) -> Self {
        self.runs_per_page = runs_per_page.max(1);
        self
    }

    pub fn organizations(&self) -> &[String] {
        &self.organizations
    }

    /// Runs one collection pass for `period`, with `now` fixing both the
    /// current instant and the reference timezone.
    ///
    /// # Errors
    ///
    /// Fails only when the first API call of the pass fails fatally.
    pub async fn build<Tz: TimeZone>(
        &self,
        period: Period,
        now: &DateTime<Tz>,
    ) -> Result<DashboardReport> {
        let window = TimeWindow::resolve(period, now);
        let now = now.with_timezone(&Utc);
        info!(
            "Fetching workflow runs for period: {} (since {}{})",
            period.as_str(),
            window.start.naive_local(),
            window
                .end
                .as_ref()
                .map(|end| format!(" until {}", end.naive_local()))
                .unwrap_or_default()
        );

        let collection = Collector::new(&self.source, &self.organizations, self.runs_per_page)
            .collect(&window, now)
            .await?;

        let (jobs, stats) = aggregate(collection.jobs);
        info!(
            "Dashboard stats: success={}, failed={}, running={}, pending={}, total={}",
            stats.success, stats.failed, stats.running, stats.pending, stats.total
        );

        Ok(DashboardReport {
            response: assemble(jobs, stats, collection.rate_limit, now),
            outcomes: collection.outcomes,
        })
    }
}
