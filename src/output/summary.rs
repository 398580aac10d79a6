use std::fmt::Write;

use comfy_table::{Cell, Color as TableColor};

use crate::dashboard::DashboardStats;
use crate::feed::{DashboardReport, Period, UnitOutcome};

use super::styling::{bright, bright_green, bright_red, bright_yellow, cyan, dim};
use super::tables::{color_coded_quota_cell, create_table, status_cell};

const MAX_JOB_ROWS: usize = 25;

fn create_cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

fn stats_table(stats: &DashboardStats) -> String {
    let mut table = create_table();
    table.set_header(create_cyan_header(&[
        "Success", "Failed", "Running", "Pending", "Total",
    ]));
    table.add_row(vec![
        Cell::new(stats.success).fg(TableColor::Green),
        Cell::new(stats.failed).fg(TableColor::Red),
        Cell::new(stats.running).fg(TableColor::Yellow),
        Cell::new(stats.pending).fg(TableColor::DarkGrey),
        Cell::new(stats.total),
    ]);
    table.to_string()
}

/// Renders a fetch cycle as terminal tables: overview, rate limit, the most
/// recent jobs, and any units that could not be collected.
pub fn render_summary(report: &DashboardReport, period: Period) -> String {
    let response = &report.response;
    let mut output = String::new();

    add_section_header(&mut output, "📊", "Overview");
    let _ = writeln!(
        output,
        "  {} {}\n  {} {}\n",
        dim("Period:"),
        cyan(period.describe()),
        dim("Workflow runs:"),
        bright_yellow(response.stats.total),
    );
    for outcome in &report.outcomes {
        if let UnitOutcome::Collected {
            organization,
            repository: None,
            jobs,
        } = outcome
        {
            let _ = writeln!(output, "  {} {}", dim(format!("{organization}:")), jobs);
        }
    }
    let _ = writeln!(output, "{}\n", stats_table(&response.stats));

    add_section_header(&mut output, "⏳", "Rate Limit");
    let mut quota = create_table();
    quota.set_header(create_cyan_header(&["Remaining", "Resets At"]));
    quota.add_row(vec![
        color_coded_quota_cell(response.rate_limit.remaining, response.rate_limit.limit),
        Cell::new(response.rate_limit.reset_at.format("%Y-%m-%d %H:%M UTC")),
    ]);
    let _ = writeln!(output, "{quota}\n");

    add_section_header(&mut output, "📋", "Workflow Runs");
    if response.jobs.is_empty() {
        let _ = writeln!(
            output,
            "{}\n",
            bright_yellow(format!("No workflow runs found {}.", period.describe()))
        );
    } else {
        let mut jobs = create_table();
        jobs.set_header(create_cyan_header(&[
            "ID",
            "Workflow",
            "Status",
            "Organization",
            "Repository",
            "Branch",
            "Duration",
            "Started",
        ]));

        for job in response.jobs.iter().take(MAX_JOB_ROWS) {
            jobs.add_row(vec![
                Cell::new(&job.id).fg(TableColor::DarkGrey),
                Cell::new(&job.name),
                status_cell(job.status),
                Cell::new(&job.organization),
                Cell::new(&job.pipeline),
                Cell::new(&job.branch),
                Cell::new(&job.duration),
                Cell::new(&job.started),
            ]);
        }

        if response.jobs.len() > MAX_JOB_ROWS {
            let mut row = vec![Cell::new(format!(
                "... and {} more",
                response.jobs.len() - MAX_JOB_ROWS
            ))
            .fg(TableColor::DarkGrey)];
            row.extend(vec![Cell::new(""); 7]);
            jobs.add_row(row);
        }

        let _ = writeln!(output, "{jobs}\n");
    }

    let skipped: Vec<&UnitOutcome> = report.skipped().collect();
    if skipped.is_empty() {
        let _ = writeln!(output, "{}", bright_green("All units collected ✓"));
    } else {
        add_section_header(&mut output, "⚠️", "Skipped Units");
        for outcome in skipped {
            if let UnitOutcome::Skipped { reason, .. } = outcome {
                let _ = writeln!(
                    output,
                    "  {} {} {}",
                    bright_red("•"),
                    outcome.unit(),
                    dim(reason)
                );
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{DashboardResponse, Job, JobStatus, RateLimitInfo};
    use chrono::{TimeZone, Utc};

    fn job(run_id: u64, status: JobStatus) -> Job {
        Job {
            id: format!("JOB-{run_id:06}"),
            name: format!("CI #{run_id}"),
            status,
            pipeline: "api".to_string(),
            branch: "main".to_string(),
            duration: "2m 5s".to_string(),
            started: "5 minutes ago".to_string(),
            organization: "acme".to_string(),
            run_id,
            html_url: format!("https://github.com/acme/api/actions/runs/{run_id}"),
            created_at: Utc.with_ymd_and_hms(2024, 5, 2, 10, 0, 0).unwrap(),
        }
    }

    fn report(jobs: Vec<Job>, outcomes: Vec<UnitOutcome>) -> DashboardReport {
        let stats = DashboardStats {
            success: jobs.iter().filter(|j| j.status == JobStatus::Success).count(),
            failed: jobs.iter().filter(|j| j.status == JobStatus::Failed).count(),
            running: 0,
            pending: 0,
            total: jobs.len(),
        };
        DashboardReport {
            response: DashboardResponse {
                stats,
                jobs,
                rate_limit: RateLimitInfo {
                    remaining: 4200,
                    limit: 5000,
                    reset_at: Utc.with_ymd_and_hms(2024, 5, 2, 11, 0, 0).unwrap(),
                },
            },
            outcomes,
        }
    }

    #[test]
    fn test_render_summary_empty() {
        let output = render_summary(&report(Vec::new(), Vec::new()), Period::Today);

        assert!(output.contains("Overview"));
        assert!(output.contains("No workflow runs found today."));
        assert!(output.contains("4200/5000"));
        assert!(output.contains("All units collected"));
    }

    #[test]
    fn test_render_summary_with_jobs_and_skipped_units() {
        let outcomes = vec![
            UnitOutcome::Collected {
                organization: "acme".to_string(),
                repository: Some("api".to_string()),
                jobs: 2,
            },
            UnitOutcome::Collected {
                organization: "acme".to_string(),
                repository: None,
                jobs: 2,
            },
            UnitOutcome::Skipped {
                organization: "globex".to_string(),
                repository: None,
                reason: "GitHub API error (404): Not Found".to_string(),
            },
        ];
        let output = render_summary(
            &report(
                vec![job(2, JobStatus::Failed), job(1, JobStatus::Success)],
                outcomes,
            ),
            Period::Week,
        );

        assert!(output.contains("this week"));
        assert!(output.contains("acme:"));
        assert!(output.contains("JOB-000002"));
        assert!(output.contains("CI #1"));
        assert!(output.contains("failed"));
        assert!(output.contains("Skipped Units"));
        assert!(output.contains("globex"));
        assert!(output.contains("Not Found"));
        assert!(!output.contains("All units collected"));
    }

    #[test]
    fn test_render_summary_truncates_long_job_lists() {
        let jobs = (1..=30).map(|id| job(id, JobStatus::Success)).collect();
        let output = render_summary(&report(jobs, Vec::new()), Period::Month);

        assert!(output.contains("... and 5 more"));
        assert!(output.contains("JOB-000025"));
        assert!(!output.contains("JOB-000026"));
    }
}
