use crate::dashboard::{DashboardStats, Job, JobStatus};

/// Newest first by creation instant. The sort is stable, so jobs created at
/// the same instant keep their collection order.
pub fn sort_jobs(jobs: &mut [Job]) {
    jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

pub fn compute_stats(jobs: &[Job]) -> DashboardStats {
    jobs.iter().fold(
        DashboardStats {
            total: jobs.len(),
            ..DashboardStats::default()
        },
        |mut stats, job| {
            match job.status {
                JobStatus::Success => stats.success += 1,
                JobStatus::Failed => stats.failed += 1,
                JobStatus::Running => stats.running += 1,
                JobStatus::Pending => stats.pending += 1,
            }
            stats
        },
    )
}

/// Sorts the jobs and derives their summary counts.
pub fn aggregate(mut jobs: Vec<Job>) -> (Vec<Job>, DashboardStats) {
    sort_jobs(&mut jobs);
    let stats = compute_stats(&jobs);
    (jobs, stats)
}
