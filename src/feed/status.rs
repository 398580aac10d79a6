use crate::dashboard::JobStatus;

/// Maps a GitHub run `status`/`conclusion` pair to a dashboard status.
///
/// Completed runs without a successful conclusion count as failed, including
/// conclusions such as `skipped`, `timed_out` or a missing value.
pub fn normalize_status(status: &str, conclusion: Option<&str>) -> JobStatus {
    let status = status.to_ascii_lowercase();

    match status.as_str() {
        "completed" => match conclusion.map(str::to_ascii_lowercase).as_deref() {
            Some("success") => JobStatus::Success,
            _ => JobStatus::Failed,
        },
        "in_progress" | "queued" => JobStatus::Running,
        _ => JobStatus::Pending,
    }
}
