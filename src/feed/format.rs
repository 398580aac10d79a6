use chrono::{DateTime, Utc};

/// Placeholder shown when a value cannot be derived from the run payload.
pub const NOT_AVAILABLE: &str = "N/A";

/// Formats the elapsed time between two instants as `1h 2m 3s`, `2m 3s` or `3s`.
///
/// Components are truncated; negative spans are shown as `0s`.
pub fn format_duration(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let total = (end - start).num_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total / 60) % 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Duration of a run from the timestamps available in the payload.
///
/// Starts at `run_started_at` (falling back to `created_at`) and ends at
/// `updated_at` (falling back to `now`).
pub fn run_duration(
    run_started_at: Option<DateTime<Utc>>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> String {
    match run_started_at.or(created_at) {
        Some(start) => format_duration(start, updated_at.unwrap_or(now)),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Relative age of `instant`, e.g. `3 hours ago`.
pub fn format_time_ago(instant: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now - instant;
    let days = elapsed.num_days();
    let hours = elapsed.num_hours();
    let minutes = elapsed.num_minutes();

    if days > 0 {
        format!("{days} day{} ago", plural(days))
    } else if hours > 0 {
        format!("{hours} hour{} ago", plural(hours))
    } else if minutes > 0 {
        format!("{minutes} minute{} ago", plural(minutes))
    } else {
        "just now".to_string()
    }
}

fn plural(count: i64) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap()
    }

    fn after(seconds: i64) -> DateTime<Utc> {
        base() + Duration::seconds(seconds)
    }

    #[test]
    fn test_format_duration_hours() {
        assert_eq!(format_duration(base(), after(3661)), "1h 1m 1s");
        assert_eq!(format_duration(base(), after(26 * 3600)), "26h 0m 0s");
    }

    #[test]
    fn test_format_duration_minutes() {
        assert_eq!(format_duration(base(), after(125)), "2m 5s");
        assert_eq!(format_duration(base(), after(60)), "1m 0s");
    }

    #[test]
    fn test_format_duration_seconds() {
        assert_eq!(format_duration(base(), after(9)), "9s");
        assert_eq!(format_duration(base(), base()), "0s");
    }

    #[test]
    fn test_format_duration_truncates_subseconds() {
        let end = base() + Duration::milliseconds(59_999);
        assert_eq!(format_duration(base(), end), "59s");
    }

    #[test]
    fn test_format_duration_clamps_negative_spans() {
        assert_eq!(format_duration(after(30), base()), "0s");
    }

    #[test]
    fn test_run_duration_prefers_run_started_at() {
        let duration = run_duration(Some(after(60)), Some(base()), Some(after(90)), after(500));
        assert_eq!(duration, "30s");
    }

    #[test]
    fn test_run_duration_falls_back_to_created_at_and_now() {
        assert_eq!(run_duration(None, Some(base()), None, after(125)), "2m 5s");
        assert_eq!(run_duration(None, None, Some(after(5)), after(10)), NOT_AVAILABLE);
    }

    #[test]
    fn test_format_time_ago() {
        let now = after(90_000);
        assert_eq!(format_time_ago(base(), now), "1 day ago");
        assert_eq!(format_time_ago(base(), after(3 * 86_400)), "3 days ago");
        assert_eq!(format_time_ago(base(), after(3 * 3600)), "3 hours ago");
        assert_eq!(format_time_ago(base(), after(3600)), "1 hour ago");
        assert_eq!(format_time_ago(base(), after(61)), "1 minute ago");
        assert_eq!(format_time_ago(base(), after(150)), "2 minutes ago");
        assert_eq!(format_time_ago(base(), after(45)), "just now");
    }

    #[test]
    fn test_format_time_ago_future_instant() {
        assert_eq!(format_time_ago(after(120), base()), "just now");
    }
}
