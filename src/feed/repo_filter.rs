use chrono::TimeZone;

use crate::providers::GitHubRepository;

use super::window::TimeWindow;

/// Repositories whose last push (or, failing that, last update) lies inside
/// the window, in listing order.
///
/// Repositories with neither timestamp are dropped. This only saves API calls:
/// a repository with no recent push is skipped even if one of its old branches
/// was re-run inside the window.
pub fn select_active_repositories<'a, Tz: TimeZone>(
    repositories: &'a [GitHubRepository],
    window: &TimeWindow<Tz>,
) -> Vec<&'a GitHubRepository> {
    repositories
        .iter()
        .filter(|repo| {
            repo.last_activity()
                .is_some_and(|activity| window.contains(&activity))
        })
        .collect()
}
