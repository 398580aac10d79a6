use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{bright, bright_green, bright_red, bright_yellow};
use crate::feed::DashboardReport;

/// Spinner shown on stderr while a fetch cycle runs.
pub struct FetchProgress {
    pb: ProgressBar,
}

impl FetchProgress {
    pub fn start(organizations: usize) -> Self {
        eprintln!("{}  {}", bright("⚙️"), bright("Collection").underlined());
        let pb = create_spinner(
            bright_yellow(format!(
                "Fetching workflow runs from {organizations} organization(s)"
            ))
            .to_string(),
        );
        Self { pb }
    }

    pub fn finish(self, report: &DashboardReport) {
        let skipped = report.skipped().count();
        let message = if skipped == 0 {
            bright_green(format!(
                "Collected {} workflow runs ✓",
                report.response.stats.total
            ))
        } else {
            bright_yellow(format!(
                "Collected {} workflow runs ({skipped} units skipped)",
                report.response.stats.total
            ))
        };
        self.pb.finish_with_message(message.to_string());
        eprintln!();
    }

    pub fn abandon(self) {
        self.pb
            .abandon_with_message(bright_red("Collection failed ✗").to_string());
        eprintln!();
    }
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::with_template("  {msg} {spinner}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
