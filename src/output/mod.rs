mod progress;
mod styling;
mod summary;
mod tables;

pub use progress::FetchProgress;
pub use styling::{dim, magenta_bold};
pub use summary::render_summary;

/// Prints the actions-pulse banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("⚡ actions-pulse"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("GitHub Actions activity dashboard")
    );
}
