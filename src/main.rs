mod auth;
mod cli;
mod config;
mod dashboard;
mod error;
mod feed;
mod output;
mod providers;
mod server;
mod state;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = std::env::current_dir()
        .ok()
        .and_then(|dir| config::load_dotenv(&dir));
    env_logger::init();
    if let Some(path) = dotenv {
        debug!("Loaded environment from {}", path.display());
    }

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting actions-pulse");
    cli.execute().await?;

    Ok(())
}
