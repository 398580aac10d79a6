use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{parse_organizations, Config};
use crate::feed::{DashboardReport, Period};
use crate::output::{self, FetchProgress};
use crate::server;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "actions-pulse")]
#[command(author, version, about = "GitHub Actions activity dashboard", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./actions-pulse.{toml,json,yaml})
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// GitHub token (overrides GITHUB_TOKEN)
    #[arg(short, long, global = true)]
    token: Option<String>,

    /// Comma-separated organizations to aggregate (overrides GITHUB_ORG)
    #[arg(long, global = true)]
    org: Option<String>,

    /// IANA timezone for period boundaries (e.g. Europe/Berlin)
    #[arg(long, global = true)]
    timezone: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Summary,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single collection cycle and print the result
    Fetch {
        #[arg(short, long, value_enum, default_value_t = Period::Week)]
        period: Period,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Summary)]
        format: OutputFormat,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
    /// Serve the dashboard feed over HTTP
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,
    },
}

impl Cli {
    fn resolve_config(&self) -> Result<Config> {
        let config = Config::load(self.config.as_deref())?;
        self.layer_config(config, |key| std::env::var(key).ok())
    }

    /// Environment over file values, then command-line flags over both.
    fn layer_config(
        &self,
        mut config: Config,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Config> {
        config.apply_env_from(env)?;

        if let Some(token) = self.token.as_ref().filter(|t| !t.trim().is_empty()) {
            config.github.token = Some(token.clone());
        }
        if let Some(orgs) = self.org.as_deref().filter(|o| !o.trim().is_empty()) {
            config.github.organizations = parse_organizations(orgs);
        }
        if let Some(timezone) = &self.timezone {
            config.timezone = Some(timezone.clone());
        }

        if let Commands::Serve { host, port } = &self.command {
            if let Some(host) = host {
                config.server.host = host.clone();
            }
            if let Some(port) = port {
                config.server.port = *port;
            }
        }

        config.validate()?;
        Ok(config)
    }

    async fn execute_fetch(
        &self,
        config: &Config,
        period: Period,
        format: OutputFormat,
        output_path: Option<&PathBuf>,
        pretty: bool,
    ) -> Result<()> {
        let state = AppState::from_config(config)?;
        info!(
            "Collecting workflow runs {} for: {}",
            period.describe(),
            state.organizations().join(", ")
        );

        let progress = FetchProgress::start(state.organizations().len());
        let report = match state.build(period).await {
            Ok(report) => {
                progress.finish(&report);
                report
            }
            Err(e) => {
                progress.abandon();
                return Err(e).context("Error fetching workflow runs");
            }
        };

        let rendered = match format {
            OutputFormat::Json => render_json(&report, pretty)?,
            OutputFormat::Summary => output::render_summary(&report, period),
        };

        if let Some(path) = output_path {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Dashboard written to: {}", path.display());
        } else {
            println!("{rendered}");
        }

        Ok(())
    }

    async fn execute_serve(&self, config: &Config) -> Result<()> {
        let state = Arc::new(AppState::from_config(config)?);
        server::serve(state, &config.server.host, config.server.port).await
    }

    pub async fn execute(&self) -> Result<()> {
        let config = self.resolve_config()?;

        match &self.command {
            Commands::Fetch {
                period,
                format,
                output,
                pretty,
            } => {
                self.execute_fetch(&config, *period, *format, output.as_ref(), *pretty)
                    .await
            }
            Commands::Serve { .. } => self.execute_serve(&config).await,
        }
    }
}

fn render_json(report: &DashboardReport, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(&report.response)?
    } else {
        serde_json::to_string(&report.response)?
    };
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_cli_overrides_environment_and_file() {
        let cli = Cli::parse_from([
            "actions-pulse",
            "--token",
            "cli-token",
            "--org",
            "acme, globex,acme",
            "--timezone",
            "Asia/Bangkok",
            "serve",
            "--port",
            "9090",
        ]);
        let mut file = Config::default();
        file.github.organizations = vec!["from-file".to_string()];
        file.server.host = "127.0.0.1".to_string();

        let env = |key: &str| match key {
            "GITHUB_TOKEN" => Some("env-token".to_string()),
            "PORT" => Some("7070".to_string()),
            _ => None,
        };
        let config = cli.layer_config(file, env).unwrap();

        assert_eq!(config.github.token.as_deref(), Some("cli-token"));
        assert_eq!(config.github.organizations, vec!["acme", "globex"]);
        assert_eq!(config.timezone.as_deref(), Some("Asia/Bangkok"));
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
    }

    #[test]
    fn test_explicit_config_file_is_layered() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        std::io::Write::write_all(
            &mut file,
            b"[github]\ntoken = \"file-token\"\norganizations = [\"acme\"]\n\n[server]\nport = 3000\n",
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let cli = Cli::parse_from(["actions-pulse", "--config", &path, "serve"]);

        let config = Config::load(cli.config.as_deref()).unwrap();
        let config = cli.layer_config(config, no_env).unwrap();

        assert_eq!(config.github.token.as_deref(), Some("file-token"));
        assert_eq!(config.github.organizations, vec!["acme"]);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_missing_token_fails_validation() {
        let cli = Cli::parse_from(["actions-pulse", "--org", "acme", "fetch"]);
        let mut config = Config::default();
        config.github.token = None;

        assert!(cli.layer_config(config, no_env).is_err());
    }

    #[test]
    fn test_fetch_defaults() {
        let cli = Cli::parse_from(["actions-pulse", "fetch"]);

        match cli.command {
            Commands::Fetch {
                period,
                format,
                output,
                pretty,
            } => {
                assert_eq!(period, Period::Week);
                assert_eq!(format, OutputFormat::Summary);
                assert!(output.is_none());
                assert!(!pretty);
            }
            Commands::Serve { .. } => panic!("expected fetch"),
        }
    }

    #[test]
    fn test_fetch_parses_period_and_format() {
        let cli = Cli::parse_from([
            "actions-pulse",
            "fetch",
            "--period",
            "today",
            "--format",
            "json",
            "--pretty",
        ]);

        match cli.command {
            Commands::Fetch {
                period,
                format,
                pretty,
                ..
            } => {
                assert_eq!(period, Period::Today);
                assert_eq!(format, OutputFormat::Json);
                assert!(pretty);
            }
            Commands::Serve { .. } => panic!("expected fetch"),
        }
    }
}
