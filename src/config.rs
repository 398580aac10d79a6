use anyhow::{bail, Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::auth::Token;

/// Configuration file structure for actions-pulse.
///
/// Values are layered: built-in defaults, then the configuration file, then
/// environment variables, then command-line flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// GitHub API access and collection settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// HTTP endpoint settings
    #[serde(default)]
    pub server: ServerConfig,

    /// IANA timezone used for period boundaries (process local time if unset)
    #[serde(default)]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitHubConfig {
    /// GitHub personal access token
    pub token: Option<String>,

    /// GitHub API base URL
    #[serde(default = "default_github_base_url")]
    pub base_url: String,

    /// Organizations to aggregate, in display order
    #[serde(default)]
    pub organizations: Vec<String>,

    /// Page size for organization repository listings
    #[serde(default = "default_repos_per_page")]
    pub repos_per_page: usize,

    /// Upper bound on repository listing pages per organization
    #[serde(default = "default_max_repo_pages")]
    pub max_repo_pages: usize,

    /// Number of recent workflow runs fetched per repository
    #[serde(default = "default_runs_per_page")]
    pub runs_per_page: usize,

    /// Timeout for a single API request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: default_github_base_url(),
            organizations: Vec::new(),
            repos_per_page: default_repos_per_page(),
            max_repo_pages: default_max_repo_pages(),
            runs_per_page: default_runs_per_page(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_github_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_repos_per_page() -> usize {
    100
}

fn default_max_repo_pages() -> usize {
    10
}

fn default_runs_per_page() -> usize {
    50
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Splits a comma-separated organization list.
///
/// Entries are trimmed, empty entries dropped, and duplicates removed keeping
/// the first occurrence.
pub fn parse_organizations(raw: &str) -> Vec<String> {
    dedup_organizations(raw.split(','))
}

fn dedup_organizations<I, S>(organizations: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut result: Vec<String> = Vec::new();
    for org in organizations {
        let org = org.as_ref().trim();
        if !org.is_empty() && !result.iter().any(|existing| existing == org) {
            result.push(org.to_string());
        }
    }
    result
}

/// Load `dir/.env` into the process environment, if present.
///
/// Variables already set in the environment are left untouched. A missing or
/// unreadable file is ignored.
pub fn load_dotenv(dir: &Path) -> Option<PathBuf> {
    let path = dir.join(".env");
    dotenvy::from_path(&path).ok().map(|()| path)
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path (must exist)
    /// 2. ./actions-pulse.toml
    /// 3. ./actions-pulse.json
    /// 4. ./actions-pulse.yaml
    /// 5. ./actions-pulse.yml
    /// 6. `<config dir>/actions-pulse/config.toml`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let candidates = [
            "actions-pulse.toml",
            "actions-pulse.json",
            "actions-pulse.yaml",
            "actions-pulse.yml",
        ]
        .into_iter()
        .map(PathBuf::from)
        .chain(dirs::config_dir().map(|dir| dir.join("actions-pulse").join("config.toml")));

        for candidate in candidates {
            if candidate.exists() {
                return Self::load_from_path(&candidate);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        let config: Self = match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?,
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?,
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
        };

        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply `GITHUB_TOKEN`, `GITHUB_ORG` and `PORT` as returned by `lookup`.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(token) = lookup("GITHUB_TOKEN").filter(|t| !t.trim().is_empty()) {
            self.github.token = Some(token);
        }
        if let Some(orgs) = lookup("GITHUB_ORG").filter(|o| !o.trim().is_empty()) {
            self.github.organizations = parse_organizations(&orgs);
        }
        if let Some(port) = lookup("PORT").filter(|p| !p.trim().is_empty()) {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT value: {port}"))?;
        }
        Ok(())
    }

    /// Check that everything a fetch cycle needs is present and normalize
    /// the organization list.
    pub fn validate(&mut self) -> Result<()> {
        if self.token().is_none() {
            bail!("A GitHub token is required (set GITHUB_TOKEN, --token, or github.token)");
        }

        self.github.organizations = dedup_organizations(&self.github.organizations);
        if self.github.organizations.is_empty() {
            bail!(
                "At least one organization is required (set GITHUB_ORG, --org, or github.organizations)"
            );
        }

        self.reference_timezone()?;
        Ok(())
    }

    pub fn token(&self) -> Option<Token> {
        self.github
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(Token::from)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.github.request_timeout_secs.max(1))
    }

    /// Configured IANA timezone, or `None` for the process local timezone.
    pub fn reference_timezone(&self) -> Result<Option<Tz>> {
        self.timezone
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| {
                name.parse::<Tz>()
                    .map_err(|e| anyhow::anyhow!("Invalid timezone '{name}': {e}"))
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.github.base_url, "https://api.github.com");
        assert_eq!(config.github.repos_per_page, 100);
        assert_eq!(config.github.runs_per_page, 50);
        assert_eq!(config.server.port, 8080);
        assert!(config.github.organizations.is_empty());
        assert!(config.timezone.is_none());
    }

    #[test]
    fn test_parse_organizations() {
        assert_eq!(
            parse_organizations(" acme, globex ,,acme,initech "),
            vec!["acme", "globex", "initech"]
        );
        assert!(parse_organizations(" , ").is_empty());
    }

    #[test]
    fn test_load_toml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        let toml_content = r#"
timezone = "Asia/Jakarta"

[github]
token = "ghp-test-token"
base-url = "https://ghe.example.com/api/v3"
organizations = ["acme", "globex"]
runs-per-page = 20

[server]
port = 9090
"#;
        write!(temp_file, "{}", toml_content).unwrap();

        let config = Config::load(Some(temp_file.path())).unwrap();
        assert_eq!(config.github.token, Some("ghp-test-token".to_string()));
        assert_eq!(config.github.base_url, "https://ghe.example.com/api/v3");
        assert_eq!(config.github.organizations, vec!["acme", "globex"]);
        assert_eq!(config.github.runs_per_page, 20);
        assert_eq!(config.github.repos_per_page, 100);
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(
            config.reference_timezone().unwrap(),
            Some(chrono_tz::Asia::Jakarta)
        );
    }

    #[test]
    fn test_load_json_config() {
        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        let json_content = r#"{
  "github": {
    "token": "ghp-json-token",
    "organizations": ["acme"]
  }
}"#;
        write!(temp_file, "{}", json_content).unwrap();

        let config = Config::load(Some(temp_file.path())).unwrap();
        assert_eq!(config.github.token, Some("ghp-json-token".to_string()));
        assert_eq!(config.github.organizations, vec!["acme"]);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_load_yaml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        let yaml_content = "github:\n  organizations:\n    - acme\n  max-repo-pages: 2\nserver:\n  host: 127.0.0.1\n";
        write!(temp_file, "{}", yaml_content).unwrap();

        let config = Config::load(Some(temp_file.path())).unwrap();
        assert_eq!(config.github.organizations, vec!["acme"]);
        assert_eq!(config.github.max_repo_pages, 2);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let err = Config::load(Some(Path::new("does-not-exist.toml"))).unwrap_err();
        assert!(err.to_string().contains("does-not-exist.toml"));
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = Config::default();
        config.github.organizations = vec!["from-file".to_string()];

        config
            .apply_env_from(env(&[
                ("GITHUB_TOKEN", "ghp-env"),
                ("GITHUB_ORG", "acme, globex"),
                ("PORT", "3000"),
            ]))
            .unwrap();

        assert_eq!(config.github.token, Some("ghp-env".to_string()));
        assert_eq!(config.github.organizations, vec!["acme", "globex"]);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_dotenv_fills_missing_variables_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".env"),
            "ACTIONS_PULSE_DOTENV_ORG=acme,globex\nACTIONS_PULSE_DOTENV_KEEP=from-file\n",
        )
        .unwrap();
        std::env::set_var("ACTIONS_PULSE_DOTENV_KEEP", "from-env");

        let loaded = load_dotenv(dir.path());

        assert_eq!(loaded, Some(dir.path().join(".env")));
        assert_eq!(
            std::env::var("ACTIONS_PULSE_DOTENV_ORG").as_deref(),
            Ok("acme,globex")
        );
        assert_eq!(
            std::env::var("ACTIONS_PULSE_DOTENV_KEEP").as_deref(),
            Ok("from-env")
        );
    }

    #[test]
    fn test_dotenv_missing_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_dotenv(dir.path()).is_none());
    }

    #[test]
    fn test_env_rejects_invalid_port() {
        let mut config = Config::default();
        assert!(config.apply_env_from(env(&[("PORT", "eighty")])).is_err());
    }

    #[test]
    fn test_validate_requires_token() {
        let mut config = Config::default();
        config.github.organizations = vec!["acme".to_string()];

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("token"));
    }

    #[test]
    fn test_validate_requires_organizations() {
        let mut config = Config::default();
        config.github.token = Some("ghp".to_string());
        config.github.organizations = vec![" ".to_string()];

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("organization"));
    }

    #[test]
    fn test_validate_dedups_organizations() {
        let mut config = Config::default();
        config.github.token = Some("ghp".to_string());
        config.github.organizations = vec!["acme".into(), " acme ".into(), "globex".into()];

        config.validate().unwrap();
        assert_eq!(config.github.organizations, vec!["acme", "globex"]);
    }

    #[test]
    fn test_validate_rejects_unknown_timezone() {
        let mut config = Config::default();
        config.github.token = Some("ghp".to_string());
        config.github.organizations = vec!["acme".to_string()];
        config.timezone = Some("Mars/Olympus".to_string());

        assert!(config.validate().is_err());
    }
}
