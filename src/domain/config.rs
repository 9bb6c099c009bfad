//! # Configuration
//!
//! Manages the loading and parsing of the application's configuration files.
//! `config.yaml` holds the connection and system settings; the sticky poller keeps its own
//! file (`sticky.yaml`) so it can be re-read at runtime without touching the rest.

use crate::domain::error::RelayError;
use crate::domain::paths;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration structure.
/// Matches the layout of `data/config.yaml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub services: ServicesConfig,
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
    #[serde(default)]
    pub reporting: ReportingConfig,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, RelayError> {
        let content = fs::read_to_string(path)
            .map_err(|e| RelayError::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, RelayError> {
        serde_yaml::from_str(content).map_err(|e| RelayError::Config(format!("failed to parse YAML: {e}")))
    }

    pub fn is_admin(&self, user_id: &str) -> bool {
        self.system.admin.iter().any(|a| a == user_id)
    }
}

/// Configuration for the connected services.
#[derive(Debug, Deserialize, Clone)]
pub struct ServicesConfig {
    pub matrix: MatrixConfig,
    #[serde(default)]
    pub reddit: RedditConfig,
}

/// Specific configuration for the Matrix service.
#[derive(Debug, Deserialize, Clone)]
pub struct MatrixConfig {
    pub username: String,
    pub password: String,
    pub homeserver: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedditConfig {
    #[serde(default = "default_reddit_base")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            base_url: default_reddit_base(),
            user_agent: default_user_agent(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_reddit_base() -> String {
    "https://www.reddit.com".to_string()
}
fn default_user_agent() -> String {
    format!("herald/{}", env!("CARGO_PKG_VERSION"))
}
fn default_timeout() -> u64 {
    30
}

/// System-level settings for the bot.
#[derive(Debug, Deserialize, Clone)]
pub struct SystemConfig {
    #[serde(default)]
    pub admin: Vec<String>,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            admin: Vec::new(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(paths::DEFAULT_DATA_DIR)
}

#[derive(Debug, Deserialize, Clone)]
pub struct CommandsConfig {
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            cache_ttl_seconds: default_cache_ttl(),
        }
    }
}

fn default_cache_ttl() -> u64 {
    300
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct ReportingConfig {
    #[serde(default)]
    pub webhook_url: Option<String>,
}

/// Sticky poller settings, loaded from `sticky.yaml`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PollerConfig {
    #[serde(default)]
    pub enabled: bool,
    pub poll_interval_seconds: u64,
    pub target_feed: String,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub suppress_cross_module_reposts: bool,
}

impl PollerConfig {
    pub fn load(path: &Path) -> Result<Self, RelayError> {
        let content = fs::read_to_string(path)
            .map_err(|e| RelayError::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, RelayError> {
        let mut config: Self = serde_yaml::from_str(content)
            .map_err(|e| RelayError::Config(format!("failed to parse poller config: {e}")))?;
        config.validate()?;
        // channels is an ordered set: keep the first occurrence of each
        let mut seen = std::collections::HashSet::new();
        config.channels.retain(|c| seen.insert(c.clone()));
        Ok(config)
    }

    fn validate(&self) -> Result<(), RelayError> {
        if self.poll_interval_seconds == 0 {
            return Err(RelayError::Config("poll_interval_seconds must be greater than 0".into()));
        }
        if self.target_feed.trim().is_empty() {
            return Err(RelayError::Config("target_feed must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_app_config_defaults() {
        let yaml = r#"
services:
  matrix:
    username: "@herald:example.org"
    password: "secret"
    homeserver: "https://example.org"
system:
  admin: ["@ops:example.org"]
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.services.reddit.base_url, "https://www.reddit.com");
        assert_eq!(config.services.reddit.timeout_seconds, 30);
        assert_eq!(config.system.data_dir, PathBuf::from("data"));
        assert_eq!(config.commands.cache_ttl_seconds, 300);
        assert!(config.reporting.webhook_url.is_none());
        assert!(config.is_admin("@ops:example.org"));
        assert!(!config.is_admin("@someone:example.org"));
    }

    #[test]
    fn test_poller_config_parse_and_dedup_channels() {
        let yaml = r#"
enabled: true
poll_interval_seconds: 60
target_feed: "news"
channels: ["!a:x", "!b:x", "!a:x"]
suppress_cross_module_reposts: true
"#;
        let config = PollerConfig::from_yaml(yaml).unwrap();
        assert!(config.enabled);
        assert_eq!(config.channels, vec!["!a:x".to_string(), "!b:x".to_string()]);
        assert!(config.suppress_cross_module_reposts);
    }

    #[test]
    fn test_poller_config_rejects_zero_interval() {
        let yaml = "poll_interval_seconds: 0\ntarget_feed: news\n";
        let err = PollerConfig::from_yaml(yaml).unwrap_err();
        assert_eq!(err.kind(), "config");
    }

    #[test]
    fn test_poller_config_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = PollerConfig::load(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(err.to_string().contains("nope.yaml"));
    }
}
