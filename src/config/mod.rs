//! Configuration management.
//!
//! Settings come from, lowest precedence first: built-in defaults, a TOML file
//! (see [`find_config_file`]), and `ARXIV_FETCH__<SECTION>__<KEY>` environment
//! variables, e.g. `ARXIV_FETCH__CLIENT__DELAY_SECONDS=5`.

mod file_config;

pub use file_config::{default_config_path, find_config_file, ConfigFileError};

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::models::MAX_PAGE_SIZE;
use crate::utils::DEFAULT_USER_AGENT;

/// Prefix of environment variable overrides
pub const ENV_PREFIX: &str = "ARXIV_FETCH";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Client settings
    #[serde(default)]
    pub client: ClientConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings of an arXiv [`Client`](crate::Client)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Results requested per API page (1 to 2000)
    pub page_size: usize,

    /// Minimum seconds between two requests
    pub delay_seconds: f64,

    /// Extra attempts for a failed page request
    pub num_retries: u32,

    /// Query API endpoint
    pub api_url: String,

    /// Base URL of the syndication feeds
    pub feed_url: String,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            delay_seconds: 3.0,
            num_retries: 3,
            api_url: "https://export.arxiv.org/api/query".to_string(),
            feed_url: "https://rss.arxiv.org".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    /// Set page size (clamped to 1..=2000)
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Set the delay between requests (negative values mean no delay)
    pub fn delay_seconds(mut self, seconds: f64) -> Self {
        self.delay_seconds = sanitize_delay(seconds);
        self
    }

    /// Set the number of retries
    pub fn num_retries(mut self, retries: u32) -> Self {
        self.num_retries = retries;
        self
    }

    /// Set the query API endpoint
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Set the feed base URL
    pub fn feed_url(mut self, url: impl Into<String>) -> Self {
        self.feed_url = url.into();
        self
    }

    /// Set the User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the request timeout
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Copy with every value brought into its valid range.
    pub fn normalized(self) -> Self {
        let page_size = self.page_size;
        let delay = self.delay_seconds;
        self.page_size(page_size).delay_seconds(delay)
    }

    /// Delay between requests
    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f64(sanitize_delay(self.delay_seconds)).unwrap_or(Duration::MAX)
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn sanitize_delay(seconds: f64) -> f64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level filter when `RUST_LOG` is unset
    pub level: String,

    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Load configuration from an optional file plus environment overrides
pub fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    build_config(path, config::Environment::with_prefix(ENV_PREFIX))
}

fn build_config(
    path: Option<&Path>,
    environment: config::Environment,
) -> Result<Config, config::ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            environment
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

/// Get the configuration from the default file location (if any) and environment
pub fn get_config() -> Result<Config, config::ConfigError> {
    let path = find_config_file();
    if let Some(path) = &path {
        tracing::info!("Using config file: {}", path.display());
    }
    load_config(path.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let mut map = config::Map::new();
        for (key, value) in vars {
            map.insert(key.to_string(), value.to_string());
        }
        config::Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.client.page_size, 100);
        assert_eq!(config.client.delay_seconds, 3.0);
        assert_eq!(config.client.num_retries, 3);
        assert_eq!(config.client.api_url, "https://export.arxiv.org/api/query");
        assert!(config.client.user_agent.starts_with("arxiv-fetch/"));
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_builder_clamps_values() {
        let config = ClientConfig::default()
            .page_size(50_000)
            .delay_seconds(-2.0);
        assert_eq!(config.page_size, MAX_PAGE_SIZE);
        assert_eq!(config.delay(), Duration::ZERO);

        assert_eq!(ClientConfig::default().page_size(0).page_size, 1);
        assert_eq!(ClientConfig::default().delay_seconds(f64::NAN).delay_seconds, 0.0);
    }

    #[test]
    fn test_huge_delay_saturates() {
        let config = ClientConfig::default().delay_seconds(1e20);
        assert_eq!(config.delay_seconds, 1e20);
        assert_eq!(config.delay(), Duration::MAX);
    }

    #[test]
    fn test_normalized() {
        let config = ClientConfig {
            page_size: 9000,
            delay_seconds: f64::INFINITY,
            ..Default::default()
        }
        .normalized();

        assert_eq!(config.page_size, MAX_PAGE_SIZE);
        assert_eq!(config.delay_seconds, 0.0);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("arxiv-fetch.toml");
        std::fs::write(
            &path,
            r#"
[client]
page_size = 500
delay_seconds = 0.5

[logging]
format = "json"
"#,
        )
        .unwrap();

        let config = build_config(Some(&path), env(&[])).unwrap();

        assert_eq!(config.client.page_size, 500);
        assert_eq!(config.client.delay_seconds, 0.5);
        assert_eq!(config.client.num_retries, 3);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("arxiv-fetch.toml");
        std::fs::write(&path, "[client]\nnum_retries = 1\n").unwrap();

        let config = build_config(
            Some(&path),
            env(&[
                ("ARXIV_FETCH__CLIENT__NUM_RETRIES", "7"),
                ("ARXIV_FETCH__LOGGING__LEVEL", "debug"),
            ]),
        )
        .unwrap();

        assert_eq!(config.client.num_retries, 7);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = build_config(Some(Path::new("/nonexistent/arxiv-fetch.toml")), env(&[]));
        assert!(result.is_err());
    }
}
