//! Configuration file support for arxiv-fetch.
//!
//! # Configuration File Format
//!
//! ```toml
//! [client]
//! page_size = 100
//! delay_seconds = 3.0
//! num_retries = 3
//! api_url = "https://export.arxiv.org/api/query"
//! feed_url = "https://rss.arxiv.org"
//! timeout_secs = 30
//!
//! [logging]
//! level = "info"
//! format = "text"
//! ```

use std::path::{Path, PathBuf};

use super::Config;

/// File name looked up in the working directory
const LOCAL_FILE_NAME: &str = "arxiv-fetch.toml";

impl Config {
    /// Load configuration from a TOML file, without environment overrides
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save configuration to a TOML file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigFileError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Per-user configuration file, e.g. `~/.config/arxiv-fetch/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("arxiv-fetch").join("config.toml"))
}

/// First existing configuration file: `./arxiv-fetch.toml`, then the per-user file
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }
    default_config_path().filter(|path| path.is_file())
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
