use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::pagination::DEFAULT_PAGE_SIZE;

/// Public GitHub REST endpoint
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Main configuration structure for commitmark
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    /// GitHub API and authentication settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// Local persistence settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// GitHub configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GitHubConfig {
    /// REST API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Authentication method
    #[serde(default = "default_auth_method")]
    pub auth_method: String, // "auto", "token", "gh_cli", "none"

    /// Personal access token (takes precedence over GITHUB_TOKEN in "auto")
    #[serde(default)]
    pub token: Option<String>,

    /// Username used when a command does not name one
    #[serde(default)]
    pub username: Option<String>,

    /// Commits per page
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

/// Storage configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    /// SQLite file holding favorites and UI selections
    #[serde(default = "default_state_db")]
    pub state_db: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String, // "info"

    /// Log format
    #[serde(default = "default_log_format")]
    pub format: String, // "compact", "full"

    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,
}

// Default value functions
fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}
fn default_auth_method() -> String {
    "auto".to_string()
}
fn default_per_page() -> u32 {
    DEFAULT_PAGE_SIZE
}
fn default_timeout() -> u64 {
    30
}
fn default_true() -> bool {
    true
}
fn default_state_db() -> String {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        format!("{}/commitmark/state.db", data_home)
    } else if let Ok(home) = std::env::var("HOME") {
        format!("{}/.local/share/commitmark/state.db", home)
    } else {
        "/tmp/commitmark-state.db".to_string()
    }
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "compact".to_string()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            auth_method: default_auth_method(),
            token: None,
            username: None,
            per_page: default_per_page(),
            timeout: default_timeout(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_db: default_state_db(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            color: default_true(),
        }
    }
}

impl Config {
    /// Load configuration from the default location or create a default config
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            let mut config = Self::default();

            // Create config directory if it doesn't exist
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
            }

            config.save(&config_path)?;

            tracing::info!("Created default configuration at: {:?}", config_path);

            config.finalize()?;
            Ok(config)
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        config.finalize()?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("commitmark").join("config.yml"))
    }

    fn finalize(&mut self) -> Result<()> {
        self.apply_env_overrides();
        self.expand_paths()?;
        self.github.api_base = self.github.api_base.trim_end_matches('/').to_string();
        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(api_base) = std::env::var("GITHUB_API_BASE") {
            if !api_base.is_empty() {
                self.github.api_base = api_base;
            }
        }
    }

    /// Expand environment variables in configuration paths
    pub fn expand_paths(&mut self) -> Result<()> {
        self.storage.state_db = shellexpand::full(&self.storage.state_db)
            .context("Failed to expand state_db path")?
            .into_owned();

        Ok(())
    }

    pub fn state_db_path(&self) -> PathBuf {
        PathBuf::from(&self.storage.state_db)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.github.timeout)
    }
}
