//! Configuration management for sitemap-validator
//!
//! Handles loading, saving, and validating configuration from TOML files.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Upper bound for `validator.sample_urls_count`
pub const MAX_SAMPLE_URLS: usize = 100;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Validator behaviour
    #[serde(default)]
    pub validator: ValidatorConfig,

    /// Input and transport restrictions
    #[serde(default)]
    pub security: SecurityConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// Validator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds, applied to each request individually
    #[serde(default = "default_http_timeout")]
    pub http_timeout: u64,

    /// Number of sitemap URLs probed for reachability
    #[serde(default = "default_sample_urls_count")]
    pub sample_urls_count: usize,

    /// Maximum number of probes in flight
    #[serde(default = "default_probe_concurrency")]
    pub probe_concurrency: usize,
}

/// Security configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Hosts that may be validated (empty = no restriction)
    #[serde(default)]
    pub allowed_hosts: Vec<String>,

    /// Hard ceiling for the sitemap body in bytes
    #[serde(default = "default_max_filesize")]
    pub max_filesize: u64,

    /// Verify TLS certificates
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for sitemap-validator files
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            http_timeout: default_http_timeout(),
            sample_urls_count: default_sample_urls_count(),
            probe_concurrency: default_probe_concurrency(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            allowed_hosts: Vec::new(),
            max_filesize: default_max_filesize(),
            verify_ssl: default_verify_ssl(),
        }
    }
}

impl ValidatorConfig {
    /// Per-request timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout)
    }
}

impl SecurityConfig {
    /// Whether `host` passes the allow-list
    pub fn is_host_allowed(&self, host: &str) -> bool {
        self.allowed_hosts.is_empty()
            || self
                .allowed_hosts
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(host))
    }
}

impl Config {
    /// Get the default base directory (<config dir>/sitemap-validator)
    pub fn default_base_dir() -> PathBuf {
        dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sitemap-validator")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("config.toml")
    }

    /// Initialize paths configuration
    fn init_paths(&mut self, base_dir: Option<PathBuf>) {
        let base = base_dir.unwrap_or_else(Self::default_base_dir);
        self.paths = PathsConfig {
            config_file: base.join("config.toml"),
            base_dir: base,
        };
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        let base = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        config.paths = PathsConfig {
            config_file: config_path.to_path_buf(),
            base_dir: base,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a base directory, falling back to defaults
    pub fn load_from(base_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = Config::default();
        config.init_paths(base_dir);

        if config.paths.config_file.exists() {
            debug!("Loading config from {:?}", config.paths.config_file);
            let content = std::fs::read_to_string(&config.paths.config_file)?;
            let mut loaded: Config = toml::from_str(&content)?;
            loaded.paths = config.paths;
            config = loaded;
        } else {
            debug!("No config file found, using defaults");
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.validator.user_agent.trim().is_empty() {
            return Err(Error::Config(
                "validator.user_agent must not be empty".to_string(),
            ));
        }

        if self.validator.http_timeout == 0 {
            return Err(Error::Config(
                "validator.http_timeout must be positive".to_string(),
            ));
        }

        if self.validator.sample_urls_count > MAX_SAMPLE_URLS {
            return Err(Error::Config(format!(
                "validator.sample_urls_count must be at most {}",
                MAX_SAMPLE_URLS
            )));
        }

        if self.validator.probe_concurrency == 0 {
            return Err(Error::Config(
                "validator.probe_concurrency must be at least 1".to_string(),
            ));
        }

        if self.security.max_filesize == 0 {
            return Err(Error::Config(
                "security.max_filesize must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
