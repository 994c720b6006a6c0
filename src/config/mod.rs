//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::catalog::DedupRules;
use crate::parse_duration;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    #[default]
    Sqlite,
}

/// Stats store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// `sqlite://` URL. When unset the database lives in the data dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            database_url: None,
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSourceKind {
    #[default]
    Jsonl,
    Http,
}

/// Catalog source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub source: CatalogSourceKind,

    /// Directory of `{collection}.jsonl` files. Defaults to `{data_dir}/catalog`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// Base URL of the catalog service, required for the http source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// How long a cached catalog stays fresh, e.g. "24h". Empty disables the cache.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: String,
}

fn default_timeout() -> u64 {
    10
}

fn default_cache_ttl() -> String {
    "24h".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            source: CatalogSourceKind::default(),
            dir: None,
            base_url: None,
            timeout_seconds: default_timeout(),
            cache_ttl: default_cache_ttl(),
        }
    }
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// `None` when caching is disabled.
    pub fn cache_ttl(&self) -> Option<Duration> {
        if self.cache_ttl.trim().is_empty() {
            return None;
        }
        parse_duration(&self.cache_ttl)
    }
}

/// Leaderboard limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

fn default_limit() -> usize {
    crate::stats::leaderboard::DEFAULT_LIMIT
}

fn default_max_limit() -> usize {
    100
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub dedup: DedupRules,

    #[serde(default)]
    pub leaderboard: LeaderboardConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            catalog: CatalogConfig::default(),
            dedup: DedupRules::default(),
            leaderboard: LeaderboardConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`AppConfig::from_file`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        if self.store.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "Store max_connections must be greater than 0".to_string(),
            ));
        }

        if self.catalog.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "Catalog timeout must be greater than 0".to_string(),
            ));
        }

        if !self.catalog.cache_ttl.trim().is_empty() && self.catalog.cache_ttl().is_none() {
            return Err(ConfigError::ValidationError(format!(
                "Invalid catalog cache_ttl: {}",
                self.catalog.cache_ttl
            )));
        }

        if self.catalog.source == CatalogSourceKind::Http {
            match &self.catalog.base_url {
                None => {
                    return Err(ConfigError::ValidationError(
                        "catalog.base_url is required for the http source".to_string(),
                    ))
                }
                Some(raw) => {
                    url::Url::parse(raw).map_err(|e| {
                        ConfigError::ValidationError(format!("Invalid catalog.base_url: {}", e))
                    })?;
                }
            }
        }

        if self.leaderboard.default_limit == 0 || self.leaderboard.max_limit == 0 {
            return Err(ConfigError::ValidationError(
                "Leaderboard limits must be greater than 0".to_string(),
            ));
        }

        if self.leaderboard.default_limit > self.leaderboard.max_limit {
            return Err(ConfigError::ValidationError(
                "leaderboard.default_limit cannot exceed leaderboard.max_limit".to_string(),
            ));
        }

        Ok(())
    }
}
