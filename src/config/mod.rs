use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Signing secret for bearer tokens. Required; there is no built-in default.
    #[serde(default)]
    pub jwt_secret: Option<String>,
    /// Token lifetime in seconds
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_secs: default_token_ttl_secs(),
        }
    }
}

fn default_token_ttl_secs() -> u64 {
    3600
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Optional entry TTL in seconds. Unset means entries live until invalidated.
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
    /// Interval between expired-entry sweeps in seconds (only runs with a TTL set)
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: None,
            cleanup_interval: default_cleanup_interval(),
        }
    }
}

fn default_cleanup_interval() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| "Failed to parse configuration file")?;
            Ok(config)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            cache: CacheConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Check that all required settings are present. Called once at startup so
    /// a missing token secret aborts the process instead of surfacing later.
    pub fn validate(&self) -> Result<()> {
        match self.auth.jwt_secret.as_deref() {
            Some(secret) if !secret.is_empty() => Ok(()),
            _ => bail!(
                "auth.jwt_secret is not configured; set it in the config file or via TASKR_JWT_SECRET"
            ),
        }
    }
}
