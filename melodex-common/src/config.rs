//! Bootstrap configuration loading
//!
//! Resolution priority for every value:
//! 1. Command-line argument (applied by the binary)
//! 2. Environment variable (`MELODEX_*`)
//! 3. TOML config file
//! 4. Built-in default
//!
//! A missing config file is not an error: a warning is logged and defaults
//! are used. Secrets (catalog client credentials, completion API key) are
//! normally supplied through the environment.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const ENV_BIND_ADDR: &str = "MELODEX_BIND_ADDR";
pub const ENV_DATABASE: &str = "MELODEX_DATABASE";
pub const ENV_ENVIRONMENT: &str = "MELODEX_ENV";
pub const ENV_LOG_LEVEL: &str = "MELODEX_LOG_LEVEL";
pub const ENV_SPOTIFY_CLIENT_ID: &str = "MELODEX_SPOTIFY_CLIENT_ID";
pub const ENV_SPOTIFY_CLIENT_SECRET: &str = "MELODEX_SPOTIFY_CLIENT_SECRET";
pub const ENV_OPENAI_API_KEY: &str = "MELODEX_OPENAI_API_KEY";
pub const ENV_OPENAI_MODEL: &str = "MELODEX_OPENAI_MODEL";

/// Deployment environment
///
/// Controls whether upstream error details are exposed in HTTP responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    pub fn is_development(self) -> bool {
        self == Environment::Development
    }
}

impl std::str::FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(Error::Config(format!("Unknown environment: {}", other))),
        }
    }
}

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// SQLite database file. Defaults to the platform data directory.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default)]
    pub environment: Environment,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            database_path: None,
            environment: Environment::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
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

/// Music catalog (Spotify Web API) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_catalog_api_url")]
    pub api_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Reuse the bearer token until shortly before it expires
    #[serde(default = "default_true")]
    pub cache_token: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            token_url: default_token_url(),
            api_url: default_catalog_api_url(),
            timeout_secs: default_timeout_secs(),
            cache_token: true,
        }
    }
}

/// Language-model completion (OpenAI) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_completion_api_url")]
    pub api_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            api_url: default_completion_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_bind_addr() -> String {
    "127.0.0.1:5780".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_token_url() -> String {
    "https://accounts.spotify.com/api/token".to_string()
}

fn default_catalog_api_url() -> String {
    "https://api.spotify.com/v1".to_string()
}

fn default_completion_api_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

impl TomlConfig {
    /// Load configuration from a TOML file
    ///
    /// A missing file yields defaults; a malformed file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Config file not found at {} - using built-in defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: TomlConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply `MELODEX_*` environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source
    ///
    /// Blank values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(addr) = get(ENV_BIND_ADDR) {
            self.server.bind_addr = addr;
        }
        if let Some(path) = get(ENV_DATABASE) {
            self.server.database_path = Some(PathBuf::from(path));
        }
        if let Some(env) = get(ENV_ENVIRONMENT) {
            self.server.environment = env.parse()?;
        }
        if let Some(level) = get(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
        if let Some(id) = get(ENV_SPOTIFY_CLIENT_ID) {
            self.catalog.client_id = Some(id);
        }
        if let Some(secret) = get(ENV_SPOTIFY_CLIENT_SECRET) {
            self.catalog.client_secret = Some(secret);
        }
        if let Some(key) = get(ENV_OPENAI_API_KEY) {
            self.completion.api_key = Some(key);
        }
        if let Some(model) = get(ENV_OPENAI_MODEL) {
            self.completion.model = model;
        }

        Ok(())
    }

    /// Database path, falling back to the platform default
    pub fn database_path(&self) -> PathBuf {
        self.server
            .database_path
            .clone()
            .unwrap_or_else(default_database_path)
    }
}

/// Default config file location: `<config_dir>/melodex/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("melodex").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("melodex.toml"))
}

/// Default database location: `<data_local_dir>/melodex/melodex.db`
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("melodex"))
        .unwrap_or_else(|| PathBuf::from("./melodex_data"))
        .join("melodex.db")
}
