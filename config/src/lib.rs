//! # Configuration Management for RowHaus
//!
//! This crate provides centralized configuration structures for all RowHaus components,
//! including database, cache, and bulk-loading settings.
//!
//! ## Quick Start
//!
//! ### Programmatic Configuration
//! ```rust
//! use config::{BulkConfig, CacheConfig, DatabaseConfig};
//!
//! let db_config = DatabaseConfig::new(
//!     "localhost".to_string(), 5432, "myapp".to_string(),
//!     "postgres".to_string(), "password".to_string(),
//!     1, 10, 30, 600, 3600,
//! );
//!
//! let cache_config = CacheConfig::memory(100_000, 1000);
//! let bulk_config = BulkConfig::default();
//! ```
//!
//! ### TOML File Configuration
//! ```toml
//! [database]
//! host = "localhost"
//! port = 5432
//! database = "myapp"
//! username = "postgres"
//! password = "password"
//! min_connections = 1
//! max_connections = 10
//! connection_timeout_seconds = 30
//! idle_timeout_seconds = 600
//! max_lifetime_seconds = 3600
//! reconnect_attempts = 5
//! reconnect_delay_ms = 1000
//!
//! [cache]
//! backend = "redis"
//! redis_url = "redis://localhost:6379"
//! default_ttl = 1000
//! key_prefix = "rowhaus"
//! connection_timeout_ms = 3000
//!
//! [bulk]
//! block_size = 3000
//! ```
//!
//! Load configuration:
//! ```rust,no_run
//! use config::AppConfig;
//!
//! // Load from rowhaus.toml (or the path in ROWHAUS_CONFIG)
//! let config = AppConfig::load()?;
//!
//! // Or load from custom path
//! let config = AppConfig::from_file("config/production.toml")?;
//! # Ok::<(), config::ConfigError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::{env, path::Path};
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "./rowhaus.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Dotenvy error: {0}")]
    Dotenvy(#[from] dotenvy::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub bulk: BulkConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub min_connections: u32,
    pub max_connections: u32,
    pub connection_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
    pub max_lifetime_seconds: u64,
    /// Extra connection attempts after the first one fails
    #[serde(default = "default_reconnect_attempts")]
    pub reconnect_attempts: u32,
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

/// Which store backs the select cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Redis,
    #[default]
    Memory,
    Disabled,
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,
    #[serde(default)]
    pub redis_url: String,
    /// Seconds a cached row stays valid
    #[serde(default = "default_ttl")]
    pub default_ttl: u64,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Entry bound for the in-process backend
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,
}

/// Bulk engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkConfig {
    /// Maximum rows rendered into one statement
    #[serde(default = "default_block_size")]
    pub block_size: usize,
}

fn default_reconnect_attempts() -> u32 {
    5
}

fn default_reconnect_delay_ms() -> u64 {
    1000
}

fn default_ttl() -> u64 {
    1000
}

fn default_key_prefix() -> String {
    "rowhaus".to_string()
}

fn default_max_entries() -> usize {
    100_000
}

fn default_connection_timeout_ms() -> u64 {
    3000
}

fn default_block_size() -> usize {
    3000
}

impl AppConfig {
    /// Load configuration from TOML file specified in .env or defaults
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env file is fine; the variable may come from the process
        match dotenvy::dotenv() {
            Ok(_) => {}
            Err(e) if e.not_found() => {}
            Err(e) => return Err(e.into()),
        }

        if let Ok(config_path) = env::var("ROWHAUS_CONFIG") {
            Self::from_file(&config_path)
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::from_file(DEFAULT_CONFIG_PATH)
        } else {
            Err(ConfigError::Invalid(format!(
                "Config path must be specified in .env file as ROWHAUS_CONFIG or in {} file",
                DEFAULT_CONFIG_PATH
            )))
        }
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<(), ConfigError> {
        let db = &self.database;
        let cache = &self.cache;
        let caching = cache.backend != CacheBackend::Disabled;

        let rules = [
            (db.host.is_empty(), "database.host is empty"),
            (db.port == 0, "database.port is zero"),
            (db.database.is_empty(), "database.database is empty"),
            (db.username.is_empty(), "database.username is empty"),
            (db.min_connections == 0, "database.min_connections is zero"),
            (db.max_connections == 0, "database.max_connections is zero"),
            (
                db.min_connections > db.max_connections,
                "database.min_connections exceeds max_connections",
            ),
            (
                db.connection_timeout_seconds == 0,
                "database.connection_timeout_seconds is zero",
            ),
            (
                cache.backend == CacheBackend::Redis && cache.redis_url.is_empty(),
                "cache.redis_url is empty for the redis backend",
            ),
            (
                cache.backend == CacheBackend::Memory && cache.max_entries == 0,
                "cache.max_entries is zero for the memory backend",
            ),
            (caching && cache.default_ttl == 0, "cache.default_ttl is zero"),
            (self.bulk.block_size == 0, "bulk.block_size is zero"),
        ];

        match rules.iter().find(|(failed, _)| *failed) {
            Some((_, message)) => Err(ConfigError::Invalid(message.to_string())),
            None => Ok(()),
        }
    }
}

impl CacheConfig {
    /// Create a Redis-backed cache configuration
    pub fn redis(redis_url: String, default_ttl: u64, key_prefix: String) -> Self {
        Self {
            backend: CacheBackend::Redis,
            redis_url,
            default_ttl,
            key_prefix,
            max_entries: default_max_entries(),
            connection_timeout_ms: default_connection_timeout_ms(),
        }
    }

    /// Create an in-process cache configuration
    pub fn memory(max_entries: usize, default_ttl: u64) -> Self {
        Self {
            backend: CacheBackend::Memory,
            max_entries,
            default_ttl,
            ..Self::default()
        }
    }

    pub fn with_connection_timeout(mut self, timeout_ms: u64) -> Self {
        self.connection_timeout_ms = timeout_ms;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            redis_url: String::new(),
            default_ttl: default_ttl(),
            key_prefix: default_key_prefix(),
            max_entries: default_max_entries(),
            connection_timeout_ms: default_connection_timeout_ms(),
        }
    }
}

impl BulkConfig {
    pub fn new(block_size: usize) -> Self {
        Self { block_size }
    }
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            block_size: default_block_size(),
        }
    }
}

impl DatabaseConfig {
    /// Create a new database configuration
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        host: String,
        port: u16,
        database: String,
        username: String,
        password: String,
        min_connections: u32,
        max_connections: u32,
        connection_timeout_seconds: u64,
        idle_timeout_seconds: u64,
        max_lifetime_seconds: u64,
    ) -> Self {
        Self {
            host,
            port,
            database,
            username,
            password,
            min_connections,
            max_connections,
            connection_timeout_seconds,
            idle_timeout_seconds,
            max_lifetime_seconds,
            reconnect_attempts: default_reconnect_attempts(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }

    pub fn with_reconnect(mut self, attempts: u32, delay_ms: u64) -> Self {
        self.reconnect_attempts = attempts;
        self.reconnect_delay_ms = delay_ms;
        self
    }

    /// Build connection string
    pub fn connection_string(&self) -> String {
        format!(
            "postgresql://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }
}
