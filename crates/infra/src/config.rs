//! Layered application configuration.
//!
//! Sources, later ones overriding earlier ones:
//! 1. built-in defaults
//! 2. `config/default.{toml,...}` (optional)
//! 3. `config/{RUN_MODE}` (optional, `RUN_MODE` defaults to `development`)
//! 4. `STOCKROOM__*` environment variables, `__` separating sections
//!    (e.g. `STOCKROOM__SERVER__PORT=9000`, `STOCKROOM__STORE__BACKEND=postgres`)

use std::env;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use stockroom_catalog::StockThresholds;
use stockroom_observability::LogFormat;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub stock: StockConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            database_url: None,
            max_connections: 10,
            acquire_timeout_secs: 5,
        }
    }
}

impl StoreConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

#[derive(Debug, Copy, Clone, Deserialize)]
#[serde(default)]
pub struct StockConfig {
    pub low_threshold: u64,
    pub critical_threshold: u64,
}

impl Default for StockConfig {
    fn default() -> Self {
        let defaults = StockThresholds::default();
        Self {
            low_threshold: defaults.low,
            critical_threshold: defaults.critical,
        }
    }
}

impl StockConfig {
    pub fn thresholds(&self) -> StockThresholds {
        StockThresholds {
            low: self.low_threshold,
            critical: self.critical_threshold,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub format: LogFormat,
}

impl AppConfig {
    /// Load from config files and the environment, then validate.
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(
                config::Environment::with_prefix("STOCKROOM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.backend == StoreBackend::Postgres
            && self.store.database_url.as_deref().is_none_or(|url| url.trim().is_empty())
        {
            return Err(ConfigError::Invalid(
                "store.database_url is required for the postgres backend".to_string(),
            ));
        }
        if self.store.max_connections == 0 {
            return Err(ConfigError::Invalid("store.max_connections must be positive".to_string()));
        }
        if self.stock.critical_threshold > self.stock.low_threshold {
            return Err(ConfigError::Invalid(format!(
                "stock.critical_threshold ({}) exceeds stock.low_threshold ({})",
                self.stock.critical_threshold, self.stock.low_threshold
            )));
        }
        Ok(())
    }
}
