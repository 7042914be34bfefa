use crate::error::Result;
use crate::service::unit_policy::TrailingTokenPolicy;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub parser: TrailingTokenPolicy,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    /// Statements slower than this are logged at WARN.
    pub slow_statement_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `mercuriale_pricecheck=debug`.
    pub filter: String,
    pub timestamp_format: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/mercuriale".to_string(),
            max_connections: 20,
            acquire_timeout_secs: 10,
            slow_statement_secs: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            timestamp_format: "%Y-%m-%d %H:%M:%S".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from `mercuriale.toml` (optional) and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Layering: defaults, then the file, then `MERCURIALE__SECTION__KEY`
    /// variables, then `DATABASE_URL`.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);

        builder = match path {
            Some(p) => builder.add_source(File::from(p)),
            None => builder.add_source(File::with_name("mercuriale").required(false)),
        };

        builder = builder.add_source(
            Environment::with_prefix("MERCURIALE")
                .separator("__")
                .try_parsing(true),
        );

        if let Ok(url) = std::env::var("DATABASE_URL") {
            builder = builder.set_override("database.url", url)?;
        }

        Ok(builder.build()?.try_deserialize()?)
    }
}
