//! Handles settings for the application. Configuration is read from an
//! optional `settings.toml`, then overridden by `FAMONEY__*` environment
//! variables (`FAMONEY__SERVER__PORT=9000`).
//!
//! See `settings.toml` for an example.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: String,
    pub port: u16,
    pub database: Database,
    pub default_base: String,
}

#[derive(Debug, Deserialize)]
pub struct Engine {
    pub store_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Rates {
    /// exchangerate-api.com key. Without it rates are never refreshed.
    pub api_key: Option<String>,
    pub reference: String,
    pub refresh_hours: u64,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Server,
    pub engine: Engine,
    pub rates: Rates,
}

impl Settings {
    /// Load `path` (extension optional, file optional) and the environment.
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        Self::from_config(
            Config::builder()
                .add_source(File::with_name(path).required(false))
                .add_source(
                    Environment::with_prefix("FAMONEY")
                        .prefix_separator("__")
                        .separator("__")
                        .try_parsing(true),
                ),
        )
    }

    fn from_config(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        builder
            .set_default("app.level", "info")?
            .set_default("server.bind", "127.0.0.1")?
            .set_default("server.port", 8295)?
            .set_default("server.database", "memory")?
            .set_default("server.default_base", "CNY")?
            .set_default("engine.store_timeout_ms", 5000)?
            .set_default("rates.reference", "USD")?
            .set_default("rates.refresh_hours", 12)?
            .build()?
            .try_deserialize()
    }
}
