//! # configs
//!
//! Layered configuration for both binaries.
//!
//! Sources, later ones win:
//! 1. built-in defaults,
//! 2. `config/gido.toml` (or the path in `GIDO_CONFIG`), optional,
//! 3. environment variables such as `GIDO__SUPPORT__WEBHOOK_URL`.
//!
//! A `.env` file is loaded into the environment first.

pub mod telemetry;

use std::env;

use config::{Config, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

const DEFAULT_CONFIG_PATH: &str = "config/gido";
const ENV_PREFIX: &str = "GIDO";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("missing required setting `{0}`")]
    Missing(&'static str),
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub support: SupportConfig,
    pub status: StatusConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Take the client address from `X-Forwarded-For` (behind a proxy).
    pub trust_forwarded_for: bool,
    pub static_dir: String,
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SupportConfig {
    pub webhook_url: Option<SecretString>,
    pub abuse_webhook_url: Option<SecretString>,
    pub mention_role_id: Option<u64>,
    pub ban_list: Vec<String>,
    /// When set, this variable is re-read on every ban check.
    pub ban_list_env: Option<String>,
    pub ban_contact_url: String,
    pub debounce_minutes: i64,
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct StatusConfig {
    pub bot_token: Option<SecretString>,
    pub display_name: String,
    pub watched_user_id: Option<u64>,
    pub bot_status_channel_id: Option<u64>,
    pub bot_status_message_id: Option<u64>,
    pub website_status_channel_id: Option<u64>,
    pub website_status_message_id: Option<u64>,
    pub ping_channel_id: Option<u64>,
    pub ping_role_id: Option<u64>,
    pub website_url: Option<String>,
    pub poll_interval_secs: u64,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Used when `RUST_LOG` is not set.
    pub filter: String,
}

impl AppConfig {
    /// Loads `.env`, then the config file and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }
        let path = env::var("GIDO_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::from_file(&path)
    }

    /// Same as [`AppConfig::load`] without touching `.env`.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = with_defaults(Config::builder())?
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator("/")
                    .with_list_parse_key("support.ban_list")
                    .with_list_parse_key("server.allowed_origins"),
            )
            .build()?;
        Ok(config.try_deserialize()?)
    }
}

fn with_defaults(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
    Ok(builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("server.trust_forwarded_for", true)?
        .set_default("server.static_dir", "main-web")?
        .set_default("server.allowed_origins", Vec::<String>::new())?
        .set_default("support.ban_list", Vec::<String>::new())?
        .set_default("support.ban_contact_url", "https://discord.gg/Gq48UpPrXH")?
        .set_default("support.debounce_minutes", 60)?
        .set_default("support.sweep_interval_secs", 600)?
        .set_default("status.display_name", "Gido")?
        .set_default("status.poll_interval_secs", 60)?
        .set_default("status.port", 8081)?
        .set_default("log.format", "pretty")?
        .set_default("log.filter", "info")?)
}

/// Unwraps an optional setting that a particular binary cannot run without.
pub fn required<T>(value: Option<T>, key: &'static str) -> Result<T, ConfigError> {
    value.ok_or(ConfigError::Missing(key))
}
