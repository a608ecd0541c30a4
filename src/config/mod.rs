use anyhow::{Context, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::Error;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub poller: PollerConfig,
}

/// API server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// API server address
    #[serde(default = "default_address")]
    pub address: String,
    /// API server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database URL
    #[serde(default = "default_db_url")]
    pub url: String,
    /// Connection pool max size
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Automatic migration on startup
    #[serde(default = "default_auto_migrate")]
    pub auto_migrate: bool,
}

fn default_db_url() -> String {
    "sqlite://ai_guard.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_auto_migrate() -> bool {
    true
}

/// Event log configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventsConfig {
    /// Offset from UTC, in minutes, that defines the store's calendar day
    #[serde(default)]
    pub utc_offset_minutes: i32,
    /// Default batch size for `/events/since/{last_id}`
    #[serde(default = "default_since_limit")]
    pub since_limit_default: i64,
    /// Upper bound for `/events/since/{last_id}` batches
    #[serde(default = "default_since_limit_max")]
    pub since_limit_max: i64,
}

fn default_since_limit() -> i64 {
    100
}

fn default_since_limit_max() -> i64 {
    1000
}

impl EventsConfig {
    /// Resolve the configured offset into a chrono time zone
    pub fn time_zone(&self) -> Result<FixedOffset, Error> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                Error::Config(format!(
                    "utc_offset_minutes out of range: {}",
                    self.utc_offset_minutes
                ))
            })
    }
}

/// Notification poller configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollerConfig {
    /// Base URL of the event server the observer polls
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Delay between the end of one poll and the start of the next
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// How long a notification stays on the board
    #[serde(default = "default_display_ms")]
    pub display_ms: u64,
    /// Maximum number of records fetched per poll
    #[serde(default = "default_batch_limit")]
    pub batch_limit: i64,
    /// HTTP request timeout for remote feeds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_server_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_display_ms() -> u64 {
    3000
}

fn default_batch_limit() -> i64 {
    100
}

fn default_request_timeout_ms() -> u64 {
    2000
}

impl PollerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn display_duration(&self) -> Duration {
        Duration::from_millis(self.display_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_db_url(),
            max_connections: default_max_connections(),
            auto_migrate: default_auto_migrate(),
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            since_limit_default: default_since_limit(),
            since_limit_max: default_since_limit_max(),
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            interval_ms: default_interval_ms(),
            display_ms: default_display_ms(),
            batch_limit: default_batch_limit(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Load configuration from a file or use default
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(path) => {
            let config_str = std::fs::read_to_string(path)
                .context(format!("Failed to read config file: {:?}", path))?;

            let config = if path.extension().map_or(false, |ext| ext == "json") {
                serde_json::from_str(&config_str).context("Failed to parse JSON config")?
            } else if path.extension().map_or(false, |ext| ext == "toml") {
                toml::from_str(&config_str).context("Failed to parse TOML config")?
            } else {
                return Err(anyhow::anyhow!("Unsupported config file format"));
            };

            Ok(config)
        }
        None => Ok(Config::default()),
    }
}

/// Load configuration from `AI_GUARD_CONFIG` (if set) and apply environment overrides
pub fn load_from_env() -> Result<Config> {
    let path = std::env::var_os("AI_GUARD_CONFIG");
    let mut config = load_config(path.as_deref().map(Path::new))?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

/// Apply `DATABASE_URL` and `PORT` on top of a loaded configuration
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("DATABASE_URL") {
        config.database.url = url;
    }

    if let Some(port) = lookup("PORT") {
        config.api.port = port
            .parse()
            .context(format!("Invalid PORT value: {}", port))?;
    }

    Ok(())
}
