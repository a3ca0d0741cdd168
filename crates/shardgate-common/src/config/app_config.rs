//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when present).

use serde::Deserialize;
use shardgate_core::{Intents, Token};
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub bot: BotConfig,
    pub api: ApiConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Bot credentials and subscriptions
#[derive(Clone, Deserialize)]
pub struct BotConfig {
    pub app_id: u64,
    pub token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Intents requested on top of the ones derived from registered handlers
    #[serde(default)]
    pub intents: Intents,
}

impl BotConfig {
    /// Credentials for the gateway handshake and HTTP API
    #[must_use]
    pub fn token(&self) -> Token {
        Token::bot(self.app_id, self.token.clone()).with_type(self.token_type.clone())
    }
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("app_id", &self.app_id)
            .field("token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("intents", &self.intents)
            .finish()
    }
}

/// Bootstrap HTTP API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_timeout_ms")]
    pub timeout_ms: u64,
}

impl ApiConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Gateway connection tuning
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Overrides the shard count recommended by the gateway endpoint
    #[serde(default)]
    pub shard_count: Option<u32>,
    #[serde(default = "default_frame_queue_capacity")]
    pub frame_queue_capacity: usize,
    /// Heartbeat period used until the server sends Hello
    #[serde(default = "default_heartbeat_ms")]
    pub default_heartbeat_ms: u64,
    /// Concurrency window used to pace session starts
    #[serde(default = "default_concurrency_window_secs")]
    pub concurrency_window_secs: u64,
    /// Close codes after which the credential can never reconnect
    #[serde(default = "default_fatal_close_codes")]
    pub fatal_close_codes: Vec<u16>,
    /// Close codes after which the session must identify again
    #[serde(default = "default_reidentify_close_codes")]
    pub reidentify_close_codes: Vec<u16>,
}

impl GatewayConfig {
    #[must_use]
    pub fn default_heartbeat(&self) -> Duration {
        Duration::from_millis(self.default_heartbeat_ms)
    }

    #[must_use]
    pub fn concurrency_window(&self) -> Duration {
        Duration::from_secs(self.concurrency_window_secs)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            shard_count: None,
            frame_queue_capacity: default_frame_queue_capacity(),
            default_heartbeat_ms: default_heartbeat_ms(),
            concurrency_window_secs: default_concurrency_window_secs(),
            fatal_close_codes: default_fatal_close_codes(),
            reidentify_close_codes: default_reidentify_close_codes(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "shardgate".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_token_type() -> String {
    Token::BOT_TYPE.to_string()
}

fn default_api_base_url() -> String {
    "https://api.sgroup.qq.com".to_string()
}

fn default_api_timeout_ms() -> u64 {
    3000
}

fn default_frame_queue_capacity() -> usize {
    2000
}

fn default_heartbeat_ms() -> u64 {
    60_000
}

fn default_concurrency_window_secs() -> u64 {
    2
}

fn default_fatal_close_codes() -> Vec<u16> {
    vec![4914, 4915]
}

fn default_reidentify_close_codes() -> Vec<u16> {
    vec![4006, 4007]
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env: lookup("APP_ENV")
                    .and_then(|s| match s.to_lowercase().as_str() {
                        "production" => Some(Environment::Production),
                        "staging" => Some(Environment::Staging),
                        "development" => Some(Environment::Development),
                        _ => None,
                    })
                    .unwrap_or_default(),
            },
            bot: BotConfig {
                app_id: parse_var(&lookup, "BOT_APP_ID")?
                    .ok_or(ConfigError::MissingVar("BOT_APP_ID"))?,
                token: lookup("BOT_TOKEN")
                    .filter(|s| !s.trim().is_empty())
                    .ok_or(ConfigError::MissingVar("BOT_TOKEN"))?,
                token_type: lookup("BOT_TOKEN_TYPE").unwrap_or_else(default_token_type),
                intents: parse_var(&lookup, "BOT_INTENTS")?.unwrap_or_default(),
            },
            api: ApiConfig {
                base_url: lookup("API_BASE_URL")
                    .map(|s| s.trim_end_matches('/').to_string())
                    .unwrap_or_else(default_api_base_url),
                timeout_ms: parse_var(&lookup, "API_TIMEOUT_MS")?
                    .unwrap_or_else(default_api_timeout_ms),
            },
            gateway: GatewayConfig {
                shard_count: parse_var(&lookup, "GATEWAY_SHARD_COUNT")?,
                frame_queue_capacity: parse_var(&lookup, "GATEWAY_FRAME_QUEUE_CAPACITY")?
                    .unwrap_or_else(default_frame_queue_capacity),
                default_heartbeat_ms: parse_var(&lookup, "GATEWAY_DEFAULT_HEARTBEAT_MS")?
                    .unwrap_or_else(default_heartbeat_ms),
                concurrency_window_secs: parse_var(&lookup, "GATEWAY_CONCURRENCY_WINDOW_SECS")?
                    .unwrap_or_else(default_concurrency_window_secs),
                fatal_close_codes: parse_code_list(&lookup, "GATEWAY_FATAL_CLOSE_CODES")?
                    .unwrap_or_else(default_fatal_close_codes),
                reidentify_close_codes: parse_code_list(&lookup, "GATEWAY_REIDENTIFY_CLOSE_CODES")?
                    .unwrap_or_else(default_reidentify_close_codes),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.gateway.shard_count == Some(0) {
            return Err(ConfigError::InvalidValue("GATEWAY_SHARD_COUNT", "0".to_string()));
        }
        if self.gateway.frame_queue_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "GATEWAY_FRAME_QUEUE_CAPACITY",
                "0".to_string(),
            ));
        }
        if self.gateway.default_heartbeat_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "GATEWAY_DEFAULT_HEARTBEAT_MS",
                "0".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue(key, format!("{raw}: {e}"))),
    }
}

fn parse_code_list<F>(lookup: &F, key: &'static str) -> Result<Option<Vec<u16>>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };

    raw.split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(|code| {
            code.parse::<u16>()
                .map_err(|_| ConfigError::InvalidValue(key, code.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
