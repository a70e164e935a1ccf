//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Environment variable that overrides `bot.token`.
pub const TOKEN_ENV: &str = "CHATWARDEN_TOKEN";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Bot configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Bot identity and owners.
    #[serde(default)]
    pub bot: BotConfig,
    /// Persisted document location.
    #[serde(default)]
    pub store: StoreConfig,
    /// Instant-answer lookup client.
    #[serde(default)]
    pub search: SearchConfig,
    /// Bot API endpoint and polling.
    #[serde(default)]
    pub telegram: TelegramConfig,
    /// Prometheus endpoint.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// A non-empty `CHATWARDEN_TOKEN` environment variable replaces `bot.token`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        if let Ok(token) = std::env::var(TOKEN_ENV)
            && !token.trim().is_empty()
        {
            config.bot.token = token.trim().to_string();
        }
        Ok(config)
    }
}

/// Bot identity configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BotConfig {
    /// Bot API token. Required; the process refuses to start without one.
    #[serde(default)]
    pub token: String,
    /// Bot username, used to accept `/command@username`.
    /// Filled from `getMe` at startup when not configured.
    #[serde(default)]
    pub username: Option<String>,
    /// User ids allowed to administer the blacklist.
    #[serde(default)]
    pub owners: Vec<i64>,
}

/// Persisted document configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the JSON document holding welcomes and warn counters.
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> String {
    "welcome_store.json".to_string()
}

/// Instant-answer lookup configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Endpoint of the instant-answer API.
    #[serde(default = "default_search_url")]
    pub api_url: String,
    /// Total budget per lookup in seconds (default: 5).
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
    /// User-Agent sent with lookups.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Address sent as `X-Forwarded-For` instead of anything real.
    #[serde(default = "default_forwarded_for")]
    pub forwarded_for: String,
    /// Retries for 5xx responses and transport errors (default: 3).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base backoff in milliseconds, doubled per attempt (default: 300).
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_url: default_search_url(),
            timeout_secs: default_search_timeout(),
            user_agent: default_user_agent(),
            forwarded_for: default_forwarded_for(),
            max_retries: default_max_retries(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

fn default_search_url() -> String {
    "https://api.duckduckgo.com/".to_string()
}

fn default_search_timeout() -> u64 {
    5
}

fn default_user_agent() -> String {
    "DuckBot/1.0".to_string()
}

fn default_forwarded_for() -> String {
    // TEST-NET-3 documentation address.
    "203.0.113.42".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    300
}

/// Which `ChatPermissions` schema the Bot API endpoint speaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    /// Pre-6.5 API with a single `can_send_media_messages` flag.
    Legacy,
    /// 6.5+ API where media permissions are split per type.
    #[default]
    Granular,
}

/// Bot API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Long-poll timeout for `getUpdates` in seconds (default: 30).
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
    /// Permission schema of the endpoint.
    #[serde(default)]
    pub permission_schema: SchemaVersion,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            poll_timeout_secs: default_poll_timeout(),
            permission_schema: SchemaVersion::default(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout() -> u64 {
    30
}

/// Prometheus metrics configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsConfig {
    /// HTTP port for `/metrics`; 0 disables the endpoint.
    #[serde(default)]
    pub port: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.bot.token.is_empty());
        assert_eq!(config.store.path, "welcome_store.json");
        assert_eq!(config.search.timeout_secs, 5);
        assert_eq!(config.search.max_retries, 3);
        assert_eq!(config.telegram.permission_schema, SchemaVersion::Granular);
        assert_eq!(config.metrics.port, 0);
    }

    #[test]
    fn sections_parse() {
        let toml = r#"
[bot]
token = "123:abc"
username = "WardenBot"
owners = [1001, 1002]

[store]
path = "/var/lib/chatwarden/store.json"

[telegram]
permission_schema = "legacy"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.bot.owners, vec![1001, 1002]);
        assert_eq!(config.bot.username.as_deref(), Some("WardenBot"));
        assert_eq!(config.telegram.permission_schema, SchemaVersion::Legacy);
        assert_eq!(config.telegram.poll_timeout_secs, 30);
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[bot]\ntoken = \"from-file\"\n").unwrap();
        let config = Config::load(&path).unwrap();
        // The environment override only applies when the variable is set.
        if std::env::var(TOKEN_ENV).is_err() {
            assert_eq!(config.bot.token, "from-file");
        }
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = Config::load("/nonexistent/chatwarden.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
