use std::collections::HashMap;

use serde::Deserialize;

use crate::domain::RateLimitDefaults;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
    pub upstream: UpstreamConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Credential gateway configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Master switch; when off, every request passes anonymously
    pub enabled: bool,
    /// Static-mode credential list
    pub api_keys: Vec<String>,
    /// Optional client label per static credential
    pub key_names: HashMap<String, String>,
    /// Use the credential store instead of the static list
    pub database_enabled: bool,
    /// Cache bucket length; staleness is bounded by this
    pub cache_validity_secs: u64,
    /// Maximum distinct cached credentials
    pub cache_capacity: usize,
    /// Requests accumulated before one last-used/total update is flushed
    pub batch_update_threshold: u32,
    /// Tier defaults for records without their own ceilings
    pub default_rate_limits: RateLimitDefaults,
}

/// Downstream document-search backend
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_keys: Vec::new(),
            key_names: HashMap::new(),
            database_enabled: false,
            cache_validity_secs: 300,
            cache_capacity: 100,
            batch_update_threshold: 10,
            default_rate_limits: RateLimitDefaults::default(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.server.port, 8080);
        assert!(!config.auth.enabled);
        assert_eq!(config.auth.cache_validity_secs, 300);
        assert_eq!(config.auth.batch_update_threshold, 10);
        assert_eq!(config.auth.default_rate_limits.per_minute, 60);
        assert_eq!(config.auth.default_rate_limits.per_hour, 1000);
        assert_eq!(config.auth.default_rate_limits.per_day, 10000);
    }

    #[test]
    fn test_partial_config_deserializes() {
        let config: AppConfig = serde_json::from_str(
            r#"{
                "auth": {
                    "enabled": true,
                    "api_keys": ["key-1", "key-2"],
                    "key_names": {"key-1": "Client A"}
                }
            }"#,
        )
        .unwrap();

        assert!(config.auth.enabled);
        assert_eq!(config.auth.api_keys.len(), 2);
        assert_eq!(
            config.auth.key_names.get("key-1").map(String::as_str),
            Some("Client A")
        );
        // untouched sections keep their defaults
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.cache_capacity, 100);
    }
}
