//! Configuration management.
//!
//! Configuration is set via environment variables:
//! - `OPENAI_API_KEY` - Required. API key for the model endpoint.
//! - `LLM_MODEL` - Optional. Chat model identifier. Defaults to `gpt-4o-mini`.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `8000`.
//! - `VMANAGE_URL` - Required. Base URL of the SD-WAN controller.
//! - `VMANAGE_USERNAME` / `VMANAGE_PASSWORD` - Required. Controller credentials.
//! - `VMANAGE_INSECURE_TLS` - Optional. Accept self-signed controller certs. Defaults to `false`.
//! - `MAX_ITERATIONS` - Optional. Agent reasoning-loop bound. Defaults to `15`.
//! - `WEBEX_BOT_TOKEN` / `WEBEX_ROOM_ID` - Optional. Notification channel.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Notification channel configuration.
#[derive(Debug, Clone, Default)]
pub struct WebexConfig {
    /// Bot access token
    pub bot_token: Option<String>,

    /// Destination room id
    pub room_id: Option<String>,
}

impl WebexConfig {
    /// Check if the notification channel is configured.
    pub fn is_enabled(&self) -> bool {
        self.bot_token.is_some() && self.room_id.is_some()
    }
}

/// SD-WAN controller configuration.
#[derive(Debug, Clone)]
pub struct VmanageConfig {
    /// Base URL, e.g. `https://vmanage.example.com`
    pub url: String,

    /// Controller username
    pub username: String,

    /// Controller password
    pub password: String,

    /// Accept self-signed certificates (lab controllers)
    pub insecure_tls: bool,
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Model endpoint API key
    pub api_key: String,

    /// Chat model identifier
    pub model: String,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Maximum iterations for the agent reasoning loop
    pub max_iterations: usize,

    /// SD-WAN controller access
    pub vmanage: VmanageConfig,

    /// Notification channel
    pub webex: WebexConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `OPENAI_API_KEY` or any of the
    /// `VMANAGE_*` credentials are not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = require_env("OPENAI_API_KEY")?;

        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?;

        let max_iterations = std::env::var("MAX_ITERATIONS")
            .unwrap_or_else(|_| "15".to_string())
            .parse()
            .map_err(|e| {
                ConfigError::InvalidValue("MAX_ITERATIONS".to_string(), format!("{}", e))
            })?;

        let vmanage = VmanageConfig {
            url: require_env("VMANAGE_URL")?,
            username: require_env("VMANAGE_USERNAME")?,
            password: require_env("VMANAGE_PASSWORD")?,
            insecure_tls: std::env::var("VMANAGE_INSECURE_TLS")
                .ok()
                .map(|v| {
                    parse_bool(&v).map_err(|e| {
                        ConfigError::InvalidValue("VMANAGE_INSECURE_TLS".to_string(), e)
                    })
                })
                .transpose()?
                .unwrap_or(false),
        };

        let webex = WebexConfig {
            bot_token: std::env::var("WEBEX_BOT_TOKEN").ok(),
            room_id: std::env::var("WEBEX_ROOM_ID").ok(),
        };

        Ok(Self {
            api_key,
            model,
            host,
            port,
            max_iterations,
            vmanage,
            webex,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: String, model: String, vmanage: VmanageConfig) -> Self {
        Self {
            api_key,
            model,
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_iterations: 15,
            vmanage,
            webex: WebexConfig::default(),
        }
    }
}

fn require_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        other => Err(format!("expected boolean-like value, got: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert_eq!(parse_bool("true"), Ok(true));
        assert_eq!(parse_bool("Yes"), Ok(true));
        assert_eq!(parse_bool(" 0 "), Ok(false));
        assert_eq!(parse_bool("off"), Ok(false));
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn webex_channel_requires_both_fields() {
        let partial = WebexConfig {
            bot_token: Some("token".into()),
            room_id: None,
        };
        assert!(!partial.is_enabled());
        assert!(!WebexConfig::default().is_enabled());

        let full = WebexConfig {
            bot_token: Some("token".into()),
            room_id: Some("room".into()),
        };
        assert!(full.is_enabled());
    }

    #[test]
    fn test_constructor_uses_defaults() {
        let config = Config::new(
            "key".into(),
            "gpt-4o-mini".into(),
            VmanageConfig {
                url: "https://vmanage.local".into(),
                username: "admin".into(),
                password: "admin".into(),
                insecure_tls: true,
            },
        );
        assert_eq!(config.port, 8000);
        assert_eq!(config.max_iterations, 15);
        assert!(!config.webex.is_enabled());
    }
}
