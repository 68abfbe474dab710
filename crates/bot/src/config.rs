//! Bot configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DISCORD_BOT_TOKEN` - Discord bot token
//! - `DATABASE_URL` - `PostgreSQL` connection string for the Nonogram store
//!
//! ## Optional
//! - `TARGET_CHANNEL_ID` - Review and relay channel (default: 1236906035932041286)
//! - `BOT_API_HOST` - Bind address (default: 0.0.0.0)
//! - `BOT_API_PORT` - Listen port, falls back to `PORT` (default: 3001)
//! - `RELAY_DELIVERY` - `bot` or `webhook` (default: bot)
//! - `DISCORD_WEBHOOK_URL` - Webhook URL, required when `RELAY_DELIVERY=webhook`
//! - `CORS_ALLOWED_ORIGINS` - Comma-separated origins, or `*` for any
//! - `LOG_FORMAT` - `json` for structured logs (default: text)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use nonogram_relay_core::ChannelId;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_CHANNEL_ID: &str = "1236906035932041286";
const DEFAULT_PORT: &str = "3001";

/// Origins allowed when `CORS_ALLOWED_ORIGINS` is unset.
const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:8000",
    "http://127.0.0.1:3000",
    "https://tethuytruongluu.github.io",
];

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Bot application configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Discord session configuration
    pub discord: DiscordConfig,
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the relay server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// How relayed messages reach the channel
    pub delivery: DeliveryConfig,
    /// Origins allowed to call the relay endpoint
    pub cors: CorsConfig,
    /// Emit JSON logs instead of text
    pub json_logs: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Discord bot session configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct DiscordConfig {
    /// Bot token used for REST and gateway authentication.
    pub bot_token: SecretString,
    /// Channel where submissions are reviewed and relayed messages land.
    pub channel_id: ChannelId,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("bot_token", &"[REDACTED]")
            .field("channel_id", &self.channel_id)
            .finish()
    }
}

/// Delivery strategy for `POST /send-message`.
#[derive(Clone)]
pub enum DeliveryConfig {
    /// Send through the bot session.
    Bot,
    /// POST to a static webhook URL. The URL embeds the webhook token.
    Webhook { url: SecretString },
}

impl std::fmt::Debug for DeliveryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bot => f.write_str("Bot"),
            Self::Webhook { .. } => f
                .debug_struct("Webhook")
                .field("url", &"[REDACTED]")
                .finish(),
        }
    }
}

/// CORS origin policy for the relay endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsConfig {
    /// Any origin (`*`).
    Any,
    /// Exact origins.
    List(Vec<String>),
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self::List(DEFAULT_CORS_ORIGINS.iter().map(|o| (*o).to_string()).collect())
    }
}

impl CorsConfig {
    /// Parse a comma-separated origin list. `*` anywhere means any origin.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let origins: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(|o| o.trim_end_matches('/').to_string())
            .collect();

        if origins.iter().any(|o| o == "*") {
            Self::Any
        } else if origins.is_empty() {
            Self::default()
        } else {
            Self::List(origins)
        }
    }

    /// Whether a request from `origin` is allowed.
    #[must_use]
    pub fn allows(&self, origin: &str) -> bool {
        match self {
            Self::Any => true,
            Self::List(origins) => origins.iter().any(|o| o == origin),
        }
    }
}

impl BotConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let discord = DiscordConfig::from_env()?;
        let database_url = get_required_secret("DATABASE_URL")?;
        let host = get_env_or_default("BOT_API_HOST", "0.0.0.0")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("BOT_API_HOST".to_string(), e.to_string()))?;
        let port = get_optional_env("BOT_API_PORT")
            .or_else(|| get_optional_env("PORT"))
            .unwrap_or_else(|| DEFAULT_PORT.to_string())
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("BOT_API_PORT".to_string(), e.to_string()))?;
        let delivery = DeliveryConfig::from_env()?;
        let cors = get_optional_env("CORS_ALLOWED_ORIGINS")
            .map_or_else(CorsConfig::default, |raw| CorsConfig::parse(&raw));
        let json_logs = get_optional_env("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json"));
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            discord,
            database_url,
            host,
            port,
            delivery,
            cors,
            json_logs,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl DiscordConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let bot_token = get_required_env("DISCORD_BOT_TOKEN")?;
        if let Err(e) = validate_secret_strength(&bot_token, "DISCORD_BOT_TOKEN") {
            tracing::warn!("DISCORD_BOT_TOKEN validation warning: {e}");
        }

        let channel_id = get_env_or_default("TARGET_CHANNEL_ID", DEFAULT_CHANNEL_ID);
        if channel_id.is_empty() || !channel_id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ConfigError::InvalidEnvVar(
                "TARGET_CHANNEL_ID".to_string(),
                "must be a numeric Discord snowflake".to_string(),
            ));
        }

        Ok(Self {
            bot_token: SecretString::from(bot_token),
            channel_id: ChannelId::new(channel_id),
        })
    }
}

impl DeliveryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let mode = get_env_or_default("RELAY_DELIVERY", "bot");
        Self::from_parts(&mode, get_optional_env("DISCORD_WEBHOOK_URL"))
    }

    /// Build from the raw `RELAY_DELIVERY` value and optional webhook URL.
    fn from_parts(mode: &str, webhook_url: Option<String>) -> Result<Self, ConfigError> {
        match mode.to_ascii_lowercase().as_str() {
            "bot" => Ok(Self::Bot),
            "webhook" => {
                let url = webhook_url
                    .ok_or_else(|| ConfigError::MissingEnvVar("DISCORD_WEBHOOK_URL".to_string()))?;
                Url::parse(&url).map_err(|e| {
                    ConfigError::InvalidEnvVar("DISCORD_WEBHOOK_URL".to_string(), e.to_string())
                })?;
                Ok(Self::Webhook {
                    url: SecretString::from(url),
                })
            }
            other => Err(ConfigError::InvalidEnvVar(
                "RELAY_DELIVERY".to_string(),
                format!("expected `bot` or `webhook`, got `{other}`"),
            )),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-bot-token-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength(
            "MTIzNDU2Nzg5MDEyMzQ1Njc4.GhIjKl.mNoPqRsTuVwXyZ0123456789aBcDeF",
            "TEST_VAR",
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_cors_parse_list() {
        let cors = CorsConfig::parse("https://a.example, http://localhost:8000/ ,");
        assert_eq!(
            cors,
            CorsConfig::List(vec![
                "https://a.example".to_string(),
                "http://localhost:8000".to_string(),
            ])
        );
        assert!(cors.allows("http://localhost:8000"));
        assert!(!cors.allows("http://localhost:9000"));
    }

    #[test]
    fn test_cors_parse_wildcard() {
        let cors = CorsConfig::parse("https://a.example,*");
        assert_eq!(cors, CorsConfig::Any);
        assert!(cors.allows("https://anything.example"));
    }

    #[test]
    fn test_cors_default_origins() {
        let cors = CorsConfig::parse(" , ");
        assert!(cors.allows("https://tethuytruongluu.github.io"));
        assert!(cors.allows("http://127.0.0.1:3000"));
        assert!(!cors.allows("https://evil.example"));
    }

    #[test]
    fn test_delivery_bot() {
        let delivery = DeliveryConfig::from_parts("BOT", None).unwrap();
        assert!(matches!(delivery, DeliveryConfig::Bot));
    }

    #[test]
    fn test_delivery_webhook_requires_url() {
        let result = DeliveryConfig::from_parts("webhook", None);
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(_))));

        let result = DeliveryConfig::from_parts("webhook", Some("not a url".to_string()));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_delivery_unknown_mode() {
        let result = DeliveryConfig::from_parts("carrier-pigeon", None);
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_delivery_debug_redacts_webhook_url() {
        let delivery = DeliveryConfig::from_parts(
            "webhook",
            Some("https://discord.com/api/webhooks/1/super-secret-token".to_string()),
        )
        .unwrap();

        let debug_output = format!("{delivery:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super-secret-token"));
    }

    #[test]
    fn test_discord_config_debug_redacts_token() {
        let config = DiscordConfig {
            bot_token: SecretString::from("MTIz.super-secret-bot-token"),
            channel_id: ChannelId::new("42"),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("42"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super-secret-bot-token"));
    }

    #[test]
    fn test_socket_addr() {
        let config = BotConfig {
            discord: DiscordConfig {
                bot_token: SecretString::from("token"),
                channel_id: ChannelId::new(DEFAULT_CHANNEL_ID),
            },
            database_url: SecretString::from("postgres://localhost/nonograms"),
            host: "0.0.0.0".parse().unwrap(),
            port: 3001,
            delivery: DeliveryConfig::Bot,
            cors: CorsConfig::default(),
            json_logs: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "0.0.0.0");
        assert_eq!(addr.port(), 3001);
    }
}
