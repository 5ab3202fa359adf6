//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; defaults target a local development backend.
//!
//! - `SOUNDCART_API_BASE_URL` - Backend REST base URL
//!   (default: `http://localhost:5034/api`)
//! - `SOUNDCART_AUTH_TOKEN` - Bearer credential for the backend and hub
//! - `SOUNDCART_ENABLE_REALTIME` - Enable the push channel (default: true)
//! - `SOUNDCART_HUB_URL` - Hub WebSocket URL
//!   (default: `ws://localhost:7227/hubs/notifications`)
//! - `SOUNDCART_HUB_NOTIFICATION_EVENT` - Push event name for new
//!   notifications (default: `ReceiveNotification`)
//! - `SOUNDCART_HUB_COUNT_EVENT` - Push event name for unread-count updates
//!   (default: `NotificationCountUpdated`)
//! - `SENTRY_DSN` - Sentry error tracking DSN (CLI binary only)
//! - `RUST_LOG` - Logging verbosity (`tracing_subscriber::EnvFilter`)
//!
//! Configuration is read once at startup and immutable for the process
//! lifetime.

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://localhost:5034/api";
const DEFAULT_HUB_URL: &str = "ws://localhost:7227/hubs/notifications";
const DEFAULT_NOTIFICATION_EVENT: &str = "ReceiveNotification";
const DEFAULT_COUNT_EVENT: &str = "NotificationCountUpdated";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend REST base URL (including the `/api` prefix).
    pub api_base_url: String,
    /// Bearer credential for the backend and the hub, if available.
    pub auth_token: Option<SecretString>,
    /// Push channel configuration.
    pub realtime: RealtimeConfig,
    /// Sentry DSN for error tracking.
    pub sentry_dsn: Option<String>,
}

/// Push channel configuration.
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// Whether the push channel is enabled at all.
    pub enabled: bool,
    /// Hub WebSocket URL.
    pub hub_url: String,
    /// Server event name carrying a new notification.
    pub notification_event: String,
    /// Server event name carrying an unread-count update.
    pub count_event: String,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            hub_url: DEFAULT_HUB_URL.to_string(),
            notification_event: DEFAULT_NOTIFICATION_EVENT.to_string(),
            count_event: DEFAULT_COUNT_EVENT.to_string(),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable fails validation (malformed URL,
    /// unparseable boolean).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = get_env_or_default("SOUNDCART_API_BASE_URL", DEFAULT_API_BASE_URL);
        validate_url("SOUNDCART_API_BASE_URL", &api_base_url, &["http", "https"])?;

        let auth_token = get_optional_env("SOUNDCART_AUTH_TOKEN")
            .filter(|token| !token.is_empty())
            .map(SecretString::from);

        let realtime = RealtimeConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            api_base_url,
            auth_token,
            realtime,
            sentry_dsn,
        })
    }

    /// The bearer credential, or a config error naming the variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when no token was configured.
    pub fn require_auth_token(&self) -> Result<&SecretString, ConfigError> {
        self.auth_token
            .as_ref()
            .ok_or_else(|| ConfigError::MissingEnvVar("SOUNDCART_AUTH_TOKEN".to_string()))
    }
}

impl RealtimeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let enabled = parse_bool(
            "SOUNDCART_ENABLE_REALTIME",
            &get_env_or_default("SOUNDCART_ENABLE_REALTIME", "true"),
        )?;

        let hub_url = get_env_or_default("SOUNDCART_HUB_URL", DEFAULT_HUB_URL);
        validate_url("SOUNDCART_HUB_URL", &hub_url, &["ws", "wss"])?;

        Ok(Self {
            enabled,
            hub_url,
            notification_event: get_env_or_default(
                "SOUNDCART_HUB_NOTIFICATION_EVENT",
                DEFAULT_NOTIFICATION_EVENT,
            ),
            count_event: get_env_or_default("SOUNDCART_HUB_COUNT_EVENT", DEFAULT_COUNT_EVENT),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a boolean flag ("true"/"false"/"1"/"0", case-insensitive).
fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

/// Validate that a URL parses and uses one of the allowed schemes.
fn validate_url(key: &str, value: &str, schemes: &[&str]) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !schemes.contains(&url.scheme()) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!(
                "scheme '{}' not allowed (expected one of: {})",
                url.scheme(),
                schemes.join(", ")
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
    fn test_parse_bool_accepted_forms() {
        assert!(parse_bool("K", "true").expect("true"));
        assert!(parse_bool("K", "TRUE").expect("TRUE"));
        assert!(parse_bool("K", "1").expect("1"));
        assert!(!parse_bool("K", "false").expect("false"));
        assert!(!parse_bool("K", "0").expect("0"));
    }

    #[test]
    fn test_parse_bool_rejects_garbage() {
        let err = parse_bool("SOUNDCART_ENABLE_REALTIME", "maybe").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "SOUNDCART_ENABLE_REALTIME"));
    }

    #[test]
    fn test_validate_url_scheme_allowlist() {
        assert!(validate_url("K", "ws://localhost:7227/hubs/notifications", &["ws", "wss"]).is_ok());
        assert!(validate_url("K", "wss://hub.example.com/live", &["ws", "wss"]).is_ok());

        let err = validate_url("K", "http://localhost:7227", &["ws", "wss"]).unwrap_err();
        assert!(err.to_string().contains("scheme 'http' not allowed"));
    }

    #[test]
    fn test_validate_url_rejects_malformed() {
        assert!(validate_url("K", "not a url", &["http", "https"]).is_err());
    }

    #[test]
    fn test_realtime_defaults() {
        let realtime = RealtimeConfig::default();
        assert!(realtime.enabled);
        assert_eq!(realtime.hub_url, "ws://localhost:7227/hubs/notifications");
        assert_eq!(realtime.notification_event, "ReceiveNotification");
        assert_eq!(realtime.count_event, "NotificationCountUpdated");
    }

    #[test]
    fn test_require_auth_token() {
        let config = StorefrontConfig {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            auth_token: None,
            realtime: RealtimeConfig::default(),
            sentry_dsn: None,
        };
        assert!(matches!(
            config.require_auth_token(),
            Err(ConfigError::MissingEnvVar(_))
        ));

        let config = StorefrontConfig {
            auth_token: Some(SecretString::from("tok".to_string())),
            ..config
        };
        assert!(config.require_auth_token().is_ok());
    }
}
