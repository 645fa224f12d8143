//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//! - `STOREFRONT_API_BASE_URL` - Backend REST base URL (default: `http://localhost:9090/api`)
//! - `STOREFRONT_LOGIN_PATH` - Login entry point announced when a session expires (default: `/login`)
//! - `STOREFRONT_TOKEN_PATH` - Credential file (default: `<config dir>/marketstall/credentials.json`)
//! - `STOREFRONT_REQUEST_TIMEOUT_SECS` - Per-request timeout; transport default when unset
//! - `STOREFRONT_SEARCH_DEBOUNCE_MS` - Catalog search debounce (default: 500)
//! - `STOREFRONT_LOG_FORMAT` - `text` or `json` (default: `text`)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://localhost:9090/api";
const DEFAULT_LOGIN_PATH: &str = "/login";
const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 500;
const CREDENTIALS_FILE: &str = "credentials.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format for binaries built on this library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL every endpoint path is appended to
    pub api_base_url: Url,
    /// Login entry point clients are sent to when the session cannot be refreshed
    pub login_path: String,
    /// Where the file token store keeps the credential pair
    pub token_path: PathBuf,
    /// Per-request timeout (`None` keeps the transport default)
    pub request_timeout: Option<Duration>,
    /// Delay before a catalog search is sent
    pub search_debounce: Duration,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl StorefrontConfig {
    /// Configuration pointing at `api_base_url` with every other setting at its default.
    #[must_use]
    pub fn new(api_base_url: Url) -> Self {
        Self {
            api_base_url,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            token_path: default_token_path(),
            request_timeout: None,
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
            log_format: LogFormat::Text,
            sentry_dsn: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base = get_or_default(&lookup, "STOREFRONT_API_BASE_URL", DEFAULT_API_BASE_URL);
        let api_base_url = Url::parse(&base).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_API_BASE_URL".to_string(), e.to_string())
        })?;
        if api_base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidEnvVar(
                "STOREFRONT_API_BASE_URL".to_string(),
                "must be an absolute http(s) URL".to_string(),
            ));
        }

        let login_path = get_or_default(&lookup, "STOREFRONT_LOGIN_PATH", DEFAULT_LOGIN_PATH);
        let token_path = get_optional(&lookup, "STOREFRONT_TOKEN_PATH")
            .map_or_else(default_token_path, PathBuf::from);

        let request_timeout = get_optional(&lookup, "STOREFRONT_REQUEST_TIMEOUT_SECS")
            .map(|raw| parse_positive(&raw, "STOREFRONT_REQUEST_TIMEOUT_SECS"))
            .transpose()?
            .map(Duration::from_secs);

        let search_debounce = get_optional(&lookup, "STOREFRONT_SEARCH_DEBOUNCE_MS")
            .map(|raw| {
                raw.trim().parse::<u64>().map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "STOREFRONT_SEARCH_DEBOUNCE_MS".to_string(),
                        e.to_string(),
                    )
                })
            })
            .transpose()?
            .map_or(
                Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
                Duration::from_millis,
            );

        let log_format = match get_optional(&lookup, "STOREFRONT_LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidEnvVar(
                    "STOREFRONT_LOG_FORMAT".to_string(),
                    format!("expected 'text' or 'json', got '{other}'"),
                ));
            }
        };

        Ok(Self {
            api_base_url,
            login_path,
            token_path,
            request_timeout,
            search_debounce,
            log_format,
            sentry_dsn: get_optional(&lookup, "SENTRY_DSN"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional variable, treating blank values as unset.
fn get_optional(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|value| !value.trim().is_empty())
}

/// Get a variable with a default value.
fn get_or_default(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    get_optional(lookup, key).unwrap_or_else(|| default.to_string())
}

fn parse_positive(raw: &str, key: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be greater than zero".to_string(),
        )),
        Ok(value) => Ok(value),
        Err(e) => Err(ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
    }
}

fn default_token_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("marketstall")
        .join(CREDENTIALS_FILE)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = StorefrontConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(config.api_base_url.as_str(), "http://localhost:9090/api");
        assert_eq!(config.login_path, "/login");
        assert!(config.token_path.ends_with("marketstall/credentials.json"));
        assert_eq!(config.request_timeout, None);
        assert_eq!(config.search_debounce, Duration::from_millis(500));
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = StorefrontConfig::from_vars(vars(&[
            ("STOREFRONT_API_BASE_URL", "https://shop.example.com/api/v2"),
            ("STOREFRONT_LOGIN_PATH", "/signin"),
            ("STOREFRONT_TOKEN_PATH", "/tmp/creds.json"),
            ("STOREFRONT_REQUEST_TIMEOUT_SECS", "15"),
            ("STOREFRONT_SEARCH_DEBOUNCE_MS", "0"),
            ("STOREFRONT_LOG_FORMAT", "json"),
            ("SENTRY_DSN", "https://key@sentry.example.com/1"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url.path(), "/api/v2");
        assert_eq!(config.login_path, "/signin");
        assert_eq!(config.token_path, PathBuf::from("/tmp/creds.json"));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.search_debounce, Duration::ZERO);
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.sentry_dsn.is_some());
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config =
            StorefrontConfig::from_vars(vars(&[("STOREFRONT_LOGIN_PATH", "  "), ("SENTRY_DSN", "")]))
                .unwrap();
        assert_eq!(config.login_path, "/login");
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_invalid_base_url() {
        let err = StorefrontConfig::from_vars(vars(&[("STOREFRONT_API_BASE_URL", "not a url")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "STOREFRONT_API_BASE_URL"));

        let err = StorefrontConfig::from_vars(vars(&[("STOREFRONT_API_BASE_URL", "mailto:a@b.c")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err =
            StorefrontConfig::from_vars(vars(&[("STOREFRONT_REQUEST_TIMEOUT_SECS", "0")])).unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        assert!(StorefrontConfig::from_vars(vars(&[("STOREFRONT_LOG_FORMAT", "xml")])).is_err());
    }
}
