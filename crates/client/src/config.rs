//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional:
//! - `VENTAS_API_URL` - Base URL of the REST backend
//!   (default: the production deployment)
//! - `VENTAS_LOGIN_PATH` - Public entry path (default: `/`)
//! - `VENTAS_PANEL_PATH` - Protected area prefix and landing path
//!   (default: `/panel`)
//! - `VENTAS_SESSION_TTL_HOURS` - Token validity window (default: 24)
//! - `VENTAS_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 30)

use std::time::Duration;

use chrono::TimeDelta;
use thiserror::Error;
use url::Url;

use crate::guard::RouteTable;

/// Production backend used when `VENTAS_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "https://ventas-produccion-1f4baea70467.herokuapp.com/api";

const DEFAULT_SESSION_TTL_HOURS: i64 = 24;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST API; always ends with `/`
    pub api_url: Url,
    /// Login path, protected prefix and landing path
    pub routes: RouteTable,
    /// How long a token is considered valid after login
    pub session_ttl: TimeDelta,
    /// Timeout applied to every HTTP request
    pub http_timeout: Duration,
}

impl ClientConfig {
    /// Create a configuration for the given API base URL with default
    /// routes and timeouts.
    #[must_use]
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url: with_trailing_slash(api_url),
            routes: RouteTable::default(),
            session_ttl: TimeDelta::hours(DEFAULT_SESSION_TTL_HOURS),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = get_env_or_default("VENTAS_API_URL", DEFAULT_API_URL);
        let api_url = Url::parse(&api_url)
            .map_err(|e| ConfigError::InvalidEnvVar("VENTAS_API_URL".to_string(), e.to_string()))?;

        let login_path = get_env_or_default("VENTAS_LOGIN_PATH", "/");
        let panel_path = get_env_or_default("VENTAS_PANEL_PATH", "/panel");
        for (key, value) in [
            ("VENTAS_LOGIN_PATH", &login_path),
            ("VENTAS_PANEL_PATH", &panel_path),
        ] {
            if !value.starts_with('/') {
                return Err(ConfigError::InvalidEnvVar(
                    key.to_string(),
                    "must start with '/'".to_string(),
                ));
            }
        }

        let ttl_hours = get_env_or_default(
            "VENTAS_SESSION_TTL_HOURS",
            &DEFAULT_SESSION_TTL_HOURS.to_string(),
        )
        .parse::<i64>()
        .ok()
        .filter(|hours| *hours > 0)
        .ok_or_else(|| {
            ConfigError::InvalidEnvVar(
                "VENTAS_SESSION_TTL_HOURS".to_string(),
                "must be a positive number of hours".to_string(),
            )
        })?;

        let timeout_secs = get_env_or_default(
            "VENTAS_HTTP_TIMEOUT_SECS",
            &DEFAULT_HTTP_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("VENTAS_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
        })?;

        Ok(Self {
            api_url: with_trailing_slash(api_url),
            routes: RouteTable::new(&login_path, &panel_path, &panel_path),
            session_ttl: TimeDelta::hours(ttl_hours),
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Resolve an endpoint path (e.g. `productos/3/`) against the API base.
    ///
    /// # Errors
    ///
    /// Returns an error if the joined URL is invalid.
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        self.api_url.join(path.trim_start_matches('/'))
    }
}

/// `Url::join` replaces the last segment unless the base ends with a slash,
/// which would turn `.../api` + `token/` into `.../token/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_keeps_api_prefix() {
        let config = ClientConfig::new(Url::parse("https://pos.example.com/api").unwrap());
        assert_eq!(config.api_url.as_str(), "https://pos.example.com/api/");
        assert_eq!(
            config.endpoint("token/").unwrap().as_str(),
            "https://pos.example.com/api/token/"
        );
        assert_eq!(
            config.endpoint("/productos/12/").unwrap().as_str(),
            "https://pos.example.com/api/productos/12/"
        );
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new(Url::parse(DEFAULT_API_URL).unwrap());
        assert_eq!(config.session_ttl, TimeDelta::hours(24));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.routes.login_path(), "/");
        assert_eq!(config.routes.protected_prefix(), "/panel");
    }

    #[test]
    fn test_trailing_slash_is_idempotent() {
        let url = with_trailing_slash(Url::parse("http://127.0.0.1:8000/api/").unwrap());
        assert_eq!(url.path(), "/api/");
    }
}
