//! Command-line configuration.
//!
//! Extends [`ClientConfig`] with the settings only the binary needs.
//!
//! # Environment Variables
//!
//! - `VENTAS_SESSION_FILE` - Where the session token is kept between runs
//!   (default: `.ventas-session.json`)
//! - `VENTAS_USERNAME`, `VENTAS_PASSWORD` - Login fallbacks for `ventas login`
//! - `VENTAS_LOG_FORMAT` - `json` for structured logs, anything else for text
//! - `SENTRY_DSN` - Sentry DSN for error tracking (optional)
//! - `SENTRY_ENVIRONMENT` - Environment name reported to Sentry (optional)

use std::path::PathBuf;

use secrecy::SecretString;
use ventas_client::{ClientConfig, ConfigError};

const DEFAULT_SESSION_FILE: &str = ".ventas-session.json";

/// Binary configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub client: ClientConfig,
    pub session_file: PathBuf,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub log_json: bool,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

impl CliConfig {
    /// Load configuration from the environment (and `.env`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a client variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let client = ClientConfig::from_env()?;

        Ok(Self {
            client,
            session_file: get_optional_env("VENTAS_SESSION_FILE")
                .map_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE), PathBuf::from),
            username: get_optional_env("VENTAS_USERNAME"),
            password: get_optional_env("VENTAS_PASSWORD").map(SecretString::from),
            log_json: get_optional_env("VENTAS_LOG_FORMAT")
                .is_some_and(|format| format.eq_ignore_ascii_case("json")),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
