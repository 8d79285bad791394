//! Configuration management for dispatch-pilot.
//!
//! Configuration is set via environment variables:
//! - `DISPATCH_BASE_URL` - Required. Base URL of the game service.
//! - `DISPATCH_EMAIL` - Required. Account email for the session login.
//! - `DISPATCH_PASSWORD` - Required. Account password.
//! - `DISPATCH_DB_PATH` - Optional. SQLite mission store path. Defaults to `missions.db`.
//! - `DISPATCH_CALL_COOLDOWN_SECS` - Optional. Pause between probe/dispatch
//!   calls to respect the service's rate limits. Defaults to `2`.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the game service
    pub base_url: Url,

    /// Account email for the session login
    pub email: String,

    /// Account password
    pub password: String,

    /// Path of the SQLite mission store
    pub db_path: PathBuf,

    /// Pause between consecutive probe/dispatch calls
    pub call_cooldown: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if a required variable is not set,
    /// or `ConfigError::InvalidValue` if a value fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("DISPATCH_BASE_URL")
            .map_err(|_| ConfigError::MissingEnvVar("DISPATCH_BASE_URL".to_string()))?;
        let base_url = Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidValue("DISPATCH_BASE_URL".to_string(), e.to_string()))?;

        let email = std::env::var("DISPATCH_EMAIL")
            .map_err(|_| ConfigError::MissingEnvVar("DISPATCH_EMAIL".to_string()))?;

        let password = std::env::var("DISPATCH_PASSWORD")
            .map_err(|_| ConfigError::MissingEnvVar("DISPATCH_PASSWORD".to_string()))?;

        let db_path = std::env::var("DISPATCH_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("missions.db"));

        let cooldown_secs: u64 = std::env::var("DISPATCH_CALL_COOLDOWN_SECS")
            .unwrap_or_else(|_| "2".to_string())
            .parse()
            .map_err(|e| {
                ConfigError::InvalidValue("DISPATCH_CALL_COOLDOWN_SECS".to_string(), format!("{}", e))
            })?;

        Ok(Self {
            base_url,
            email,
            password,
            db_path,
            call_cooldown: Duration::from_secs(cooldown_secs),
        })
    }
}
