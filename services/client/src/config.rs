//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// Every outbound call is bounded by this timeout. It is not configurable.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How long a notification stays queued unless dismissed earlier.
pub const DEFAULT_NOTIFICATION_DURATION: Duration = Duration::from_millis(3500);

/// The fixed key the session record is stored under.
pub const SESSION_STORAGE_KEY: &str = "astrometric.session";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub log_level: Level,
    pub session_dir: PathBuf,
    pub coalesce_refresh: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("ASTROMETRIC_API_URL")
            .unwrap_or_else(|| "http://localhost:5000".to_string());
        let api_base_url = api_base_url.trim().trim_end_matches('/').to_string();
        if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue(
                "ASTROMETRIC_API_URL".to_string(),
                format!("'{}' is not an http(s) address", api_base_url),
            ));
        }

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let session_dir = lookup("ASTROMETRIC_SESSION_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./.astrometric"));

        let coalesce_refresh = match lookup("ASTROMETRIC_COALESCE_REFRESH") {
            None => false,
            Some(raw) => parse_flag(&raw).ok_or_else(|| {
                ConfigError::InvalidValue(
                    "ASTROMETRIC_COALESCE_REFRESH".to_string(),
                    format!("'{}' is not a boolean", raw),
                )
            })?,
        };

        Ok(Self {
            api_base_url,
            log_level,
            session_dir,
            coalesce_refresh,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
