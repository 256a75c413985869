//! services/session/src/config.rs
//!
//! Defines the session's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development. Every value has a product default, so an
//! empty environment yields `Config::default()`.

use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub log_level: Level,
    /// How long a notification stays up unless dismissed first.
    pub toast_ttl: Duration,
    pub profile_submit_delay: Duration,
    pub onboarding_submit_delay: Duration,
    pub system_select_delay: Duration,
    pub sign_out_delay: Duration,
    pub reply_delay_min: Duration,
    pub reply_delay_max: Duration,
    /// Start sessions with the demo primary profile and the welcome message.
    pub seed_demo_data: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            toast_ttl: Duration::from_millis(5000),
            profile_submit_delay: Duration::from_millis(1000),
            onboarding_submit_delay: Duration::from_millis(2000),
            system_select_delay: Duration::from_millis(1500),
            sign_out_delay: Duration::from_millis(1500),
            reply_delay_min: Duration::from_millis(1000),
            reply_delay_max: Duration::from_millis(2000),
            seed_demo_data: true,
        }
    }
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

    /// Builds a config from an arbitrary key lookup, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let log_level = match lookup("RUST_LOG") {
            Some(raw) => raw.parse::<Level>().map_err(|_| {
                ConfigError::InvalidValue(
                    "RUST_LOG".to_string(),
                    format!("'{}' is not a valid log level", raw),
                )
            })?,
            None => defaults.log_level,
        };

        let millis = |key: &str, fallback: Duration| -> Result<Duration, ConfigError> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .map(Duration::from_millis)
                    .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
                None => Ok(fallback),
            }
        };

        let toast_ttl = millis("TOAST_TTL_MS", defaults.toast_ttl)?;
        let profile_submit_delay = millis("PROFILE_SUBMIT_DELAY_MS", defaults.profile_submit_delay)?;
        let onboarding_submit_delay =
            millis("ONBOARDING_SUBMIT_DELAY_MS", defaults.onboarding_submit_delay)?;
        let system_select_delay = millis("SYSTEM_SELECT_DELAY_MS", defaults.system_select_delay)?;
        let sign_out_delay = millis("SIGN_OUT_DELAY_MS", defaults.sign_out_delay)?;
        let reply_delay_min = millis("REPLY_DELAY_MIN_MS", defaults.reply_delay_min)?;
        let reply_delay_max = millis("REPLY_DELAY_MAX_MS", defaults.reply_delay_max)?;
        if reply_delay_min > reply_delay_max {
            return Err(ConfigError::InvalidValue(
                "REPLY_DELAY_MIN_MS".to_string(),
                "must not exceed REPLY_DELAY_MAX_MS".to_string(),
            ));
        }

        let seed_demo_data = match lookup("SEED_DEMO_DATA") {
            Some(raw) => match raw.to_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidValue(
                        "SEED_DEMO_DATA".to_string(),
                        format!("'{}' is not a boolean", raw),
                    ))
                }
            },
            None => defaults.seed_demo_data,
        };

        Ok(Self {
            log_level,
            toast_ttl,
            profile_submit_delay,
            onboarding_submit_delay,
            system_select_delay,
            sign_out_delay,
            reply_delay_min,
            reply_delay_max,
            seed_demo_data,
        })
    }
}
