use casino_types::casino::INITIAL_CREDITS;
use serde::{Deserialize, Serialize};
use std::{str::FromStr, time::Duration};
use thiserror::Error;
use tracing::Level;

/// Configuration for the [crate::Simulator].
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_json: bool,

    #[serde(default = "default_initial_credits")]
    pub initial_credits: u64,
    #[serde(default = "default_wild_substitution")]
    pub wild_substitution: bool,

    /// Sessions unused for this long are closed on the next sign-in.
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            log_level: default_log_level(),
            log_json: false,
            initial_credits: default_initial_credits(),
            wild_substitution: default_wild_substitution(),
            session_idle_secs: default_session_idle_secs(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
    #[error("{field} must be > 0 (got {value})")]
    InvalidNonZero { field: &'static str, value: u64 },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Clone, Debug)]
pub struct ValidatedConfig {
    pub port: u16,
    pub log_level: Level,
    pub log_json: bool,

    pub initial_credits: u64,
    pub wild_substitution: bool,
    pub session_idle: Duration,
}

impl Default for ValidatedConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            log_level: Level::INFO,
            log_json: false,
            initial_credits: INITIAL_CREDITS,
            wild_substitution: true,
            session_idle: Duration::from_secs(default_session_idle_secs()),
        }
    }
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_initial_credits() -> u64 {
    INITIAL_CREDITS
}

fn default_wild_substitution() -> bool {
    true
}

fn default_session_idle_secs() -> u64 {
    3_600
}

impl Config {
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        let log_level = Level::from_str(&self.log_level).map_err(|_| ConfigError::InvalidLogLevel {
            value: self.log_level.clone(),
        })?;
        if self.initial_credits == 0 {
            return Err(ConfigError::InvalidNonZero {
                field: "initial_credits",
                value: self.initial_credits,
            });
        }
        if self.session_idle_secs == 0 {
            return Err(ConfigError::InvalidNonZero {
                field: "session_idle_secs",
                value: self.session_idle_secs,
            });
        }

        Ok(ValidatedConfig {
            port: self.port,
            log_level,
            log_json: self.log_json,
            initial_credits: self.initial_credits,
            wild_substitution: self.wild_substitution,
            session_idle: Duration::from_secs(self.session_idle_secs),
        })
    }
}
