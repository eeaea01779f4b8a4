//! Configuration for the habit timer agent.
//!
//! Values are resolved in order: built-in defaults, the JSON config file,
//! then environment variables. The binary applies command-line flags last.

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable for the record store directory.
pub const ENV_DATA_DIR: &str = "HABIT_DATA_DIR";
/// Environment variable for the shared sync secret.
pub const ENV_API_KEY: &str = "SYNC_API_KEY";
/// Environment variable for the sync server bind host.
pub const ENV_HOST: &str = "SYNC_HOST";
/// Environment variable for the sync server port.
pub const ENV_PORT: &str = "SYNC_PORT";
/// Environment variable for the IANA timezone used to resolve "today".
pub const ENV_TIMEZONE: &str = "HABIT_TIMEZONE";

/// Main configuration for the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding one JSON document per day
    pub data_dir: PathBuf,

    /// Shared secret expected in the `X-API-Key` header of sync requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Host the sync server binds to
    pub host: String,

    /// Port the sync server binds to (0 for random)
    pub port: u16,

    /// Timezone that decides which calendar day is "today"
    #[serde(with = "tz_serde")]
    pub timezone: Tz,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("habit-timer")
            .join("habits");

        Self {
            data_dir,
            api_key: None,
            host: "127.0.0.1".to_string(),
            port: 8080,
            timezone: Tz::UTC,
        }
    }
}

impl Config {
    /// Load configuration from the default file location and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_file(&Self::config_path())?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load the config file at `path`, or defaults if it does not exist.
    pub fn load_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))
    }

    /// Override fields from environment variables, looked up through `var`.
    ///
    /// Empty values are ignored.
    pub fn apply_env<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = var(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(key) = var(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(host) = var(ENV_HOST) {
            self.host = host;
        }
        if let Some(port) = var(ENV_PORT) {
            self.port = port
                .trim()
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("{ENV_PORT}={port}: {e}")))?;
        }
        if let Some(tz) = var(ENV_TIMEZONE) {
            self.timezone = parse_timezone(&tz)?;
        }

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("habit-timer")
            .join("config.json")
    }

    /// Copy of the configuration safe for display.
    pub fn redacted(&self) -> Self {
        Self {
            api_key: self.api_key.as_ref().map(|_| "********".to_string()),
            ..self.clone()
        }
    }

    /// The current calendar date in the configured timezone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }
}

/// Parse an IANA timezone name such as `Europe/Berlin`.
pub fn parse_timezone(name: &str) -> Result<Tz, ConfigError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| ConfigError::Invalid(format!("{ENV_TIMEZONE}={name}: {e}")))
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid value: {0}")]
    Invalid(String),
}

/// Serde support for timezones as IANA names.
mod tz_serde {
    use chrono_tz::Tz;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(tz: &Tz, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(tz.name())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Tz, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}
