//! Environment variable names used by this crate for convenient
//! configuration of the sink from services.
//!
//! These are purely helpers; [`Sink`](crate::sink::Sink) itself only ever
//! sees an explicit [`SinkConfig`].

use crate::config::{ConfigError, SinkConfig, DEFAULT_MYSQL_PORT, DEFAULT_TABLE_NAME};

/// Logging database host, defaults to `127.0.0.1`.
pub const LOG_SINK_DB_HOST_ENV: &str = "LOG_SINK_DB_HOST";

/// Logging database port, defaults to `3306`.
pub const LOG_SINK_DB_PORT_ENV: &str = "LOG_SINK_DB_PORT";

/// Logging database name (required).
pub const LOG_SINK_DB_NAME_ENV: &str = "LOG_SINK_DB_NAME";

/// Logging database user (required).
pub const LOG_SINK_DB_USER_ENV: &str = "LOG_SINK_DB_USER";

/// Logging database password, empty when unset.
pub const LOG_SINK_DB_PASSWORD_ENV: &str = "LOG_SINK_DB_PASSWORD";

/// Destination table, defaults to `system_log`.
pub const LOG_SINK_TABLE_ENV: &str = "LOG_SINK_TABLE";

/// Fallback file for records that could not be persisted (required).
pub const LOG_SINK_FALLBACK_FILE_ENV: &str = "LOG_SINK_FALLBACK_FILE";

impl SinkConfig {
    /// Build a config from the `LOG_SINK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup using the same variable
    /// names as [`SinkConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::MissingVar(key))
        };

        let port = match lookup(LOG_SINK_DB_PORT_ENV) {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_MYSQL_PORT,
        };

        let config = SinkConfig::new(
            lookup(LOG_SINK_DB_HOST_ENV).unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            required(LOG_SINK_DB_NAME_ENV)?,
            required(LOG_SINK_DB_USER_ENV)?,
            lookup(LOG_SINK_DB_PASSWORD_ENV).unwrap_or_default(),
            required(LOG_SINK_FALLBACK_FILE_ENV)?,
        );

        Ok(config.with_table_name(
            lookup(LOG_SINK_TABLE_ENV).unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
        ))
    }
}
