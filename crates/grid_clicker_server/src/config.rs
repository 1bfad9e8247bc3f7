//! Server configuration.

use std::path::Path;

use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{BackendSettings, JournalMode, RegressionPolicy, StoreOptions};

/// Environment variable overriding [`ServerConfig::database_path`].
pub const DATABASE_ENV: &str = "GRID_CLICKER_DB";

/// Environment variable overriding [`ServerConfig::bind_address`].
pub const BIND_ENV: &str = "GRID_CLICKER_BIND";

/// Configuration for the backend and its HTTP surface.
#[derive(Debug, Clone, PartialEq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
pub struct ServerConfig {
    /// SQLite database file.
    #[serde(default = "default_database_path")]
    database_path: String,

    /// Address the HTTP server binds to.
    #[serde(default = "default_bind_address")]
    bind_address: String,

    /// SQLite journal mode.
    #[serde(default)]
    journal_mode: JournalMode,

    /// How long a connection waits on a locked database, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    busy_timeout_ms: u64,

    /// Handling of statistics events that lower a stored counter.
    #[serde(default)]
    regression_policy: RegressionPolicy,

    /// Rows per leaderboard query.
    #[serde(default = "default_leaderboard_size")]
    leaderboard_size: usize,

    /// `tracing` filter directive; `RUST_LOG` wins when set.
    #[serde(default)]
    #[setters(strip_option)]
    log_filter: Option<String>,
}

#[instrument]
fn default_database_path() -> String {
    "grid_clicker.db".to_string()
}

#[instrument]
fn default_bind_address() -> String {
    "127.0.0.1:3000".to_string()
}

#[instrument]
fn default_busy_timeout_ms() -> u64 {
    StoreOptions::default().busy_timeout_ms
}

#[instrument]
fn default_leaderboard_size() -> usize {
    crate::DEFAULT_LEADERBOARD_SIZE
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            bind_address: default_bind_address(),
            journal_mode: JournalMode::default(),
            busy_timeout_ms: default_busy_timeout_ms(),
            regression_policy: RegressionPolicy::default(),
            leaderboard_size: default_leaderboard_size(),
            log_filter: None,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the text is not valid configuration.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        info!(database = %config.database_path, "Config loaded successfully");
        Ok(config)
    }

    /// Loads `path` if it exists, falling back to defaults otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an existing file cannot be read or parsed.
    #[instrument(skip(path))]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) if path.exists() => Self::from_file(path),
            Some(path) => {
                info!("Config file not found at {}, using defaults", path.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Applies [`DATABASE_ENV`] and [`BIND_ENV`] when set.
    #[instrument(skip(self))]
    pub fn with_env_overrides(self) -> Self {
        let mut config = self;
        if let Ok(path) = std::env::var(DATABASE_ENV) {
            debug!(path = %path, "Database path overridden from environment");
            config.database_path = path;
        }
        if let Ok(bind) = std::env::var(BIND_ENV) {
            debug!(bind = %bind, "Bind address overridden from environment");
            config.bind_address = bind;
        }
        config
    }

    /// Connection settings for the store.
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            journal_mode: self.journal_mode,
            busy_timeout_ms: self.busy_timeout_ms,
        }
    }

    /// Settings for the backend service.
    pub fn backend_settings(&self) -> BackendSettings {
        BackendSettings::new(self.regression_policy, self.leaderboard_size)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = ServerConfig::from_toml("").expect("Parse failed");
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.database_path(), "grid_clicker.db");
        assert_eq!(*config.leaderboard_size(), 10);
    }

    #[test]
    fn file_values_override_defaults() {
        let config = ServerConfig::from_toml(
            r#"
database_path = "/var/lib/grid/clicker.db"
journal_mode = "delete"
regression_policy = "reject_regression"
leaderboard_size = 25
log_filter = "debug"
"#,
        )
        .expect("Parse failed");
        assert_eq!(config.database_path(), "/var/lib/grid/clicker.db");
        assert_eq!(*config.journal_mode(), JournalMode::Delete);
        assert_eq!(*config.regression_policy(), RegressionPolicy::RejectRegression);
        assert_eq!(config.backend_settings().leaderboard_size, 25);
        assert_eq!(config.log_filter().as_deref(), Some("debug"));
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let err = ServerConfig::from_toml(r#"regression_policy = "merge""#).expect_err("Should reject");
        assert!(err.message.contains("Failed to parse config"));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = ServerConfig::load(Some(Path::new("/nonexistent/grid_clicker.toml"))).expect("Load failed");
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn setters_override_fields() {
        let config = ServerConfig::default()
            .with_bind_address("0.0.0.0:8080".to_string())
            .with_log_filter("trace".to_string());
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.log_filter().as_deref(), Some("trace"));
    }
}
