//! # Server Configuration
//!
//! Configuration for the HTTP server and its database.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                            │
//! │     STOCKROOM_HOST=127.0.0.1                                            │
//! │     PORT=8080  (or STOCKROOM_PORT)                                      │
//! │     DATABASE_PATH=/var/lib/stockroom/stockroom.db                       │
//! │                                                                         │
//! │  2. TOML Config File                                                    │
//! │     $STOCKROOM_CONFIG, or                                               │
//! │     ~/.config/stockroom/stockroom.toml (Linux)                          │
//! │     ~/Library/Application Support/com.stockroom.stockroom/... (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                    │
//! │     0.0.0.0:6000, ./stockroom.db, auto-migrate on                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # stockroom.toml
//! [server]
//! host = "0.0.0.0"
//! port = 6000
//! checkout_timeout_secs = 10   # 0 disables the timeout
//!
//! [database]
//! path = "./stockroom.db"      # ":memory:" for a throwaway database
//! max_connections = 5
//! busy_timeout_ms = 5000
//! auto_migrate = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use stockroom_db::DbConfig;

// =============================================================================
// Errors
// =============================================================================

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadFailed(String),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// HTTP Settings
// =============================================================================

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Bind address (default: 0.0.0.0 for all interfaces).
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Checkouts still uncommitted after this many seconds are aborted.
    /// 0 disables the timeout.
    #[serde(default = "default_checkout_timeout")]
    pub checkout_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    6000
}

fn default_checkout_timeout() -> u64 {
    10
}

impl Default for HttpSettings {
    fn default() -> Self {
        HttpSettings {
            host: default_host(),
            port: default_port(),
            checkout_timeout_secs: default_checkout_timeout(),
        }
    }
}

// =============================================================================
// Database Settings
// =============================================================================

/// `[database]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file, or `:memory:`.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a writer waits for the SQLite lock (milliseconds).
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,

    /// Apply pending migrations at startup.
    #[serde(default = "default_true")]
    pub auto_migrate: bool,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./stockroom.db")
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout(),
            auto_migrate: true,
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpSettings,

    #[serde(default)]
    pub database: DatabaseSettings,
}

impl ServerConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (stockroom.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Applies overrides looked up by environment variable name.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<()> {
        if let Some(host) = lookup("STOCKROOM_HOST") {
            self.server.host = host;
        }

        if let Some((key, port)) = lookup("PORT")
            .map(|v| ("PORT", v))
            .or_else(|| lookup("STOCKROOM_PORT").map(|v| ("STOCKROOM_PORT", v)))
        {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))?;
            debug!(port = self.server.port, "Overriding port from environment");
        }

        if let Some(path) = lookup("DATABASE_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(flag) = lookup("STOCKROOM_AUTO_MIGRATE") {
            self.database.auto_migrate = match flag.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(ConfigError::InvalidValue("STOCKROOM_AUTO_MIGRATE".into())),
            };
        }

        if let Some(secs) = lookup("STOCKROOM_CHECKOUT_TIMEOUT_SECS") {
            self.server.checkout_timeout_secs = secs.trim().parse().map_err(|_| {
                ConfigError::InvalidValue("STOCKROOM_CHECKOUT_TIMEOUT_SECS".into())
            })?;
        }

        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Invalid("server.host cannot be empty".into()));
        }

        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path cannot be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "stockroom", "stockroom")
            .map(|dirs| dirs.config_dir().join("stockroom.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Returns the full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Returns the checkout timeout, if enabled.
    pub fn checkout_timeout(&self) -> Option<Duration> {
        match self.server.checkout_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Builds the pool configuration.
    pub fn db_config(&self) -> DbConfig {
        let base = if self.database.path.as_os_str() == ":memory:" {
            DbConfig::in_memory()
        } else {
            DbConfig::new(&self.database.path).max_connections(self.database.max_connections)
        };

        base.busy_timeout(Duration::from_millis(self.database.busy_timeout_ms))
            .run_migrations(self.database.auto_migrate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:6000");
        assert_eq!(config.checkout_timeout(), Some(Duration::from_secs(10)));
        assert!(config.database.auto_migrate);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config: ServerConfig = toml::from_str(
            r#"
            [server]
            port = 8080
            checkout_timeout_secs = 0

            [database]
            path = ":memory:"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.checkout_timeout(), None);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.db_config().max_connections, 1);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ServerConfig::default();
        config
            .apply_overrides(env(&[
                ("STOCKROOM_HOST", "127.0.0.1"),
                ("STOCKROOM_PORT", "7000"),
                ("DATABASE_PATH", "/tmp/stock.db"),
                ("STOCKROOM_AUTO_MIGRATE", "false"),
            ]))
            .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:7000");
        assert_eq!(config.database.path, PathBuf::from("/tmp/stock.db"));
        assert!(!config.db_config().run_migrations);

        // PORT wins over STOCKROOM_PORT
        config
            .apply_overrides(env(&[("PORT", "9000"), ("STOCKROOM_PORT", "7000")]))
            .unwrap();
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_invalid_overrides() {
        let mut config = ServerConfig::default();
        assert!(matches!(
            config.apply_overrides(env(&[("PORT", "not-a-port")])),
            Err(ConfigError::InvalidValue(key)) if key == "PORT"
        ));
        assert!(config
            .apply_overrides(env(&[("STOCKROOM_AUTO_MIGRATE", "maybe")]))
            .is_err());
    }

    #[test]
    fn test_validation() {
        let mut config = ServerConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.server.host = " ".into();
        assert!(config.validate().is_err());
    }
}
