//! Server configuration module.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then environment variables, then validation.
//!
//! ## Environment Variables
//! - `STOCKWISE_CONFIG` - Path to the TOML file (default: `stockwise.toml`)
//! - `STOCKWISE_HTTP_PORT` - HTTP port (default: 8080)
//! - `STOCKWISE_DB_PATH` - SQLite database file (default: `./stockwise.db`)
//! - `STOCKWISE_DB_MAX_CONNECTIONS` - Pool size (default: 5)
//! - `STOCKWISE_JWT_SECRET` - Secret for verifying bearer tokens

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use stockwise_db::DbConfig;

pub const DEFAULT_CONFIG_FILE: &str = "stockwise.toml";

const DEV_JWT_SECRET: &str = "stockwise-dev-secret-change-in-production";
const MIN_JWT_SECRET_LEN: usize = 16;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub http_host: String,

    /// HTTP server port
    pub http_port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Max pooled SQLite connections
    pub db_max_connections: u32,

    /// How long a writer waits for the SQLite write lock, in milliseconds
    pub db_busy_timeout_ms: u64,

    /// HS256 secret for bearer tokens
    pub jwt_secret: String,

    /// Lifetime of tokens minted by this server, in seconds
    pub jwt_lifetime_secs: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            http_host: "0.0.0.0".to_string(),
            http_port: 8080,
            database_path: PathBuf::from("./stockwise.db"),
            db_max_connections: 5,
            db_busy_timeout_ms: 5_000,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_lifetime_secs: 8 * 3600,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from the TOML file and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = env::var("STOCKWISE_CONFIG").ok().map(PathBuf::from);
        Self::load_with(explicit.as_deref(), |key| env::var(key).ok())
    }

    /// Loads configuration with an explicit file and environment lookup.
    ///
    /// An explicitly named file must exist; the default `stockwise.toml` is
    /// optional.
    pub fn load_with(
        file: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    ServerConfig::default()
                }
            }
        };

        config.apply_env_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML file; missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(port) = lookup("STOCKWISE_HTTP_PORT") {
            self.http_port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("STOCKWISE_HTTP_PORT".to_string()))?;
        }
        if let Some(path) = lookup("STOCKWISE_DB_PATH") {
            self.database_path = PathBuf::from(path);
        }
        if let Some(max) = lookup("STOCKWISE_DB_MAX_CONNECTIONS") {
            self.db_max_connections = max.trim().parse().map_err(|_| {
                ConfigError::InvalidValue("STOCKWISE_DB_MAX_CONNECTIONS".to_string())
            })?;
        }
        if let Some(secret) = lookup("STOCKWISE_JWT_SECRET") {
            self.jwt_secret = secret;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http_port == 0 {
            return Err(ConfigError::InvalidValue("http_port".to_string()));
        }
        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("db_max_connections".to_string()));
        }
        if self.jwt_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("jwt_lifetime_secs".to_string()));
        }
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt_secret".to_string()));
        }
        if self.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::WeakSecret {
                min: MIN_JWT_SECRET_LEN,
            });
        }
        Ok(())
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    /// Pool settings for the database layer.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.db_max_connections)
            .busy_timeout(Duration::from_millis(self.db_busy_timeout_ms))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("JWT secret must be at least {min} characters")]
    WeakSecret { min: usize },

    #[error("Failed to read config file {path:?}: {message}")]
    ReadFailed { path: PathBuf, message: String },

    #[error("Failed to parse config file: {0}")]
    ParseFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = ServerConfig::default();
        config.validate().unwrap();
        assert!(config.uses_dev_secret());
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_file_then_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stockwise.toml");
        fs::write(
            &path,
            "http_port = 9000\ndatabase_path = \"/var/lib/stockwise.db\"\ndb_max_connections = 8\n",
        )
        .unwrap();

        let config = ServerConfig::load_with(
            Some(&path),
            env_of(&[
                ("STOCKWISE_HTTP_PORT", "9100"),
                ("STOCKWISE_JWT_SECRET", "a-much-longer-production-secret"),
            ]),
        )
        .unwrap();

        assert_eq!(config.http_port, 9100);
        assert_eq!(config.database_path, PathBuf::from("/var/lib/stockwise.db"));
        assert_eq!(config.db_max_connections, 8);
        assert_eq!(config.db_busy_timeout_ms, 5_000);
        assert!(!config.uses_dev_secret());
    }

    #[test]
    fn test_bad_env_value() {
        let err = ServerConfig::load_with(
            Some(Path::new("/nonexistent/stockwise.toml")),
            env_of(&[]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ReadFailed { .. }));

        let mut config = ServerConfig::default();
        let err = config
            .apply_env_overrides(env_of(&[("STOCKWISE_HTTP_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn test_validation() {
        let config = ServerConfig {
            jwt_secret: "short".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::WeakSecret { .. })));

        let config = ServerConfig {
            db_max_connections: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        assert!(matches!(
            ServerConfig::from_toml("http_port = \"x\""),
            Err(ConfigError::ParseFailed(_))
        ));
    }
}
