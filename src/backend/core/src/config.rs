//! Configuration management.

use serde::Deserialize;

use crate::telemetry::{LoggingConfig, MetricsConfig};
use crate::Result;

/// Environment variable prefix, e.g. `CEPHAS__SERVER__PORT=8080`.
pub const ENV_PREFIX: &str = "CEPHAS";

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Event storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Which collection implementation backs the event store.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Mongodb,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Collection backend
    #[serde(default)]
    pub backend: StorageBackend,

    /// Document store host
    #[serde(default = "default_storage_host")]
    pub host: String,

    /// Document store port
    #[serde(default = "default_storage_port")]
    pub port: u16,

    /// Username, used only together with `password`
    pub user: Option<String>,

    /// Password, used only together with `user`
    pub password: Option<String>,

    /// Database name
    #[serde(default = "default_database")]
    pub database: String,

    /// Collection name
    #[serde(default = "default_collection")]
    pub collection: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            host: default_storage_host(),
            port: default_storage_port(),
            user: None,
            password: None,
            database: default_database(),
            collection: default_collection(),
        }
    }
}

impl StorageConfig {
    /// Credentials are sent only when both user and password are set.
    pub fn uses_auth(&self) -> bool {
        self.user.is_some() && self.password.is_some()
    }
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_storage_host() -> String { "localhost".to_string() }
fn default_storage_port() -> u16 { 27017 }
fn default_database() -> String { "space-time".to_string() }
fn default_collection() -> String { "www".to_string() }

impl Config {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let cfg: Config = config.try_deserialize()?;
        Ok(cfg)
    }

    /// Load from a specific file path, overlaid by the environment.
    pub fn from_file(path: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let cfg: Config = config.try_deserialize()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::LogFormat;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.host, "localhost");
        assert_eq!(config.storage.port, 27017);
        assert_eq!(config.storage.database, "space-time");
        assert_eq!(config.storage.collection, "www");
        assert!(!config.storage.uses_auth());
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_uses_auth_requires_both_credentials() {
        let mut storage = StorageConfig {
            user: Some("cephas".to_string()),
            ..StorageConfig::default()
        };
        assert!(!storage.uses_auth());
        storage.password = Some("secret".to_string());
        assert!(storage.uses_auth());
    }

    #[test]
    fn test_deserialize_partial_sections() {
        let source = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [server]
                port = 9090

                [storage]
                backend = "mongodb"
                user = "cephas"

                [logging]
                format = "compact"
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();

        let config: Config = source.try_deserialize().unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.storage.backend, StorageBackend::Mongodb);
        assert_eq!(config.storage.user.as_deref(), Some("cephas"));
        assert_eq!(config.storage.database, "space-time");
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let err = Config::from_file("/nonexistent/cephas-config").unwrap_err();
        assert_eq!(err.code().category(), "configuration");
    }
}
