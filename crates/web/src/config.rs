//! Server configuration.
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 3000
//! max_connections = 256
//! read_buffer_size = 8192
//! keep_alive_timeout_ms = 5000
//! request_timeout_ms = 10000
//! max_body_size = 1048576
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use nimble_http::connection::ConnectionConfig;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Semaphore;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Connections handled at the same time; more are accepted but wait for a slot.
    pub max_connections: usize,
    #[serde(flatten)]
    pub connection: ConnectionConfig,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("can't read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid<S: ToString>(field: &'static str, reason: S) -> Self {
        Self::Invalid { field, reason: reason.to_string() }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_owned(), port: 8080, max_connections: 1024, connection: ConnectionConfig::default() }
    }
}

impl ServerConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(toml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let toml = fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_owned(), source })?;
        Self::from_toml_str(&toml)
    }

    #[must_use]
    pub fn with_address(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }

    #[must_use]
    pub fn with_connection(mut self, connection: ConnectionConfig) -> Self {
        self.connection = connection;
        self
    }

    /// `host:port`, as handed to the listener.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::invalid("host", "must not be empty"));
        }
        if self.max_connections == 0 || self.max_connections > Semaphore::MAX_PERMITS {
            return Err(ConfigError::invalid(
                "max_connections",
                format!("must be between 1 and {}, got {}", Semaphore::MAX_PERMITS, self.max_connections),
            ));
        }

        let connection = &self.connection;
        if connection.read_buffer_size == 0 {
            return Err(ConfigError::invalid("read_buffer_size", "must be positive"));
        }
        if connection.keep_alive_timeout_ms == 0 {
            return Err(ConfigError::invalid("keep_alive_timeout_ms", "must be positive"));
        }
        if connection.request_timeout_ms == 0 {
            return Err(ConfigError::invalid("request_timeout_ms", "must be positive"));
        }
        Ok(())
    }
}
