//! Server configuration types.
//!
//! Configuration is built in code with [`ServerConfig::builder()`] or loaded
//! from TOML. Keys missing from a file keep their defaults.
//!
//! ```toml
//! http_addr = "0.0.0.0:5000"
//! base_url = "http://search.internal:5000/api"
//! json_indent = 2
//! schema_dir = "schemas"
//! shutdown_timeout_secs = 10
//! request_timeout_secs = 5
//! max_body_size = 65536
//! ```
//!
//! # Example
//!
//! ```rust
//! use oasis_server::ServerConfig;
//! use std::time::Duration;
//!
//! let config = ServerConfig::builder()
//!     .http_addr("0.0.0.0:8080")
//!     .shutdown_timeout(Duration::from_secs(10))
//!     .build();
//!
//! assert_eq!(config.http_addr(), "0.0.0.0:8080");
//! assert_eq!(config.base_url(), "http://localhost:5000/api");
//! ```

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use oasis_extract::DEFAULT_MAX_BODY_SIZE;
use serde::Deserialize;

use crate::error::ConfigError;

/// Default HTTP bind address.
pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:5000";

/// Default URL the service is mounted at.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP server bind address
    http_addr: String,

    /// URL the service is mounted at; its path is the route prefix
    base_url: String,

    /// Default JSON indent for responses (0 = compact)
    json_indent: usize,

    /// Directory of schema definition files
    schema_dir: Option<PathBuf>,

    /// How long to wait for in-flight connections on shutdown
    shutdown_timeout: Duration,

    /// Upper bound for serving one request
    request_timeout: Duration,

    /// Largest request body read, in bytes
    max_body_size: usize,
}

impl ServerConfig {
    /// Creates a new server configuration builder.
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Parses a TOML document.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(toml)?;
        file.into_config()
    }

    /// Reads and parses a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Returns the HTTP bind address.
    #[must_use]
    pub fn http_addr(&self) -> &str {
        &self.http_addr
    }

    /// Parses and returns the HTTP address as a `SocketAddr`.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.http_addr.parse()
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the default JSON indent.
    #[must_use]
    pub fn json_indent(&self) -> usize {
        self.json_indent
    }

    /// Returns the schema directory, if configured.
    #[must_use]
    pub fn schema_dir(&self) -> Option<&Path> {
        self.schema_dir.as_deref()
    }

    /// Returns the graceful shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Returns the request body limit in bytes.
    #[must_use]
    pub fn max_body_size(&self) -> usize {
        self.max_body_size
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Clone)]
pub struct ServerConfigBuilder {
    http_addr: String,
    base_url: String,
    json_indent: usize,
    schema_dir: Option<PathBuf>,
    shutdown_timeout: Duration,
    request_timeout: Duration,
    max_body_size: usize,
}

impl ServerConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            json_indent: 0,
            schema_dir: None,
            shutdown_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Sets the HTTP bind address.
    #[must_use]
    pub fn http_addr(mut self, addr: impl Into<String>) -> Self {
        self.http_addr = addr.into();
        self
    }

    /// Sets the base URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the default JSON indent.
    #[must_use]
    pub fn json_indent(mut self, indent: usize) -> Self {
        self.json_indent = indent;
        self
    }

    /// Sets the schema definition directory.
    #[must_use]
    pub fn schema_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.schema_dir = Some(dir.into());
        self
    }

    /// Sets the graceful shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the request body limit in bytes.
    #[must_use]
    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ServerConfig {
        ServerConfig {
            http_addr: self.http_addr,
            base_url: self.base_url,
            json_indent: self.json_indent,
            schema_dir: self.schema_dir,
            shutdown_timeout: self.shutdown_timeout,
            request_timeout: self.request_timeout,
            max_body_size: self.max_body_size,
        }
    }
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// On-disk shape of the configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    http_addr: Option<String>,
    base_url: Option<String>,
    json_indent: Option<usize>,
    schema_dir: Option<PathBuf>,
    shutdown_timeout_secs: Option<u64>,
    request_timeout_secs: Option<u64>,
    max_body_size: Option<usize>,
}

impl ConfigFile {
    fn into_config(self) -> Result<ServerConfig, ConfigError> {
        let mut builder = ServerConfig::builder();

        if let Some(addr) = self.http_addr {
            addr.parse::<SocketAddr>()
                .map_err(|e| ConfigError::Invalid {
                    key: "http_addr",
                    message: format!("'{addr}': {e}"),
                })?;
            builder = builder.http_addr(addr);
        }
        if let Some(url) = self.base_url {
            builder = builder.base_url(url);
        }
        if let Some(indent) = self.json_indent {
            builder = builder.json_indent(indent);
        }
        if let Some(dir) = self.schema_dir {
            builder = builder.schema_dir(dir);
        }
        if let Some(secs) = self.shutdown_timeout_secs {
            builder = builder.shutdown_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.request_timeout_secs {
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    key: "request_timeout_secs",
                    message: "must be greater than zero".to_string(),
                });
            }
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
        if let Some(bytes) = self.max_body_size {
            if bytes == 0 {
                return Err(ConfigError::Invalid {
                    key: "max_body_size",
                    message: "must be greater than zero".to_string(),
                });
            }
            builder = builder.max_body_size(bytes);
        }

        Ok(builder.build())
    }
}
