//! Definition, configuration and server errors.

use std::path::PathBuf;

use oasis_schema::SchemaError;
use thiserror::Error;

/// A configuration error found while defining an endpoint.
///
/// These are raised once, by [`EndpointBuilder::define`](crate::EndpointBuilder::define),
/// and never while serving traffic.
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// Another endpoint of the service already uses the operation id.
    #[error("operation id '{operation_id}' is already defined")]
    DuplicateOperationId {
        /// The clashing operation id.
        operation_id: String,
    },

    /// A path parameter has no `{name}` placeholder in the URL template.
    #[error("{operation_id}: path parameter '{name}' has no placeholder in '{path}'")]
    MissingPathPlaceholder {
        /// Operation being defined.
        operation_id: String,
        /// Parameter name.
        name: String,
        /// URL template.
        path: String,
    },

    /// A parameter location other than `query`, `path` or `header`.
    #[error("{operation_id}: parameter '{name}' has invalid location '{location}'")]
    InvalidParameterLocation {
        /// Operation being defined.
        operation_id: String,
        /// Parameter name.
        name: String,
        /// The location as declared.
        location: String,
    },

    /// A schema `$ref` that no registry definition satisfies.
    #[error("{operation_id}: unresolvable schema reference '{reference}'")]
    UnresolvableReference {
        /// Operation being defined.
        operation_id: String,
        /// The reference as written.
        reference: String,
    },

    /// A schema failed to compile.
    #[error("{operation_id}: {source}")]
    Schema {
        /// Operation being defined.
        operation_id: String,
        /// Underlying error.
        #[source]
        source: SchemaError,
    },
}

impl DefinitionError {
    pub(crate) fn from_schema(operation_id: &str, err: SchemaError) -> Self {
        match err {
            SchemaError::UnresolvableReference { reference } => Self::UnresolvableReference {
                operation_id: operation_id.to_string(),
                reference,
            },
            source => Self::Schema {
                operation_id: operation_id.to_string(),
                source,
            },
        }
    }
}

/// Errors loading a [`ServerConfig`](crate::ServerConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The TOML could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range or malformed.
    #[error("invalid config value for '{key}': {message}")]
    Invalid {
        /// Offending key.
        key: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to address.
    #[error("Bind error: {0}")]
    BindError(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(String),
}
