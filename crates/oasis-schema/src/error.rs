//! Schema error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while loading definitions or compiling schemas.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A schema file could not be read.
    #[error("failed to read schema file {}: {source}", .path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A schema file is not valid JSON.
    #[error("failed to parse schema file {}: {source}", .path.display())]
    Parse {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// A schema document has no `definitions` property.
    #[error("{origin}: schema files must contain a top-level 'definitions' property")]
    MissingDefinitions {
        /// File name or other origin of the document.
        origin: String,
    },

    /// A schema document's `definitions` property is not an object.
    #[error("{origin}: 'definitions' property of schema files must be an object")]
    DefinitionsNotObject {
        /// File name or other origin of the document.
        origin: String,
    },

    /// Two definitions share a name.
    #[error("schema definition '{name}' is defined more than once")]
    DuplicateDefinition {
        /// The clashing name.
        name: String,
    },

    /// A `$ref` does not point at a known definition.
    #[error("unresolvable schema reference '{reference}'")]
    UnresolvableReference {
        /// The reference as written.
        reference: String,
    },

    /// The validation engine rejected the schema.
    #[error("schema failed to compile: {message}")]
    Compile {
        /// Engine diagnostic.
        message: String,
    },
}
