//! # Oasis Schema
//!
//! JSON Schema support for the Oasis endpoint pipeline.
//!
//! - [`SchemaRegistry`] - named definitions loaded from `*.json` files
//! - [`composite_request_schema`] - one schema describing query, path, header and body
//! - [`CompiledSchema`] - a compiled validator with its embedded definitions
//! - [`ResponseSchemas`] - compiled response schemas keyed by status
//!
//! ## Example
//!
//! ```
//! use oasis_schema::{array_of, schema_ref, CompiledSchema, SchemaRegistry};
//! use serde_json::json;
//!
//! let mut registry = SchemaRegistry::new();
//! registry
//!     .define("Result", json!({"type": "object", "required": ["title"]}))
//!     .unwrap();
//!
//! let schema = CompiledSchema::compile(&array_of(schema_ref("Result")), &registry).unwrap();
//! assert!(schema.is_valid(&json!([{"title": "hello"}])));
//! assert!(!schema.is_valid(&json!([{}])));
//! ```

#![doc(html_root_url = "https://docs.rs/oasis-schema/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod compiler;
mod error;
mod helpers;
mod registry;

pub use compiler::{
    composite_request_schema, BodySchema, CompiledSchema, ResponseSchemas, Validation,
    ROOT_LOCATION, SCHEMA_DRAFT,
};
pub use error::{SchemaError, SchemaResult};
pub use helpers::{array_of, schema_ref};
pub use registry::{SchemaRegistry, DEFINITIONS_PREFIX};
