//! # Oasis
//!
//! **Declarative, schema-validated JSON endpoints**
//!
//! An endpoint is declared once: method, URL template, typed parameters,
//! request body, responses. Defining it compiles a single JSON Schema that
//! covers the whole request. Every request is then converted, validated,
//! handed to the handler chain inside a panic guard, and encoded back to
//! JSON, with the response checked against the schema of its status.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use oasis::prelude::*;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::builder().http_addr("0.0.0.0:5000").build();
//!     let mut service = Service::from_config(&config)?;
//!
//!     service
//!         .new_endpoint("search", Method::GET, "/search", "Search", "", ["search"])
//!         .parameter("query", "q", "Query", true, json!({"type": "string"}), ParamKind::String)
//!         .define(handler_fn(|ctx| {
//!             Box::pin(async move {
//!                 Ok(Reply::ok(json!({"q": ctx.query().get_str("q")})))
//!             })
//!         }))?;
//!
//!     Server::new(config, service.router()).run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! Request → convert params → validate {Query, Params, Headers, Body} → decode body
//!                                                                         ↓
//! Response ← encode JSON ← check response schema ← middleware → handler (panic guard)
//! ```

#![doc(html_root_url = "https://docs.rs/oasis/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use oasis_core as core;

// Re-export schema registry and compiler
pub use oasis_schema as schema;

// Re-export request materialization
pub use oasis_extract as extract;

// Re-export middleware composition and dispatch
pub use oasis_middleware as middleware;

// Re-export service, endpoint and server types
pub use oasis_server as server;

// Re-export logging and metrics
pub use oasis_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// ```rust
/// use oasis::prelude::*;
///
/// let service = Service::new("http://localhost:5000/api");
/// assert_eq!(service.base_path(), "/api");
/// ```
pub mod prelude {
    pub use http::Method;

    pub use oasis_core::{
        handler_fn, middleware_fn, EndpointInfo, Handler, Middleware, OasError, ParamKind,
        ParamLocation, ParamValue, Reply, RequestContext,
    };

    pub use oasis_schema::{array_of, schema_ref, SchemaRegistry};

    pub use oasis_middleware::trace_requests;

    pub use oasis_server::{
        DefinitionError, Endpoint, EndpointBuilder, Server, ServerConfig, Service, ShutdownSignal,
    };

    pub use oasis_telemetry::{init_telemetry, LogConfig, TelemetryConfig};
}
