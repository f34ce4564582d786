//! # Oasis Server
//!
//! Endpoint definition and HTTP serving for Oasis.
//!
//! - [`Service`] - owns the endpoints mounted under one base URL, the schema
//!   registry, service middleware, the JSON indent and the observer
//! - [`EndpointBuilder`] - the declaration surface, finished by
//!   [`define`](EndpointBuilder::define)
//! - [`Endpoint::call`] - the per-request pipeline: materialize, dispatch,
//!   resolve and encode
//! - [`Router`], [`Server`], [`ShutdownSignal`] - serving over hyper
//! - [`ServerConfig`] - configuration, in code or from TOML
//!
//! ## Example
//!
//! ```rust
//! use oasis_core::{handler_fn, ParamKind, Reply};
//! use oasis_server::Service;
//! use http::{Method, Request};
//! use http_body_util::Empty;
//! use bytes::Bytes;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let mut service = Service::new("http://localhost:5000/api");
//! let search = service
//!     .new_endpoint("search", Method::GET, "/search", "Search", "", ["search"])
//!     .parameter("query", "q", "Query text", true, json!({"type": "string"}), ParamKind::String)
//!     .define(handler_fn(|ctx| {
//!         Box::pin(async move {
//!             let q = ctx.query().get_str("q").unwrap_or_default().to_string();
//!             Ok(Reply::ok(json!({"q": q})))
//!         })
//!     }))
//!     .unwrap();
//!
//! let request = Request::get("/api/search?q=hello").body(Empty::<Bytes>::new()).unwrap();
//! let response = search.call(request).await;
//! assert_eq!(response.status(), 200);
//!
//! let request = Request::get("/api/search").body(Empty::<Bytes>::new()).unwrap();
//! assert_eq!(search.call(request).await.status(), 400);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/oasis-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
mod endpoint;
mod error;
mod resolve;
mod router;
mod server;
mod service;
pub mod shutdown;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use endpoint::{Endpoint, EndpointBuilder, RequestBodyDoc, ResponseDoc};
pub use error::{ConfigError, DefinitionError, ServerError};
pub use resolve::{JSON_INDENT_HEADER, MAX_JSON_INDENT};
pub use router::{RouteMatch, Router};
pub use server::{HttpResponse, Server};
pub use service::{Observer, Service};
pub use shutdown::{ConnectionTracker, ShutdownSignal};
