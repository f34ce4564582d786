//! # Oasis Core
//!
//! Core types for the Oasis endpoint pipeline.
//!
//! - [`RequestContext`] - per-request state handed to handlers
//! - [`Reply`] - a handler's outcome
//! - [`OasError`] - request-time error values and their HTTP classification
//! - [`TypedParameter`], [`ParamKind`], [`ParamValue`], [`ParamMap`] - declared parameters and converted values
//! - [`Handler`], [`Middleware`] - shared async handler and decorator types
//! - [`EndpointInfo`] - read-only endpoint metadata

#![doc(html_root_url = "https://docs.rs/oasis-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod endpoint;
mod error;
mod handler;
mod param;
mod reply;

pub use context::{RequestContext, RequestId, ResponseWriter};
pub use endpoint::{EndpointInfo, SecurityRequirement};
pub use error::{
    internal_envelope, OasError, OasResult, ValidationErrors, ValidationIssue,
    INTERNAL_ERROR_MESSAGE, MALFORMED_JSON_MESSAGE,
};
pub use handler::{handler_fn, middleware_fn, BoxFuture, Handler, Middleware};
pub use param::{ParamKind, ParamLocation, ParamMap, ParamValue, TypedParameter, UnknownLocation};
pub use reply::{Reply, ReplyBody};
