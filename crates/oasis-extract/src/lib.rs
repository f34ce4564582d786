//! # Oasis Extract
//!
//! Request-side building blocks of the Oasis pipeline.
//!
//! - [`PathPattern`] - placeholder positions of a URL template
//! - [`convert`] - raw text to a typed [`ParamValue`](oasis_core::ParamValue)
//! - [`first_query_values`] - query string decoding
//! - [`RequestShape`] - an endpoint's declared request, and the materializer
//!   that fills a [`RequestContext`](oasis_core::RequestContext) from a raw request
//!
//! Conversion fails fast: the first parameter whose text does not parse as
//! its declared kind aborts the request before schema validation runs.

#![doc(html_root_url = "https://docs.rs/oasis-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod convert;
mod materialize;
mod path_pattern;
mod query;

pub use convert::convert;
pub use materialize::{BodyDecoder, BodySpec, RequestShape, DEFAULT_MAX_BODY_SIZE};
pub use path_pattern::{segment_count, PathPattern};
pub use query::first_query_values;
