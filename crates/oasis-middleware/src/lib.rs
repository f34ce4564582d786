//! # Oasis Middleware
//!
//! Handler wrapping for the Oasis pipeline.
//!
//! - [`compose`] builds an endpoint's handler chain once, at definition time.
//!   The first declared middleware is the outermost.
//! - [`dispatch`] runs a chain for one request and turns a panic into an
//!   internal error instead of unwinding into the server.
//! - [`trace_requests`] is a built-in middleware that opens a `tracing` span
//!   per request.

#![doc(html_root_url = "https://docs.rs/oasis-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod compose;
mod guard;
mod trace;

pub use compose::compose;
pub use guard::{dispatch, panic_message};
pub use trace::trace_requests;
