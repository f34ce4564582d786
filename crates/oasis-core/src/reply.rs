//! Handler replies.
//!
//! A [`Reply`] is what a handler hands back to the pipeline: a status, an
//! optional body of any serializable type, extra headers, and an `ignore`
//! flag for handlers that wrote the raw response themselves.
//!
//! # Example
//!
//! ```
//! use oasis_core::Reply;
//! use serde_json::json;
//!
//! let reply = Reply::json(201, json!({"id": 7}));
//! assert_eq!(reply.status_code(), 201);
//! assert!(reply.has_body());
//!
//! // Status 0 means "unset" and resolves to 200.
//! assert_eq!(Reply::ok(json!([])).resolved_status(), 200);
//! assert_eq!(Reply::new().resolved_status(), 200);
//! ```

use std::fmt;

use http::header::IntoHeaderName;
use http::{HeaderMap, HeaderValue};
use serde::Serialize;
use serde_json::Value;

/// A reply body: anything that can be turned into JSON.
pub trait ReplyBody: Send + Sync {
    /// Converts the body into a JSON value.
    fn to_json(&self) -> serde_json::Result<Value>;
}

impl<T> ReplyBody for T
where
    T: Serialize + Send + Sync,
{
    fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

/// The outcome of a handler.
#[derive(Default)]
pub struct Reply {
    ignore: bool,
    status: u16,
    body: Option<Box<dyn ReplyBody>>,
    headers: HeaderMap,
}

impl Reply {
    /// Creates an empty reply with an unset status.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a 200 reply with a body.
    pub fn ok<T: Serialize + Send + Sync + 'static>(body: T) -> Self {
        Self::json(200, body)
    }

    /// Creates a reply with a status and a body.
    pub fn json<T: Serialize + Send + Sync + 'static>(status: u16, body: T) -> Self {
        Self::with_status(status).body(body)
    }

    /// Creates a body-less reply with a status.
    #[must_use]
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// Creates a reply telling the pipeline the handler already wrote the
    /// response through the context's writer.
    #[must_use]
    pub fn ignore() -> Self {
        Self {
            ignore: true,
            ..Self::default()
        }
    }

    /// Sets the body.
    pub fn body<T: Serialize + Send + Sync + 'static>(mut self, body: T) -> Self {
        self.body = Some(Box::new(body));
        self
    }

    /// Sets the status.
    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Adds a response header.
    pub fn header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Returns `true` if the pipeline must not write anything.
    #[must_use]
    pub fn is_ignored(&self) -> bool {
        self.ignore
    }

    /// Returns the raw status; 0 means unset.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status
    }

    /// Returns the status with "unset" resolved to 200.
    #[must_use]
    pub fn resolved_status(&self) -> u16 {
        if self.status == 0 {
            200
        } else {
            self.status
        }
    }

    /// Overwrites the status.
    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    /// Replaces the body.
    pub fn set_body<T: Serialize + Send + Sync + 'static>(&mut self, body: T) {
        self.body = Some(Box::new(body));
    }

    /// Returns `true` if a body is set.
    #[must_use]
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Converts the body into JSON. `None` when there is no body.
    ///
    /// The resolver sends a body that converts to `null` as no body at all.
    pub fn body_json(&self) -> Option<serde_json::Result<Value>> {
        self.body.as_ref().map(|b| b.to_json())
    }

    /// Returns the extra response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the extra response headers mutably.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reply")
            .field("ignore", &self.ignore)
            .field("status", &self.status)
            .field("has_body", &self.body.is_some())
            .field("headers", &self.headers)
            .finish()
    }
}
