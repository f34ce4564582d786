//! Per-request context.
//!
//! The [`RequestContext`] carries everything a handler sees for one request:
//! converted query, path and header parameters, the typed body, the endpoint
//! it was routed to, and a free-form extension bag for middleware. It is
//! created fresh by the materializer and dropped once the response is
//! written.

use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};
use http::{Extensions, HeaderMap, Method, StatusCode, Uri};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::endpoint::EndpointInfo;
use crate::param::ParamMap;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps request ids sortable in logs.
///
/// # Example
///
/// ```
/// use oasis_core::RequestId;
///
/// let id = RequestId::new();
/// println!("Request ID: {}", id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A raw response buffer for handlers that write the response themselves.
///
/// Handlers that use the writer must return [`Reply::ignore`](crate::Reply::ignore);
/// the pipeline then sends exactly what was written here. Only the first
/// status write takes effect.
#[derive(Debug, Default)]
pub struct ResponseWriter {
    status: Option<StatusCode>,
    status_writes: usize,
    headers: HeaderMap,
    body: BytesMut,
}

impl ResponseWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes the status line. Later writes are ignored.
    pub fn write_status(&mut self, status: StatusCode) {
        self.status_writes += 1;
        if let Some(existing) = self.status {
            tracing::warn!(
                existing = existing.as_u16(),
                attempted = status.as_u16(),
                "superfluous status write ignored"
            );
            return;
        }
        self.status = Some(status);
    }

    /// Appends body bytes, implying status 200 if none was written.
    pub fn write(&mut self, chunk: &[u8]) {
        if self.status.is_none() {
            self.write_status(StatusCode::OK);
        }
        self.body.extend_from_slice(chunk);
    }

    /// Returns the response headers mutably.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Returns the response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the written status, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Returns how many times a status write was attempted.
    #[must_use]
    pub fn status_writes(&self) -> usize {
        self.status_writes
    }

    /// Returns the body written so far.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Takes the buffered response, defaulting the status to 200.
    pub fn take(&mut self) -> (StatusCode, HeaderMap, Bytes) {
        let status = self.status.unwrap_or(StatusCode::OK);
        let headers = std::mem::take(&mut self.headers);
        let body = std::mem::take(&mut self.body).freeze();
        (status, headers, body)
    }
}

/// Per-request state passed to handlers and middleware.
#[derive(Debug)]
pub struct RequestContext {
    request_id: RequestId,
    method: Method,
    uri: Uri,
    raw_headers: HeaderMap,
    query: ParamMap,
    params: ParamMap,
    headers: ParamMap,
    body: Option<Box<dyn Any + Send + Sync>>,
    endpoint: Arc<EndpointInfo>,
    extensions: Extensions,
    writer: ResponseWriter,
    started_at: Instant,
}

impl RequestContext {
    /// Creates a context for a request routed to `endpoint`.
    pub fn new(endpoint: Arc<EndpointInfo>, method: Method, uri: Uri, headers: HeaderMap) -> Self {
        Self {
            request_id: RequestId::new(),
            method,
            uri,
            raw_headers: headers,
            query: ParamMap::new(),
            params: ParamMap::new(),
            headers: ParamMap::new(),
            body: None,
            endpoint,
            extensions: Extensions::new(),
            writer: ResponseWriter::new(),
            started_at: Instant::now(),
        }
    }

    /// Creates a context from request parts; request extensions seed the
    /// context's extension bag.
    pub fn from_parts(endpoint: Arc<EndpointInfo>, parts: http::request::Parts) -> Self {
        let mut ctx = Self::new(endpoint, parts.method, parts.uri, parts.headers);
        ctx.extensions = parts.extensions;
        ctx
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns all request headers as received.
    #[must_use]
    pub fn raw_headers(&self) -> &HeaderMap {
        &self.raw_headers
    }

    /// Returns the declared query parameters, converted.
    #[must_use]
    pub fn query(&self) -> &ParamMap {
        &self.query
    }

    /// Returns the declared path parameters, converted.
    #[must_use]
    pub fn params(&self) -> &ParamMap {
        &self.params
    }

    /// Returns the declared header parameters, converted.
    #[must_use]
    pub fn headers(&self) -> &ParamMap {
        &self.headers
    }

    /// Returns the query map mutably.
    pub fn query_mut(&mut self) -> &mut ParamMap {
        &mut self.query
    }

    /// Returns the path parameter map mutably.
    pub fn params_mut(&mut self) -> &mut ParamMap {
        &mut self.params
    }

    /// Returns the header parameter map mutably.
    pub fn headers_mut(&mut self) -> &mut ParamMap {
        &mut self.headers
    }

    /// Stores the deserialized body.
    pub fn set_body(&mut self, body: Box<dyn Any + Send + Sync>) {
        self.body = Some(body);
    }

    /// Returns `true` if a body was materialized.
    #[must_use]
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Returns the body as `T`, or `None` if absent or of another type.
    #[must_use]
    pub fn body<T: Any>(&self) -> Option<&T> {
        self.body.as_ref().and_then(|b| b.downcast_ref::<T>())
    }

    /// Takes the body out as `T`. A body of another type is left in place.
    pub fn take_body<T: Any>(&mut self) -> Option<T> {
        match self.body.take()?.downcast::<T>() {
            Ok(body) => Some(*body),
            Err(other) => {
                self.body = Some(other);
                None
            }
        }
    }

    /// Returns the metadata of the endpoint serving this request.
    #[must_use]
    pub fn endpoint(&self) -> &Arc<EndpointInfo> {
        &self.endpoint
    }

    /// Returns the extension bag.
    #[must_use]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Returns the extension bag mutably.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Returns the raw response writer.
    #[must_use]
    pub fn writer(&self) -> &ResponseWriter {
        &self.writer
    }

    /// Returns the raw response writer mutably.
    pub fn writer_mut(&mut self) -> &mut ResponseWriter {
        &mut self.writer
    }

    /// Returns the time elapsed since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}
