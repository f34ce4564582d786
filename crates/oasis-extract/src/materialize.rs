//! Request materialization.
//!
//! Turns a raw request into a validated [`RequestContext`] for one endpoint:
//!
//! 1. collect the body, if one is declared, up to a size limit
//! 2. convert query, path and header parameters, failing on the first bad one
//! 3. validate `{Query, Params, Headers, Body?}` against the composite schema
//! 4. deserialize the body into its declared type

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;
use oasis_core::{OasError, ParamMap, RequestContext, TypedParameter};
use oasis_schema::CompiledSchema;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::convert::convert;
use crate::query::first_query_values;

/// Default request body limit (1 MiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Decodes body bytes into the declared body type.
pub type BodyDecoder =
    Arc<dyn Fn(&[u8]) -> Result<Box<dyn Any + Send + Sync>, serde_json::Error> + Send + Sync>;

/// A declared request body.
#[derive(Clone)]
pub struct BodySpec {
    /// Whether the request must carry a body.
    pub required: bool,
    /// Decoder producing the typed body.
    pub decode: BodyDecoder,
}

impl BodySpec {
    /// Declares a body deserialized into `T`.
    #[must_use]
    pub fn typed<T>(required: bool) -> Self
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        Self {
            required,
            decode: Arc::new(|bytes: &[u8]| {
                let value: T = serde_json::from_slice(bytes)?;
                Ok(Box::new(value) as Box<dyn Any + Send + Sync>)
            }),
        }
    }
}

impl fmt::Debug for BodySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodySpec")
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

/// Everything the materializer needs to know about an endpoint's request.
///
/// Built once when the endpoint is defined and shared by all requests.
#[derive(Debug)]
pub struct RequestShape {
    /// Query parameters in declaration order.
    pub query: Vec<TypedParameter>,
    /// Path parameters with their placeholder index among the template's
    /// non-empty segments.
    pub path: Vec<(TypedParameter, usize)>,
    /// Header parameters in declaration order.
    pub header: Vec<TypedParameter>,
    /// Declared body, if any.
    pub body: Option<BodySpec>,
    /// Compiled composite request schema.
    pub schema: CompiledSchema,
    /// Segments in front of the template: mount path plus version.
    pub prefix_segments: usize,
}

impl RequestShape {
    /// Populates `ctx` from the request and validates it.
    ///
    /// The body stream is only read when a body is declared, and at most
    /// `max_body_size` bytes of it. A larger body is rejected with
    /// [`OasError::PayloadTooLarge`]. Other body read failures are internal;
    /// conversion, JSON and schema failures are client errors.
    pub async fn materialize<B>(
        &self,
        ctx: &mut RequestContext,
        body: B,
        max_body_size: usize,
    ) -> Result<(), OasError>
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let raw_body = match &self.body {
            Some(_) => Some(read_body(body, max_body_size).await?),
            None => None,
        };

        let query = self.convert_query(ctx)?;
        *ctx.query_mut() = query;

        let params = self.convert_path(ctx)?;
        *ctx.params_mut() = params;

        let headers = self.convert_headers(ctx)?;
        *ctx.headers_mut() = headers;

        let body_json = match raw_body.as_deref() {
            Some(bytes) if !bytes.is_empty() => {
                Some(serde_json::from_slice::<Value>(bytes).map_err(OasError::malformed_json)?)
            }
            _ => None,
        };

        let mut candidate = Map::new();
        candidate.insert("Query".to_string(), ctx.query().to_json());
        candidate.insert("Params".to_string(), ctx.params().to_json());
        candidate.insert("Headers".to_string(), ctx.headers().to_json());
        if let Some(body_json) = body_json {
            candidate.insert("Body".to_string(), body_json);
        }

        if let Err(errors) = self.schema.validate(&Value::Object(candidate)) {
            debug!(
                operation_id = %ctx.endpoint().operation_id,
                violations = errors.len(),
                "request failed schema validation"
            );
            return Err(OasError::Validation(errors));
        }

        if let (Some(spec), Some(bytes)) = (&self.body, raw_body) {
            if !bytes.is_empty() {
                let typed = (spec.decode)(&bytes[..]).map_err(OasError::malformed_json)?;
                ctx.set_body(typed);
            }
        }

        Ok(())
    }

    fn convert_query(&self, ctx: &RequestContext) -> Result<ParamMap, OasError> {
        let mut out = ParamMap::new();
        if self.query.is_empty() {
            return Ok(out);
        }

        let values = first_query_values(ctx.uri().query().unwrap_or_default());
        for param in &self.query {
            let Some(raw) = values.get(&param.name) else {
                continue;
            };
            if let Some(value) = convert(param, raw)? {
                out.insert(param.name.clone(), value);
            }
        }
        Ok(out)
    }

    fn convert_path(&self, ctx: &RequestContext) -> Result<ParamMap, OasError> {
        let mut out = ParamMap::new();
        if self.path.is_empty() {
            return Ok(out);
        }

        // same rule as the router: empty segments do not count
        let segments: Vec<&str> = ctx
            .uri()
            .path()
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        for (param, index) in &self.path {
            let Some(segment) = segments.get(index + self.prefix_segments) else {
                continue;
            };
            let raw = urlencoding::decode(segment)
                .map_err(|_| OasError::parameter_type(param.location, &param.name, *segment, param.kind))?;
            if let Some(value) = convert(param, &raw)? {
                out.insert(param.name.clone(), value);
            }
        }
        Ok(out)
    }

    fn convert_headers(&self, ctx: &RequestContext) -> Result<ParamMap, OasError> {
        let mut out = ParamMap::new();
        for param in &self.header {
            let Some(value) = ctx.raw_headers().get(param.name.as_str()) else {
                continue;
            };
            let raw = String::from_utf8_lossy(value.as_bytes());
            if let Some(value) = convert(param, &raw)? {
                out.insert(param.name.clone(), value);
            }
        }
        Ok(out)
    }
}

async fn read_body<B>(body: B, limit: usize) -> Result<Bytes, OasError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    Limited::new(body, limit)
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|err| {
            if err.downcast_ref::<LengthLimitError>().is_some() {
                OasError::PayloadTooLarge { limit }
            } else {
                OasError::internal(format!("failed to read request body: {err}"))
            }
        })
}
