//! Endpoint declaration and the per-request pipeline.
//!
//! An endpoint is declared with an [`EndpointBuilder`] obtained from
//! [`Service::new_endpoint`](crate::Service::new_endpoint). Declarations are
//! only recorded; all checks and schema compilation happen once, in
//! [`EndpointBuilder::define`]. The resulting [`Endpoint`] is immutable and
//! shared by every request it serves.
//!
//! # Example
//!
//! ```rust
//! use oasis_core::{handler_fn, ParamKind, Reply};
//! use oasis_server::Service;
//! use http::Method;
//! use serde_json::json;
//!
//! let mut service = Service::new("http://localhost:5000/api");
//! let endpoint = service
//!     .new_endpoint("getItem", Method::GET, "/item/{item}", "Get an item", "", ["items"])
//!     .parameter("path", "item", "Item id", true, json!({"type": "string"}), ParamKind::String)
//!     .version(2)
//!     .response(200, "The item", json!({"type": "object"}))
//!     .define(handler_fn(|ctx| {
//!         Box::pin(async move {
//!             let item = ctx.params().get_str("item").unwrap_or_default().to_string();
//!             Ok(Reply::ok(json!({"id": item})))
//!         })
//!     }))
//!     .unwrap();
//!
//! assert_eq!(endpoint.info().route, "/api/v2/item/{item}");
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::{Method, Request, Response};
use http_body_util::Full;
use hyper::body::Body;
use oasis_core::{
    EndpointInfo, Handler, Middleware, ParamKind, ParamLocation, RequestContext,
    SecurityRequirement, TypedParameter,
};
use oasis_extract::{segment_count, BodySpec, PathPattern, RequestShape};
use oasis_middleware::{compose, dispatch};
use oasis_schema::{composite_request_schema, BodySchema, CompiledSchema, ResponseSchemas};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::DefinitionError;
use crate::resolve::{indent_override, resolve};
use crate::service::{Service, ServiceSettings};

/// A declared request body.
#[derive(Debug, Clone)]
pub struct RequestBodyDoc {
    /// Human readable description.
    pub description: String,
    /// Whether the body must be present.
    pub required: bool,
    /// JSON Schema of the body.
    pub schema: Value,
}

/// A declared response.
#[derive(Debug, Clone)]
pub struct ResponseDoc {
    /// Status code.
    pub code: u16,
    /// Human readable description.
    pub description: String,
    /// JSON Schema of the body; `Value::Null` when the response has none.
    pub schema: Value,
}

/// A parameter as written in the declaration, before its location is checked.
#[derive(Debug)]
struct PendingParameter {
    location: String,
    name: String,
    description: String,
    required: bool,
    schema: Value,
    kind: ParamKind,
}

/// Accumulates the declaration of one endpoint.
///
/// Nothing is validated until [`define`](Self::define) is called.
#[must_use = "an endpoint is only registered by calling `define`"]
pub struct EndpointBuilder<'s> {
    service: &'s mut Service,
    operation_id: String,
    method: Method,
    path: String,
    summary: String,
    description: String,
    tags: Vec<String>,
    parameters: Vec<PendingParameter>,
    body: Option<(RequestBodyDoc, BodySpec)>,
    responses: Vec<ResponseDoc>,
    security: Vec<SecurityRequirement>,
    version: Option<u32>,
    deprecated: bool,
    options: BTreeMap<String, Value>,
    middleware: Vec<Middleware>,
}

impl<'s> EndpointBuilder<'s> {
    pub(crate) fn new(
        service: &'s mut Service,
        operation_id: String,
        method: Method,
        path: String,
        summary: String,
        description: String,
        tags: Vec<String>,
    ) -> Self {
        Self {
            service,
            operation_id,
            method,
            path,
            summary,
            description,
            tags,
            parameters: Vec::new(),
            body: None,
            responses: Vec::new(),
            security: Vec::new(),
            version: None,
            deprecated: false,
            options: BTreeMap::new(),
            middleware: Vec::new(),
        }
    }

    /// Declares a parameter.
    ///
    /// `location` is one of `query`, `path` or `header`. A `Value::Null`
    /// schema stands for "any value of `kind`".
    pub fn parameter(
        mut self,
        location: &str,
        name: impl Into<String>,
        description: impl Into<String>,
        required: bool,
        schema: Value,
        kind: ParamKind,
    ) -> Self {
        self.parameters.push(PendingParameter {
            location: location.to_string(),
            name: name.into(),
            description: description.into(),
            required,
            schema,
            kind,
        });
        self
    }

    /// Declares a JSON request body deserialized into `T`.
    pub fn request_body<T>(
        mut self,
        description: impl Into<String>,
        required: bool,
        schema: Value,
    ) -> Self
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let doc = RequestBodyDoc {
            description: description.into(),
            required,
            schema,
        };
        self.body = Some((doc, BodySpec::typed::<T>(required)));
        self
    }

    /// Declares a response. Pass `Value::Null` for a response without a body.
    pub fn response(mut self, code: u16, description: impl Into<String>, schema: Value) -> Self {
        self.responses.retain(|r| r.code != code);
        self.responses.push(ResponseDoc {
            code,
            description: description.into(),
            schema,
        });
        self
    }

    /// Adds a security requirement.
    pub fn security<I, S>(mut self, name: impl Into<String>, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.security.push(SecurityRequirement {
            name: name.into(),
            scopes: scopes.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Mounts the endpoint under `/v<n>`.
    pub fn version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    /// Marks the endpoint deprecated, appending the comment to the description.
    pub fn deprecate(mut self, comment: &str) -> Self {
        self.deprecated = true;
        if !comment.is_empty() {
            self.description.push_str("<br/>DEPRECATED: ");
            self.description.push_str(comment);
        }
        self
    }

    /// Attaches a free-form option readable through the request context.
    pub fn option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Adds endpoint middleware. It runs inside any service middleware.
    pub fn middleware(mut self, middleware: Middleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Checks the declaration, compiles its schemas and registers the endpoint.
    ///
    /// # Errors
    ///
    /// Returns a [`DefinitionError`] for a duplicate operation id, an invalid
    /// parameter location, a path parameter without placeholder, an
    /// unresolvable `$ref` or a schema that does not compile. Nothing is
    /// registered in that case.
    ///
    /// A template without a leading `/` is mounted as if it had one.
    pub fn define(self, handler: Handler) -> Result<Arc<Endpoint>, DefinitionError> {
        let Self {
            service,
            operation_id,
            method,
            path,
            summary,
            description,
            tags,
            parameters,
            body,
            responses,
            security,
            version,
            deprecated,
            options,
            middleware,
        } = self;

        if service.contains(&operation_id) {
            return Err(DefinitionError::DuplicateOperationId { operation_id });
        }

        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };

        let pattern = PathPattern::parse(&path);
        let mut declared = Vec::with_capacity(parameters.len());
        let mut query = Vec::new();
        let mut path_params = Vec::new();
        let mut header = Vec::new();

        for pending in parameters {
            let location: ParamLocation = pending.location.parse().map_err(|_| {
                DefinitionError::InvalidParameterLocation {
                    operation_id: operation_id.clone(),
                    name: pending.name.clone(),
                    location: pending.location.clone(),
                }
            })?;
            let param = TypedParameter::new(
                location,
                pending.name,
                pending.description,
                pending.required,
                pending.schema,
                pending.kind,
            );

            match location {
                ParamLocation::Query => query.push(param.clone()),
                ParamLocation::Header => header.push(param.clone()),
                ParamLocation::Path => {
                    let index = pattern.index_of(&param.name).ok_or_else(|| {
                        DefinitionError::MissingPathPlaceholder {
                            operation_id: operation_id.clone(),
                            name: param.name.clone(),
                            path: path.clone(),
                        }
                    })?;
                    path_params.push((param.clone(), index));
                }
            }
            declared.push(param);
        }

        let plain_path: Vec<TypedParameter> = path_params.iter().map(|(p, _)| p.clone()).collect();
        let composite = composite_request_schema(
            &query,
            &plain_path,
            &header,
            body.as_ref().map(|(doc, _)| BodySchema {
                schema: &doc.schema,
                required: doc.required,
            }),
        );

        let registry = Arc::clone(service.registry_arc());
        let schema = CompiledSchema::compile(&composite, &registry)
            .map_err(|err| DefinitionError::from_schema(&operation_id, err))?;
        let response_schemas = ResponseSchemas::compile(
            responses
                .iter()
                .map(|r| (r.code, Some(&r.schema).filter(|s| !s.is_null()))),
            &registry,
        )
        .map_err(|err| DefinitionError::from_schema(&operation_id, err))?;

        let version_prefix = version.map(|v| format!("/v{v}")).unwrap_or_default();
        let route = format!("{}{}{}", service.base_path(), version_prefix, path);
        let prefix_segments = segment_count(service.base_path()) + usize::from(version.is_some());

        let chain: Vec<Middleware> = service
            .service_middleware()
            .iter()
            .chain(middleware.iter())
            .cloned()
            .collect();
        let handler = compose(handler, &chain);

        let (body_doc, body_spec) = match body {
            Some((doc, spec)) => (Some(doc), Some(spec)),
            None => (None, None),
        };

        let info = Arc::new(EndpointInfo {
            operation_id,
            method,
            path,
            route,
            version,
            summary,
            description,
            tags,
            deprecated,
            security,
            options,
        });

        let endpoint = Arc::new(Endpoint {
            info: Arc::clone(&info),
            parameters: declared,
            request_body: body_doc,
            responses,
            shape: RequestShape {
                query,
                path: path_params,
                header,
                body: body_spec,
                schema,
                prefix_segments,
            },
            response_schemas,
            handler,
            settings: Arc::clone(service.settings()),
        });

        debug!(
            operation_id = %info.operation_id,
            method = %info.method,
            route = %info.route,
            middleware = chain.len(),
            "endpoint defined"
        );

        service.insert(Arc::clone(&endpoint));
        Ok(endpoint)
    }
}

impl EndpointBuilder<'_> {
    /// Like [`define`](Self::define), for startup code that cannot continue
    /// with a misconfigured endpoint.
    ///
    /// # Panics
    ///
    /// Panics with the [`DefinitionError`] text if the definition fails.
    pub fn must_define(self, handler: Handler) -> Arc<Endpoint> {
        match self.define(handler) {
            Ok(endpoint) => endpoint,
            Err(err) => panic!("failed to define endpoint: {err}"),
        }
    }
}

impl fmt::Debug for EndpointBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointBuilder")
            .field("operation_id", &self.operation_id)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("parameters", &self.parameters)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

/// A defined endpoint: metadata, compiled schemas and the composed handler.
pub struct Endpoint {
    info: Arc<EndpointInfo>,
    parameters: Vec<TypedParameter>,
    request_body: Option<RequestBodyDoc>,
    responses: Vec<ResponseDoc>,
    shape: RequestShape,
    response_schemas: ResponseSchemas,
    handler: Handler,
    settings: Arc<ServiceSettings>,
}

impl Endpoint {
    /// Returns the endpoint metadata.
    #[must_use]
    pub fn info(&self) -> &Arc<EndpointInfo> {
        &self.info
    }

    /// Returns the declared parameters in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[TypedParameter] {
        &self.parameters
    }

    /// Returns the declared request body.
    #[must_use]
    pub fn request_body(&self) -> Option<&RequestBodyDoc> {
        self.request_body.as_ref()
    }

    /// Returns the declared responses.
    #[must_use]
    pub fn responses(&self) -> &[ResponseDoc] {
        &self.responses
    }

    /// Returns the compiled composite request schema document.
    #[must_use]
    pub fn request_schema(&self) -> &Value {
        self.shape.schema.document()
    }

    /// Serves one request.
    ///
    /// Never fails: request errors become 400 responses, internal errors and
    /// handler panics become 500 responses with the generic envelope.
    pub async fn call<B>(&self, request: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let (parts, body) = request.into_parts();
        let indent = indent_override(&parts.headers).unwrap_or_else(|| self.settings.json_indent());
        let mut ctx = RequestContext::from_parts(Arc::clone(&self.info), parts);

        let max_body_size = self.settings.max_body_size();
        let outcome = match self.shape.materialize(&mut ctx, body, max_body_size).await {
            Ok(()) => dispatch(&self.handler, &mut ctx).await,
            Err(err) => Err(err),
        };

        resolve(&mut ctx, outcome, &self.response_schemas, &self.settings, indent)
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("info", &self.info)
            .field("parameters", &self.parameters)
            .field("responses", &self.responses.len())
            .finish_non_exhaustive()
    }
}
