//! The service object owning a set of endpoints.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use http::{Method, Uri};
use indexmap::IndexMap;
use oasis_core::{Middleware, OasError, Reply, RequestContext};
use oasis_extract::{segment_count, DEFAULT_MAX_BODY_SIZE};
use oasis_schema::{SchemaRegistry, SchemaResult};
use parking_lot::RwLock;

use crate::config::ServerConfig;
use crate::endpoint::{Endpoint, EndpointBuilder};
use crate::router::Router;

/// A hook receiving the outcome of every request.
///
/// It is called with the final context, the reply that was sent and every
/// error collected along the way: the request error if there was one,
/// response schema mismatches, and serialization failures.
pub type Observer = Arc<dyn Fn(&RequestContext, &Reply, &[OasError]) + Send + Sync>;

/// Settings shared by a service and all of its endpoints.
///
/// All of them can be changed after endpoints are defined; requests read
/// the current value.
pub(crate) struct ServiceSettings {
    json_indent: AtomicUsize,
    max_body_size: AtomicUsize,
    observer: RwLock<Option<Observer>>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            json_indent: AtomicUsize::new(0),
            max_body_size: AtomicUsize::new(DEFAULT_MAX_BODY_SIZE),
            observer: RwLock::new(None),
        }
    }
}

impl ServiceSettings {
    pub(crate) fn json_indent(&self) -> usize {
        self.json_indent.load(Ordering::Relaxed)
    }

    pub(crate) fn max_body_size(&self) -> usize {
        self.max_body_size.load(Ordering::Relaxed)
    }

    pub(crate) fn observer(&self) -> Option<Observer> {
        self.observer.read().clone()
    }
}

impl fmt::Debug for ServiceSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceSettings")
            .field("json_indent", &self.json_indent())
            .field("max_body_size", &self.max_body_size())
            .field("observer", &self.observer.read().is_some())
            .finish()
    }
}

/// A set of endpoints mounted under one base URL.
///
/// # Example
///
/// ```rust
/// use oasis_core::{handler_fn, Reply};
/// use oasis_server::Service;
/// use http::Method;
/// use serde_json::json;
///
/// let mut service = Service::new("http://localhost:5000/api");
/// service
///     .new_endpoint("ping", Method::GET, "/ping", "Liveness", "", ["ops"])
///     .response(200, "pong", json!({"type": "string"}))
///     .define(handler_fn(|_ctx| Box::pin(async { Ok(Reply::ok("pong")) })))
///     .unwrap();
///
/// assert_eq!(service.endpoint("ping").unwrap().info().route, "/api/ping");
/// ```
pub struct Service {
    base_url: String,
    base_path: String,
    registry: Arc<SchemaRegistry>,
    endpoints: IndexMap<String, Arc<Endpoint>>,
    middleware: Vec<Middleware>,
    settings: Arc<ServiceSettings>,
}

impl Service {
    /// Creates a service mounted at `base_url`, with an empty schema registry.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let base_path = base_path_of(&base_url);
        Self {
            base_url,
            base_path,
            registry: Arc::new(SchemaRegistry::new()),
            endpoints: IndexMap::new(),
            middleware: Vec::new(),
            settings: Arc::new(ServiceSettings::default()),
        }
    }

    /// Replaces the schema registry used by endpoints defined afterwards.
    #[must_use]
    pub fn with_registry(mut self, registry: SchemaRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// Creates a service from configuration, loading its schema directory.
    ///
    /// # Errors
    ///
    /// Returns a `SchemaError` if the schema directory cannot be loaded.
    pub fn from_config(config: &ServerConfig) -> SchemaResult<Self> {
        let mut service = Self::new(config.base_url());
        service.set_default_json_indent(config.json_indent());
        service.set_max_body_size(config.max_body_size());
        if let Some(dir) = config.schema_dir() {
            service.registry = Arc::new(SchemaRegistry::load_dir(dir)?);
        }
        Ok(service)
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the path component of the base URL, without a trailing slash.
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Returns the number of segments the base path puts in front of every route.
    #[must_use]
    pub fn base_segments(&self) -> usize {
        segment_count(&self.base_path)
    }

    /// Returns the schema registry.
    #[must_use]
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Sets the JSON indent used when a request does not override it.
    pub fn set_default_json_indent(&self, indent: usize) {
        self.settings.json_indent.store(indent, Ordering::Relaxed);
    }

    /// Returns the default JSON indent.
    #[must_use]
    pub fn default_json_indent(&self) -> usize {
        self.settings.json_indent()
    }

    /// Sets the largest request body read, in bytes. Larger bodies are
    /// answered with 413.
    pub fn set_max_body_size(&self, bytes: usize) {
        self.settings.max_body_size.store(bytes, Ordering::Relaxed);
    }

    /// Returns the request body limit.
    #[must_use]
    pub fn max_body_size(&self) -> usize {
        self.settings.max_body_size()
    }

    /// Installs the response-and-error observer.
    pub fn set_observer<F>(&self, observer: F)
    where
        F: Fn(&RequestContext, &Reply, &[OasError]) + Send + Sync + 'static,
    {
        *self.settings.observer.write() = Some(Arc::new(observer));
    }

    /// Removes the observer; collected errors are logged instead.
    pub fn clear_observer(&self) {
        *self.settings.observer.write() = None;
    }

    /// Adds middleware applied to every endpoint defined afterwards.
    ///
    /// Service middleware wraps endpoint middleware, in registration order.
    pub fn use_middleware(&mut self, middleware: Middleware) {
        self.middleware.push(middleware);
    }

    /// Starts declaring an endpoint.
    ///
    /// Line breaks in `description` are stored as `<br/>`.
    pub fn new_endpoint<I, T>(
        &mut self,
        operation_id: impl Into<String>,
        method: Method,
        path: impl Into<String>,
        summary: impl Into<String>,
        description: &str,
        tags: I,
    ) -> EndpointBuilder<'_>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        EndpointBuilder::new(
            self,
            operation_id.into(),
            method,
            path.into(),
            summary.into(),
            description.replace("\r\n", "\n").replace('\n', "<br/>"),
            tags.into_iter().map(Into::into).collect(),
        )
    }

    /// Returns the defined endpoints keyed by operation id, in definition order.
    #[must_use]
    pub fn endpoints(&self) -> &IndexMap<String, Arc<Endpoint>> {
        &self.endpoints
    }

    /// Looks up an endpoint by operation id.
    #[must_use]
    pub fn endpoint(&self, operation_id: &str) -> Option<&Arc<Endpoint>> {
        self.endpoints.get(operation_id)
    }

    /// Builds a route table of every defined endpoint.
    #[must_use]
    pub fn router(&self) -> Router {
        let mut router = Router::new();
        for endpoint in self.endpoints.values() {
            router.add_endpoint(Arc::clone(endpoint));
        }
        router
    }

    pub(crate) fn contains(&self, operation_id: &str) -> bool {
        self.endpoints.contains_key(operation_id)
    }

    pub(crate) fn insert(&mut self, endpoint: Arc<Endpoint>) {
        self.endpoints
            .insert(endpoint.info().operation_id.clone(), endpoint);
    }

    pub(crate) fn registry_arc(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub(crate) fn service_middleware(&self) -> &[Middleware] {
        &self.middleware
    }

    pub(crate) fn settings(&self) -> &Arc<ServiceSettings> {
        &self.settings
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("base_url", &self.base_url)
            .field("endpoints", &self.endpoints.keys().collect::<Vec<_>>())
            .field("middleware", &self.middleware.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Extracts the mount path from a base URL: `http://host/api/` gives `/api`.
fn base_path_of(base_url: &str) -> String {
    let path = match base_url.parse::<Uri>() {
        Ok(uri) if uri.scheme().is_some() => uri.path().to_string(),
        _ => base_url.to_string(),
    };
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
