//! Route table mapping method and path to endpoints.
//!
//! Routes are the mounted templates of defined endpoints, e.g.
//! `/api/v2/item/{item}`. A placeholder matches exactly one non-empty
//! segment. When several routes match, the one with more literal segments
//! wins, then the one added first.
//!
//! # Example
//!
//! ```rust
//! use oasis_core::{handler_fn, Reply};
//! use oasis_server::Service;
//! use http::Method;
//!
//! let mut service = Service::new("http://localhost:5000/api");
//! service
//!     .new_endpoint("getItem", Method::GET, "/item/{item}", "", "", ["items"])
//!     .define(handler_fn(|_ctx| Box::pin(async { Ok(Reply::new()) })))
//!     .unwrap();
//!
//! let router = service.router();
//! let found = router.match_route(&Method::GET, "/api/item/42").unwrap();
//! assert_eq!(found.operation_id(), "getItem");
//! assert_eq!(found.param("item"), Some("42"));
//! assert!(router.match_route(&Method::POST, "/api/item/42").is_none());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::Method;

use crate::endpoint::Endpoint;

/// A matched route with the raw text of its placeholders.
#[derive(Clone)]
pub struct RouteMatch {
    endpoint: Arc<Endpoint>,
    params: HashMap<String, String>,
}

impl RouteMatch {
    /// Returns the matched endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Arc<Endpoint> {
        &self.endpoint
    }

    /// Returns the operation id of the matched endpoint.
    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.endpoint.info().operation_id
    }

    /// Returns the raw placeholder values.
    #[must_use]
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Returns one raw placeholder value.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

impl fmt::Debug for RouteMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch")
            .field("operation_id", &self.operation_id())
            .field("params", &self.params)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Literal(String),
    Param(String),
}

#[derive(Clone)]
struct Route {
    method: Method,
    segments: Vec<PathSegment>,
    literals: usize,
    endpoint: Arc<Endpoint>,
}

impl Route {
    fn new(method: Method, pattern: &str, endpoint: Arc<Endpoint>) -> Self {
        let segments: Vec<PathSegment> = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => PathSegment::Param(name.to_string()),
                None => PathSegment::Literal(s.to_string()),
            })
            .collect();
        let literals = segments
            .iter()
            .filter(|s| matches!(s, PathSegment::Literal(_)))
            .count();
        Self {
            method,
            segments,
            literals,
            endpoint,
        }
    }

    fn match_path(&self, path: &[&str]) -> Option<HashMap<String, String>> {
        if path.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (pattern, actual) in self.segments.iter().zip(path) {
            match pattern {
                PathSegment::Literal(expected) if expected == actual => {}
                PathSegment::Literal(_) => return None,
                PathSegment::Param(name) => {
                    params.insert(name.clone(), (*actual).to_string());
                }
            }
        }
        Some(params)
    }
}

/// HTTP route table.
#[derive(Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Adds an endpoint under its mounted route.
    pub fn add_endpoint(&mut self, endpoint: Arc<Endpoint>) {
        let method = endpoint.info().method.clone();
        let pattern = endpoint.info().route.clone();
        self.add_route(method, &pattern, endpoint);
    }

    /// Adds an endpoint under an explicit method and pattern.
    pub fn add_route(&mut self, method: Method, pattern: &str, endpoint: Arc<Endpoint>) {
        self.routes.push(Route::new(method, pattern, endpoint));
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Finds the endpoint serving `method` and `path`.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let mut best: Option<(&Route, HashMap<String, String>)> = None;
        for route in self.routes.iter().filter(|r| r.method == *method) {
            let Some(params) = route.match_path(&segments) else {
                continue;
            };
            if best.as_ref().map_or(true, |(b, _)| route.literals > b.literals) {
                best = Some((route, params));
            }
        }

        best.map(|(route, params)| RouteMatch {
            endpoint: Arc::clone(&route.endpoint),
            params,
        })
    }

    /// Returns `true` if the path is served under any method.
    #[must_use]
    pub fn has_path(&self, path: &str) -> bool {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        self.routes.iter().any(|r| r.match_path(&segments).is_some())
    }

    /// Returns `true` if an endpoint with this operation id is routed.
    #[must_use]
    pub fn has_operation(&self, operation_id: &str) -> bool {
        self.routes
            .iter()
            .any(|r| r.endpoint.info().operation_id == operation_id)
    }

    /// Returns every routed operation id.
    pub fn operation_ids(&self) -> impl Iterator<Item = &str> {
        self.routes
            .iter()
            .map(|r| r.endpoint.info().operation_id.as_str())
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.routes
                    .iter()
                    .map(|r| (r.method.as_str(), r.endpoint.info().route.as_str())),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Service;
    use oasis_core::{handler_fn, Reply};

    fn service() -> Service {
        let mut service = Service::new("http://localhost:5000/api");
        for (id, method, path, version) in [
            ("search", Method::GET, "/search", Some(1)),
            ("getItem", Method::GET, "/item/{item}", Some(2)),
            ("putItem", Method::PUT, "/item/{item}", Some(1)),
            ("newItem", Method::GET, "/item/new", Some(2)),
            ("getPart", Method::GET, "/item/{item}/parts/{part}", None),
        ] {
            let mut builder = service.new_endpoint(id, method, path, "", "", Vec::<String>::new());
            if let Some(v) = version {
                builder = builder.version(v);
            }
            builder
                .define(handler_fn(|_ctx| Box::pin(async { Ok(Reply::new()) })))
                .unwrap();
        }
        service
    }

    #[test]
    fn test_router_from_service() {
        let router = service().router();
        assert_eq!(router.route_count(), 5);
        assert!(router.has_operation("putItem"));
        assert!(!router.has_operation("deleteItem"));
        assert_eq!(router.operation_ids().count(), 5);
    }

    #[test]
    fn test_match_versioned_routes() {
        let router = service().router();

        let m = router.match_route(&Method::GET, "/api/v1/search").unwrap();
        assert_eq!(m.operation_id(), "search");
        assert!(m.params().is_empty());

        let m = router.match_route(&Method::PUT, "/api/v1/item/abc").unwrap();
        assert_eq!(m.operation_id(), "putItem");
        assert_eq!(m.param("item"), Some("abc"));

        assert!(router.match_route(&Method::GET, "/api/v1/item/abc").is_none());
        assert!(router.match_route(&Method::GET, "/search").is_none());
    }

    #[test]
    fn test_literal_beats_placeholder() {
        let router = service().router();

        let m = router.match_route(&Method::GET, "/api/v2/item/new").unwrap();
        assert_eq!(m.operation_id(), "newItem");

        let m = router.match_route(&Method::GET, "/api/v2/item/old").unwrap();
        assert_eq!(m.operation_id(), "getItem");
    }

    #[test]
    fn test_segment_count_must_match() {
        let router = service().router();

        let m = router
            .match_route(&Method::GET, "/api/item/7/parts/wheel")
            .unwrap();
        assert_eq!(m.param("item"), Some("7"));
        assert_eq!(m.param("part"), Some("wheel"));

        assert!(router.match_route(&Method::GET, "/api/item/7/parts").is_none());
        assert!(router
            .match_route(&Method::GET, "/api/item/7/parts/wheel/extra")
            .is_none());
    }

    #[test]
    fn test_trailing_slash_and_has_path() {
        let router = service().router();
        assert!(router.match_route(&Method::GET, "/api/v1/search/").is_some());
        assert!(router.has_path("/api/v1/item/x"));
        assert!(!router.has_path("/api/v3/item/x"));
    }

    #[test]
    fn test_empty_router() {
        let router = Router::default();
        assert_eq!(router.route_count(), 0);
        assert!(router.match_route(&Method::GET, "/").is_none());
    }
}
