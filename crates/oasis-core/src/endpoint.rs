//! Read-only endpoint metadata visible to handlers and middleware.

use std::collections::BTreeMap;

use http::Method;
use serde::Serialize;
use serde_json::Value;

/// A security requirement attached to an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityRequirement {
    /// Name of the security scheme.
    pub name: String,
    /// Required scopes.
    pub scopes: Vec<String>,
}

/// Descriptive data of a defined endpoint.
///
/// One instance is shared by every request served by the endpoint, so a
/// handler can ask which operation it is running under.
#[derive(Debug, Clone)]
pub struct EndpointInfo {
    /// Unique operation id.
    pub operation_id: String,
    /// HTTP method.
    pub method: Method,
    /// URL template as declared, e.g. `/item/{item}`.
    pub path: String,
    /// Full mounted route, including base path and version prefix.
    pub route: String,
    /// Version number, when the endpoint is versioned.
    pub version: Option<u32>,
    /// Short summary.
    pub summary: String,
    /// Long description. Line breaks are stored as `<br/>`.
    pub description: String,
    /// Documentation tags.
    pub tags: Vec<String>,
    /// Whether the endpoint is deprecated.
    pub deprecated: bool,
    /// Security requirements.
    pub security: Vec<SecurityRequirement>,
    /// Free-form options attached at declaration time.
    pub options: BTreeMap<String, Value>,
}

impl EndpointInfo {
    /// Returns `(method, path, version)`.
    #[must_use]
    pub fn settings(&self) -> (&Method, &str, Option<u32>) {
        (&self.method, &self.path, self.version)
    }

    /// Returns an option value.
    #[must_use]
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info() -> EndpointInfo {
        EndpointInfo {
            operation_id: "getItem".to_string(),
            method: Method::GET,
            path: "/item/{item}".to_string(),
            route: "/api/v2/item/{item}".to_string(),
            version: Some(2),
            summary: String::new(),
            description: String::new(),
            tags: vec!["Tag1".to_string()],
            deprecated: false,
            security: Vec::new(),
            options: BTreeMap::from([("cache".to_string(), json!(true))]),
        }
    }

    #[test]
    fn test_settings() {
        let info = info();
        let (method, path, version) = info.settings();
        assert_eq!(*method, Method::GET);
        assert_eq!(path, "/item/{item}");
        assert_eq!(version, Some(2));
    }

    #[test]
    fn test_option_lookup() {
        let info = info();
        assert_eq!(info.option("cache"), Some(&json!(true)));
        assert_eq!(info.option("missing"), None);
    }
}
