//! Request materialization against declared shapes.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, Uri};
use http_body_util::{Empty, Full};
use oasis_core::{
    EndpointInfo, OasError, ParamKind, ParamLocation, ParamValue, RequestContext, TypedParameter,
};
use oasis_extract::{segment_count, BodySpec, PathPattern, RequestShape, DEFAULT_MAX_BODY_SIZE};
use oasis_schema::{composite_request_schema, BodySchema, CompiledSchema, SchemaRegistry};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize, PartialEq)]
struct Item {
    title: String,
    #[serde(default)]
    rank: u8,
}

fn info(path: &str) -> Arc<EndpointInfo> {
    Arc::new(EndpointInfo {
        operation_id: "test".to_string(),
        method: Method::GET,
        path: path.to_string(),
        route: path.to_string(),
        version: None,
        summary: String::new(),
        description: String::new(),
        tags: Vec::new(),
        deprecated: false,
        security: Vec::new(),
        options: BTreeMap::new(),
    })
}

fn query(name: &str, required: bool, kind: ParamKind) -> TypedParameter {
    TypedParameter::new(ParamLocation::Query, name, "", required, Value::Null, kind)
}

fn search_shape() -> RequestShape {
    let query = vec![
        query("q", true, ParamKind::String),
        query("limit", false, ParamKind::Integer),
    ];
    let schema = composite_request_schema(&query, &[], &[], None);
    RequestShape {
        query,
        path: Vec::new(),
        header: Vec::new(),
        body: None,
        schema: CompiledSchema::compile(&schema, &SchemaRegistry::new()).unwrap(),
        prefix_segments: 0,
    }
}

fn item_shape(prefix: &str, versioned: bool) -> RequestShape {
    let pattern = PathPattern::parse("/item/{item}");
    let item = TypedParameter::new(
        ParamLocation::Path,
        "item",
        "",
        true,
        json!({"type": "string"}),
        ParamKind::String,
    );
    let retries = TypedParameter::new(
        ParamLocation::Header,
        "x-retries",
        "",
        false,
        Value::Null,
        ParamKind::Integer,
    );
    let body_schema = json!({
        "type": "object",
        "required": ["title"],
        "properties": {"title": {"type": "string"}, "rank": {}}
    });
    let schema = composite_request_schema(
        &[],
        std::slice::from_ref(&item),
        std::slice::from_ref(&retries),
        Some(BodySchema {
            schema: &body_schema,
            required: true,
        }),
    );

    RequestShape {
        query: Vec::new(),
        path: vec![(item, pattern.index_of("item").unwrap())],
        header: vec![retries],
        body: Some(BodySpec::typed::<Item>(true)),
        schema: CompiledSchema::compile(&schema, &SchemaRegistry::new()).unwrap(),
        prefix_segments: segment_count(prefix) + usize::from(versioned),
    }
}

fn ctx(uri: &'static str) -> RequestContext {
    RequestContext::new(info("/"), Method::GET, Uri::from_static(uri), HeaderMap::new())
}

#[tokio::test]
async fn test_search_query_converted() {
    let shape = search_shape();
    let mut ctx = ctx("/search?q=hello&limit=10");

    shape.materialize(&mut ctx, Empty::<Bytes>::new(), DEFAULT_MAX_BODY_SIZE).await.unwrap();

    assert_eq!(ctx.query().get("q"), Some(&ParamValue::String("hello".into())));
    assert_eq!(ctx.query().get_i64("limit"), Some(10));
    assert!(!ctx.has_body());
}

#[tokio::test]
async fn test_bad_integer_fails_fast() {
    let shape = search_shape();
    let mut ctx = ctx("/search?limit=abc");

    let err = shape
        .materialize(&mut ctx, Empty::<Bytes>::new(), DEFAULT_MAX_BODY_SIZE)
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), http::StatusCode::BAD_REQUEST);
    match err {
        OasError::ParameterType { name, raw, .. } => {
            assert_eq!(name, "limit");
            assert_eq!(raw, "abc");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_required_query_is_validation_error() {
    let shape = search_shape();
    let mut ctx = ctx("/search?limit=5");

    let err = shape
        .materialize(&mut ctx, Empty::<Bytes>::new(), DEFAULT_MAX_BODY_SIZE)
        .await
        .unwrap_err();

    match err {
        OasError::Validation(errors) => assert!(errors.mentions("q")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_path_index_accounts_for_base_and_version() {
    let shape = item_shape("/api", true);
    let mut ctx = ctx("/api/v2/item/hello%20world");

    let body = Full::new(Bytes::from_static(br#"{"title": "a", "rank": 3}"#));
    shape.materialize(&mut ctx, body, DEFAULT_MAX_BODY_SIZE).await.unwrap();

    assert_eq!(ctx.params().get_str("item"), Some("hello world"));
    assert_eq!(
        ctx.body::<Item>(),
        Some(&Item {
            title: "a".to_string(),
            rank: 3
        })
    );
}

#[tokio::test]
async fn test_header_parameter_converted() {
    let shape = item_shape("", false);
    let mut headers = HeaderMap::new();
    headers.insert("X-Retries", HeaderValue::from_static("3"));
    let mut ctx = RequestContext::new(
        info("/item/{item}"),
        Method::PUT,
        Uri::from_static("/item/abc"),
        headers,
    );

    let body = Full::new(Bytes::from_static(br#"{"title": "a"}"#));
    shape.materialize(&mut ctx, body, DEFAULT_MAX_BODY_SIZE).await.unwrap();

    assert_eq!(ctx.params().get_str("item"), Some("abc"));
    assert_eq!(ctx.headers().get_i64("x-retries"), Some(3));
}

#[tokio::test]
async fn test_invalid_json_body_is_malformed() {
    let shape = item_shape("", false);
    let mut ctx = ctx("/item/abc");

    let err = shape
        .materialize(&mut ctx, Full::new(Bytes::from_static(b"{not json")), DEFAULT_MAX_BODY_SIZE)
        .await
        .unwrap_err();

    assert!(matches!(err, OasError::MalformedJson { .. }));
    assert_eq!(err.status_code(), http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_required_body_fails_validation() {
    let shape = item_shape("", false);
    let mut ctx = ctx("/item/abc");

    let err = shape
        .materialize(&mut ctx, Full::new(Bytes::new()), DEFAULT_MAX_BODY_SIZE)
        .await
        .unwrap_err();

    match err {
        OasError::Validation(errors) => assert!(errors.mentions("Body")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_body_schema_checked_before_deserialization() {
    let shape = item_shape("", false);
    let mut ctx = ctx("/item/abc");

    let err = shape
        .materialize(&mut ctx, Full::new(Bytes::from_static(br#"{"title": 7}"#)), DEFAULT_MAX_BODY_SIZE)
        .await
        .unwrap_err();
    assert!(matches!(err, OasError::Validation(_)));

    // passes the schema, but `rank` does not fit in a u8
    let mut ctx = self::ctx("/item/abc");
    let err = shape
        .materialize(
            &mut ctx,
            Full::new(Bytes::from_static(br#"{"title": "a", "rank": 1000}"#)),
            DEFAULT_MAX_BODY_SIZE,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, OasError::MalformedJson { .. }));
}

#[tokio::test]
async fn test_empty_segments_are_skipped_in_request_path() {
    let shape = item_shape("/api", false);
    let mut ctx = ctx("/api//item/5");

    let body = Full::new(Bytes::from_static(br#"{"title": "a"}"#));
    shape.materialize(&mut ctx, body, DEFAULT_MAX_BODY_SIZE).await.unwrap();

    assert_eq!(ctx.params().get_str("item"), Some("5"));
}

#[tokio::test]
async fn test_body_over_limit_is_rejected() {
    let shape = item_shape("", false);
    let mut ctx = ctx("/item/abc");

    let body = Full::new(Bytes::from(format!(r#"{{"title": "{}"}}"#, "x".repeat(64))));
    let err = shape.materialize(&mut ctx, body, 16).await.unwrap_err();

    assert!(matches!(err, OasError::PayloadTooLarge { limit: 16 }));
    assert_eq!(err.status_code(), http::StatusCode::PAYLOAD_TOO_LARGE);
    assert!(!ctx.has_body());
}

#[tokio::test]
async fn test_body_within_limit_is_accepted() {
    let shape = item_shape("", false);
    let mut ctx = ctx("/item/abc");

    let payload = br#"{"title": "a"}"#;
    let body = Full::new(Bytes::from_static(payload));
    shape.materialize(&mut ctx, body, payload.len()).await.unwrap();

    assert_eq!(ctx.body::<Item>().map(|i| i.title.as_str()), Some("a"));
}
