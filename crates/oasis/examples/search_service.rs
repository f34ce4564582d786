//! A small search service.
//!
//! Run with `cargo run -p oasis --example search_service`, then try:
//!
//! ```text
//! curl 'http://localhost:5000/api/v1/search?q=rust&limit=2'
//! curl 'http://localhost:5000/api/v1/search?limit=abc'
//! curl 'http://localhost:5000/api/v2/item/42'
//! curl -X PUT 'http://localhost:5000/api/v1/item/42' -d '{"title": "t", "description": "d", "url": "u"}'
//! ```
//!
//! Set `OASIS_SCHEMA_DIR` to load schema definitions from a directory
//! instead of the built-in ones.

use oasis::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SearchResult {
    title: String,
    description: String,
    url: String,
}

fn registry() -> anyhow::Result<SchemaRegistry> {
    if let Ok(dir) = std::env::var("OASIS_SCHEMA_DIR") {
        return Ok(SchemaRegistry::load_dir(dir)?);
    }

    let mut registry = SchemaRegistry::new();
    registry.define(
        "Result",
        json!({
            "type": "object",
            "required": ["title", "description", "url"],
            "properties": {
                "title": {"type": "string"},
                "description": {"type": "string"},
                "url": {"type": "string"}
            }
        }),
    )?;
    registry.define("SearchResults", array_of(schema_ref("Result")))?;
    Ok(registry)
}

fn logging_middleware(message: &'static str) -> Middleware {
    middleware_fn(move |next| {
        handler_fn(move |ctx| {
            let next = next.clone();
            Box::pin(async move {
                tracing::info!(operation_id = %ctx.endpoint().operation_id, "{message}");
                next(ctx).await
            })
        })
    })
}

fn catalog() -> Vec<SearchResult> {
    ["rust", "hyper", "tokio", "serde"]
        .iter()
        .map(|name| SearchResult {
            title: (*name).to_string(),
            description: format!("All about {name}"),
            url: format!("https://crates.io/crates/{name}"),
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_telemetry(&TelemetryConfig {
        logging: LogConfig::development(),
        ..TelemetryConfig::default()
    })?;

    let config = ServerConfig::builder()
        .http_addr("127.0.0.1:5000")
        .base_url("http://localhost:5000/api")
        .json_indent(2)
        .build();

    let mut service = Service::new(config.base_url()).with_registry(registry()?);
    service.set_default_json_indent(config.json_indent());
    service.use_middleware(logging_middleware("this runs first"));
    service.use_middleware(logging_middleware("this runs second"));
    service.set_observer(|ctx, reply, errors| {
        let (method, path, version) = ctx.endpoint().settings();
        tracing::info!(
            %method,
            path,
            version = ?version,
            status = reply.status_code(),
            errors = errors.len(),
            "response"
        );
    });

    let string = json!({"type": "string"});
    let integer = json!({"type": "integer"});

    service
        .new_endpoint("search", Method::GET, "/search", "Summary", "Description", ["Tag1", "Tag2"])
        .version(1)
        .parameter("query", "q", "The search query", true, string.clone(), ParamKind::String)
        .parameter(
            "query",
            "limit",
            "Limit the amount of returned results",
            false,
            integer.clone(),
            ParamKind::Integer,
        )
        .parameter(
            "query",
            "skip",
            "How many results to skip over before returning",
            false,
            integer,
            ParamKind::Integer,
        )
        .response(200, "Results were found", schema_ref("SearchResults"))
        .response(204, "No results found", serde_json::Value::Null)
        .define(handler_fn(|ctx| {
            Box::pin(async move {
                let q = ctx.query().get_str("q").unwrap_or_default().to_lowercase();
                let skip = usize::try_from(ctx.query().get_i64("skip").unwrap_or(0)).unwrap_or(0);
                let limit = usize::try_from(ctx.query().get_i64("limit").unwrap_or(10)).unwrap_or(10);

                let found: Vec<SearchResult> = catalog()
                    .into_iter()
                    .filter(|r| r.title.contains(&q) || r.description.to_lowercase().contains(&q))
                    .skip(skip)
                    .take(limit)
                    .collect();

                if found.is_empty() {
                    return Ok(Reply::with_status(204));
                }
                Ok(Reply::ok(found))
            })
        }))?;

    service
        .new_endpoint(
            "getItem",
            Method::GET,
            "/item/{item}",
            "Get an Item",
            "Like, really get an Item if you want it",
            ["Tag1"],
        )
        .version(2)
        .parameter("path", "item", "the item to get", true, string.clone(), ParamKind::String)
        .response(200, "The item", json!({"type": "string"}))
        .response(204, "Item does not exist", serde_json::Value::Null)
        .define(handler_fn(|ctx| {
            Box::pin(async move {
                let item = ctx.params().get_str("item").unwrap_or_default();
                Ok(Reply::ok(format!("got item: '{item}'")))
            })
        }))?;

    service
        .new_endpoint(
            "putItem",
            Method::PUT,
            "/item/{item}",
            "Put an Item",
            "Like, really put an Item if you want to",
            ["Tag2"],
        )
        .version(1)
        .parameter("path", "item", "the item to put", true, string, ParamKind::String)
        .request_body::<SearchResult>("Item details", true, schema_ref("Result"))
        .response(201, "Created/Updated", serde_json::Value::Null)
        .define(handler_fn(|ctx| {
            Box::pin(async move {
                let item = ctx.params().get_str("item").unwrap_or_default().to_string();
                let body = ctx.take_body::<SearchResult>();
                tracing::info!(item = %item, title = ?body.map(|b| b.title), "storing item");
                Ok(Reply::with_status(201))
            })
        }))?;

    for endpoint in service.endpoints().values() {
        tracing::info!(
            operation_id = %endpoint.info().operation_id,
            method = %endpoint.info().method,
            route = %endpoint.info().route,
            "endpoint ready"
        );
    }

    Server::new(config, service.router()).run().await?;
    Ok(())
}
