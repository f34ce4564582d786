//! Composed chains under dispatch.

use std::collections::BTreeMap;
use std::sync::Arc;

use http::{HeaderMap, Method, Uri};
use oasis_core::{
    handler_fn, middleware_fn, EndpointInfo, Handler, Middleware, OasError, Reply, RequestContext,
};
use oasis_middleware::{compose, dispatch, trace_requests};
use parking_lot::Mutex;

fn ctx() -> RequestContext {
    let info = EndpointInfo {
        operation_id: "chain".to_string(),
        method: Method::GET,
        path: "/chain".to_string(),
        route: "/chain".to_string(),
        version: None,
        summary: String::new(),
        description: String::new(),
        tags: Vec::new(),
        deprecated: false,
        security: Vec::new(),
        options: BTreeMap::new(),
    };
    RequestContext::new(
        Arc::new(info),
        Method::GET,
        Uri::from_static("/chain"),
        HeaderMap::new(),
    )
}

fn recording(label: &'static str, log: Arc<Mutex<Vec<String>>>) -> Middleware {
    middleware_fn(move |next| {
        let log = log.clone();
        handler_fn(move |ctx| {
            let next = next.clone();
            let log = log.clone();
            Box::pin(async move {
                log.lock().push(format!("{label} in"));
                let result = next(&mut *ctx).await;
                log.lock().push(format!("{label} out"));
                result
            })
        })
    })
}

#[tokio::test]
async fn test_first_declared_middleware_runs_outermost() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let terminal: Handler = {
        let log = log.clone();
        handler_fn(move |_ctx| {
            let log = log.clone();
            Box::pin(async move {
                log.lock().push("handler".to_string());
                Ok(Reply::new())
            })
        })
    };

    let chain = compose(
        terminal,
        &[
            recording("first", log.clone()),
            recording("second", log.clone()),
        ],
    );

    let mut ctx = ctx();
    dispatch(&chain, &mut ctx).await.unwrap();

    assert_eq!(
        *log.lock(),
        vec!["first in", "second in", "handler", "second out", "first out"]
    );
}

#[tokio::test]
async fn test_panic_becomes_internal_error() {
    let panicking = handler_fn(|_ctx| {
        Box::pin(async {
            if true {
                panic!("handler exploded");
            }
            Ok(Reply::new())
        })
    });
    let chain = compose(panicking, &[trace_requests()]);

    let mut ctx = ctx();
    let err = dispatch(&chain, &mut ctx).await.unwrap_err();

    match &err {
        OasError::Panic { message } => assert_eq!(message, "handler exploded"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.status_code(), http::StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!err.to_string().contains("exploded"));

    // the process keeps serving
    let healthy = handler_fn(|_ctx| Box::pin(async { Ok(Reply::ok("fine")) }));
    let reply = dispatch(&healthy, &mut ctx).await.unwrap();
    assert_eq!(reply.body_json().unwrap().unwrap(), "fine");
}

#[tokio::test]
async fn test_synchronous_panic_is_caught() {
    let panicking = handler_fn(|_ctx| panic!("before the future"));

    let mut ctx = ctx();
    let err = dispatch(&panicking, &mut ctx).await.unwrap_err();
    assert!(matches!(err, OasError::Panic { .. }));
}

#[tokio::test]
async fn test_errors_pass_through_unchanged() {
    let failing = handler_fn(|_ctx| {
        Box::pin(async { Err(OasError::malformed_json("bad input")) })
    });
    let chain = compose(failing, &[trace_requests()]);

    let mut ctx = ctx();
    let err = dispatch(&chain, &mut ctx).await.unwrap_err();
    assert!(matches!(err, OasError::MalformedJson { ref details } if details == "bad input"));
}
