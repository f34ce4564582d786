//! Handler and middleware function types.
//!
//! A [`Handler`] is a shared async function from a mutable
//! [`RequestContext`] to a [`Reply`]. A [`Middleware`] decorates a handler
//! and returns a new one. Both are reference-counted so a composed chain can
//! be stored on an endpoint and reused by every request.
//!
//! # Example
//!
//! ```
//! use oasis_core::{handler_fn, middleware_fn, Reply};
//!
//! let hello = handler_fn(|_ctx| Box::pin(async move { Ok(Reply::ok("hello")) }));
//!
//! let log = middleware_fn(|next| {
//!     handler_fn(move |ctx| {
//!         let next = next.clone();
//!         Box::pin(async move {
//!             tracing::info!(operation = %ctx.endpoint().operation_id, "calling");
//!             next(ctx).await
//!         })
//!     })
//! });
//!
//! let _wrapped = log(hello);
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::RequestContext;
use crate::error::OasError;
use crate::reply::Reply;

/// A boxed future that is `Send`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A shared request handler.
pub type Handler = Arc<
    dyn for<'a> Fn(&'a mut RequestContext) -> BoxFuture<'a, Result<Reply, OasError>>
        + Send
        + Sync,
>;

/// A shared decorator turning one handler into another.
pub type Middleware = Arc<dyn Fn(Handler) -> Handler + Send + Sync>;

/// Wraps a closure as a [`Handler`].
pub fn handler_fn<F>(f: F) -> Handler
where
    F: for<'a> Fn(&'a mut RequestContext) -> BoxFuture<'a, Result<Reply, OasError>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// Wraps a closure as a [`Middleware`].
pub fn middleware_fn<F>(f: F) -> Middleware
where
    F: Fn(Handler) -> Handler + Send + Sync + 'static,
{
    Arc::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::EndpointInfo;
    use http::{HeaderMap, Method, Uri};
    use std::collections::BTreeMap;

    fn ctx() -> RequestContext {
        let info = EndpointInfo {
            operation_id: "ping".to_string(),
            method: Method::GET,
            path: "/ping".to_string(),
            route: "/ping".to_string(),
            version: None,
            summary: String::new(),
            description: String::new(),
            tags: Vec::new(),
            deprecated: false,
            security: Vec::new(),
            options: BTreeMap::new(),
        };
        RequestContext::new(Arc::new(info), Method::GET, Uri::from_static("/ping"), HeaderMap::new())
    }

    #[tokio::test]
    async fn test_handler_fn_runs() {
        let handler = handler_fn(|ctx| {
            Box::pin(async move { Ok(Reply::ok(ctx.endpoint().operation_id.clone())) })
        });

        let mut ctx = ctx();
        let reply = handler(&mut ctx).await.unwrap();
        assert_eq!(reply.body_json().unwrap().unwrap(), "ping");
    }

    #[tokio::test]
    async fn test_middleware_fn_wraps() {
        #[derive(Clone)]
        struct Seen;

        let handler = handler_fn(|ctx| {
            Box::pin(async move {
                let seen = ctx.extensions().get::<Seen>().is_some();
                Ok(Reply::ok(seen))
            })
        });
        let mark = middleware_fn(|next| {
            handler_fn(move |ctx| {
                let next = next.clone();
                Box::pin(async move {
                    ctx.extensions_mut().insert(Seen);
                    next(ctx).await
                })
            })
        });

        let wrapped = mark(handler);
        let mut ctx = ctx();
        let reply = wrapped(&mut ctx).await.unwrap();
        assert_eq!(reply.body_json().unwrap().unwrap(), true);
    }
}
