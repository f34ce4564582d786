//! Request tracing middleware.

use oasis_core::{handler_fn, middleware_fn, Middleware};
use tracing::{debug, info_span, Instrument};

/// Runs every call inside an `endpoint` span and logs its outcome at `debug`.
///
/// The span carries the operation id, request id, method and path, so events
/// emitted by handlers and inner middleware are attributed to the request.
///
/// # Example
///
/// ```
/// use oasis_middleware::{compose, trace_requests};
/// use oasis_core::{handler_fn, Reply};
///
/// let handler = handler_fn(|_ctx| Box::pin(async { Ok(Reply::ok("pong")) }));
/// let _traced = compose(handler, &[trace_requests()]);
/// ```
#[must_use]
pub fn trace_requests() -> Middleware {
    middleware_fn(|next| {
        handler_fn(move |ctx| {
            let next = next.clone();
            let span = info_span!(
                "endpoint",
                operation_id = %ctx.endpoint().operation_id,
                request_id = %ctx.request_id(),
                http.method = %ctx.method(),
                http.path = %ctx.uri().path(),
            );

            Box::pin(
                async move {
                    let started = ctx.elapsed();
                    let result = next(&mut *ctx).await;
                    let elapsed_ms = ctx.elapsed().saturating_sub(started).as_secs_f64() * 1000.0;
                    match &result {
                        Ok(reply) => debug!(
                            status = reply.resolved_status(),
                            ignored = reply.is_ignored(),
                            elapsed_ms,
                            "handler returned"
                        ),
                        Err(err) => debug!(error = %err, elapsed_ms, "handler failed"),
                    }
                    result
                }
                .instrument(span),
            )
        })
    })
}
