//! Panic-safe handler dispatch.
//!
//! A panicking handler must never take the server down with it. [`dispatch`]
//! runs the composed chain inside `catch_unwind`, logs the panic once with a
//! backtrace, and hands the resolver an [`OasError::Panic`] whose client
//! facing text carries none of the panic details.

use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use oasis_core::{Handler, OasError, Reply, RequestContext};
use tracing::error;

/// Invokes `handler`, converting a panic into [`OasError::Panic`].
///
/// The handler's own result passes through unchanged.
pub async fn dispatch(handler: &Handler, ctx: &mut RequestContext) -> Result<Reply, OasError> {
    let operation_id = ctx.endpoint().operation_id.clone();
    let request_id = ctx.request_id();

    match AssertUnwindSafe(async move { handler(ctx).await })
        .catch_unwind()
        .await
    {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            let backtrace = Backtrace::capture();
            error!(
                operation_id = %operation_id,
                request_id = %request_id,
                panic_message = %message,
                backtrace = %backtrace,
                "endpoint handler panicked"
            );
            Err(OasError::Panic { message })
        }
    }
}

/// Extracts the text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
