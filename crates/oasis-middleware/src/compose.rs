//! Middleware composition.

use oasis_core::{Handler, Middleware};

/// Wraps `terminal` with `middleware`, first entry outermost.
///
/// The decorators are applied in reverse declaration order, so
/// `compose(h, &[a, b])` behaves like `a(b(h))`: `a` sees the request first
/// and the reply last.
#[must_use]
pub fn compose(terminal: Handler, middleware: &[Middleware]) -> Handler {
    middleware
        .iter()
        .rev()
        .fold(terminal, |next, decorate| decorate(next))
}
