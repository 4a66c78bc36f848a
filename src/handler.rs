//! Handler trait and type erasure.
//!
//! # How handlers are stored
//!
//! The handler table holds handlers of *different* types in one map, so each
//! one is kept behind a trait object:
//!
//! ```text
//! struct Dashboard;  impl Handler for Dashboard { … }   ← user writes this
//!        ↓ table.register("App.Handler.Dashboard", Dashboard)
//! Arc::new(Dashboard) as Arc<dyn Handler>               ← BoxedHandler
//!        ↓ router resolves `/Dashboard` at request time
//! handler.handle(req)                                   ← one vtable dispatch
//!        ↓
//! BoxFuture<'_, Result<Response, Fault>>
//! ```
//!
//! Plain async functions become handlers through [`handler_fn`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::capability::Capability;
use crate::error::Fault;
use crate::request::Request;
use crate::response::{IntoOutcome, Response};

/// A heap-allocated, type-erased future.
///
/// `Send` lets tokio move the future across worker threads; the lifetime ties
/// it to the handler or middleware it borrows from.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What every handler and middleware layer produces: a response, or a fault
/// that propagates outward.
pub type Outcome = Result<Response, Fault>;

/// A terminal unit of request processing.
///
/// The pipeline calls [`handle`](Handler::handle) exactly once per request
/// resolved to this handler. Capabilities are read once, when the handler is
/// registered.
///
/// ```rust
/// use juzdy::{BoxFuture, Capability, Handler, Outcome, Request, Response};
///
/// struct Dashboard;
///
/// impl Handler for Dashboard {
///     fn capabilities(&self) -> Vec<Capability> {
///         vec![Capability::from_static("auth")]
///     }
///
///     fn handle(&self, _req: Request) -> BoxFuture<'_, Outcome> {
///         Box::pin(async { Ok(Response::text("dashboard")) })
///     }
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Capability tags this handler declares, in priority order.
    fn capabilities(&self) -> Vec<Capability> {
        Vec::new()
    }

    fn handle(&self, req: Request) -> BoxFuture<'_, Outcome>;
}

/// A type-erased handler shared across concurrent requests.
pub type BoxedHandler = Arc<dyn Handler>;

// ── Function handlers ────────────────────────────────────────────────────────

/// Wraps an async function as a [`Handler`].
///
/// The function's output may be anything that implements [`IntoOutcome`]: a
/// [`Response`], a string, a status code, or a `Result` of those.
///
/// ```rust
/// use juzdy::{Request, handler_fn};
///
/// async fn hello(_req: Request) -> &'static str { "Hello" }
///
/// let handler = handler_fn(hello).with_capability("auth");
/// ```
pub fn handler_fn<F, Fut, R>(f: F) -> FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoOutcome + 'static,
{
    FnHandler { f, capabilities: Vec::new() }
}

/// Handler built by [`handler_fn`].
pub struct FnHandler<F> {
    f: F,
    capabilities: Vec<Capability>,
}

impl<F> FnHandler<F> {
    /// Declares one more capability on this handler.
    pub fn with_capability(mut self, tag: impl Into<Capability>) -> Self {
        self.capabilities.push(tag.into());
        self
    }
}

impl<F, Fut, R> Handler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoOutcome + 'static,
{
    fn capabilities(&self) -> Vec<Capability> {
        self.capabilities.clone()
    }

    fn handle(&self, req: Request) -> BoxFuture<'_, Outcome> {
        let fut = (self.f)(req);
        Box::pin(async move { fut.await.into_outcome() })
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::*;

    #[tokio::test]
    async fn fn_handler_converts_output() {
        async fn created(_req: Request) -> StatusCode { StatusCode::CREATED }

        let res = handler_fn(created).handle(Request::get("/")).await.unwrap();
        assert_eq!(res.status_code(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn fn_handler_propagates_fault() {
        async fn broken(_req: Request) -> Result<Response, std::io::Error> {
            Err(std::io::Error::other("db down"))
        }

        let err = handler_fn(broken).handle(Request::get("/")).await.unwrap_err();
        assert_eq!(err.to_string(), "db down");
    }

    #[test]
    fn capabilities_keep_declaration_order() {
        async fn noop(_req: Request) -> &'static str { "" }

        let h = handler_fn(noop).with_capability("auth").with_capability("csrf");
        assert_eq!(h.capabilities(), vec![Capability::from_static("auth"), "csrf".into()]);
    }
}
