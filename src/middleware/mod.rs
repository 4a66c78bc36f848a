//! Middleware layer.
//!
//! Middleware wraps the next layer of the pipeline: it sees the request on
//! the way in and the outcome on the way out. It is the place for
//! cross-cutting concerns such as tracing, authentication checks and fault
//! recovery.
//!
//! ```rust
//! use juzdy::middleware::{BoxFuture, Middleware, Next};
//! use juzdy::{Outcome, Request, Response, StatusCode};
//!
//! struct RequireToken;
//!
//! impl Middleware for RequireToken {
//!     fn name(&self) -> &str { "require_token" }
//!
//!     fn process<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a, Outcome> {
//!         Box::pin(async move {
//!             if req.header("authorization").is_none() {
//!                 // Short-circuit: nothing further in runs.
//!                 return Ok(Response::status(StatusCode::UNAUTHORIZED));
//!             }
//!             next.run(req).await
//!         })
//!     }
//! }
//! ```
//!
//! Built-in middleware:
//! - [`Trace`] — per-request span with method, path, status, latency
//! - [`Recover`] — turns faults into `500 Internal Server Error`

use std::sync::Arc;

use crate::handler::Handler;
use crate::request::Request;
use crate::router::Router;

mod catalog;
mod recover;
mod trace;

pub use crate::handler::{BoxFuture, Outcome};
pub use catalog::MiddlewareCatalog;
pub use recover::Recover;
pub use trace::Trace;

/// A unit of the middleware chain.
///
/// Call `next.run(req)` to forward the request further in. Not calling it is
/// a short-circuit: the layers further in, including the handler, never run.
/// [`Next::run`] takes `self`, so forwarding twice does not compile.
pub trait Middleware: Send + Sync + 'static {
    /// Name used in logs and in configuration.
    fn name(&self) -> &str;

    fn process<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a, Outcome>;
}

/// A type-erased middleware shared between the global chain, capability
/// groups and concurrent requests.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The rest of the chain below the current middleware.
pub struct Next<'a> {
    chain: &'a [BoxedMiddleware],
    endpoint: Endpoint<'a>,
}

/// What sits after the last middleware of a chain.
#[derive(Clone, Copy)]
pub(crate) enum Endpoint<'a> {
    /// End of the global chain: resolve and run the group chain.
    Router(&'a Router),
    /// End of a group chain.
    Handler(&'a dyn Handler),
}

impl<'a> Next<'a> {
    pub(crate) fn new(chain: &'a [BoxedMiddleware], endpoint: Endpoint<'a>) -> Self {
        Self { chain, endpoint }
    }

    /// Runs the remaining chain and returns its outcome.
    pub fn run(self, req: Request) -> BoxFuture<'a, Outcome> {
        match self.chain.split_first() {
            Some((first, rest)) => first.process(req, Next::new(rest, self.endpoint)),
            None => match self.endpoint {
                Endpoint::Router(router) => router.dispatch(req),
                Endpoint::Handler(handler) => handler.handle(req),
            },
        }
    }

    /// Number of middleware still ahead, not counting the endpoint.
    pub fn remaining(&self) -> usize {
        self.chain.len()
    }
}
