//! # juzdy
//!
//! Request dispatch by convention, with middleware chosen per handler.
//!
//! ## The contract
//!
//! Every request walks the same road:
//!
//! 1. The **global chain**: middleware that runs for every request, in the
//!    order configured.
//! 2. The **router**: always last in the global chain. It turns the URL path
//!    into a handler name (`/Blog/Post` → `App.Handler.Blog.Post`) and answers
//!    `404` itself when nothing is registered under that name.
//! 3. The **group chain**: middleware attached to the capability tags the
//!    handler declares (`auth` → `[auth_check]`).
//! 4. The **handler**.
//!
//! The response then unwinds through the same layers in reverse. Any layer may
//! answer early without calling `next`; nothing further in runs.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use juzdy::middleware::{BoxedMiddleware, Recover, Trace};
//! use juzdy::{Pipeline, Request, Server, handler_fn};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), juzdy::Error> {
//!     let pipeline = Pipeline::builder()
//!         .middleware(Recover::new())
//!         .middleware(Trace::new())
//!         .namespace("App.Handler")
//!         .default_handler("Index")
//!         .handler("App.Handler.Index", handler_fn(index))
//!         .handler("App.Handler.Dashboard", handler_fn(dashboard).with_capability("auth"))
//!         .group("auth", vec![Arc::new(Trace::new()) as BoxedMiddleware])
//!         .build()?;
//!
//!     Server::bind("0.0.0.0:3000".parse().unwrap()).serve(pipeline).await
//! }
//!
//! async fn index(_req: Request) -> &'static str {
//!     "Hello"
//! }
//!
//! async fn dashboard(_req: Request) -> &'static str {
//!     "secret"
//! }
//! ```
//!
//! Configuration files, environment overrides and `@{path}` references are
//! covered in [`config`].

mod capability;
mod error;
mod handler;
mod pipeline;
mod request;
mod response;
mod router;
mod server;

pub mod config;
pub mod logging;
pub mod middleware;

pub use capability::{Capability, CapabilityRegistry};
pub use error::{Error, Fault};
pub use handler::{BoxFuture, BoxedHandler, FnHandler, Handler, Outcome, handler_fn};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use request::{QueryValue, Request, RequestBuilder};
pub use response::{ContentType, IntoOutcome, IntoResponse, Response, ResponseBuilder};
pub use router::{HANDLER_ATTRIBUTE, HandlerTable, Registration, Resolver, Router};
pub use server::Server;

// Re-exported so callers can name methods and status codes without adding
// `http` themselves.
pub use http::{Method, StatusCode};
