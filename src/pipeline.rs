//! The dispatch pipeline.
//!
//! ```text
//!   request ─▶ global[0] ─▶ … ─▶ global[n] ─▶ Router ─▶ group[0] ─▶ … ─▶ Handler
//!  response ◀─ global[0] ◀─ … ◀─ global[n] ◀─ Router ◀─ group[0] ◀─ … ◀─┘
//! ```
//!
//! The global chain runs for every request. The router is held apart from it
//! and always sits at its end, so nothing can be configured to run after
//! resolution except the handler's own capability group.

use std::fmt;
use std::sync::Arc;

use crate::capability::{Capability, CapabilityRegistry};
use crate::config::DispatchConfig;
use crate::error::Error;
use crate::handler::{Handler, Outcome};
use crate::middleware::{BoxedMiddleware, Endpoint, Middleware, MiddlewareCatalog, Next};
use crate::request::Request;
use crate::router::{HandlerTable, Resolver, Router};

/// A fully built pipeline. Immutable and shareable across requests.
///
/// ```rust,no_run
/// use juzdy::{Pipeline, Request, handler_fn};
/// use juzdy::middleware::{Recover, Trace};
///
/// async fn hello(_req: Request) -> &'static str { "Hello" }
///
/// # async fn run() -> Result<(), juzdy::Error> {
/// let pipeline = Pipeline::builder()
///     .middleware(Recover::new())
///     .middleware(Trace::new())
///     .namespace("App.Handler")
///     .handler("App.Handler.Hello", handler_fn(hello))
///     .build()?;
///
/// let res = pipeline.handle(Request::get("/Hello")).await;
/// # Ok(())
/// # }
/// ```
pub struct Pipeline {
    global: Vec<BoxedMiddleware>,
    router: Router,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Builds a pipeline from configuration. Middleware names are looked up
    /// in `catalog`; handlers come from `handlers`.
    pub fn from_config(
        config: &DispatchConfig,
        catalog: &MiddlewareCatalog,
        handlers: HandlerTable,
    ) -> Result<Self, Error> {
        let mut builder = Self::builder().handlers(handlers);
        for mw in catalog.resolve(config.middleware.as_slice())? {
            builder = builder.middleware_boxed(mw);
        }
        for (tag, names) in &config.groups {
            builder = builder.group(tag.clone(), catalog.resolve(names.as_slice())?);
        }
        for root in &config.namespaces {
            builder = builder.namespace(root.clone());
        }
        if let Some(name) = &config.default_handler {
            builder = builder.default_handler(name.clone());
        }
        builder.build()
    }

    /// Runs `req` through the global chain, the router, the handler's group
    /// chain and the handler, and returns the unwound outcome.
    ///
    /// `Err` means a fault escaped every layer; hosts should answer it with a
    /// generic 500.
    pub async fn handle(&self, req: Request) -> Outcome {
        Next::new(&self.global, Endpoint::Router(&self.router))
            .run(req)
            .await
    }

    /// Names of the global middleware, in execution order.
    pub fn middleware_names(&self) -> Vec<&str> {
        self.global.iter().map(|m| m.name()).collect()
    }

    pub fn router(&self) -> &Router {
        &self.router
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("global", &self.middleware_names())
            .field("router", &self.router)
            .finish()
    }
}

/// Builder for [`Pipeline`].
///
/// Registration errors are kept and reported by [`build`](Self::build), so a
/// builder chain never half-succeeds.
#[derive(Default)]
pub struct PipelineBuilder {
    global: Vec<BoxedMiddleware>,
    groups: CapabilityRegistry,
    namespaces: Vec<String>,
    default_handler: Option<String>,
    handlers: HandlerTable,
    error: Option<Error>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a global middleware. Global middleware runs in the order added.
    pub fn middleware(self, middleware: impl Middleware) -> Self {
        self.middleware_boxed(Arc::new(middleware))
    }

    pub fn middleware_boxed(mut self, middleware: BoxedMiddleware) -> Self {
        self.global.push(middleware);
        self
    }

    /// Sets the middleware group for a capability tag, replacing any earlier
    /// group for the same tag.
    pub fn group(
        mut self,
        tag: impl Into<Capability>,
        middleware: Vec<BoxedMiddleware>,
    ) -> Self {
        self.groups.register(tag, middleware);
        self
    }

    /// Appends a namespace root. Roots are searched in the order added.
    pub fn namespace(mut self, root: impl Into<String>) -> Self {
        self.namespaces.push(root.into());
        self
    }

    /// Handler name used for the empty path, relative to the roots.
    pub fn default_handler(mut self, name: impl Into<String>) -> Self {
        self.default_handler = Some(name.into());
        self
    }

    /// Registers a handler under its fully qualified dotted name.
    pub fn handler(mut self, name: impl Into<String>, handler: impl Handler) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.handlers.register(name, handler) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Adds every handler of a prebuilt table. A name already registered is
    /// reported by [`build`](Self::build).
    pub fn handlers(mut self, table: HandlerTable) -> Self {
        if let Err(e) = self.handlers.merge(table) {
            self.error.get_or_insert(e);
        }
        self
    }

    pub fn build(self) -> Result<Pipeline, Error> {
        if let Some(e) = self.error {
            return Err(e);
        }
        let resolver = Resolver::new(self.namespaces, self.default_handler)?;
        tracing::debug!(
            global = self.global.len(),
            groups = self.groups.len(),
            handlers = self.handlers.len(),
            "pipeline built"
        );
        Ok(Pipeline {
            global: self.global,
            router: Router::new(resolver, self.handlers, self.groups),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use http::StatusCode;

    use super::*;
    use crate::handler::handler_fn;
    use crate::router::HANDLER_ATTRIBUTE;

    async fn whoami(req: Request) -> String {
        req.attribute::<String>(HANDLER_ATTRIBUTE).cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn dispatches_to_resolved_handler() {
        let pipeline = Pipeline::builder()
            .namespace("App")
            .handler("App.Who", handler_fn(whoami))
            .build()
            .unwrap();

        let res = pipeline.handle(Request::get("/Who")).await.unwrap();
        assert_eq!(res.body(), b"App.Who");
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let pipeline = Pipeline::builder().namespace("App").build().unwrap();
        let res = pipeline.handle(Request::get("/Nope")).await.unwrap();
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn first_registration_error_is_reported() {
        let noop = || handler_fn(|_req: Request| async { "" });
        let err = Pipeline::builder()
            .namespace("App")
            .handler("App.A", noop())
            .handler("App.A", noop())
            .handler("bad name", noop())
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateHandler { ref name } if name == "App.A"));
    }

    #[tokio::test]
    async fn handler_tables_merge_with_single_registrations() {
        let mut table = HandlerTable::new();
        table.register("App.Table", handler_fn(whoami)).unwrap();
        let pipeline = Pipeline::builder()
            .namespace("App")
            .handler("App.Single", handler_fn(whoami))
            .handlers(table)
            .build()
            .unwrap();

        assert_eq!(pipeline.router().handlers().len(), 2);
        let res = pipeline.handle(Request::get("/Single")).await.unwrap();
        assert_eq!(res.body(), b"App.Single");
        let res = pipeline.handle(Request::get("/Table")).await.unwrap();
        assert_eq!(res.body(), b"App.Table");
    }

    #[test]
    fn merged_table_with_clashing_name_fails_the_build() {
        let mut table = HandlerTable::new();
        table.register("App.Who", handler_fn(whoami)).unwrap();
        let err = Pipeline::builder()
            .namespace("App")
            .handler("App.Who", handler_fn(whoami))
            .handlers(table)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateHandler { ref name } if name == "App.Who"));
    }

    #[test]
    fn missing_namespaces_fail_the_build() {
        assert!(matches!(Pipeline::builder().build(), Err(Error::NoNamespaces)));
    }

    #[test]
    fn from_config_resolves_names() {
        let config = DispatchConfig {
            namespaces: vec!["App".into()],
            default_handler: Some("Index".into()),
            middleware: vec!["recover".into(), "trace".into()],
            groups: BTreeMap::from([("auth".to_owned(), vec!["trace".to_owned()])]),
        };
        let pipeline =
            Pipeline::from_config(&config, &MiddlewareCatalog::with_builtins(), HandlerTable::new())
                .unwrap();
        assert_eq!(pipeline.middleware_names(), ["recover", "trace"]);
        assert_eq!(pipeline.router().groups().len(), 1);
        assert_eq!(pipeline.router().groups().resolve_for(&["auth".into()]).len(), 1);
        assert_eq!(pipeline.router().resolver().roots(), ["App"]);
    }

    #[test]
    fn from_config_rejects_unknown_middleware() {
        let config = DispatchConfig {
            namespaces: vec!["App".into()],
            groups: BTreeMap::from([("auth".to_owned(), vec!["auth_check".to_owned()])]),
            ..DispatchConfig::default()
        };
        let err = Pipeline::from_config(&config, &MiddlewareCatalog::with_builtins(), HandlerTable::new())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownMiddleware { ref name } if name == "auth_check"));
    }
}
