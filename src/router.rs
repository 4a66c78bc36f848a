//! Convention-based handler resolution.
//!
//! No route table to maintain: the URL *is* the handler name. Each `/`
//! segment of the path becomes one segment of a dotted name, casing kept as
//! written, and that name is looked up under every configured namespace root
//! in order:
//!
//! ```text
//! roots = ["App.Handler", "Vendor.Handler"]
//!
//! /Blog/Post   →  App.Handler.Blog.Post     (checked first)
//!              →  Vendor.Handler.Blog.Post  (only if the first is absent)
//! /            →  App.Handler.Index         (with default_handler = "Index")
//! /blog-post   →  404  (not an identifier)
//! ```
//!
//! The [`Router`] is the terminal unit of the global middleware chain. It
//! resolves the handler, then runs the handler's capability group in front
//! of it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use tracing::debug;

use crate::capability::{Capability, CapabilityRegistry};
use crate::error::Error;
use crate::handler::{BoxFuture, BoxedHandler, Handler, Outcome};
use crate::middleware::{Endpoint, Next};
use crate::request::Request;
use crate::response::Response;

/// Request attribute holding the resolved handler's dotted name (`String`).
pub const HANDLER_ATTRIBUTE: &str = "juzdy.handler";

// ── Handler table ─────────────────────────────────────────────────────────────

/// One registered handler. Fixed once registered.
pub struct Registration {
    name: String,
    handler: BoxedHandler,
    capabilities: Vec<Capability>,
}

impl Registration {
    pub fn name(&self) -> &str { &self.name }
    pub fn capabilities(&self) -> &[Capability] { &self.capabilities }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

/// Boot-time table of handlers by fully qualified dotted name.
#[derive(Debug, Default)]
pub struct HandlerTable {
    entries: HashMap<String, Registration>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `name` (e.g. `App.Handler.Dashboard`).
    ///
    /// The handler's capabilities are captured now and never re-read.
    pub fn register(&mut self, name: impl Into<String>, handler: impl Handler) -> Result<(), Error> {
        self.register_boxed(name, Arc::new(handler))
    }

    pub fn register_boxed(&mut self, name: impl Into<String>, handler: BoxedHandler) -> Result<(), Error> {
        let name = name.into();
        if !is_dotted_name(&name) {
            return Err(Error::InvalidHandlerName { name });
        }
        if self.entries.contains_key(&name) {
            return Err(Error::DuplicateHandler { name });
        }
        let capabilities = handler.capabilities();
        self.entries.insert(name.clone(), Registration { name, handler, capabilities });
        Ok(())
    }

    /// Moves every registration of `other` into this table. A name present
    /// in both is a [`Error::DuplicateHandler`]; registrations before it are
    /// kept.
    pub fn merge(&mut self, other: HandlerTable) -> Result<(), Error> {
        for (name, registration) in other.entries {
            if self.entries.contains_key(&name) {
                return Err(Error::DuplicateHandler { name });
            }
            self.entries.insert(name, registration);
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Registration> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Resolver ──────────────────────────────────────────────────────────────────

/// Maps a request path to a registered handler. Pure: no I/O, no state.
#[derive(Clone, Debug)]
pub struct Resolver {
    roots: Vec<String>,
    default_handler: Option<String>,
}

impl Resolver {
    /// Fails when `roots` is empty or any root or the default name is not a
    /// dotted identifier path.
    pub fn new(roots: Vec<String>, default_handler: Option<String>) -> Result<Self, Error> {
        if roots.is_empty() {
            return Err(Error::NoNamespaces);
        }
        if let Some(root) = roots.iter().find(|r| !is_dotted_name(r)) {
            return Err(Error::InvalidNamespace { root: root.clone() });
        }
        if let Some(name) = default_handler.as_ref().filter(|d| !is_dotted_name(d)) {
            return Err(Error::InvalidDefaultHandler { name: name.clone() });
        }
        Ok(Self { roots, default_handler })
    }

    pub fn roots(&self) -> &[String] { &self.roots }

    /// The root-relative handler name for `path`, or `None` when the path
    /// cannot name a handler.
    pub fn relative_name(&self, path: &str) -> Option<String> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return self.default_handler.clone();
        }
        if !segments.iter().all(|s| is_identifier(s)) {
            return None;
        }
        Some(segments.join("."))
    }

    /// Fully qualified names to try for `path`, in root order.
    pub fn candidates(&self, path: &str) -> Vec<String> {
        match self.relative_name(path) {
            Some(relative) => self.roots.iter().map(|root| format!("{root}.{relative}")).collect(),
            None => Vec::new(),
        }
    }

    /// The first registered handler among [`candidates`](Self::candidates).
    pub fn resolve<'t>(&self, path: &str, table: &'t HandlerTable) -> Option<&'t Registration> {
        self.candidates(path).iter().find_map(|name| table.get(name))
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub(crate) fn is_dotted_name(s: &str) -> bool {
    !s.is_empty() && s.split('.').all(is_identifier)
}

// ── Router ────────────────────────────────────────────────────────────────────

/// Terminal unit of the global chain.
pub struct Router {
    resolver: Resolver,
    handlers: HandlerTable,
    groups: CapabilityRegistry,
}

impl Router {
    pub(crate) fn new(resolver: Resolver, handlers: HandlerTable, groups: CapabilityRegistry) -> Self {
        Self { resolver, handlers, groups }
    }

    pub fn resolver(&self) -> &Resolver { &self.resolver }
    pub fn handlers(&self) -> &HandlerTable { &self.handlers }
    pub fn groups(&self) -> &CapabilityRegistry { &self.groups }

    /// Resolves the handler and runs it behind its capability group.
    ///
    /// An unresolvable path is answered here with `404 Not Found`; no group
    /// middleware runs for it.
    pub(crate) fn dispatch(&self, mut req: Request) -> BoxFuture<'_, Outcome> {
        Box::pin(async move {
            let Some(entry) = self.resolver.resolve(req.path(), &self.handlers) else {
                debug!(path = req.path(), "no handler for path");
                return Ok(Response::builder()
                    .status(StatusCode::NOT_FOUND)
                    .text("Not Found"));
            };

            let group = self.groups.resolve_for(&entry.capabilities);
            debug!(handler = %entry.name, group_len = group.len(), "resolved handler");
            req.set_attribute(HANDLER_ATTRIBUTE, entry.name.clone());

            Next::new(&group, Endpoint::Handler(entry.handler.as_ref()))
                .run(req)
                .await
        })
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("resolver", &self.resolver)
            .field("handlers", &self.handlers.len())
            .field("groups", &self.groups)
            .finish()
    }
}
