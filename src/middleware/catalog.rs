//! Name → middleware lookup used when the chain comes from configuration.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{BoxedMiddleware, Middleware, Recover, Trace};
use crate::error::Error;

/// Middleware instances by configuration name.
///
/// Configuration refers to middleware by name (`middleware = ["recover",
/// "trace"]`). The catalog turns those names into instances at boot; an
/// unknown name is a boot-time error.
#[derive(Clone, Default)]
pub struct MiddlewareCatalog {
    entries: HashMap<String, BoxedMiddleware>,
}

impl MiddlewareCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog with the built-in `recover` and `trace` middleware.
    pub fn with_builtins() -> Self {
        Self::new()
            .with(Recover::new())
            .with(Trace::new())
    }

    /// Adds `middleware` under its own [`name`](Middleware::name).
    pub fn with(mut self, middleware: impl Middleware) -> Self {
        self.register(Arc::new(middleware));
        self
    }

    /// Adds `middleware` under its own name, replacing any entry with that
    /// name.
    pub fn register(&mut self, middleware: BoxedMiddleware) {
        self.entries.insert(middleware.name().to_owned(), middleware);
    }

    /// Adds `middleware` under an explicit name.
    pub fn register_as(&mut self, name: impl Into<String>, middleware: BoxedMiddleware) {
        self.entries.insert(name.into(), middleware);
    }

    pub fn get(&self, name: &str) -> Result<BoxedMiddleware, Error> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownMiddleware { name: name.to_owned() })
    }

    /// Looks up every name, keeping order. Fails on the first unknown name.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<BoxedMiddleware>, Error> {
        names.iter().map(|n| self.get(n.as_ref())).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}

impl fmt::Debug for MiddlewareCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("MiddlewareCatalog").field("names", &names).finish()
    }
}
