//! Capability tags and the registry that maps them to middleware groups.
//!
//! A handler opts into a group of middleware by declaring a [`Capability`].
//! The registry is filled at boot and only read afterwards:
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use juzdy::{Capability, CapabilityRegistry};
//! # use juzdy::middleware::{BoxedMiddleware, Trace};
//! const AUTH: Capability = Capability::from_static("auth");
//!
//! let mut groups = CapabilityRegistry::new();
//! groups.register(AUTH, vec![Arc::new(Trace::new()) as BoxedMiddleware]);
//! ```

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use crate::middleware::BoxedMiddleware;

/// A static marker a handler declares to opt into a middleware group.
#[derive(Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Capability(Cow<'static, str>);

impl Capability {
    pub const fn from_static(tag: &'static str) -> Self {
        Self(Cow::Borrowed(tag))
    }

    pub fn new(tag: impl Into<String>) -> Self {
        Self(Cow::Owned(tag.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Capability {
    fn from(tag: &'static str) -> Self {
        Self::from_static(tag)
    }
}

impl From<String> for Capability {
    fn from(tag: String) -> Self {
        Self::new(tag)
    }
}

/// Capability tag → ordered middleware group.
#[derive(Clone, Default)]
pub struct CapabilityRegistry {
    groups: HashMap<Capability, Vec<BoxedMiddleware>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the middleware group for `tag`.
    pub fn register(&mut self, tag: impl Into<Capability>, middleware: Vec<BoxedMiddleware>) {
        self.groups.insert(tag.into(), middleware);
    }

    /// The group middleware for a handler declaring `capabilities`.
    ///
    /// Groups are concatenated in the handler's declaration order, not
    /// registration order. Unregistered tags contribute nothing; a tag
    /// declared twice contributes once, at its first position.
    pub fn resolve_for(&self, capabilities: &[Capability]) -> Vec<BoxedMiddleware> {
        let mut chain = Vec::new();
        for (i, tag) in capabilities.iter().enumerate() {
            if capabilities[..i].contains(tag) {
                continue;
            }
            if let Some(group) = self.groups.get(tag) {
                chain.extend(group.iter().cloned());
            }
        }
        chain
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (tag, group) in &self.groups {
            let names: Vec<_> = group.iter().map(|m| m.name()).collect();
            map.entry(&tag.as_str(), &names);
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::middleware::{BoxFuture, Middleware, Next};
    use crate::{Outcome, Request};

    struct Named(&'static str);

    impl Middleware for Named {
        fn name(&self) -> &str { self.0 }

        fn process<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a, Outcome> {
            next.run(req)
        }
    }

    fn group(names: &[&'static str]) -> Vec<BoxedMiddleware> {
        names.iter().map(|&n| Arc::new(Named(n)) as BoxedMiddleware).collect()
    }

    fn names(chain: &[BoxedMiddleware]) -> Vec<&str> {
        chain.iter().map(|m| m.name()).collect()
    }

    #[test]
    fn concatenates_in_declaration_order() {
        let mut reg = CapabilityRegistry::new();
        reg.register("b", group(&["b1"]));
        reg.register("a", group(&["a1", "a2"]));

        let chain = reg.resolve_for(&["a".into(), "b".into()]);
        assert_eq!(names(&chain), ["a1", "a2", "b1"]);

        let chain = reg.resolve_for(&["b".into(), "a".into()]);
        assert_eq!(names(&chain), ["b1", "a1", "a2"]);
    }

    #[test]
    fn no_capabilities_means_no_group() {
        let mut reg = CapabilityRegistry::new();
        reg.register("auth", group(&["check"]));
        assert!(reg.resolve_for(&[]).is_empty());
    }

    #[test]
    fn unregistered_tag_contributes_nothing() {
        let mut reg = CapabilityRegistry::new();
        reg.register("auth", group(&["check"]));
        let chain = reg.resolve_for(&["csrf".into(), "auth".into()]);
        assert_eq!(names(&chain), ["check"]);
    }

    #[test]
    fn register_replaces_existing_group() {
        let mut reg = CapabilityRegistry::new();
        reg.register("auth", group(&["old"]));
        reg.register("auth", group(&["new"]));
        assert_eq!(names(&reg.resolve_for(&["auth".into()])), ["new"]);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn duplicate_declaration_counts_once() {
        let mut reg = CapabilityRegistry::new();
        reg.register("auth", group(&["check"]));
        let chain = reg.resolve_for(&["auth".into(), "auth".into()]);
        assert_eq!(names(&chain), ["check"]);
    }

    #[test]
    fn owned_tag_matches_static_declaration() {
        let mut reg = CapabilityRegistry::new();
        let tag = String::from("auth");
        reg.register(tag, group(&["check"]));
        assert_eq!(names(&reg.resolve_for(&[Capability::from_static("auth")])), ["check"]);
    }

    #[test]
    fn static_and_owned_tags_are_equal() {
        assert_eq!(Capability::from_static("auth"), Capability::new("auth"));
    }
}
