//! Incoming HTTP request type.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};

/// A query-string value.
///
/// `?tag=a&tag=b` keeps the last value; `?tag[]=a&tag[]=b` collects a list
/// under the key `tag`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum QueryValue {
    Single(String),
    List(Vec<String>),
}

impl QueryValue {
    /// The scalar value, or the last element of a list.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Single(v) => Some(v),
            Self::List(vs) => vs.last().map(String::as_str),
        }
    }
}

type Attribute = Arc<dyn Any + Send + Sync>;

/// An incoming HTTP request.
///
/// Method, path, query, headers and body are fixed at construction. The
/// attribute bag is the only mutable part; middleware uses it to pass values
/// further in.
#[derive(Clone)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: HashMap<String, QueryValue>,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
    attributes: HashMap<String, Attribute>,
}

impl Request {
    /// Builder for a request. Defaults to `GET /`.
    pub fn builder() -> RequestBuilder {
        RequestBuilder {
            method: Method::GET,
            target: String::from("/"),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Shorthand for a bodiless `GET` to `uri`.
    pub fn get(uri: &str) -> Self {
        Self::builder().uri(uri).build()
    }

    pub(crate) fn from_parts(
        method: Method,
        path: String,
        query: Option<&str>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Self {
        Self {
            method,
            path,
            query: query.map(parse_query).unwrap_or_default(),
            headers,
            body,
            attributes: HashMap::new(),
        }
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup. Returns the first value for `name`
    /// when it is valid visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a query parameter.
    pub fn query(&self, key: &str) -> Option<&QueryValue> {
        self.query.get(key)
    }

    /// Returns a query parameter as a single string.
    pub fn query_str(&self, key: &str) -> Option<&str> {
        self.query.get(key).and_then(QueryValue::as_str)
    }

    /// Stores a value in the attribute bag, replacing any previous value
    /// under `key`.
    pub fn set_attribute<T>(&mut self, key: impl Into<String>, value: T)
    where
        T: Any + Send + Sync,
    {
        self.attributes.insert(key.into(), Arc::new(value));
    }

    /// Returns the attribute stored under `key` if it has type `T`.
    pub fn attribute<T: Any>(&self, key: &str) -> Option<&T> {
        self.attributes.get(key)?.downcast_ref::<T>()
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .field("attributes", &self.attributes.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Fluent builder for [`Request`], used by hosts other than the bundled
/// server and by tests.
pub struct RequestBuilder {
    method: Method,
    target: String,
    headers: HeaderMap,
    body: Bytes,
}

impl RequestBuilder {
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the request target: a path with optional query, or an absolute
    /// URI. A target that is not a valid URI keeps its path verbatim, so it
    /// resolves to no handler rather than to a different one.
    pub fn uri(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Appends a header value. Invalid names or values are dropped.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => tracing::warn!(name, "ignoring invalid request header"),
        }
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn build(self) -> Request {
        match self.target.parse::<Uri>() {
            Ok(uri) => Request::from_parts(
                self.method,
                uri.path().to_owned(),
                uri.query(),
                self.headers,
                self.body,
            ),
            Err(e) => {
                tracing::debug!(uri = %self.target, "request target is not a valid uri: {e}");
                let raw = self.target.split_once('#').map_or(self.target.as_str(), |(t, _)| t);
                let (path, query) = match raw.split_once('?') {
                    Some((path, query)) => (path, Some(query)),
                    None => (raw, None),
                };
                Request::from_parts(self.method, path.to_owned(), query, self.headers, self.body)
            }
        }
    }
}

fn parse_query(raw: &str) -> HashMap<String, QueryValue> {
    let mut query = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        match key.strip_suffix("[]") {
            Some(list_key) => {
                let entry = query
                    .entry(list_key.to_owned())
                    .or_insert_with(|| QueryValue::List(Vec::new()));
                match entry {
                    QueryValue::List(values) => values.push(value.into_owned()),
                    // `a=1&a[]=2`: the list form takes over.
                    QueryValue::Single(_) => *entry = QueryValue::List(vec![value.into_owned()]),
                }
            }
            None => {
                query.insert(key.into_owned(), QueryValue::Single(value.into_owned()));
            }
        }
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_path_and_query() {
        let req = Request::get("/Blog/Post?id=42&lang=en");
        assert_eq!(req.path(), "/Blog/Post");
        assert_eq!(req.query_str("id"), Some("42"));
        assert_eq!(req.query_str("lang"), Some("en"));
        assert!(req.query("missing").is_none());
    }

    #[test]
    fn invalid_target_keeps_raw_path() {
        let req = Request::get("/No Such Thing?x=1");
        assert_eq!(req.path(), "/No Such Thing");
        assert_eq!(req.query_str("x"), Some("1"));
    }

    #[test]
    fn absolute_uri_uses_its_path() {
        let req = Request::get("http://localhost:3000/Hello?name=alice");
        assert_eq!(req.path(), "/Hello");
        assert_eq!(req.query_str("name"), Some("alice"));
    }

    #[test]
    fn repeated_plain_key_keeps_last_value() {
        let req = Request::get("/?a=1&a=2");
        assert_eq!(req.query("a"), Some(&QueryValue::Single("2".into())));
    }

    #[test]
    fn bracket_keys_collect_lists() {
        let req = Request::get("/?tag[]=x&tag[]=y%20z");
        assert_eq!(
            req.query("tag"),
            Some(&QueryValue::List(vec!["x".into(), "y z".into()]))
        );
        assert_eq!(req.query_str("tag"), Some("y z"));
    }

    #[test]
    fn headers_are_case_insensitive_and_multi_valued() {
        let req = Request::builder()
            .header("X-Token", "a")
            .header("x-token", "b")
            .build();
        assert_eq!(req.header("x-TOKEN"), Some("a"));
        let all: Vec<_> = req.headers().get_all("x-token").iter().collect();
        assert_eq!(all, vec!["a", "b"]);
    }

    #[test]
    fn attributes_are_typed() {
        let mut req = Request::get("/");
        req.set_attribute("user", String::from("alice"));
        assert_eq!(req.attribute::<String>("user").map(String::as_str), Some("alice"));
        assert!(req.attribute::<u32>("user").is_none());
        assert!(req.has_attribute("user"));
    }

    #[test]
    fn builder_keeps_method_and_body() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/Users")
            .body("payload")
            .build();
        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.body(), b"payload");
    }
}
