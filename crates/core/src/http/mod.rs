//! Request and response model shared by the router, the cache and the
//! network boundary.
//!
//! Bodies are `Bytes`, so cloning a response before handing one copy to the
//! cache writer and the other to the caller is a reference-count bump.

pub mod url;

use std::collections::BTreeMap;

use ::url::Url;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::cache::hash::compute_cache_key;

pub use self::url::{UrlError, parse_origin, resolve};

/// Header map with case-insensitive names.
///
/// Names are stored lowercased; a repeated insert replaces the previous value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.0.insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// An intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: String,
    pub url: Url,
    pub headers: Headers,
}

impl Request {
    /// Build a request; the method is uppercased.
    pub fn new(method: impl AsRef<str>, url: Url) -> Self {
        Self { method: method.as_ref().to_ascii_uppercase(), url, headers: Headers::new() }
    }

    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    pub fn accept(&self) -> Option<&str> {
        self.headers.get("accept")
    }

    /// Whether the `Accept` header asks for an HTML document.
    ///
    /// A missing header is treated as "not HTML".
    pub fn accepts_html(&self) -> bool {
        self.accept().is_some_and(|accept| accept.contains("text/html"))
    }

    /// Request identity used as the cache key (method + absolute URL).
    pub fn cache_key(&self) -> String {
        compute_cache_key(&self.method, self.url.as_str())
    }
}

/// A response snapshot: status, headers and a single shared body buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Headers,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, headers: Headers, body: impl Into<Bytes>) -> Self {
        Self { status, headers, body: body.into() }
    }

    /// Whether the status is in the 2xx range.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type")
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_headers_case_insensitive() {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "text/css");
        assert_eq!(headers.get("content-type"), Some("text/css"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/css"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_method_uppercased() {
        let req = Request::new("post", url("https://moodify.example/api/mood"));
        assert_eq!(req.method(), "POST");
        assert!(!req.is_get());
    }

    #[test]
    fn test_accepts_html() {
        let req = Request::get(url("https://moodify.example/about"))
            .with_header("Accept", "text/html,application/xhtml+xml,*/*;q=0.8");
        assert!(req.accepts_html());

        let json = Request::get(url("https://moodify.example/data.json")).with_header("Accept", "application/json");
        assert!(!json.accepts_html());

        let bare = Request::get(url("https://moodify.example/data.json"));
        assert!(!bare.accepts_html());
    }

    #[test]
    fn test_cache_key_ignores_headers() {
        let a = Request::get(url("https://moodify.example/a")).with_header("Accept", "text/html");
        let b = Request::get(url("https://moodify.example/a"));
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_response_ok_range() {
        assert!(Response::new(200, Headers::new(), "x").ok());
        assert!(Response::new(204, Headers::new(), "").ok());
        assert!(!Response::new(304, Headers::new(), "").ok());
        assert!(!Response::new(404, Headers::new(), "").ok());
    }

    #[test]
    fn test_response_clone_shares_body() {
        let original = Response::new(200, Headers::new(), "body { color: teal; }");
        let copy = original.clone();
        assert_eq!(copy.body.as_ptr(), original.body.as_ptr());
        assert_eq!(copy.text(), "body { color: teal; }");
    }
}
