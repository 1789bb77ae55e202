//! Owned request and response values passed between the controller,
//! the cache stores and the network.
//!
//! A [`Response`] owns its body. Handing a response to one consumer moves
//! it; every additional consumer (a store write, the caller) must receive
//! its own copy via [`Response::duplicate`].

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

/// Ordered header list with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// First value for `name`, compared case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replace every value for `name` with a single value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.remove(&name);
        self.0.push((name, value.into()));
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    pub fn remove(&mut self, name: &str) {
        self.0.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
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

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// An intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: Url,
    pub headers: Headers,
}

impl Request {
    pub fn new(method: impl Into<String>, url: Url) -> Self {
        Self { method: method.into(), url, headers: Headers::new() }
    }

    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }

    /// Whether the `Accept` header asks for an HTML document.
    pub fn accepts_html(&self) -> bool {
        self.headers
            .get("accept")
            .is_some_and(|accept| accept.to_ascii_lowercase().contains("text/html"))
    }
}

/// A response snapshot: status, headers and an immutable body.
#[derive(Debug, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    body: Bytes,
}

impl Response {
    pub fn new(status: u16, status_text: impl Into<String>, headers: Headers, body: impl Into<Bytes>) -> Self {
        Self { status, status_text: status_text.into(), headers, body: body.into() }
    }

    /// A plain-text response with a single content-type header.
    pub fn text(status: u16, status_text: impl Into<String>, body: impl Into<String>) -> Self {
        let mut headers = Headers::new();
        headers.set("content-type", "text/plain; charset=utf-8");
        Self::new(status, status_text, headers, Bytes::from(body.into()))
    }

    /// Synthetic sentinel for a network failure with no usable cached entry.
    pub fn offline() -> Self {
        Self::text(503, "Service Unavailable", "Offline")
    }

    /// Synthetic sentinel for an exhausted fallback strategy.
    pub fn unavailable(resource: &str) -> Self {
        Self::text(404, "Not Found", format!("{resource} unavailable"))
    }

    /// Whether the status is in the 2xx range.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Consume the response, yielding its body.
    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Independent copy for an additional consumer.
    pub fn duplicate(&self) -> Self {
        Self {
            status: self.status,
            status_text: self.status_text.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type")
    }
}
