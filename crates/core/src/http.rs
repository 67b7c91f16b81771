//! Request and response values passed between the controller, the cache store and the network.
//!
//! These mirror the parts of the Fetch API the controller reasons about: URL,
//! method, mode and headers on the way out; status, headers and body on the way
//! back. Responses are plain values, so the write-through path stores a clone
//! and hands the original back to the caller.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

/// How a request was initiated by the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Full document load (top-level page navigation).
    Navigate,
    SameOrigin,
    #[default]
    Cors,
    NoCors,
}

impl fmt::Display for RequestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestMode::Navigate => write!(f, "navigate"),
            RequestMode::SameOrigin => write!(f, "same-origin"),
            RequestMode::Cors => write!(f, "cors"),
            RequestMode::NoCors => write!(f, "no-cors"),
        }
    }
}

/// An outbound request as seen by the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: Url,
    /// Upper-case HTTP method.
    pub method: String,
    pub mode: RequestMode,
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// A subresource `GET` request.
    pub fn get(url: Url) -> Self {
        Self { url, method: "GET".into(), mode: RequestMode::default(), headers: Vec::new() }
    }

    /// A top-level page navigation.
    pub fn navigate(url: Url) -> Self {
        Self { url, method: "GET".into(), mode: RequestMode::Navigate, headers: Vec::new() }
    }

    /// Build a request with an arbitrary method.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the method is empty or not an HTTP token.
    pub fn with_method(url: Url, method: &str, mode: RequestMode) -> Result<Self, Error> {
        let method = method.trim();
        if method.is_empty() || !method.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::InvalidInput(format!("invalid method: {method:?}")));
        }
        Ok(Self { url, method: method.to_ascii_uppercase(), mode, headers: Vec::new() })
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// URL used for cache matching: the request URL without its fragment.
    pub fn cache_url(&self) -> Url {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url
    }
}

/// A response from the network, the cache, or synthesized by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// URL the response was served for, if any.
    pub url: Option<Url>,
    pub status: u16,
    pub status_text: String,
    /// Headers in the order they were received.
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, status_text: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self { url: None, status, status_text: status_text.into(), headers: Vec::new(), body: body.into() }
    }

    /// The minimal response served when neither the network nor the cache can answer.
    pub fn offline(body: &str) -> Self {
        Self::new(503, "Service Unavailable", body.to_string()).with_header("Content-Type", "text/plain")
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    /// Status in the 200-299 range.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value matching `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_request_defaults() {
        let req = Request::get(url("http://localhost:3000/widgets"));
        assert!(req.is_get());
        assert!(!req.is_navigation());
        assert_eq!(req.mode, RequestMode::Cors);

        let nav = Request::navigate(url("http://localhost:3000/"));
        assert!(nav.is_navigation());
    }

    #[test]
    fn test_with_method_uppercases() {
        let req = Request::with_method(url("http://localhost:3000/api"), "post", RequestMode::Cors).unwrap();
        assert_eq!(req.method, "POST");
        assert!(!req.is_get());
    }

    #[test]
    fn test_with_method_rejects_garbage() {
        assert!(Request::with_method(url("http://localhost:3000/"), "", RequestMode::Cors).is_err());
        assert!(Request::with_method(url("http://localhost:3000/"), "GE T", RequestMode::Cors).is_err());
    }

    #[test]
    fn test_cache_url_strips_fragment() {
        let req = Request::get(url("http://localhost:3000/widgets?id=2#details"));
        assert_eq!(req.cache_url().as_str(), "http://localhost:3000/widgets?id=2");
    }

    #[test]
    fn test_response_ok_range() {
        assert!(Response::new(200, "OK", "").ok());
        assert!(Response::new(204, "No Content", "").ok());
        assert!(!Response::new(304, "Not Modified", "").ok());
        assert!(!Response::new(404, "Not Found", "").ok());
    }

    #[test]
    fn test_offline_response() {
        let resp = Response::offline("Offline");
        assert_eq!(resp.status, 503);
        assert_eq!(resp.status_text, "Service Unavailable");
        assert_eq!(resp.content_type(), Some("text/plain"));
        assert_eq!(resp.body, Bytes::from_static(b"Offline"));
    }

    #[test]
    fn test_header_lookup_case_insensitive() {
        let resp = Response::new(200, "OK", "").with_header("ETag", "\"abc\"");
        assert_eq!(resp.header("etag"), Some("\"abc\""));
        assert_eq!(resp.header("last-modified"), None);
    }

    #[test]
    fn test_request_mode_serde() {
        let json = serde_json::to_string(&RequestMode::SameOrigin).unwrap();
        assert_eq!(json, "\"same-origin\"");
        assert_eq!(RequestMode::NoCors.to_string(), "no-cors");
    }
}
