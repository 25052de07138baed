//! The request capability the scheduler polls through.
//!
//! The scheduler only ever needs one thing from the outside world:
//! `request(method, path, options) -> Response`.  [`ApiClient`] is that seam.
//! [`InstagramClient`] is the real, reqwest-backed implementation; tests plug
//! in a recording mock instead.

mod instagram;
#[cfg(test)]
pub(crate) mod mock;

pub use instagram::{AccessToken, AuthParams, AuthorizationOptions, InstagramClient};

use async_trait::async_trait;
use reqwest::header::HeaderMap;
pub use reqwest::Method;

use crate::error::Result;

/// Query, body and header options for a single request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub query: Vec<(String, String)>,
    pub body: Option<String>,
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Value of the first query parameter named `key`.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Rate-limit budget reported by the API for the credential that was used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub limit: u32,
    pub remaining: u32,
}

impl RateLimit {
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let read = |name: &str| -> Option<u32> { headers.get(name)?.to_str().ok()?.parse().ok() };
        Some(Self {
            limit: read("x-ratelimit-limit")?,
            remaining: read("x-ratelimit-remaining")?,
        })
    }
}

/// A successful (2xx) response with its JSON body already decoded.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub rate_limit: Option<RateLimit>,
    pub body: serde_json::Value,
}

impl Response {
    pub fn new(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            rate_limit: None,
            body,
        }
    }
}

/// Anything that can carry a request to the API.
///
/// Implementations must map non-2xx statuses to
/// [`StreamError::Http`](crate::StreamError::Http) and network failures to
/// [`StreamError::Transport`](crate::StreamError::Transport).
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn request(&self, method: Method, path: &str, options: RequestOptions) -> Result<Response>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn query_value_returns_first_match() {
        let options = RequestOptions::default()
            .query("access_token", "a")
            .query("count", "50")
            .query("access_token", "b");
        assert_eq!(options.query_value("access_token"), Some("a"));
        assert_eq!(options.query_value("count"), Some("50"));
        assert_eq!(options.query_value("missing"), None);
    }

    #[test]
    fn rate_limit_needs_both_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("4996"));
        assert!(RateLimit::from_headers(&headers).is_none());

        headers.insert("x-ratelimit-limit", HeaderValue::from_static("5000"));
        assert_eq!(
            RateLimit::from_headers(&headers),
            Some(RateLimit {
                limit: 5000,
                remaining: 4996
            })
        );
    }

    #[test]
    fn rate_limit_ignores_garbage() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-limit", HeaderValue::from_static("lots"));
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("1"));
        assert!(RateLimit::from_headers(&headers).is_none());
    }
}
