// # HTTP Requester Trait
//
// Defines the transport the feed uses to reach the photo API.
//
// ## Implementations
//
// - reqwest-based: `photofeed-http` crate
// - Scripted doubles: `tests/common` in this crate
//
// ## Usage
//
// ```rust,ignore
// use photofeed_core::{HttpRequest, HttpRequester, Method};
//
// let response = requester
//     .send(HttpRequest::new(Method::Get, "https://api.unsplash.com/me"))
//     .await?;
// assert!(response.is_success());
// ```

use async_trait::async_trait;
use std::fmt;

/// HTTP method of a request built by the core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    /// Uppercase method name as it appears on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully built request: method, absolute URL and headers
#[derive(Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    /// Create a request without headers
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
        }
    }

    /// Append a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Look up a header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

// Custom Debug implementation that hides the Authorization header
impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(key, value)| {
                if key.eq_ignore_ascii_case("authorization") {
                    (key.as_str(), "<REDACTED>")
                } else {
                    (key.as_str(), value.as_str())
                }
            })
            .collect();

        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &headers)
            .finish()
    }
}

/// Status and raw body of a completed exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a response
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for HTTP transport implementations
///
/// Implementations perform exactly one exchange per call. Connection
/// failures and timeouts are reported as [`crate::Error::Transport`];
/// any status code, including 4xx and 5xx, is a successful exchange and is
/// returned as an [`HttpResponse`] for the core to classify.
///
/// Retries, redirects and TLS are the implementation's own business; the
/// core never retries on its own.
#[async_trait]
pub trait HttpRequester: Send + Sync {
    /// Send a request and wait for the full response body
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, crate::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_authorization() {
        let request = HttpRequest::new(Method::Get, "https://api.unsplash.com/me")
            .with_header("Authorization", "Bearer secret-token");

        let rendered = format!("{:?}", request);
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("<REDACTED>"));
        assert_eq!(request.header("authorization"), Some("Bearer secret-token"));
    }

    #[test]
    fn test_success_range() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(201, "").is_success());
        assert!(!HttpResponse::new(304, "").is_success());
        assert!(!HttpResponse::new(500, "").is_success());
    }
}
