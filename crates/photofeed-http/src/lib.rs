// # HTTP Transport
//
// This crate provides the production collaborators for photofeed-core:
//
// - [`ReqwestRequester`]: `HttpRequester` on top of a pooled `reqwest::Client`
// - [`EnvTokenProvider`]: `TokenProvider` that reads the bearer token from an
//   environment variable on every call
//
// ## Behavior
//
// - One HTTP exchange per `send()`; no retries (callers own retry policy)
// - Timeouts and connection failures map to `Error::Transport`
// - Every status code, including 4xx/5xx, is returned to the core as-is
// - The Authorization header never appears in logs

use async_trait::async_trait;
use photofeed_core::config::HttpConfig;
use photofeed_core::{Error, HttpRequest, HttpRequester, HttpResponse, Method, Result, TokenProvider};
use std::time::Duration;

/// Default environment variable holding the bearer token
pub const DEFAULT_TOKEN_VAR: &str = "PHOTOFEED_ACCESS_TOKEN";

/// `HttpRequester` backed by reqwest
#[derive(Debug, Clone)]
pub struct ReqwestRequester {
    client: reqwest::Client,
}

impl ReqwestRequester {
    /// Build a requester from transport configuration
    ///
    /// Fails with [`Error::Config`] if the configuration is invalid or the
    /// TLS backend cannot be initialized.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl HttpRequester for ReqwestRequester {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        tracing::debug!(method = %request.method, url = %request.url, "sending request");

        let mut builder = self.client.request(to_reqwest(request.method), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_builder() {
                Error::invalid_request(format!("Request could not be built: {}", e))
            } else if e.is_timeout() {
                Error::transport(format!("Request timed out: {}", e))
            } else {
                Error::transport(format!("HTTP request failed: {}", e))
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::transport(format!("Failed to read response body: {}", e)))?;

        tracing::debug!(status, bytes = body.len(), "response received");
        Ok(HttpResponse::new(status, body.to_vec()))
    }
}

/// `TokenProvider` that reads an environment variable on demand
#[derive(Debug, Clone)]
pub struct EnvTokenProvider {
    var: String,
}

impl EnvTokenProvider {
    /// Read the token from `var`
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    /// Name of the variable this provider reads
    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Default for EnvTokenProvider {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_VAR)
    }
}

#[async_trait]
impl TokenProvider for EnvTokenProvider {
    async fn bearer_token(&self) -> Result<String> {
        match std::env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            Ok(_) => Err(Error::auth(format!("{} is empty", self.var))),
            Err(_) => Err(Error::auth(format!("{} is not set", self.var))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photofeed_core::ErrorKind;

    #[test]
    fn test_requester_creation() {
        let requester = ReqwestRequester::new(&HttpConfig::default());
        assert!(requester.is_ok());
    }

    #[test]
    fn test_requester_rejects_invalid_config() {
        let config = HttpConfig {
            timeout_secs: 0,
            ..HttpConfig::default()
        };
        assert!(matches!(ReqwestRequester::new(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_method_mapping() {
        assert_eq!(to_reqwest(Method::Get), reqwest::Method::GET);
        assert_eq!(to_reqwest(Method::Post), reqwest::Method::POST);
        assert_eq!(to_reqwest(Method::Delete), reqwest::Method::DELETE);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let config = HttpConfig {
            timeout_secs: 2,
            ..HttpConfig::default()
        };
        let requester = ReqwestRequester::new(&config).unwrap();

        // Port 9 on localhost (discard) is closed on test machines
        let err = requester
            .send(HttpRequest::new(Method::Get, "http://127.0.0.1:9/photos"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn test_missing_env_token() {
        let provider = EnvTokenProvider::new("PHOTOFEED_TEST_TOKEN_THAT_IS_NEVER_SET");
        let err = tokio_test::block_on(provider.bearer_token()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(EnvTokenProvider::default().var(), "PHOTOFEED_ACCESS_TOKEN");
    }
}
