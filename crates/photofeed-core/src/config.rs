//! Configuration types for the photo feed
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use url::Url;

/// Default base URL of the photo API
pub const DEFAULT_API_BASE_URL: &str = "https://api.unsplash.com";

/// Main photo feed configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoFeedConfig {
    /// Remote API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Transport settings, consumed by requester implementations
    #[serde(default)]
    pub http: HttpConfig,
}

impl PhotoFeedConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the configuration at another API host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api.base_url = base_url.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.api.validate()?;
        self.http.validate()?;
        Ok(())
    }
}

/// Remote API configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Absolute base URL, e.g. "https://api.unsplash.com"
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl ApiConfig {
    /// Validate the API configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.base_url.is_empty() {
            return Err(crate::Error::config("API base URL cannot be empty"));
        }

        let url = Url::parse(&self.base_url).map_err(|e| {
            crate::Error::config(format!("API base URL '{}' is invalid: {}", self.base_url, e))
        })?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(crate::Error::config(format!(
                    "API base URL must use http or https, got '{}'",
                    other
                )));
            }
        }

        if url.cannot_be_a_base() {
            return Err(crate::Error::config(format!(
                "API base URL '{}' cannot be used as a base",
                self.base_url
            )));
        }

        Ok(())
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Transport configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout (in seconds)
    ///
    /// A timed out request surfaces as a transport error.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header sent by the requester
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl HttpConfig {
    /// Validate the transport configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("HTTP timeout must be > 0"));
        }
        if self.user_agent.trim().is_empty() {
            return Err(crate::Error::config("HTTP user agent cannot be empty"));
        }
        Ok(())
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("photofeed/", env!("CARGO_PKG_VERSION")).to_string()
}
