// # Token Provider Trait
//
// Supplies the bearer token used on every API request. Acquiring, storing
// and refreshing tokens belongs to the implementation; the core asks for a
// token right before each operation and never validates it.

use async_trait::async_trait;
use std::fmt;

/// Trait for bearer token sources
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return the current bearer token
    ///
    /// Fails with [`crate::Error::Authentication`] when no token is available.
    async fn bearer_token(&self) -> Result<String, crate::Error>;
}

/// Token provider that always returns the same token
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("token", &"<REDACTED>")
            .finish()
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn bearer_token(&self) -> Result<String, crate::Error> {
        Ok(self.token.clone())
    }
}
