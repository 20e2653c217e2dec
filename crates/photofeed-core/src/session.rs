//! Shared context for one signed-in user
//!
//! A [`FeedSession`] wires the feed and profile caches to one bus, one
//! requester and one token provider. Create one per sign-in and pass it to
//! whatever needs the feed; call [`FeedSession::sign_out()`] to drop all
//! cached state.

use crate::api::Endpoints;
use crate::bus::ChangeBus;
use crate::config::PhotoFeedConfig;
use crate::error::Result;
use crate::feed::{FeedCache, PageLoad};
use crate::profile::{Profile, ProfileCache};
use crate::traits::{HttpRequester, TokenProvider};
use std::sync::Arc;
use tracing::info;

/// Feed, profile and bus for one user session
pub struct FeedSession {
    bus: ChangeBus,
    feed: FeedCache,
    profile: ProfileCache,
    tokens: Arc<dyn TokenProvider>,
}

impl FeedSession {
    /// Create a session
    ///
    /// # Parameters
    ///
    /// - `config`: Validated before anything is built
    /// - `requester`: Transport shared by both caches
    /// - `tokens`: Asked for a bearer token before every operation
    pub fn new(
        config: &PhotoFeedConfig,
        requester: Arc<dyn HttpRequester>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self> {
        config.validate()?;

        let endpoints = Endpoints::new(&config.api.base_url)?;
        let bus = ChangeBus::new();

        info!(base_url = %endpoints.base_url(), "feed session created");

        Ok(Self {
            feed: FeedCache::new(requester.clone(), endpoints.clone(), bus.clone()),
            profile: ProfileCache::new(requester, endpoints, bus.clone()),
            bus,
            tokens,
        })
    }

    /// Bus carrying every event of this session
    pub fn bus(&self) -> &ChangeBus {
        &self.bus
    }

    pub fn feed(&self) -> &FeedCache {
        &self.feed
    }

    pub fn profile(&self) -> &ProfileCache {
        &self.profile
    }

    /// [`FeedCache::load_next_page()`] with a token from the provider
    pub async fn load_next_page(&self) -> Result<PageLoad> {
        let token = self.tokens.bearer_token().await?;
        self.feed.load_next_page(&token).await
    }

    /// [`FeedCache::toggle_like()`] with a token from the provider
    pub async fn toggle_like(&self, photo_id: &str, currently_liked: bool) -> Result<bool> {
        let token = self.tokens.bearer_token().await?;
        self.feed.toggle_like(photo_id, currently_liked, &token).await
    }

    /// [`ProfileCache::fetch_profile()`] with a token from the provider
    pub async fn fetch_profile(&self) -> Result<Profile> {
        let token = self.tokens.bearer_token().await?;
        self.profile.fetch_profile(&token).await
    }

    /// Drop all cached state; outstanding fetches will be discarded
    pub fn sign_out(&self) {
        self.feed.reset();
        self.profile.clear();
        info!("signed out, caches cleared");
    }
}

impl std::fmt::Debug for FeedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedSession")
            .field("feed", &self.feed)
            .field("profile", &self.profile)
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}
