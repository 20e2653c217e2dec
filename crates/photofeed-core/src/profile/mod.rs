//! Signed-in user profile
//!
//! The ProfileCache keeps the profile returned by `GET /me`. Fetches are
//! latest-wins: starting a fetch supersedes the outstanding one, whose
//! result is then dropped and reported as [`Error::Cancelled`].

use crate::api::Endpoints;
use crate::bus::{ChangeBus, FeedEvent};
use crate::error::{Error, Result};
use crate::traits::HttpRequester;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Profile of the signed-in user, ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    /// First and last name joined by a space
    pub name: String,
    /// `@username`
    pub login_name: String,
    pub bio: Option<String>,
}

/// Body of `GET /me`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePayload {
    pub username: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl From<ProfilePayload> for Profile {
    fn from(payload: ProfilePayload) -> Self {
        let name = [payload.first_name.as_deref(), payload.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            login_name: format!("@{}", payload.username),
            username: payload.username,
            name,
            bio: payload.bio.filter(|bio| !bio.trim().is_empty()),
        }
    }
}

#[derive(Debug, Default)]
struct ProfileState {
    profile: Option<Profile>,
    /// Sequence number of the latest fetch or clear
    latest: u64,
}

/// Latest-wins cache of the signed-in user's profile
pub struct ProfileCache {
    requester: Arc<dyn HttpRequester>,
    endpoints: Endpoints,
    bus: ChangeBus,
    state: Mutex<ProfileState>,
}

impl ProfileCache {
    /// Create an empty profile cache
    pub fn new(requester: Arc<dyn HttpRequester>, endpoints: Endpoints, bus: ChangeBus) -> Self {
        Self {
            requester,
            endpoints,
            bus,
            state: Mutex::new(ProfileState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, ProfileState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch the profile and store it
    ///
    /// Publishes [`FeedEvent::ProfileUpdated`] on success. Fails with
    /// [`Error::Cancelled`] if another fetch or [`ProfileCache::clear()`]
    /// started before this one finished.
    pub async fn fetch_profile(&self, token: &str) -> Result<Profile> {
        let request = self.endpoints.profile(token)?;
        let sequence = {
            let mut state = self.state();
            state.latest += 1;
            state.latest
        };

        debug!(sequence, "fetching profile");
        let fetched = self.requester.send(request).await.and_then(|response| {
            if !response.is_success() {
                return Err(Error::response(response.status));
            }
            serde_json::from_slice::<ProfilePayload>(&response.body)
                .map(Profile::from)
                .map_err(Error::from)
        });

        let profile = {
            let mut state = self.state();
            if state.latest != sequence {
                debug!(sequence, latest = state.latest, "profile fetch superseded");
                return Err(Error::cancelled("profile fetch superseded"));
            }

            match fetched {
                Ok(profile) => {
                    state.profile = Some(profile.clone());
                    profile
                }
                Err(e) => {
                    warn!(error = %e, "profile fetch failed");
                    return Err(e);
                }
            }
        };

        info!(username = %profile.username, "profile updated");
        self.bus.publish(FeedEvent::ProfileUpdated {
            profile: profile.clone(),
        });

        Ok(profile)
    }

    /// The cached profile, if one was fetched since the last clear
    pub fn profile(&self) -> Option<Profile> {
        self.state().profile.clone()
    }

    /// Drop the cached profile and supersede any outstanding fetch
    pub fn clear(&self) {
        let mut state = self.state();
        state.profile = None;
        state.latest += 1;
        debug!("profile cleared");
    }
}

impl std::fmt::Debug for ProfileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("ProfileCache")
            .field("profile", &state.profile)
            .field("latest", &state.latest)
            .finish()
    }
}
