//! Paginated photo feed cache
//!
//! The FeedCache is responsible for:
//! - Loading successive pages, at most one request outstanding at a time
//! - Keeping the ordered, id-unique photo collection
//! - Applying server-confirmed like states in place
//! - Announcing changes on the [`ChangeBus`]
//!
//! ## Page Load Flow
//!
//! ```text
//! load_next_page()
//!   │
//!   ├─ fetch in flight? ──────────────► PageLoad::InFlight (no request)
//!   │
//!   ├─ advance cursor, mark in flight (generation g)
//!   │
//!   ├─ GET /photos?page=n ... (lock released while waiting)
//!   │
//!   ├─ generation != g (reset)? ──────► PageLoad::Discarded
//!   │
//!   ├─ error ─────────────────────────► clear in flight, Err(..)
//!   │
//!   └─ append, publish PageAppended, clear in flight ─► PageLoad::Appended(items)
//! ```
//!
//! ## Concurrency
//!
//! All state lives behind one mutex that is only held for short, synchronous
//! critical sections and never across an await point. Network waits happen
//! outside the lock; completions re-enter the critical section and check the
//! generation tag before touching state.

use crate::api::Endpoints;
use crate::bus::{ChangeBus, FeedEvent};
use crate::error::{Error, Result};
use crate::photo::{self, PhotoEntry};
use crate::traits::{HttpRequest, HttpRequester};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Outcome of [`FeedCache::load_next_page`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageLoad {
    /// The page was appended; carries the full updated collection
    Appended(Vec<PhotoEntry>),

    /// Another page fetch is outstanding; nothing was requested
    InFlight,

    /// The feed was reset while this page was loading; the result was dropped
    Discarded {
        /// The page whose result was dropped
        page: u32,
    },
}

impl PageLoad {
    /// The updated collection, if this call appended a page
    pub fn items(&self) -> Option<&[PhotoEntry]> {
        match self {
            PageLoad::Appended(items) => Some(items.as_slice()),
            _ => None,
        }
    }
}

/// The page fetch currently outstanding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InFlight {
    page: u32,
    generation: u64,
}

/// State owned exclusively by [`FeedCache`]
#[derive(Debug, Default)]
struct FeedState {
    /// Ordered collection, append-only apart from like updates
    items: Vec<PhotoEntry>,
    /// Position of each id in `items`
    index: HashMap<String, usize>,
    /// Last page number a fetch was started for
    last_loaded_page: Option<u32>,
    in_flight: Option<InFlight>,
    /// Bumped by every reset; completions from older generations are discarded
    generation: u64,
}

impl FeedState {
    /// Append entries whose ids are not yet known, returning the appended ones
    fn append(&mut self, entries: Vec<PhotoEntry>) -> Vec<PhotoEntry> {
        let mut appended = Vec::with_capacity(entries.len());
        for entry in entries {
            if self.index.contains_key(&entry.id) {
                debug!(photo_id = %entry.id, "photo already cached, skipping duplicate");
                continue;
            }
            self.index.insert(entry.id.clone(), self.items.len());
            self.items.push(entry.clone());
            appended.push(entry);
        }
        appended
    }

    /// Clear the marker only if it still belongs to `op`
    fn clear_in_flight(&mut self, op: InFlight) {
        if self.in_flight == Some(op) {
            self.in_flight = None;
        }
    }
}

/// Clears the in-flight marker of one page fetch when dropped
///
/// Covers every exit of `load_next_page`, including the caller dropping the
/// future while the request is outstanding.
struct InFlightGuard<'a> {
    state: &'a Mutex<FeedState>,
    op: InFlight,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear_in_flight(self.op);
    }
}

/// Client-side cache of the photo feed
///
/// ## Lifecycle
///
/// 1. Create with [`FeedCache::new()`], sharing a requester and a bus
/// 2. Call [`FeedCache::load_next_page()`] whenever the UI needs more photos
/// 3. Call [`FeedCache::toggle_like()`] on user interaction
/// 4. Call [`FeedCache::reset()`] on sign-out
///
/// ## Threading
///
/// The cache is `Send + Sync` and is meant to be shared behind an `Arc`.
pub struct FeedCache {
    requester: Arc<dyn HttpRequester>,
    endpoints: Endpoints,
    bus: ChangeBus,
    state: Mutex<FeedState>,
}

impl FeedCache {
    /// Create an empty feed cache
    ///
    /// # Parameters
    ///
    /// - `requester`: Transport used for every API call
    /// - `endpoints`: Request builder for the API host
    /// - `bus`: Bus that receives `PageAppended` and `LikeToggled` events
    pub fn new(requester: Arc<dyn HttpRequester>, endpoints: Endpoints, bus: ChangeBus) -> Self {
        Self {
            requester,
            endpoints,
            bus,
            state: Mutex::new(FeedState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load the next page of photos
    ///
    /// The cursor advances before the request is sent, so a failed page is
    /// never requested again; the next call moves on to the following page.
    ///
    /// # Returns
    ///
    /// - `Ok(PageLoad::Appended(items))`: The page was appended; `items` is the
    ///   whole collection
    /// - `Ok(PageLoad::InFlight)`: A fetch is already outstanding
    /// - `Ok(PageLoad::Discarded { .. })`: [`FeedCache::reset()`] ran while waiting
    /// - `Err(Error)`: Transport, response or decode failure; the collection
    ///   is unchanged
    pub async fn load_next_page(&self, token: &str) -> Result<PageLoad> {
        let (request, op) = {
            let mut state = self.state();

            if let Some(op) = state.in_flight {
                debug!(page = op.page, "page fetch already in flight, skipping");
                return Ok(PageLoad::InFlight);
            }

            let page = state.last_loaded_page.unwrap_or(0) + 1;
            state.last_loaded_page = Some(page);
            let request = self.endpoints.photos_page(page, token)?;

            let op = InFlight {
                page,
                generation: state.generation,
            };
            state.in_flight = Some(op);
            (request, op)
        };
        let in_flight = InFlightGuard {
            state: &self.state,
            op,
        };

        debug!(page = op.page, generation = op.generation, "fetching page");
        let fetched = self.fetch_page(request).await;

        let (new_items, items) = {
            let mut state = self.state();

            if state.generation != op.generation {
                info!(page = op.page, "feed was reset during fetch, discarding page");
                return Ok(PageLoad::Discarded { page: op.page });
            }

            match fetched {
                Ok(entries) => {
                    let new_items = state.append(entries);
                    (new_items, state.items.clone())
                }
                Err(e) => {
                    warn!(page = op.page, error = %e, "page fetch failed");
                    return Err(e);
                }
            }
        };

        info!(
            page = op.page,
            appended = new_items.len(),
            total = items.len(),
            "page appended"
        );
        self.bus.publish(FeedEvent::PageAppended { new_items });

        // Cleared only after publishing so no later page can overtake this one
        drop(in_flight);

        Ok(PageLoad::Appended(items))
    }

    /// Like or unlike a photo and apply the server-confirmed state
    ///
    /// # Parameters
    ///
    /// - `photo_id`: Id of a photo in the collection
    /// - `currently_liked`: The state the caller shows now; `true` sends an
    ///   unlike, `false` a like
    /// - `token`: Bearer token
    ///
    /// # Returns
    ///
    /// - `Ok(bool)`: The like state reported by the server, now stored locally
    /// - `Err(Error::NotFound)`: The id is not in the collection, or the feed was
    ///   reset before the server answered
    /// - `Err(Error)`: Transport, response or decode failure; nothing changed
    pub async fn toggle_like(&self, photo_id: &str, currently_liked: bool, token: &str) -> Result<bool> {
        let generation = {
            let state = self.state();
            if !state.index.contains_key(photo_id) {
                return Err(Error::not_found(photo_id));
            }
            state.generation
        };

        let request = self.endpoints.toggle_like(photo_id, currently_liked, token)?;
        debug!(photo_id, currently_liked, method = %request.method, "sending like toggle");

        let is_liked = match self.send(request).await.and_then(|body| photo::decode_like(&body)) {
            Ok(is_liked) => is_liked,
            Err(e) => {
                warn!(photo_id, error = %e, "like toggle failed");
                return Err(e);
            }
        };

        {
            let mut state = self.state();
            // After a reset the id may be back, but as a different entry
            if state.generation != generation {
                warn!(photo_id, "feed was reset before the like was confirmed, discarding");
                return Err(Error::not_found(photo_id));
            }
            let Some(&position) = state.index.get(photo_id) else {
                warn!(photo_id, "photo left the feed before the like was confirmed");
                return Err(Error::not_found(photo_id));
            };
            let updated = state.items[position].with_liked(is_liked);
            state.items[position] = updated;
        }

        info!(photo_id, is_liked, "like state applied");
        self.bus.publish(FeedEvent::LikeToggled {
            photo_id: photo_id.to_string(),
            is_liked,
        });

        Ok(is_liked)
    }

    /// Drop every cached photo and rewind the cursor
    ///
    /// An outstanding page fetch is invalidated; its result will be discarded.
    pub fn reset(&self) {
        let mut state = self.state();
        let dropped = state.items.len();

        state.items.clear();
        state.index.clear();
        state.last_loaded_page = None;
        state.in_flight = None;
        state.generation += 1;

        info!(dropped, generation = state.generation, "feed reset");
    }

    /// Snapshot of the collection in feed order
    pub fn items(&self) -> Vec<PhotoEntry> {
        self.state().items.clone()
    }

    /// Look up one photo by id
    pub fn get(&self, photo_id: &str) -> Option<PhotoEntry> {
        let state = self.state();
        state.index.get(photo_id).map(|&position| state.items[position].clone())
    }

    /// Number of cached photos
    pub fn len(&self) -> usize {
        self.state().items.len()
    }

    /// Whether no photo is cached
    pub fn is_empty(&self) -> bool {
        self.state().items.is_empty()
    }

    /// Last page a fetch was started for, if any
    pub fn last_loaded_page(&self) -> Option<u32> {
        self.state().last_loaded_page
    }

    /// Whether a page fetch is outstanding
    pub fn is_fetching(&self) -> bool {
        self.state().in_flight.is_some()
    }

    /// Current generation tag; increases with every reset
    pub fn generation(&self) -> u64 {
        self.state().generation
    }

    async fn fetch_page(&self, request: HttpRequest) -> Result<Vec<PhotoEntry>> {
        let body = self.send(request).await?;
        photo::decode_page(&body)
    }

    /// Send one request and return the body of a 2xx response
    async fn send(&self, request: HttpRequest) -> Result<Vec<u8>> {
        let response = self.requester.send(request).await?;
        if !response.is_success() {
            return Err(Error::response(response.status));
        }
        Ok(response.body)
    }
}

impl std::fmt::Debug for FeedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("FeedCache")
            .field("base_url", &self.endpoints.base_url().as_str())
            .field("items", &state.items.len())
            .field("last_loaded_page", &state.last_loaded_page)
            .field("in_flight", &state.in_flight)
            .field("generation", &state.generation)
            .finish()
    }
}
