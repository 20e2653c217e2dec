// # photofeed-core
//
// Core library for the paginated photo feed.
//
// ## Architecture Overview
//
// This library owns the client-side view of a remote photo API:
// - **FeedCache**: Ordered photo collection, page cursor, single-flight page loading
//   and server-confirmed like toggling
// - **ChangeBus**: Typed publish/subscribe channel announcing feed changes
// - **ProfileCache**: Latest-wins cache of the signed-in user's profile
// - **FeedSession**: Shared context wiring the caches to one bus, requester and
//   token provider
// - **HttpRequester** / **TokenProvider**: Traits for the injected collaborators
//
// ## Design Principles
//
// 1. **Injected Collaborators**: Transport and credentials live behind traits
// 2. **Serialized State**: Every mutation of cached state happens inside one
//    short critical section, never across an await point
// 3. **Generation Tags**: Results that resolve after a reset are discarded
// 4. **Commit After Confirmation**: Local state changes only after the server answers

pub mod api;
pub mod bus;
pub mod config;
pub mod error;
pub mod feed;
pub mod photo;
pub mod profile;
pub mod session;
pub mod traits;

// Re-export core types for convenience
pub use bus::{ChangeBus, EventKind, EventStream, FeedEvent, SubscriptionToken};
pub use config::{ApiConfig, HttpConfig, PhotoFeedConfig};
pub use error::{Error, ErrorKind, Result};
pub use feed::{FeedCache, PageLoad};
pub use photo::PhotoEntry;
pub use profile::{Profile, ProfileCache};
pub use session::FeedSession;
pub use traits::{HttpRequest, HttpRequester, HttpResponse, Method, StaticTokenProvider, TokenProvider};
