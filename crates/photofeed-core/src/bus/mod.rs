//! Typed change notifications
//!
//! The [`ChangeBus`] fans events out synchronously to the handlers
//! subscribed to that event's [`EventKind`]:
//!
//! ```text
//! FeedCache ──┐                      ┌──► handler (PageAppended)
//!             ├── publish(event) ────┼──► handler (PageAppended)
//! ProfileCache┘                      └──► EventStream (LikeToggled)
//! ```
//!
//! - Delivery happens on the publishing thread before `publish` returns
//! - Handlers of one kind see events in publish-call order
//! - Nothing is buffered for late subscribers

use crate::photo::PhotoEntry;
use crate::profile::Profile;
use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::trace;

/// Events published by the caches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// A page was appended to the feed
    PageAppended {
        /// Entries added by this page, in response order
        new_items: Vec<PhotoEntry>,
    },

    /// The server confirmed a like state change
    LikeToggled {
        photo_id: String,
        is_liked: bool,
    },

    /// The signed-in user's profile was refreshed
    ProfileUpdated {
        profile: Profile,
    },
}

impl FeedEvent {
    /// The kind subscribers register for
    pub fn kind(&self) -> EventKind {
        match self {
            FeedEvent::PageAppended { .. } => EventKind::PageAppended,
            FeedEvent::LikeToggled { .. } => EventKind::LikeToggled,
            FeedEvent::ProfileUpdated { .. } => EventKind::ProfileUpdated,
        }
    }
}

/// Subscription key of a [`FeedEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    PageAppended,
    LikeToggled,
    ProfileUpdated,
}

/// Handle returned by [`ChangeBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken {
    kind: EventKind,
    id: u64,
}

impl SubscriptionToken {
    /// The kind this subscription listens to
    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

type Handler = Arc<dyn Fn(&FeedEvent) + Send + Sync>;

#[derive(Default)]
struct BusInner {
    next_id: AtomicU64,
    // Ids grow monotonically, so map order is subscription order
    handlers: Mutex<BTreeMap<EventKind, BTreeMap<u64, Handler>>>,
}

impl BusInner {
    fn handlers(&self) -> MutexGuard<'_, BTreeMap<EventKind, BTreeMap<u64, Handler>>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, token: SubscriptionToken) -> bool {
        let mut handlers = self.handlers();
        let Some(for_kind) = handlers.get_mut(&token.kind) else {
            return false;
        };
        let removed = for_kind.remove(&token.id).is_some();
        if for_kind.is_empty() {
            handlers.remove(&token.kind);
        }
        removed
    }
}

/// Synchronous publish/subscribe channel keyed by [`EventKind`]
///
/// Cloning is cheap; clones share the same subscribers.
#[derive(Clone, Default)]
pub struct ChangeBus {
    inner: Arc<BusInner>,
}

impl ChangeBus {
    /// Create a bus without subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one event kind
    ///
    /// The handler runs on the publishing thread. It may subscribe or
    /// unsubscribe, but must not block.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionToken
    where
        F: Fn(&FeedEvent) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .handlers()
            .entry(kind)
            .or_default()
            .insert(id, Arc::new(handler));

        trace!(?kind, id, "subscribed");
        SubscriptionToken { kind, id }
    }

    /// Remove a subscription
    ///
    /// Returns `false` if the token was already removed.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let removed = self.inner.remove(token);
        trace!(kind = ?token.kind, id = token.id, removed, "unsubscribed");
        removed
    }

    /// Deliver an event to every current subscriber of its kind
    ///
    /// Handlers are called in subscription order. The subscriber list is
    /// captured before the first handler runs; subscriptions added during
    /// delivery see the next publish, not this one.
    pub fn publish(&self, event: FeedEvent) {
        let kind = event.kind();
        let handlers: Vec<Handler> = match self.inner.handlers().get(&kind) {
            Some(for_kind) => for_kind.values().cloned().collect(),
            None => Vec::new(),
        };

        if handlers.is_empty() {
            trace!(?kind, "no subscribers for event");
            return;
        }

        trace!(?kind, subscribers = handlers.len(), "publishing event");
        for handler in handlers {
            handler(&event);
        }
    }

    /// Subscribe with a stream instead of a callback
    ///
    /// Events are queued without bound until the stream is polled. Dropping
    /// the stream removes the subscription.
    pub fn watch(&self, kind: EventKind) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let token = self.subscribe(kind, move |event| {
            let _ = tx.send(event.clone());
        });

        EventStream {
            inner: UnboundedReceiverStream::new(rx),
            token,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Number of live subscriptions for a kind
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.inner.handlers().get(&kind).map_or(0, BTreeMap::len)
    }
}

impl std::fmt::Debug for ChangeBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.inner.handlers();
        let counts: BTreeMap<EventKind, usize> =
            handlers.iter().map(|(kind, subs)| (*kind, subs.len())).collect();
        f.debug_struct("ChangeBus").field("subscribers", &counts).finish()
    }
}

/// Stream of events for one kind, created by [`ChangeBus::watch`]
pub struct EventStream {
    inner: UnboundedReceiverStream<FeedEvent>,
    token: SubscriptionToken,
    bus: std::sync::Weak<BusInner>,
}

impl EventStream {
    /// The subscription backing this stream
    pub fn token(&self) -> SubscriptionToken {
        self.token
    }
}

impl Stream for EventStream {
    type Item = FeedEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.remove(self.token);
        }
    }
}
