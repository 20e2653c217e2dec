//! Test doubles and common utilities for feed contract tests
//!
//! This module provides a scripted requester, JSON fixture builders and an
//! event recorder shared by the contract tests.

#![allow(dead_code)]

use photofeed_core::api::Endpoints;
use photofeed_core::error::{Error, Result};
use photofeed_core::{
    ChangeBus, EventKind, FeedCache, FeedEvent, HttpRequest, HttpRequester, HttpResponse,
};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, oneshot};

pub const BASE_URL: &str = "https://api.unsplash.com";
pub const TOKEN: &str = "test-token";

/// One scripted reply, optionally held back until released
struct Step {
    outcome: Result<HttpResponse>,
    gate: Option<oneshot::Receiver<()>>,
}

/// A requester that replays scripted outcomes in order and records requests
pub struct ScriptedRequester {
    script: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<HttpRequest>>,
    call_count: AtomicUsize,
    called: Notify,
}

impl ScriptedRequester {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
            called: Notify::new(),
        })
    }

    /// Queue an outcome that is returned immediately
    pub fn push(&self, outcome: Result<HttpResponse>) {
        self.script.lock().unwrap().push_back(Step {
            outcome,
            gate: None,
        });
    }

    /// Queue an outcome that is returned once the sender fires (or is dropped)
    pub fn push_gated(&self, outcome: Result<HttpResponse>) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.script.lock().unwrap().push_back(Step {
            outcome,
            gate: Some(rx),
        });
        tx
    }

    /// Number of times send() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// URLs of every request received so far
    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }

    /// Wait until send() has been called at least `n` times
    pub async fn wait_for_calls(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let notified = self.called.notified();
                if self.call_count() >= n {
                    return;
                }
                notified.await;
            }
        })
        .await
        .expect("requester was not called in time");
    }
}

#[async_trait::async_trait]
impl HttpRequester for ScriptedRequester {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request);
        let step = self.script.lock().unwrap().pop_front();
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.called.notify_waiters();

        let Some(step) = step else {
            return Err(Error::transport("no scripted response left"));
        };

        if let Some(gate) = step.gate {
            let _ = gate.await;
        }
        step.outcome
    }
}

/// Collects every event of one kind published on a bus
#[derive(Clone)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<FeedEvent>>>,
}

impl EventRecorder {
    pub fn attach(bus: &ChangeBus, kind: EventKind) -> Self {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        bus.subscribe(kind, move |event| sink.lock().unwrap().push(event.clone()));
        Self { events }
    }

    pub fn events(&self) -> Vec<FeedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

/// A feed cache backed by the given requester, plus its bus
pub fn feed_with(requester: &Arc<ScriptedRequester>) -> (Arc<FeedCache>, ChangeBus) {
    let bus = ChangeBus::new();
    let transport: Arc<dyn HttpRequester> = requester.clone();
    let endpoints = Endpoints::new(BASE_URL).expect("valid base url");
    (Arc::new(FeedCache::new(transport, endpoints, bus.clone())), bus)
}

/// JSON for one photo as the API returns it
pub fn photo_json(id: &str, liked: bool) -> Value {
    json!({
        "id": id,
        "created_at": "2024-03-12T10:00:00Z",
        "width": 4000,
        "height": 3000,
        "description": format!("photo {}", id),
        "liked_by_user": liked,
        "urls": {
            "raw": format!("https://images.example/{}/raw", id),
            "full": format!("https://images.example/{}/full", id),
            "regular": format!("https://images.example/{}/regular", id),
            "small": format!("https://images.example/{}/small", id),
            "thumb": format!("https://images.example/{}/thumb", id),
        }
    })
}

/// 200 response with one page of unliked photos
pub fn page(ids: &[&str]) -> Result<HttpResponse> {
    let photos: Vec<Value> = ids.iter().map(|id| photo_json(id, false)).collect();
    Ok(HttpResponse::new(200, Value::Array(photos).to_string()))
}

/// Ids `"{prefix}-0"` .. `"{prefix}-{n-1}"`
pub fn ids(prefix: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{}-{}", prefix, i)).collect()
}

/// 200 response with one page of photos named by `ids()`
pub fn full_page(prefix: &str, n: usize) -> Result<HttpResponse> {
    let names = ids(prefix, n);
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    page(&refs)
}

/// Like-toggle response body
pub fn like_response(liked: bool) -> Result<HttpResponse> {
    let body = json!({
        "photo": { "id": "ignored", "liked_by_user": liked },
        "user": { "username": "someone" }
    });
    Ok(HttpResponse::new(201, body.to_string()))
}

/// Response with an arbitrary status and empty JSON body
pub fn status(code: u16) -> Result<HttpResponse> {
    Ok(HttpResponse::new(code, "{}"))
}

/// Ids of the given entries, in order
pub fn id_list(entries: &[photofeed_core::PhotoEntry]) -> Vec<String> {
    entries.iter().map(|e| e.id.clone()).collect()
}
