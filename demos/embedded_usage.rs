//! Minimal embedding example for photofeed-core
//!
//! Drives a feed session against an in-memory photo catalogue instead of the
//! network. Shows how an application supplies its own transport and token
//! source, and how it observes the feed through the change bus.

use anyhow::Result;
use photofeed_core::{
    EventKind, FeedEvent, FeedSession, HttpRequest, HttpRequester, HttpResponse, Method,
    PhotoFeedConfig, StaticTokenProvider,
};
use serde_json::json;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_stream::StreamExt;

/// In-memory stand-in for the photo API
struct InMemoryApi {
    pages: Vec<Vec<&'static str>>,
    liked: Mutex<HashSet<String>>,
    calls: AtomicUsize,
}

impl InMemoryApi {
    fn new(pages: Vec<Vec<&'static str>>) -> Self {
        Self {
            pages,
            liked: Mutex::new(HashSet::new()),
            calls: AtomicUsize::new(0),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn photos_page(&self, page: usize) -> serde_json::Value {
        let liked = self.liked.lock().unwrap_or_else(|e| e.into_inner());
        let ids = page
            .checked_sub(1)
            .and_then(|index| self.pages.get(index))
            .cloned()
            .unwrap_or_default();

        ids.into_iter()
            .map(|id| {
                json!({
                    "id": id,
                    "created_at": "2024-05-01T12:00:00Z",
                    "description": format!("photo {}", id),
                    "width": 4000,
                    "height": 3000,
                    "liked_by_user": liked.contains(id),
                    "urls": {
                        "thumb": format!("https://img.example/{}/thumb.jpg", id),
                        "full": format!("https://img.example/{}/full.jpg", id),
                    }
                })
            })
            .collect()
    }
}

/// Extract the `page` query parameter from a request URL
fn page_param(url: &str) -> usize {
    url.split(['?', '&'])
        .find_map(|pair| pair.strip_prefix("page="))
        .and_then(|value| value.parse().ok())
        .unwrap_or(1)
}

#[async_trait::async_trait]
impl HttpRequester for InMemoryApi {
    async fn send(&self, request: HttpRequest) -> photofeed_core::Result<HttpResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let path = request.url.split('?').next().unwrap_or_default();
        let body = match (request.method, path.rsplit('/').next()) {
            (Method::Get, Some("me")) => json!({
                "username": "demo",
                "first_name": "Demo",
                "last_name": "User",
                "bio": "Embedded photographer",
            }),
            (Method::Get, Some("photos")) => self.photos_page(page_param(&request.url)),
            (method, Some("like")) => {
                let id = path.rsplit('/').nth(1).unwrap_or_default().to_string();
                let mut liked = self.liked.lock().unwrap_or_else(|e| e.into_inner());
                let now_liked = method == Method::Post;
                if now_liked {
                    liked.insert(id);
                } else {
                    liked.remove(&id);
                }
                json!({ "photo": { "liked_by_user": now_liked } })
            }
            _ => return Ok(HttpResponse::new(404, b"{}".to_vec())),
        };

        Ok(HttpResponse::new(200, serde_json::to_vec(&body)?))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== photofeed-core embedded usage ===\n");

    let api = Arc::new(InMemoryApi::new(vec![
        vec!["alpine", "harbor", "dunes"],
        vec!["forest", "harbor", "glacier"],
    ]));
    let session = FeedSession::new(
        &PhotoFeedConfig::new().with_base_url("https://photos.internal"),
        api.clone(),
        Arc::new(StaticTokenProvider::new("embedded-token")),
    )?;

    // Step 1: observe the bus
    println!("1. Subscribing to feed events");
    session.bus().subscribe(EventKind::PageAppended, |event| {
        if let FeedEvent::PageAppended { new_items } = event {
            let ids: Vec<&str> = new_items.iter().map(|p| p.id.as_str()).collect();
            println!("   page appended: {:?}", ids);
        }
    });
    let mut likes = session.bus().watch(EventKind::LikeToggled);
    let like_listener = tokio::spawn(async move {
        while let Some(FeedEvent::LikeToggled { photo_id, is_liked }) = likes.next().await {
            println!("   like toggled: {} -> {}", photo_id, is_liked);
        }
    });

    // Step 2: profile
    println!("\n2. Fetching profile");
    let profile = session.fetch_profile().await?;
    println!("   {} ({})", profile.name, profile.login_name);

    // Step 3: pages; "harbor" repeats on page 2 and is skipped
    println!("\n3. Loading two pages");
    session.load_next_page().await?;
    session.load_next_page().await?;
    println!("   {} photos cached", session.feed().len());

    // Step 4: like and unlike
    println!("\n4. Toggling likes");
    session.toggle_like("dunes", false).await?;
    session.toggle_like("dunes", true).await?;
    session.toggle_like("glacier", false).await?;

    // Step 5: sign out drops everything
    println!("\n5. Signing out");
    session.sign_out();
    println!(
        "   feed empty: {}, profile cleared: {}",
        session.feed().is_empty(),
        session.profile().profile().is_none()
    );

    drop(session);
    like_listener.await?;
    println!("\nRequests served: {}", api.call_count());
    Ok(())
}
