//! Contract Test: Single-Flight Page Loading
//!
//! This test verifies that at most one page request is outstanding at a time
//! and that every page number is requested at most once.
//!
//! Constraints verified:
//! - Calls made while a fetch is outstanding send nothing
//! - Failures clear the in-flight marker so the next call can proceed
//! - Dropping a pending call clears the marker too
//! - A failed page is consumed; the next call requests the following page
//! - Failures leave the collection untouched

mod common;

use common::*;
use photofeed_core::error::{Error, ErrorKind};
use photofeed_core::{EventKind, PageLoad};
use std::time::Duration;
use tokio_test::{assert_pending, assert_ready};

#[tokio::test]
async fn calls_during_a_fetch_send_no_request() {
    let requester = ScriptedRequester::new();
    let release = requester.push_gated(page(&["a", "b"]));
    let (feed, _bus) = feed_with(&requester);

    let mut first = tokio_test::task::spawn(feed.load_next_page(TOKEN));
    assert_pending!(first.poll());
    assert_eq!(requester.call_count(), 1);
    assert!(feed.is_fetching());

    // Every further call is a no-op while the first is outstanding
    for _ in 0..5 {
        let outcome = feed.load_next_page(TOKEN).await.expect("no-op is not an error");
        assert_eq!(outcome, PageLoad::InFlight);
    }
    assert_eq!(requester.call_count(), 1, "only one request may be sent");
    assert_eq!(feed.last_loaded_page(), Some(1));

    release.send(()).unwrap();
    assert!(first.is_woken());
    let outcome = assert_ready!(first.poll()).expect("first load succeeds");

    assert_eq!(outcome.items().map(id_list), Some(vec!["a".to_string(), "b".to_string()]));
    assert!(!feed.is_fetching());
}

#[tokio::test]
async fn concurrent_tasks_share_one_request() {
    let requester = ScriptedRequester::new();
    let release = requester.push_gated(page(&["a"]));
    let (feed, _bus) = feed_with(&requester);

    let leader = {
        let feed = feed.clone();
        tokio::spawn(async move { feed.load_next_page(TOKEN).await })
    };
    requester.wait_for_calls(1).await;

    let followers: Vec<_> = (0..4)
        .map(|_| {
            let feed = feed.clone();
            tokio::spawn(async move { feed.load_next_page(TOKEN).await })
        })
        .collect();

    for follower in followers {
        assert_eq!(follower.await.unwrap().unwrap(), PageLoad::InFlight);
    }

    release.send(()).unwrap();
    let outcome = leader.await.unwrap().unwrap();
    assert!(matches!(outcome, PageLoad::Appended(ref items) if items.len() == 1));
    assert_eq!(requester.call_count(), 1);
}

#[tokio::test]
async fn server_error_clears_in_flight_and_keeps_items() {
    let requester = ScriptedRequester::new();
    requester.push(page(&["a"]));
    requester.push(status(500));
    requester.push(page(&["c"]));
    let (feed, bus) = feed_with(&requester);
    let appended = EventRecorder::attach(&bus, EventKind::PageAppended);

    feed.load_next_page(TOKEN).await.unwrap();
    let before = feed.items();

    let err = feed.load_next_page(TOKEN).await.unwrap_err();
    assert_eq!(err, Error::Response { status: 500 });
    assert_eq!(feed.items(), before);
    assert!(!feed.is_fetching(), "in-flight marker must be cleared after failure");
    assert_eq!(appended.len(), 1);

    // A subsequent call is allowed to proceed
    let outcome = feed.load_next_page(TOKEN).await.unwrap();
    assert_eq!(outcome.items().map(id_list), Some(vec!["a".to_string(), "c".to_string()]));
    assert_eq!(requester.call_count(), 3);
}

#[tokio::test]
async fn failed_page_is_not_requested_again() {
    let requester = ScriptedRequester::new();
    requester.push(Err(Error::transport("connection reset")));
    requester.push(page(&["x"]));
    let (feed, _bus) = feed_with(&requester);

    let err = feed.load_next_page(TOKEN).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(err.is_retryable());
    assert_eq!(feed.last_loaded_page(), Some(1));

    feed.load_next_page(TOKEN).await.unwrap();
    assert_eq!(feed.last_loaded_page(), Some(2));

    let urls = requester.urls();
    assert!(urls[0].contains("page=1&"));
    assert!(urls[1].contains("page=2&"), "page 1 must not be retried: {:?}", urls);
}

#[tokio::test]
async fn malformed_page_appends_nothing() {
    let requester = ScriptedRequester::new();
    // Second element is missing its urls object
    let body = serde_json::json!([
        photo_json("a", false),
        { "id": "b", "width": 1, "height": 1, "liked_by_user": false }
    ]);
    requester.push(Ok(photofeed_core::HttpResponse::new(200, body.to_string())));
    let (feed, bus) = feed_with(&requester);
    let appended = EventRecorder::attach(&bus, EventKind::PageAppended);

    let err = feed.load_next_page(TOKEN).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Data);
    assert!(feed.is_empty(), "no partial append");
    assert!(!feed.is_fetching());
    assert_eq!(appended.len(), 0);
}

#[tokio::test]
async fn page_request_shape() {
    let requester = ScriptedRequester::new();
    requester.push(page(&[]));
    let (feed, _bus) = feed_with(&requester);

    feed.load_next_page(TOKEN).await.unwrap();

    let request = &requester.requests()[0];
    assert_eq!(request.method, photofeed_core::Method::Get);
    assert_eq!(
        request.url,
        "https://api.unsplash.com/photos?page=1&per_page=10&order_by=latest"
    );
    assert_eq!(request.header("Authorization"), Some("Bearer test-token"));
}

#[tokio::test]
async fn abandoned_load_releases_in_flight() {
    let requester = ScriptedRequester::new();
    let _held = requester.push_gated(page(&["a"]));
    requester.push(page(&["b"]));
    let (feed, _bus) = feed_with(&requester);

    let outcome = tokio::time::timeout(Duration::from_millis(50), feed.load_next_page(TOKEN)).await;
    assert!(outcome.is_err(), "gated load must still be pending");
    assert!(!feed.is_fetching(), "dropping the call releases the marker");

    let outcome = feed.load_next_page(TOKEN).await.unwrap();
    assert_eq!(outcome.items().map(id_list), Some(vec!["b".to_string()]));
    assert_eq!(requester.call_count(), 2);
    assert!(requester.urls()[1].contains("page=2&"));
}
