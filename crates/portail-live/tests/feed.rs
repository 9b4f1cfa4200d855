//! Feed behaviour against the in-memory store.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::sync::broadcast;
use tokio::time::timeout;

use portail_core::error::{IndexError, StoreError};
use portail_core::{
    Collection, Document, DocumentRef, Error, Event, EventFilter, News, QueryDescriptor, RawEntry,
    Store,
};
use portail_live::{DecodePolicy, Diagnostic, Feed, FeedConfig, FeedEvent, RenderState};
use portail_memory::MemoryStore;

const WAIT: Duration = Duration::from_secs(2);

fn event_raw(title: &str, start: DateTime<Utc>) -> RawEntry {
    json!({
        "title": title,
        "body": format!("{} body", title),
        "startDate": start.to_rfc3339(),
        "endDate": (start + chrono::Duration::hours(2)).to_rfc3339(),
    })
    .as_object()
    .cloned()
    .unwrap()
}

fn news_raw(value: serde_json::Value) -> RawEntry {
    value.as_object().cloned().unwrap()
}

fn doc(path: &str) -> DocumentRef {
    DocumentRef::new(path).unwrap()
}

async fn next_event(rx: &mut broadcast::Receiver<FeedEvent>) -> FeedEvent {
    timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for a feed event")
        .expect("feed event channel closed")
}

async fn next_render(rx: &mut broadcast::Receiver<FeedEvent>) -> RenderState {
    loop {
        if let FeedEvent::Rendered(state) = next_event(rx).await {
            return state;
        }
    }
}

async fn next_diagnostic(rx: &mut broadcast::Receiver<FeedEvent>) -> Diagnostic {
    loop {
        if let FeedEvent::Diagnostic(diagnostic) = next_event(rx).await {
            return diagnostic;
        }
    }
}

async fn wait_for_listeners(store: &MemoryStore, expected: usize) {
    timeout(WAIT, async {
        while store.listener_count() != expected {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("listener count did not settle");
}

fn ids<D: Document>(feed: &Feed<MemoryStore, D>) -> Vec<String> {
    feed.current_projection()
        .iter()
        .map(|entry| entry.origin.id().to_string())
        .collect()
}

#[tokio::test]
async fn switching_filters_rebinds_and_drops_stale_results() {
    let store = Arc::new(MemoryStore::new());
    let now = Utc::now();
    store.put(&doc("events/a"), event_raw("a", now + chrono::Duration::hours(1)));

    let feed: Feed<MemoryStore, Event> = Feed::new(store.clone(), FeedConfig::default());
    let mut rx = feed.subscribe();

    feed.request_bind(QueryDescriptor::upcoming(now)).unwrap();
    let render = next_render(&mut rx).await;
    assert_eq!(render.len, 1);
    assert!(!render.is_empty);
    assert_eq!(ids(&feed), vec!["a"]);
    assert!(!feed.is_empty());

    feed.request_bind(QueryDescriptor::past(now)).unwrap();
    let render = next_render(&mut rx).await;
    assert!(render.is_empty);
    assert!(feed.is_empty());

    // The upcoming listener is gone: a change it would have reported does
    // not reach the projection.
    wait_for_listeners(&store, 1).await;
    store.put(&doc("events/a"), event_raw("a (moved)", now + chrono::Duration::hours(2)));
    let render = next_render(&mut rx).await;
    assert!(render.is_empty);
    assert!(feed.is_empty());
}

#[tokio::test]
async fn binding_an_equal_query_twice_keeps_one_listener() {
    let store = Arc::new(MemoryStore::new());
    let now = Utc::now();
    store.put(&doc("events/a"), event_raw("a", now + chrono::Duration::hours(1)));

    let feed: Feed<MemoryStore, Event> = Feed::new(store.clone(), FeedConfig::default());
    let mut rx = feed.subscribe();

    feed.request_bind(QueryDescriptor::upcoming(now)).unwrap();
    next_render(&mut rx).await;
    let once = feed.current_projection();

    feed.request_bind(QueryDescriptor::upcoming(now)).unwrap();
    assert_eq!(feed.current_projection(), once);
    assert_eq!(feed.manager().revision(), 1);
    assert_eq!(store.listener_count(), 1);
}

#[tokio::test]
async fn projection_follows_store_order() {
    let store = Arc::new(MemoryStore::new());
    let now = Utc::now();
    store.put(&doc("events/z"), event_raw("z", now + chrono::Duration::hours(1)));
    store.put(&doc("events/m"), event_raw("m", now + chrono::Duration::hours(3)));
    store.put(&doc("events/a"), event_raw("a", now + chrono::Duration::hours(2)));

    let feed: Feed<MemoryStore, Event> = Feed::new(store.clone(), FeedConfig::default());
    let mut rx = feed.subscribe();
    feed.request_bind(QueryDescriptor::upcoming(now)).unwrap();

    let render = next_render(&mut rx).await;
    assert_eq!(render.len, 3);
    assert_eq!(ids(&feed), vec!["z", "a", "m"]);

    let first = &feed.current_projection()[0];
    assert_eq!(first.record.title(), "z");
    assert_eq!(first.record.id(), Some(first.origin.id()));
}

#[tokio::test]
async fn authoritative_snapshot_wins_over_local_removal() {
    let store = Arc::new(MemoryStore::new());
    store.put(&doc("news/a"), news_raw(json!({ "title": "A" })));
    store.put(&doc("news/b"), news_raw(json!({ "title": "B" })));

    let feed: Feed<MemoryStore, News> = Feed::new(store.clone(), FeedConfig::default());
    let mut rx = feed.subscribe();
    feed.request_bind_all().unwrap();
    next_render(&mut rx).await;

    // Remove locally without telling the store, then let it push again.
    let origin = feed.manager().remove_at(0).unwrap();
    assert_eq!(origin, doc("news/a"));
    assert_eq!(ids(&feed), vec!["b"]);

    store.put(&doc("news/c"), news_raw(json!({ "title": "C" })));
    let render = next_render(&mut rx).await;
    assert_eq!(render.len, 3);
    assert_eq!(ids(&feed), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn local_delete_removes_then_store_confirms() {
    let store = Arc::new(MemoryStore::new());
    store.put(&doc("news/a"), news_raw(json!({ "title": "A" })));
    store.put(&doc("news/b"), news_raw(json!({ "title": "B" })));

    let feed: Feed<MemoryStore, News> = Feed::new(store.clone(), FeedConfig::default());
    let mut rx = feed.subscribe();
    feed.request_bind_all().unwrap();
    next_render(&mut rx).await;

    let origin = feed.request_local_delete(1).await.unwrap();
    assert_eq!(origin, doc("news/b"));
    assert_eq!(ids(&feed), vec!["a"]);

    match next_event(&mut rx).await {
        FeedEvent::Removed { index, origin } => {
            assert_eq!(index, 1);
            assert_eq!(origin, doc("news/b"));
        }
        other => panic!("expected a removal, got {:?}", other),
    }

    let render = next_render(&mut rx).await;
    assert_eq!(render.len, 1);
    assert_eq!(ids(&feed), vec!["a"]);
    assert!(store.get(&doc("news/b")).await.is_err());
}

#[tokio::test]
async fn failed_delete_is_reported_without_rollback() {
    let store = Arc::new(MemoryStore::new());
    store.put(&doc("news/a"), news_raw(json!({ "title": "A" })));

    let feed: Feed<MemoryStore, News> = Feed::new(store.clone(), FeedConfig::default());
    let mut rx = feed.subscribe();
    feed.request_bind_all().unwrap();
    next_render(&mut rx).await;

    store.fail_writes("network unreachable");
    let err = feed.request_local_delete(0).await.unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::Unavailable { .. })));
    assert!(feed.is_empty());

    match next_diagnostic(&mut rx).await {
        Diagnostic::Store { origin, message } => {
            assert_eq!(origin, doc("news/a"));
            assert!(message.contains("network unreachable"));
        }
        other => panic!("expected a store diagnostic, got {:?}", other),
    }
}

#[tokio::test]
async fn out_of_range_delete_is_an_index_error() {
    let store = Arc::new(MemoryStore::new());
    let feed: Feed<MemoryStore, News> = Feed::new(store, FeedConfig::default());

    let err = feed.request_local_delete(0).await.unwrap_err();
    assert!(matches!(err, Error::Index(IndexError { index: 0, len: 0 })));
}

#[tokio::test]
async fn undecodable_entries_are_skipped_and_reported() {
    let store = Arc::new(MemoryStore::new());
    store.put(&doc("news/bad"), news_raw(json!({ "title": "", "body": "x" })));
    store.put(&doc("news/good"), news_raw(json!({ "title": "T" })));

    let feed: Feed<MemoryStore, News> = Feed::new(store.clone(), FeedConfig::default());
    let mut rx = feed.subscribe();
    feed.request_bind_all().unwrap();

    match next_diagnostic(&mut rx).await {
        Diagnostic::Decode { origin, error } => {
            assert_eq!(origin, doc("news/bad"));
            assert!(error.reason.contains("title"));
        }
        other => panic!("expected a decode diagnostic, got {:?}", other),
    }

    let render = next_render(&mut rx).await;
    assert_eq!(render.len, 1);
    assert_eq!(ids(&feed), vec!["good"]);
    assert_eq!(
        feed.current_projection()[0].record.body(),
        portail_core::record::DEFAULT_BODY
    );
}

#[tokio::test]
async fn reject_policy_keeps_previous_projection() {
    let store = Arc::new(MemoryStore::new());
    store.put(&doc("news/good"), news_raw(json!({ "title": "T" })));

    let config = FeedConfig {
        decode_policy: DecodePolicy::Reject,
        ..FeedConfig::default()
    };
    let feed: Feed<MemoryStore, News> = Feed::new(store.clone(), config);
    let mut rx = feed.subscribe();
    feed.request_bind_all().unwrap();
    next_render(&mut rx).await;

    store.put(&doc("news/bad"), news_raw(json!({ "title": 7 })));
    assert!(matches!(
        next_diagnostic(&mut rx).await,
        Diagnostic::Decode { .. }
    ));
    assert_eq!(ids(&feed), vec!["good"]);
    assert_eq!(feed.manager().revision(), 1);
}

#[tokio::test]
async fn listener_failure_unbinds() {
    let store = Arc::new(MemoryStore::new());
    let feed: Feed<MemoryStore, News> = Feed::new(store.clone(), FeedConfig::default());
    let mut rx = feed.subscribe();
    feed.request_bind_all().unwrap();
    next_render(&mut rx).await;

    store.fail_listeners("permission denied");
    assert!(matches!(
        next_diagnostic(&mut rx).await,
        Diagnostic::Subscription(_)
    ));
    assert_eq!(next_event(&mut rx).await, FeedEvent::Unbound);
    assert!(!feed.manager().is_bound());

    // No auto-retry: later writes are not observed.
    store.put(&doc("news/a"), news_raw(json!({ "title": "A" })));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(feed.is_empty());

    // A new bind recovers.
    feed.request_bind_all().unwrap();
    let render = next_render(&mut rx).await;
    assert_eq!(render.len, 1);
}

#[tokio::test]
async fn stop_releases_listener_and_freezes_projection() {
    let store = Arc::new(MemoryStore::new());
    store.put(&doc("news/a"), news_raw(json!({ "title": "A" })));

    let feed: Feed<MemoryStore, News> = Feed::new(store.clone(), FeedConfig::default());
    let mut rx = feed.subscribe();
    feed.request_bind_all().unwrap();
    next_render(&mut rx).await;

    feed.request_stop();
    feed.request_stop();
    assert!(!feed.manager().is_bound());
    wait_for_listeners(&store, 0).await;

    store.put(&doc("news/b"), news_raw(json!({ "title": "B" })));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(ids(&feed), vec!["a"]);
}

#[tokio::test]
async fn dropping_the_feed_releases_listener() {
    let store = Arc::new(MemoryStore::new());
    let feed: Feed<MemoryStore, News> = Feed::new(store.clone(), FeedConfig::default());
    feed.request_bind_all().unwrap();
    assert!(feed.manager().is_bound());

    drop(feed);
    wait_for_listeners(&store, 0).await;
}

#[tokio::test]
async fn snapshot_handlers_see_every_delivered_snapshot() {
    let store = Arc::new(MemoryStore::new());
    let feed: Feed<MemoryStore, News> = Feed::new(store.clone(), FeedConfig::default());
    let mut rx = feed.subscribe();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    feed.on_snapshot(move |snapshot| sink.lock().unwrap().push(snapshot.len()));

    feed.request_bind_all().unwrap();
    next_render(&mut rx).await;
    store.put(&doc("news/a"), news_raw(json!({ "title": "A" })));
    next_render(&mut rx).await;

    assert_eq!(*seen.lock().unwrap(), vec![0, 1]);
}

#[tokio::test]
async fn snapshot_handlers_run_for_rejected_snapshots() {
    let store = Arc::new(MemoryStore::new());
    let config = FeedConfig {
        decode_policy: DecodePolicy::Reject,
        ..FeedConfig::default()
    };
    let feed: Feed<MemoryStore, News> = Feed::new(store.clone(), config);
    let mut rx = feed.subscribe();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    feed.on_snapshot(move |snapshot| sink.lock().unwrap().push(snapshot.len()));

    feed.request_bind_all().unwrap();
    next_render(&mut rx).await;

    store.put(&doc("news/bad"), news_raw(json!({ "body": "no title" })));
    next_diagnostic(&mut rx).await;

    assert_eq!(*seen.lock().unwrap(), vec![0, 1]);
    assert!(feed.is_empty());
    assert_eq!(feed.manager().revision(), 1);
}

#[tokio::test]
async fn publish_and_update_round_trip_through_snapshots() {
    let store = Arc::new(MemoryStore::new());
    let feed: Feed<MemoryStore, News> = Feed::new(store.clone(), FeedConfig::default());
    let mut rx = feed.subscribe();
    feed.request_bind_all().unwrap();
    next_render(&mut rx).await;

    let draft = News::new("Portes ouvertes", None).unwrap();
    let origin = feed.publish(&draft).await.unwrap();
    assert_eq!(origin.collection(), &Collection::news());

    next_render(&mut rx).await;
    let stored = feed.current_projection()[0].record.clone();
    assert_eq!(stored.id(), Some(origin.id()));
    assert_eq!(stored.title(), draft.title());

    let edited = News::new("Portes ouvertes (samedi)", Some("Gymnase".to_string())).unwrap();
    feed.request_update(0, &edited).await.unwrap();
    next_render(&mut rx).await;

    let stored = &feed.current_projection()[0].record;
    assert_eq!(stored.title(), "Portes ouvertes (samedi)");
    assert_eq!(stored.body(), "Gymnase");
}

#[tokio::test]
async fn event_filter_selection_binds_relative_to_now() {
    let store = Arc::new(MemoryStore::new());
    let now = Utc::now();
    store.put(&doc("events/next"), event_raw("next", now + chrono::Duration::days(3)));
    store.put(&doc("events/soon"), event_raw("soon", now + chrono::Duration::days(1)));
    store.put(&doc("events/done"), event_raw("done", now - chrono::Duration::days(1)));

    let feed: Feed<MemoryStore, Event> = Feed::new(store.clone(), FeedConfig::default());
    let mut rx = feed.subscribe();

    feed.select(EventFilter::default()).unwrap();
    next_render(&mut rx).await;
    assert_eq!(ids(&feed), vec!["soon", "next"]);

    feed.select(EventFilter::Past).unwrap();
    next_render(&mut rx).await;
    assert_eq!(ids(&feed), vec!["done"]);
    assert_eq!(
        feed.manager().query().map(|q| q.collection().clone()),
        Some(Collection::events())
    );
}
