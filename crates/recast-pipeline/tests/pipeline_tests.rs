// SPDX-FileCopyrightText: 2026 Recast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests of the pipeline wired through `RecastContext`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::json;

use recast_config::RecastConfig;
use recast_core::{QueuedMessage, Request, ResponseStatus};
use recast_pipeline::{DropHook, RecastContext, RetryOutcome};
use recast_storage::{MemoryStore, SqliteStore};
use recast_test_utils::{FlakyStore, MockFetcher, RecordingContainer};

fn request(action: &str, payload: serde_json::Value) -> Request {
    Request {
        action: action.into(),
        payload: Some(payload),
        request_id: None,
        source: "test".into(),
    }
}

#[tokio::test]
async fn state_survives_restart_on_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("recast.db");
    let path = path.to_str().unwrap();

    let fetcher = Arc::new(MockFetcher::new());
    fetcher
        .insert("m1", r#"<p>Set</p><img src="a.jpg"><video><source src="b.mp4"></video>"#)
        .await;

    {
        let store = Arc::new(SqliteStore::open(path).await.unwrap());
        let ctx = RecastContext::initialize(RecastConfig::default(), store, fetcher.clone(), None)
            .await
            .unwrap();

        ctx.exclusions()
            .update_list("m1", &["fan-1".to_string(), "fan-2".to_string()])
            .await;
        assert_eq!(ctx.media().get_media_elements("m1").await.unwrap().len(), 2);
        assert!(ctx.queue().enqueue(QueuedMessage::new("job-1", json!({"to": "fan-3"}))).await);

        ctx.shutdown().await.unwrap();
    }

    let store = Arc::new(SqliteStore::open(path).await.unwrap());
    let ctx = RecastContext::initialize(RecastConfig::default(), store, fetcher.clone(), None)
        .await
        .unwrap();

    assert_eq!(ctx.exclusions().get_or_create_list("m1").await, vec!["fan-1", "fan-2"]);
    assert_eq!(ctx.queue().peek().await.unwrap().id, "job-1");
    assert_eq!(ctx.media().get_media_elements("m1").await.unwrap()[1].src, "b.mp4");
    assert_eq!(fetcher.fetch_count(), 1, "media should come from the persisted cache");
}

#[tokio::test]
async fn unavailable_store_degrades_every_manager() {
    let store = Arc::new(FlakyStore::unavailable());
    let ctx = RecastContext::initialize(
        RecastConfig::default(),
        store.clone(),
        Arc::new(MockFetcher::new()),
        None,
    )
    .await
    .unwrap();

    assert!(!ctx.exclusions().is_persistent());
    ctx.exclusions().update_list("m1", &["a".to_string()]).await;
    assert!(ctx.queue().enqueue(QueuedMessage::new("j", json!(null))).await);
    ctx.shutdown().await.unwrap();

    assert_eq!(store.read_count(), 0);
    assert_eq!(store.write_count(), 0);
    assert_eq!(store.close_count(), 0);
}

#[tokio::test]
async fn shutdown_closes_the_store() {
    let store = Arc::new(FlakyStore::new());
    let ctx = RecastContext::initialize(
        RecastConfig::default(),
        store.clone(),
        Arc::new(MockFetcher::new()),
        None,
    )
    .await
    .unwrap();

    ctx.shutdown().await.unwrap();
    assert_eq!(store.close_count(), 1);
}

#[tokio::test]
async fn recycle_then_deliver_with_retries() {
    let drops = Arc::new(AtomicUsize::new(0));
    let counter = drops.clone();
    let hook: DropHook = Arc::new(move |_: &QueuedMessage| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let mut config = RecastConfig::default();
    config.queue.retry_limit = 1;
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.insert("m1", r#"{"media":[{"type":"image","src":"a.jpg"},{"type":"image"}]}"#).await;
    let ctx = RecastContext::initialize(config, Arc::new(MemoryStore::new()), fetcher, Some(hook))
        .await
        .unwrap();

    let resp = ctx
        .handler()
        .dispatch(request("updateExclusionList", json!({"messageId": "m1", "buyers": ["bob"]})))
        .await;
    assert_eq!(resp.status, ResponseStatus::Success);

    let resp = ctx
        .handler()
        .dispatch(request(
            "initiateRecycle",
            json!({"messageId": "m1", "text": "Back in stock", "candidates": ["amy", "bob"]}),
        ))
        .await;
    assert_eq!(resp.status, ResponseStatus::Success);
    assert_eq!(resp.data.unwrap()["job"]["recipients"], json!(["amy"]));

    let container = RecordingContainer::new();
    let results = ctx.media().insert_media_into_new_message("m1", &container).await;
    assert_eq!(results.len(), 2);
    assert!(results[0].is_success());
    assert!(!results[1].is_success());
    assert_eq!(container.children().await.len(), 1);

    let job = ctx.queue().dequeue().await.unwrap();
    assert_eq!(ctx.queue().handle_retry(job).await, RetryOutcome::Requeued { retry_count: 1 });
    let job = ctx.queue().dequeue().await.unwrap();
    assert_eq!(ctx.queue().handle_retry(job).await, RetryOutcome::Dropped);
    assert_eq!(ctx.queue().size().await, 0);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn dispatch_batch_round_trip() {
    let ctx = RecastContext::initialize(
        RecastConfig::default(),
        Arc::new(MemoryStore::new()),
        Arc::new(MockFetcher::new()),
        None,
    )
    .await
    .unwrap();

    let raw = r#"{"action":"processBatch","payload":{"messages":["Hello, World!","<img src=\"x.jpg\">"]},"requestId":"r7","source":"cli"}"#;
    let req: Request = serde_json::from_str(raw).unwrap();
    let resp = ctx.handler().dispatch(req).await;

    let value = serde_json::to_value(&resp).unwrap();
    assert_eq!(value["status"], "success");
    assert_eq!(value["requestId"], "r7");
    assert_eq!(value["data"][0]["tokens"], json!(["hello", "world"]));
    assert_eq!(value["data"][1]["mediaAnalysis"]["images"], 1);
}
