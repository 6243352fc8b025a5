// SPDX-FileCopyrightText: 2026 Recast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded-retry FIFO queue of outbound message jobs.
//!
//! Every mutation snapshots the whole queue to the store under one key. A
//! failed snapshot is logged and never rolls back the in-memory change.
//! Retried messages go back to the front; a message whose retry count
//! exceeds the limit is dropped and reported through the [`DropHook`].

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use recast_config::model::QueueConfig;
use recast_core::{KeyValueStore, QueuedMessage, RecastError};

/// Called once for every message dropped after exhausting its retries.
pub type DropHook = Arc<dyn Fn(&QueuedMessage) + Send + Sync>;

/// What [`MessageQueue::handle_retry`] did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RetryOutcome {
    /// Back at the head of the queue with the new count.
    Requeued { retry_count: u32 },
    /// Removed for good.
    Dropped,
}

pub struct MessageQueue {
    entries: Mutex<VecDeque<QueuedMessage>>,
    store: Option<Arc<dyn KeyValueStore>>,
    storage_key: String,
    retry_limit: u32,
    drop_hook: Option<DropHook>,
}

impl MessageQueue {
    /// An empty queue; call [`restore`](Self::restore) to load persisted jobs.
    pub fn new(store: Option<Arc<dyn KeyValueStore>>, config: &QueueConfig) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            store,
            storage_key: config.storage_key.clone(),
            retry_limit: config.retry_limit,
            drop_hook: None,
        }
    }

    pub fn with_drop_hook(mut self, hook: DropHook) -> Self {
        self.drop_hook = Some(hook);
        self
    }

    pub fn retry_limit(&self) -> u32 {
        self.retry_limit
    }

    /// Replace the in-memory queue with the persisted one.
    ///
    /// Malformed data restores nothing. Duplicate ids keep their first
    /// occurrence. Returns the number of restored messages.
    pub async fn restore(&self) -> usize {
        let Some(store) = &self.store else {
            return 0;
        };
        let raw = match store.get(&[self.storage_key.as_str()]).await {
            Ok(mut found) => found.remove(&self.storage_key),
            Err(e) => {
                error!(key = %self.storage_key, error = %e, "failed to read persisted queue");
                return 0;
            }
        };
        let Some(raw) = raw else {
            return 0;
        };

        let persisted: Vec<QueuedMessage> = match serde_json::from_str(&raw) {
            Ok(messages) => messages,
            Err(e) => {
                warn!(key = %self.storage_key, error = %e, "persisted queue is malformed, starting empty");
                Vec::new()
            }
        };

        let mut seen = HashSet::new();
        let restored: VecDeque<QueuedMessage> = persisted
            .into_iter()
            .filter(|m| seen.insert(m.id.clone()))
            .collect();
        let count = restored.len();
        *self.entries.lock().await = restored;
        info!(count, "message queue restored");
        count
    }

    /// Append `message`. Returns `false` if its id is empty or already queued.
    pub async fn enqueue(&self, message: QueuedMessage) -> bool {
        if message.id.is_empty() {
            warn!("rejected queued message without an id");
            return false;
        }
        let mut entries = self.entries.lock().await;
        if entries.iter().any(|m| m.id == message.id) {
            warn!(message_id = %message.id, "message already queued");
            return false;
        }
        debug!(message_id = %message.id, "message enqueued");
        entries.push_back(message);
        self.persist_best_effort(&entries).await;
        true
    }

    pub async fn peek(&self) -> Option<QueuedMessage> {
        self.entries.lock().await.front().cloned()
    }

    pub async fn dequeue(&self) -> Option<QueuedMessage> {
        let mut entries = self.entries.lock().await;
        let head = entries.pop_front()?;
        self.persist_best_effort(&entries).await;
        Some(head)
    }

    /// Count one failed delivery of `message`.
    ///
    /// Any queued entry with the same id is replaced. Below the limit the
    /// message returns to the head of the queue; past it, it is dropped and
    /// the drop hook runs once.
    pub async fn handle_retry(&self, mut message: QueuedMessage) -> RetryOutcome {
        message.retry_count = message.retry_count.saturating_add(1);

        let mut entries = self.entries.lock().await;
        entries.retain(|m| m.id != message.id);

        if message.retry_count > self.retry_limit {
            self.persist_best_effort(&entries).await;
            drop(entries);
            info!(message_id = %message.id, retries = message.retry_count - 1, "message dropped after exhausting retries");
            if let Some(hook) = &self.drop_hook {
                hook(&message);
            }
            return RetryOutcome::Dropped;
        }

        let retry_count = message.retry_count;
        debug!(message_id = %message.id, retry_count, "message requeued");
        entries.push_front(message);
        self.persist_best_effort(&entries).await;
        RetryOutcome::Requeued { retry_count }
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.lock().await;
        entries.clear();
        self.persist_best_effort(&entries).await;
    }

    pub async fn size(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Queued messages, head first.
    pub async fn snapshot(&self) -> Vec<QueuedMessage> {
        self.entries.lock().await.iter().cloned().collect()
    }

    /// Persist the current queue, returning any store error.
    pub async fn flush(&self) -> Result<(), RecastError> {
        let entries = self.entries.lock().await;
        self.persist(&entries).await
    }

    async fn persist_best_effort(&self, entries: &VecDeque<QueuedMessage>) {
        if let Err(e) = self.persist(entries).await {
            error!(key = %self.storage_key, error = %e, "failed to persist message queue");
        }
    }

    async fn persist(&self, entries: &VecDeque<QueuedMessage>) -> Result<(), RecastError> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let raw = serde_json::to_string(entries)?;
        store
            .set(HashMap::from([(self.storage_key.clone(), raw)]))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recast_test_utils::FlakyStore;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_test::traced_test;

    fn config(retry_limit: u32) -> QueueConfig {
        QueueConfig {
            storage_key: "message_queue".into(),
            retry_limit,
        }
    }

    fn msg(id: &str) -> QueuedMessage {
        QueuedMessage::new(id, json!({"text": id}))
    }

    fn ids(messages: &[QueuedMessage]) -> Vec<&str> {
        messages.iter().map(|m| m.id.as_str()).collect()
    }

    fn counting_hook() -> (DropHook, Arc<AtomicUsize>) {
        let drops = Arc::new(AtomicUsize::new(0));
        let counter = drops.clone();
        let hook: DropHook = Arc::new(move |_: &QueuedMessage| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (hook, drops)
    }

    #[tokio::test]
    async fn fifo_order() {
        let queue = MessageQueue::new(None, &config(3));
        assert!(queue.enqueue(msg("a")).await);
        assert!(queue.enqueue(msg("b")).await);

        assert_eq!(queue.peek().await.unwrap().id, "a");
        assert_eq!(queue.size().await, 2);
        assert_eq!(queue.dequeue().await.unwrap().id, "a");
        assert_eq!(queue.dequeue().await.unwrap().id, "b");
        assert!(queue.dequeue().await.is_none());
        assert!(queue.peek().await.is_none());
    }

    #[tokio::test]
    #[traced_test]
    async fn duplicate_enqueue_is_rejected() {
        let queue = MessageQueue::new(None, &config(3));
        assert!(queue.enqueue(msg("a")).await);
        assert!(!queue.enqueue(msg("a")).await);
        assert_eq!(queue.size().await, 1);
        assert!(logs_contain("already queued"));

        assert!(!queue.enqueue(msg("")).await);
    }

    #[tokio::test]
    async fn retry_below_limit_goes_to_front() {
        let queue = MessageQueue::new(None, &config(3));
        queue.enqueue(msg("a")).await;
        queue.enqueue(msg("b")).await;

        let outcome = queue.handle_retry(msg("b")).await;
        assert_eq!(outcome, RetryOutcome::Requeued { retry_count: 1 });
        assert_eq!(queue.size().await, 2);

        let snapshot = queue.snapshot().await;
        assert_eq!(ids(&snapshot), vec!["b", "a"]);
        assert_eq!(snapshot[0].retry_count, 1);
    }

    #[tokio::test]
    async fn retry_at_limit_drops_once() {
        let (hook, drops) = counting_hook();
        let queue = MessageQueue::new(None, &config(3)).with_drop_hook(hook);
        let mut stale = msg("a");
        stale.retry_count = 3;
        queue.enqueue(stale.clone()).await;
        queue.enqueue(msg("b")).await;

        assert_eq!(queue.handle_retry(stale).await, RetryOutcome::Dropped);
        assert_eq!(queue.size().await, 1);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
        assert_eq!(queue.peek().await.unwrap().id, "b");
    }

    #[tokio::test]
    async fn dequeued_message_can_be_retried_until_dropped() {
        let (hook, drops) = counting_hook();
        let queue = MessageQueue::new(None, &config(2)).with_drop_hook(hook);
        queue.enqueue(msg("a")).await;

        for expected in 1..=2 {
            let head = queue.dequeue().await.unwrap();
            assert_eq!(
                queue.handle_retry(head).await,
                RetryOutcome::Requeued { retry_count: expected }
            );
        }
        let head = queue.dequeue().await.unwrap();
        assert_eq!(queue.handle_retry(head).await, RetryOutcome::Dropped);
        assert_eq!(queue.size().await, 0);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn mutations_are_persisted() {
        let store = Arc::new(FlakyStore::new());
        let queue = MessageQueue::new(Some(store.clone()), &config(3));
        queue.enqueue(msg("a")).await;
        queue.enqueue(msg("b")).await;
        queue.dequeue().await;

        let raw = store.raw("message_queue").await.unwrap();
        let persisted: Vec<QueuedMessage> = serde_json::from_str(&raw).unwrap();
        assert_eq!(ids(&persisted), vec!["b"]);
        assert!(raw.contains("retryCount"));

        queue.clear().await;
        assert_eq!(store.raw("message_queue").await.as_deref(), Some("[]"));
    }

    #[tokio::test]
    #[traced_test]
    async fn persist_failure_keeps_mutation() {
        let store = Arc::new(FlakyStore::new());
        store.set_fail_writes(true);
        let queue = MessageQueue::new(Some(store.clone()), &config(3));

        assert!(queue.enqueue(msg("a")).await);
        assert_eq!(queue.size().await, 1);
        assert!(logs_contain("failed to persist message queue"));
        assert!(queue.flush().await.is_err());
    }

    #[tokio::test]
    async fn restore_loads_and_dedupes() {
        let store = Arc::new(FlakyStore::new());
        store
            .seed(
                "message_queue",
                r#"[{"id":"a","payload":1,"retryCount":2},{"id":"b","payload":2},{"id":"a","payload":3}]"#,
            )
            .await;
        let queue = MessageQueue::new(Some(store.clone()), &config(3));

        assert_eq!(queue.restore().await, 2);
        let snapshot = queue.snapshot().await;
        assert_eq!(ids(&snapshot), vec!["a", "b"]);
        assert_eq!(snapshot[0].retry_count, 2);
        assert_eq!(snapshot[0].payload, json!(1));
    }

    #[tokio::test]
    #[traced_test]
    async fn restore_ignores_malformed_data() {
        let store = Arc::new(FlakyStore::new());
        store.seed("message_queue", "{broken").await;
        let queue = MessageQueue::new(Some(store.clone()), &config(3));

        assert_eq!(queue.restore().await, 0);
        assert_eq!(queue.size().await, 0);
        assert!(logs_contain("malformed"));
    }
}
