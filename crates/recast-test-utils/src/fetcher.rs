// SPDX-FileCopyrightText: 2026 Recast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message source double with canned content.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use recast_core::{MessageFetcher, RecastError};

/// Returns pre-registered content per message ID; unknown IDs fail like a 404.
#[derive(Default)]
pub struct MockFetcher {
    messages: Mutex<HashMap<String, String>>,
    fetches: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the content returned for `message_id`.
    pub async fn insert(&self, message_id: &str, content: impl Into<String>) {
        self.messages
            .lock()
            .await
            .insert(message_id.to_string(), content.into());
    }

    /// Number of fetch attempts so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageFetcher for MockFetcher {
    async fn fetch_original_message(&self, message_id: &str) -> Result<String, RecastError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.messages
            .lock()
            .await
            .get(message_id)
            .cloned()
            .ok_or_else(|| RecastError::Fetch {
                message_id: message_id.to_string(),
                message: "message not found".into(),
                source: None,
            })
    }
}
