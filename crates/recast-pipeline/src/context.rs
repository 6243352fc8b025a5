// SPDX-FileCopyrightText: 2026 Recast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide wiring of the Recast managers.

use std::sync::Arc;

use tracing::info;

use recast_config::RecastConfig;
use recast_core::{KeyValueStore, MessageFetcher, RecastError};

use crate::exclusion::ExclusionListManager;
use crate::handler::{default_processor, MessageHandler};
use crate::media::MediaHandler;
use crate::queue::{DropHook, MessageQueue};

/// Every manager, built once from configuration and shared by reference.
///
/// The store is probed once when the exclusion manager connects. If it is
/// unavailable, the media cache and the queue skip persistence too.
pub struct RecastContext {
    config: RecastConfig,
    exclusions: Arc<ExclusionListManager>,
    media: Arc<MediaHandler>,
    queue: Arc<MessageQueue>,
    handler: MessageHandler,
    store: Option<Arc<dyn KeyValueStore>>,
}

impl RecastContext {
    /// Build the managers and restore the persisted queue.
    pub async fn initialize(
        config: RecastConfig,
        store: Arc<dyn KeyValueStore>,
        fetcher: Arc<dyn MessageFetcher>,
        drop_hook: Option<DropHook>,
    ) -> Result<Self, RecastError> {
        let exclusions = Arc::new(
            ExclusionListManager::connect(store.clone(), config.exclusion.key_prefix.clone()).await,
        );
        let usable_store = exclusions.is_persistent().then_some(store);

        let mut media = MediaHandler::new(fetcher, &config.media);
        if let Some(store) = &usable_store {
            media = media.with_store(store.clone());
        }
        let media = Arc::new(media);

        let mut queue = MessageQueue::new(usable_store.clone(), &config.queue);
        if let Some(hook) = drop_hook {
            queue = queue.with_drop_hook(hook);
        }
        let queue = Arc::new(queue);
        let restored = queue.restore().await;

        let handler = MessageHandler::new(
            default_processor(&config)?,
            exclusions.clone(),
            media.clone(),
            queue.clone(),
        );

        info!(
            persistent = exclusions.is_persistent(),
            restored, "recast context initialized"
        );
        Ok(Self {
            config,
            exclusions,
            media,
            queue,
            handler,
            store: usable_store,
        })
    }

    /// Persist the queue one last time and close the store.
    pub async fn shutdown(&self) -> Result<(), RecastError> {
        self.queue.flush().await?;
        if let Some(store) = &self.store {
            store.close().await?;
        }
        info!(queued = self.queue.size().await, "recast context shut down");
        Ok(())
    }

    pub fn config(&self) -> &RecastConfig {
        &self.config
    }

    pub fn exclusions(&self) -> &ExclusionListManager {
        &self.exclusions
    }

    pub fn media(&self) -> &MediaHandler {
        &self.media
    }

    pub fn queue(&self) -> &MessageQueue {
        &self.queue
    }

    pub fn handler(&self) -> &MessageHandler {
        &self.handler
    }
}
