// SPDX-FileCopyrightText: 2026 Recast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Source of original message content.

use async_trait::async_trait;

use crate::error::RecastError;

/// Fetches the raw content of a previously sent message.
///
/// The content is opaque to the fetcher (JSON or HTML); the media handler
/// parses it.
#[async_trait]
pub trait MessageFetcher: Send + Sync + 'static {
    async fn fetch_original_message(&self, message_id: &str) -> Result<String, RecastError>;
}
