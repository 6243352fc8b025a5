// SPDX-FileCopyrightText: 2026 Recast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Processing stage traits used by the message processor.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::RecastError;

/// Turns message text into tokens. Required by every processor.
pub trait TokenParser: Send + Sync {
    fn parse(&self, text: &str) -> Vec<String>;
}

/// Optional post-parse token filter.
pub trait TokenFilter: Send + Sync {
    fn filter(&self, tokens: Vec<String>) -> Vec<String>;
}

impl<F> TokenFilter for F
where
    F: Fn(Vec<String>) -> Vec<String> + Send + Sync,
{
    fn filter(&self, tokens: Vec<String>) -> Vec<String> {
        self(tokens)
    }
}

/// Decides whether a message must be excluded from recycling.
#[async_trait]
pub trait ExclusionChecker: Send + Sync {
    /// Receives the original message and the post-filter tokens.
    async fn is_excluded(&self, message: &str, tokens: &[String]) -> Result<bool, RecastError>;
}

/// Produces a free-form analysis of the media referenced by a message.
#[async_trait]
pub trait MediaAnalyzer: Send + Sync {
    async fn analyze(&self, message: &str) -> Result<Value, RecastError>;
}
