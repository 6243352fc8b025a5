// SPDX-FileCopyrightText: 2026 Recast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Insertion target double.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::Mutex;

use recast_core::{MediaContainer, RecastError, RenderedElement};

/// Captures appended elements in order; can reject elements by `src`.
#[derive(Default)]
pub struct RecordingContainer {
    children: Mutex<Vec<RenderedElement>>,
    rejected_sources: Mutex<HashSet<String>>,
}

impl RecordingContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `append_child` fail for any element whose `src` attribute equals `src`.
    pub async fn reject_source(&self, src: &str) {
        self.rejected_sources.lock().await.insert(src.to_string());
    }

    /// Elements appended so far, in append order.
    pub async fn children(&self) -> Vec<RenderedElement> {
        self.children.lock().await.clone()
    }
}

#[async_trait]
impl MediaContainer for RecordingContainer {
    async fn append_child(&self, element: RenderedElement) -> Result<(), RecastError> {
        if let Some(src) = element.attributes.get("src") {
            if self.rejected_sources.lock().await.contains(src) {
                return Err(RecastError::Insertion(format!("container rejected {src}")));
            }
        }
        self.children.lock().await.push(element);
        Ok(())
    }
}
