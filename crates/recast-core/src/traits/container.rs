// SPDX-FileCopyrightText: 2026 Recast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Insertion target for re-inserted media.

use async_trait::async_trait;

use crate::error::RecastError;
use crate::types::RenderedElement;

/// A container that accepts rendered child elements, in append order.
#[async_trait]
pub trait MediaContainer: Send + Sync {
    async fn append_child(&self, element: RenderedElement) -> Result<(), RecastError>;
}
