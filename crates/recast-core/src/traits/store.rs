// SPDX-FileCopyrightText: 2026 Recast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value store trait for persistence backends.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::RecastError;
use crate::types::HealthStatus;

/// Asynchronous string key-value store.
///
/// No transactions and no atomic multi-key updates. Values are JSON text.
/// Every call may fail with [`RecastError::Storage`]; callers are expected to
/// degrade rather than propagate.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Returns the human-readable name of this backend.
    fn name(&self) -> &str;

    /// Reports whether the backend can currently serve reads and writes.
    async fn health_check(&self) -> Result<HealthStatus, RecastError>;

    /// Reads the given keys. Missing keys are absent from the returned map.
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, String>, RecastError>;

    /// Writes every entry, overwriting existing values.
    async fn set(&self, entries: HashMap<String, String>) -> Result<(), RecastError>;

    /// Removes a single key. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), RecastError>;

    /// Removes every key.
    async fn clear(&self) -> Result<(), RecastError>;

    /// Flushes pending state before shutdown. The default does nothing.
    async fn close(&self) -> Result<(), RecastError> {
        Ok(())
    }
}
