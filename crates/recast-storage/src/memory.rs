// SPDX-FileCopyrightText: 2026 Recast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-local key-value store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use recast_core::{HealthStatus, KeyValueStore, RecastError};

/// A `HashMap` behind a `RwLock`. Nothing survives the process.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> Result<HealthStatus, RecastError> {
        Ok(HealthStatus::Healthy)
    }

    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, String>, RecastError> {
        let entries = self.entries.read().await;
        Ok(keys
            .iter()
            .filter_map(|key| entries.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, entries: HashMap<String, String>) -> Result<(), RecastError> {
        self.entries.write().await.extend(entries);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), RecastError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), RecastError> {
        self.entries.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_returns_only_present_keys() {
        let store = MemoryStore::new();
        store
            .set(HashMap::from([("a".to_string(), "1".to_string())]))
            .await
            .unwrap();

        let found = store.get(&["a", "missing"]).await.unwrap();
        assert_eq!(found, HashMap::from([("a".to_string(), "1".to_string())]));
    }

    #[tokio::test]
    async fn remove_and_clear() {
        let store = MemoryStore::new();
        store
            .set(HashMap::from([
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string()),
            ]))
            .await
            .unwrap();
        store.remove("a").await.unwrap();
        assert_eq!(store.len().await, 1);
        store.clear().await.unwrap();
        assert!(store.is_empty().await);
    }
}
