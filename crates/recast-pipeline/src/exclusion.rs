// SPDX-FileCopyrightText: 2026 Recast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-message exclusion lists of prior purchasers.
//!
//! Lists live in an in-memory cache and are persisted as JSON arrays under
//! `<key_prefix><message_id>`. Store failures never surface to callers: reads
//! degrade to an empty list that is not cached, writes degrade to a
//! cache-only update. When the store is unavailable at construction the
//! manager runs in-memory only.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use recast_core::types::json_type_name;
use recast_core::{ExclusionList, HealthStatus, KeyValueStore, RecastError};

/// Ordered set union: every entry of `current` in order, then the entries of
/// `incoming` not seen yet, each value exactly once.
pub fn merge_and_deduplicate<S: AsRef<str>>(current: &[S], incoming: &[S]) -> ExclusionList {
    let mut seen: HashSet<&str> = HashSet::with_capacity(current.len() + incoming.len());
    current
        .iter()
        .chain(incoming.iter())
        .map(AsRef::<str>::as_ref)
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}

/// Serialize a list to its persisted JSON form.
pub fn serialize_list(list: &[String]) -> Result<String, RecastError> {
    Ok(serde_json::to_string(list)?)
}

/// Parse a persisted list, collapsing any duplicates it may carry.
pub fn deserialize_list(raw: &str) -> Result<ExclusionList, RecastError> {
    let parsed: Vec<String> = serde_json::from_str(raw)?;
    Ok(merge_and_deduplicate(&parsed, &[]))
}

/// Owns every exclusion list for the process.
pub struct ExclusionListManager {
    /// `None` once the store has been found unavailable.
    store: Option<Arc<dyn KeyValueStore>>,
    key_prefix: String,
    cache: RwLock<HashMap<String, ExclusionList>>,
    /// Buyers recorded while the stored list could not be read.
    pending: RwLock<HashMap<String, ExclusionList>>,
}

impl ExclusionListManager {
    /// Create a manager backed by `store`.
    ///
    /// The store is probed once; if it is unhealthy or the probe fails, the
    /// outage is logged here and the manager continues in-memory only.
    pub async fn connect(store: Arc<dyn KeyValueStore>, key_prefix: impl Into<String>) -> Self {
        let key_prefix = key_prefix.into();
        let store = match store.health_check().await {
            Ok(HealthStatus::Unhealthy(reason)) => {
                error!(store = store.name(), %reason, "exclusion store unavailable, lists will not be persisted");
                None
            }
            Err(e) => {
                error!(store = store.name(), error = %e, "exclusion store unavailable, lists will not be persisted");
                None
            }
            Ok(status) => {
                if let HealthStatus::Degraded(reason) = &status {
                    warn!(store = store.name(), %reason, "exclusion store degraded");
                }
                Some(store)
            }
        };
        Self {
            store,
            key_prefix,
            cache: RwLock::new(HashMap::new()),
            pending: RwLock::new(HashMap::new()),
        }
    }

    /// Create a manager that never touches a store.
    pub fn in_memory(key_prefix: impl Into<String>) -> Self {
        Self {
            store: None,
            key_prefix: key_prefix.into(),
            cache: RwLock::new(HashMap::new()),
            pending: RwLock::new(HashMap::new()),
        }
    }

    /// Whether list updates are written to a store.
    pub fn is_persistent(&self) -> bool {
        self.store.is_some()
    }

    fn storage_key(&self, message_id: &str) -> String {
        format!("{}{message_id}", self.key_prefix)
    }

    /// Return the list for `message_id`, loading or creating it on a cache miss.
    pub async fn get_or_create_list(&self, message_id: &str) -> ExclusionList {
        self.load(message_id).await.0
    }

    /// The list for `message_id` and whether it reflects the stored state.
    ///
    /// `false` means the store could not be read: the list holds only buyers
    /// recorded since, and must not be cached or written over the stored one.
    async fn load(&self, message_id: &str) -> (ExclusionList, bool) {
        if let Some(list) = self.cache.read().await.get(message_id) {
            return (list.clone(), true);
        }

        let Some(store) = &self.store else {
            return (self.create_empty_list(message_id).await, true);
        };

        let key = self.storage_key(message_id);
        let stored = match store.get(&[key.as_str()]).await {
            Ok(mut found) => found.remove(&key),
            Err(e) => {
                error!(message_id, error = %e, "failed to read exclusion list");
                let pending = self.pending.read().await.get(message_id).cloned();
                return (pending.unwrap_or_default(), false);
            }
        };

        let list = match stored.map(|raw| deserialize_list(&raw)) {
            Some(Ok(list)) => {
                debug!(message_id, entries = list.len(), "exclusion list loaded");
                self.cache
                    .write()
                    .await
                    .insert(message_id.to_string(), list.clone());
                list
            }
            Some(Err(e)) => {
                warn!(message_id, error = %e, "stored exclusion list is malformed, starting empty");
                self.create_empty_list(message_id).await
            }
            None => self.create_empty_list(message_id).await,
        };

        let pending = self.pending.write().await.remove(message_id);
        match pending {
            Some(pending) => (self.store_merged(message_id, &list, &pending).await, true),
            None => (list, true),
        }
    }

    /// Cache and persist a fresh empty list.
    async fn create_empty_list(&self, message_id: &str) -> ExclusionList {
        let list = ExclusionList::new();
        self.cache
            .write()
            .await
            .insert(message_id.to_string(), list.clone());
        if let Err(e) = self.persist(message_id, &list).await {
            error!(message_id, error = %e, "failed to persist new exclusion list");
        }
        list
    }

    /// Merge `new_buyers` into the list for `message_id` and persist it.
    ///
    /// The merged list is cached and returned even if persisting fails. If
    /// the stored list cannot be read, the buyers are held back and merged
    /// into it on the next successful read.
    pub async fn update_list(&self, message_id: &str, new_buyers: &[String]) -> ExclusionList {
        let (current, loaded) = self.load(message_id).await;
        if !loaded {
            let merged = merge_and_deduplicate(&current, new_buyers);
            self.pending
                .write()
                .await
                .insert(message_id.to_string(), merged.clone());
            warn!(message_id, pending = merged.len(), "exclusion list unreadable, update deferred");
            return merged;
        }
        self.store_merged(message_id, &current, new_buyers).await
    }

    async fn store_merged(&self, message_id: &str, current: &[String], new_buyers: &[String]) -> ExclusionList {
        let merged = merge_and_deduplicate(current, new_buyers);

        self.cache
            .write()
            .await
            .insert(message_id.to_string(), merged.clone());

        match self.persist(message_id, &merged).await {
            Ok(()) => info!(
                message_id,
                added = merged.len() - current.len(),
                total = merged.len(),
                "exclusion list updated"
            ),
            Err(e) => error!(message_id, error = %e, "exclusion list updated in memory only"),
        }
        merged
    }

    /// [`update_list`](Self::update_list) for untyped input.
    ///
    /// Anything but an array is treated as an empty array. Array entries that
    /// are not strings are skipped.
    pub async fn update_list_from_value(&self, message_id: &str, new_buyers: &Value) -> ExclusionList {
        let buyers: Vec<String> = match new_buyers.as_array() {
            Some(items) => items
                .iter()
                .filter_map(|item| match item.as_str() {
                    Some(id) => Some(id.to_string()),
                    None => {
                        warn!(message_id, found = json_type_name(item), "skipping non-string buyer id");
                        None
                    }
                })
                .collect(),
            None => {
                warn!(message_id, found = json_type_name(new_buyers), "buyers is not an array, treating as empty");
                Vec::new()
            }
        };
        self.update_list(message_id, &buyers).await
    }

    /// Whether `subscriber` is on the list for `message_id`.
    pub async fn is_excluded(&self, message_id: &str, subscriber: &str) -> bool {
        self.get_or_create_list(message_id)
            .await
            .iter()
            .any(|id| id == subscriber)
    }

    /// Keep the candidates that are not on the list, in their original order.
    pub async fn filter_recipients(&self, message_id: &str, candidates: &[String]) -> Vec<String> {
        let list = self.get_or_create_list(message_id).await;
        let excluded: HashSet<&str> = list.iter().map(String::as_str).collect();
        candidates
            .iter()
            .filter(|c| !excluded.contains(c.as_str()))
            .cloned()
            .collect()
    }

    async fn persist(&self, message_id: &str, list: &[String]) -> Result<(), RecastError> {
        let Some(store) = &self.store else {
            debug!(message_id, "store unavailable, exclusion list kept in memory");
            return Ok(());
        };
        let raw = serialize_list(list)?;
        store
            .set(HashMap::from([(self.storage_key(message_id), raw)]))
            .await
    }
}
