// SPDX-FileCopyrightText: 2026 Recast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value store double with failure injection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use recast_core::{HealthStatus, KeyValueStore, RecastError};
use recast_storage::MemoryStore;

/// Wraps a [`MemoryStore`], counting calls and failing on demand.
///
/// - `fail_reads` makes `get` return a storage error
/// - `fail_writes` makes `set`, `remove` and `clear` return a storage error
/// - `unhealthy` makes `health_check` report [`HealthStatus::Unhealthy`]
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    reads: AtomicUsize,
    writes: AtomicUsize,
    closes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    unhealthy: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose health check fails, as if the backend were missing.
    pub fn unavailable() -> Self {
        let store = Self::default();
        store.set_unhealthy(true);
        store
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_unhealthy(&self, unhealthy: bool) {
        self.unhealthy.store(unhealthy, Ordering::SeqCst);
    }

    /// Number of `get` calls so far, failed ones included.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `set`/`remove`/`clear` calls so far, failed ones included.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of `close` calls so far.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Write a raw value directly, bypassing counters and failure switches.
    pub async fn seed(&self, key: &str, value: &str) {
        self.inner
            .set(HashMap::from([(key.to_string(), value.to_string())]))
            .await
            .expect("memory store writes cannot fail");
    }

    /// Read a raw value directly, bypassing counters and failure switches.
    pub async fn raw(&self, key: &str) -> Option<String> {
        self.inner
            .get(&[key])
            .await
            .expect("memory store reads cannot fail")
            .remove(key)
    }

    fn check_write(&self) -> Result<(), RecastError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RecastError::Storage {
                source: "injected write failure".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn health_check(&self) -> Result<HealthStatus, RecastError> {
        if self.unhealthy.load(Ordering::SeqCst) {
            return Ok(HealthStatus::Unhealthy("injected outage".into()));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, String>, RecastError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RecastError::Storage {
                source: "injected read failure".into(),
            });
        }
        self.inner.get(keys).await
    }

    async fn set(&self, entries: HashMap<String, String>) -> Result<(), RecastError> {
        self.check_write()?;
        self.inner.set(entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), RecastError> {
        self.check_write()?;
        self.inner.remove(key).await
    }

    async fn clear(&self) -> Result<(), RecastError> {
        self.check_write()?;
        self.inner.clear().await
    }

    async fn close(&self) -> Result<(), RecastError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
