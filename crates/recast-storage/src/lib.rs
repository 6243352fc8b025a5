// SPDX-FileCopyrightText: 2026 Recast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value store backends for Recast.
//!
//! [`SqliteStore`] keeps every key in one WAL-mode SQLite table, writing
//! through a single `tokio-rusqlite` connection. [`MemoryStore`] is the
//! process-local alternative for tests and throwaway sessions.

pub mod database;
pub mod memory;
pub mod migrations;
pub mod sqlite;

use std::sync::Arc;

use recast_config::model::{StorageBackend, StorageConfig};
use recast_core::{KeyValueStore, RecastError};
use tracing::info;

pub use database::Database;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Open the store selected by `[storage]` configuration.
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>, RecastError> {
    match config.backend {
        StorageBackend::Sqlite => {
            let store = SqliteStore::open(&config.database_path).await?;
            info!(path = %config.database_path, "sqlite store opened");
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            info!("memory store opened");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
