// SPDX-FileCopyrightText: 2026 Recast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the KeyValueStore trait.

use std::collections::HashMap;

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};

use recast_core::{HealthStatus, KeyValueStore, RecastError};

use crate::database::{map_tr_err, Database};

/// Key-value store persisted in the `kv` table of a SQLite database.
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    /// Open the store at `path`, creating the file and schema if needed.
    pub async fn open(path: &str) -> Result<Self, RecastError> {
        Ok(Self {
            db: Database::open(path).await?,
        })
    }

    /// Open a throwaway in-memory SQLite store.
    pub async fn open_in_memory() -> Result<Self, RecastError> {
        Ok(Self {
            db: Database::open_in_memory().await?,
        })
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn health_check(&self) -> Result<HealthStatus, RecastError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, String>, RecastError> {
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        self.db
            .connection()
            .call(move |conn| -> Result<HashMap<String, String>, rusqlite::Error> {
                let mut stmt = conn.prepare_cached("SELECT value FROM kv WHERE key = ?1")?;
                let mut found = HashMap::with_capacity(keys.len());
                for key in keys {
                    let value: Option<String> = stmt
                        .query_row(params![key], |row| row.get(0))
                        .optional()?;
                    if let Some(value) = value {
                        found.insert(key, value);
                    }
                }
                Ok(found)
            })
            .await
            .map_err(map_tr_err)
    }

    async fn set(&self, entries: HashMap<String, String>) -> Result<(), RecastError> {
        if entries.is_empty() {
            return Ok(());
        }
        self.db
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare_cached(
                        "INSERT INTO kv (key, value) VALUES (?1, ?2)
                         ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                    )?;
                    for (key, value) in &entries {
                        stmt.execute(params![key, value])?;
                    }
                }
                tx.commit()
            })
            .await
            .map_err(map_tr_err)
    }

    async fn remove(&self, key: &str) -> Result<(), RecastError> {
        let key = key.to_string();
        self.db
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn clear(&self) -> Result<(), RecastError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute("DELETE FROM kv", [])?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Checkpoint the WAL before the process exits.
    async fn close(&self) -> Result<(), RecastError> {
        self.db.close().await
    }
}
