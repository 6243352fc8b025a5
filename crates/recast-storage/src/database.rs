// SPDX-FileCopyrightText: 2026 Recast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use recast_core::RecastError;
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::migrations::run_migrations;

/// Convert a tokio-rusqlite error into RecastError::Storage.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> RecastError {
    RecastError::storage(e)
}

/// Unwrap errors raised inside a `call` closure that already returns `RecastError`.
fn map_setup_err(e: tokio_rusqlite::Error<RecastError>) -> RecastError {
    match e {
        tokio_rusqlite::Error::Error(inner) => inner,
        other => RecastError::Storage {
            source: other.to_string().into(),
        },
    }
}

/// Handle to the single SQLite connection.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database file, enable WAL, and run migrations.
    pub async fn open(path: &str) -> Result<Self, RecastError> {
        if let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(RecastError::storage)?;
        }

        let conn = Connection::open(path).await.map_err(RecastError::storage)?;
        let db = Self { conn };
        db.prepare(true).await?;
        debug!(path, "database opened");
        Ok(db)
    }

    /// Open a private in-memory database with the schema applied.
    pub async fn open_in_memory() -> Result<Self, RecastError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(RecastError::storage)?;
        let db = Self { conn };
        db.prepare(false).await?;
        Ok(db)
    }

    async fn prepare(&self, wal: bool) -> Result<(), RecastError> {
        self.conn
            .call(move |conn| -> Result<(), RecastError> {
                if wal {
                    let mode: String = conn
                        .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
                        .map_err(RecastError::storage)?;
                    debug!(mode = %mode, "journal mode set");
                }
                conn.pragma_update(None, "synchronous", "NORMAL")
                    .map_err(RecastError::storage)?;
                run_migrations(conn)
            })
            .await
            .map_err(map_setup_err)
    }

    /// Returns the underlying connection for query modules.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoint the WAL so the main database file is self-contained.
    pub async fn close(&self) -> Result<(), RecastError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}
