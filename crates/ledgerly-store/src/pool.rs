//! SQLite connection pooling
//!
//! One pool per process. WAL journaling lets the interactive write path
//! read while a sync cycle holds the write lock; writers queue behind a
//! bounded busy timeout instead of failing immediately. The schema ships
//! embedded in the binary and is applied on every open; every statement is
//! `IF NOT EXISTS`, so reopening an existing database is a no-op.

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::StoreError;

/// How long a writer waits on a locked database before its query fails
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection cap for file-backed databases
const MAX_CONNECTIONS: u32 = 5;

const SCHEMA: &str = include_str!("migrations/20260810_initial.sql");

/// Owns the SQLite pool behind the offline record store
pub struct DatabasePool {
    pool: SqlitePool,
}

impl DatabasePool {
    /// Opens the database at `db_path`, creating the file and any missing
    /// parent directories, and applies the embedded schema
    pub async fn new(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::ConnectionFailed(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(|e| {
                StoreError::ConnectionFailed(format!("cannot open {}: {e}", db_path.display()))
            })?;

        Self::apply_schema(&pool).await?;
        tracing::info!(path = %db_path.display(), "offline database ready");
        Ok(Self { pool })
    }

    /// Opens a private in-memory database for tests. Capped at one
    /// connection: an in-memory SQLite database lives and dies with its
    /// connection, so a second one would see an empty schema.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| StoreError::ConnectionFailed(format!("in-memory open failed: {e}")))?;

        Self::apply_schema(&pool).await?;
        Ok(Self { pool })
    }

    /// The underlying connection pool, for handing to the repository
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn apply_schema(pool: &SqlitePool) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(pool)
            .await
            .map_err(|e| StoreError::MigrationFailed(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_pool_has_schema() {
        let pool = DatabasePool::in_memory().await.unwrap();
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM offline_expenses")
            .fetch_one(pool.pool())
            .await
            .unwrap();
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn test_open_creates_parents_and_reopens_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ledgerly.db");

        {
            let pool = DatabasePool::new(&path).await.unwrap();
            sqlx::query(
                "INSERT INTO sync_queue (owner_id, collection, operation, local_id, created_at, synced) \
                 VALUES ('o', 'expenses', '{}', NULL, '2026-01-01T00:00:00Z', 0)",
            )
            .execute(pool.pool())
            .await
            .unwrap();
            pool.pool().close().await;
        }

        // Second open re-applies the schema without clobbering existing rows
        let pool = DatabasePool::new(&path).await.unwrap();
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sync_queue")
            .fetch_one(pool.pool())
            .await
            .unwrap();
        assert_eq!(n, 1);
    }
}
