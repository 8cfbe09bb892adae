//! SQLite implementation of IRecordStore
//!
//! This module provides the concrete SQLite-based implementation of the
//! record store port defined in ledgerly-core. It handles all domain type
//! serialization/deserialization and SQL query construction.
//!
//! ## Type Mapping
//!
//! | Domain Type    | SQL Type | Strategy                                   |
//! |----------------|----------|--------------------------------------------|
//! | OwnerId        | TEXT     | UUID string via `.to_string()` / `FromStr` |
//! | LocalId        | TEXT     | String via `.as_str()` / `LocalId::new()`  |
//! | RemoteRowId    | INTEGER  | `value()` / `RemoteRowId::new()`           |
//! | Amount         | REAL     | `value()` / `Amount::new()`                |
//! | Category       | TEXT     | Canonical name via `as_str()` / `FromStr`  |
//! | NaiveDate      | TEXT     | ISO 8601 date via `to_string()` / `parse`  |
//! | DateTime<Utc>  | TEXT     | ISO 8601 via `to_rfc3339()` / `parse_from_rfc3339` |
//! | QueueOperation | TEXT     | Tagged serde_json document                 |
//!
//! ## Soft-fail reads
//!
//! The port contract makes every read total: a storage failure is logged at
//! `warn` and surfaces as an empty result. Writes stay fallible because the
//! sync engine treats a failed write as a process-level cycle abort.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::warn;

use ledgerly_core::domain::{
    newtypes::{Amount, LocalId, OwnerId, RemoteRowId},
    Category, ExpenseChanges, ExpenseDraft, ExpenseRecord, QueueEntry, QueueOperation,
};
use ledgerly_core::ports::{IRecordStore, PendingCounts};

use crate::StoreError;

/// SQLite-based implementation of the record store port
///
/// All operations are performed through a connection pool; every mutating
/// call is one scoped transaction (or a single auto-committed statement),
/// so the interactive write path and the sync engine never observe a
/// half-applied mutation.
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Creates a new store instance with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Row conversion helpers
// ============================================================================

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::SerializationError(format!("Invalid timestamp {s:?}: {e}")))
}

fn parse_date(s: &str) -> Result<NaiveDate, StoreError> {
    s.parse::<NaiveDate>()
        .map_err(|e| StoreError::SerializationError(format!("Invalid date {s:?}: {e}")))
}

/// Rebuild an [`ExpenseRecord`] from an `offline_expenses` row
fn record_from_row(row: &SqliteRow) -> Result<ExpenseRecord, StoreError> {
    let owner_id = OwnerId::from_str(row.get::<&str, _>("owner_id"))
        .map_err(|e| StoreError::SerializationError(e.to_string()))?;
    let local_id = LocalId::new(row.get::<String, _>("local_id"))
        .map_err(|e| StoreError::SerializationError(e.to_string()))?;
    let amount = Amount::new(row.get::<f64, _>("amount"))
        .map_err(|e| StoreError::SerializationError(e.to_string()))?;
    let category = Category::from_str(row.get::<&str, _>("category"))
        .map_err(|e| StoreError::SerializationError(e.to_string()))?;
    let description: String = row.get("description");
    let date = parse_date(row.get::<&str, _>("date"))?;
    let created_at = parse_timestamp(row.get::<&str, _>("created_at"))?;
    let remote_id: Option<i64> = row.get("remote_id");
    let synced: i64 = row.get("synced");

    let record = match remote_id {
        Some(id) => {
            let remote_id =
                RemoteRowId::new(id).map_err(|e| StoreError::SerializationError(e.to_string()))?;
            ExpenseRecord::from_remote(
                remote_id, local_id, owner_id, amount, category, description, date, created_at,
            )
        }
        None => {
            let mut record = ExpenseRecord::new_local(
                owner_id,
                local_id,
                ExpenseDraft {
                    amount,
                    category,
                    description,
                    date,
                },
                created_at,
            );
            if synced != 0 {
                record.mark_synced();
            }
            record
        }
    };
    Ok(record)
}

/// Rebuild a [`QueueEntry`] from a `sync_queue` row
fn entry_from_row(row: &SqliteRow) -> Result<QueueEntry, StoreError> {
    let owner_id = OwnerId::from_str(row.get::<&str, _>("owner_id"))
        .map_err(|e| StoreError::SerializationError(e.to_string()))?;
    let collection = serde_json::from_value(serde_json::Value::String(
        row.get::<String, _>("collection"),
    ))
    .map_err(|e| StoreError::SerializationError(format!("Invalid collection: {e}")))?;
    let operation: QueueOperation = serde_json::from_str(row.get::<&str, _>("operation"))
        .map_err(|e| StoreError::SerializationError(format!("Invalid operation: {e}")))?;
    let created_at = parse_timestamp(row.get::<&str, _>("created_at"))?;
    let synced: i64 = row.get("synced");

    let mut entry = QueueEntry::new(collection, operation, owner_id, created_at);
    if synced != 0 {
        entry.mark_synced();
    }
    Ok(entry)
}

// ============================================================================
// IRecordStore implementation
// ============================================================================

#[async_trait::async_trait]
impl IRecordStore for SqliteRecordStore {
    async fn load_unsynced_expenses(&self, owner: &OwnerId) -> Vec<ExpenseRecord> {
        let rows = sqlx::query(
            "SELECT * FROM offline_expenses WHERE owner_id = ? AND synced = 0 ORDER BY created_at ASC",
        )
        .bind(owner.to_string())
        .fetch_all(&self.pool)
        .await;

        let rows = match rows {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "failed to load unsynced expenses, returning empty set");
                return Vec::new();
            }
        };

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            match record_from_row(row) {
                Ok(record) => records.push(record),
                Err(e) => warn!(error = %e, "skipping unreadable expense row"),
            }
        }
        records
    }

    async fn append_expense(
        &self,
        owner: &OwnerId,
        draft: ExpenseDraft,
    ) -> anyhow::Result<ExpenseRecord> {
        let now = Utc::now();
        let record = ExpenseRecord::new_local(*owner, LocalId::generate(now), draft, now);

        sqlx::query(
            "INSERT INTO offline_expenses \
             (owner_id, local_id, remote_id, amount, category, description, date, created_at, synced) \
             VALUES (?, ?, NULL, ?, ?, ?, ?, ?, 0)",
        )
        .bind(owner.to_string())
        .bind(record.local_id().as_str())
        .bind(record.amount().value())
        .bind(record.category().as_str())
        .bind(record.description())
        .bind(record.date().to_string())
        .bind(record.created_at().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;

        Ok(record)
    }

    async fn mark_expense_synced(
        &self,
        owner: &OwnerId,
        local_id: &LocalId,
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE offline_expenses SET synced = 1 WHERE owner_id = ? AND local_id = ?")
            .bind(owner.to_string())
            .bind(local_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(StoreError::from)?;
        Ok(())
    }

    async fn update_expense(
        &self,
        owner: &OwnerId,
        local_id: &LocalId,
        changes: &ExpenseChanges,
    ) -> anyhow::Result<()> {
        if changes.is_empty() {
            return Ok(());
        }

        // Read-modify-write in one transaction so concurrent callers never
        // interleave partial patches.
        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;

        let row = sqlx::query("SELECT * FROM offline_expenses WHERE owner_id = ? AND local_id = ?")
            .bind(owner.to_string())
            .bind(local_id.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(StoreError::from)?;

        let row = row.ok_or_else(|| StoreError::NotFound(local_id.as_str().to_string()))?;
        let mut record = record_from_row(&row)?;
        record.apply_changes(changes);

        sqlx::query(
            "UPDATE offline_expenses SET amount = ?, category = ?, description = ?, date = ? \
             WHERE owner_id = ? AND local_id = ?",
        )
        .bind(record.amount().value())
        .bind(record.category().as_str())
        .bind(record.description())
        .bind(record.date().to_string())
        .bind(owner.to_string())
        .bind(local_id.as_str())
        .execute(&mut *tx)
        .await
        .map_err(StoreError::from)?;

        tx.commit().await.map_err(StoreError::from)?;
        Ok(())
    }

    async fn remove_expense(&self, owner: &OwnerId, local_id: &LocalId) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM offline_expenses WHERE owner_id = ? AND local_id = ?")
            .bind(owner.to_string())
            .bind(local_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(StoreError::from)?;
        Ok(())
    }

    async fn prune_synced_expenses(&self, owner: &OwnerId) -> anyhow::Result<u64> {
        let result = sqlx::query(
            "DELETE FROM offline_expenses WHERE owner_id = ? AND synced = 1 \
             AND local_id NOT IN \
             (SELECT local_id FROM sync_queue WHERE owner_id = ? AND local_id IS NOT NULL)",
        )
        .bind(owner.to_string())
        .bind(owner.to_string())
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;
        Ok(result.rows_affected())
    }

    async fn load_queue(&self, owner: &OwnerId) -> Vec<QueueEntry> {
        let rows = sqlx::query("SELECT * FROM sync_queue WHERE owner_id = ? ORDER BY id ASC")
            .bind(owner.to_string())
            .fetch_all(&self.pool)
            .await;

        let rows = match rows {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "failed to load sync queue, returning empty set");
                return Vec::new();
            }
        };

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            match entry_from_row(row) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(error = %e, "skipping unreadable queue row"),
            }
        }
        entries
    }

    async fn append_to_queue(&self, owner: &OwnerId, entry: &QueueEntry) -> anyhow::Result<()> {
        let operation = serde_json::to_string(entry.operation())
            .map_err(|e| StoreError::SerializationError(e.to_string()))?;

        sqlx::query(
            "INSERT INTO sync_queue (owner_id, collection, operation, local_id, created_at, synced) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(owner.to_string())
        .bind(entry.collection().table_name())
        .bind(operation)
        .bind(entry.local_id().map(|id| id.as_str().to_string()))
        .bind(entry.created_at().to_rfc3339())
        .bind(i64::from(entry.is_synced()))
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;
        Ok(())
    }

    async fn replace_queue(&self, owner: &OwnerId, entries: &[QueueEntry]) -> anyhow::Result<()> {
        // Delete-and-reinsert inside one transaction: a crash mid-drain
        // leaves the previous consistent queue, never a partial one.
        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;

        sqlx::query("DELETE FROM sync_queue WHERE owner_id = ?")
            .bind(owner.to_string())
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from)?;

        for entry in entries {
            let operation = serde_json::to_string(entry.operation())
                .map_err(|e| StoreError::SerializationError(e.to_string()))?;
            sqlx::query(
                "INSERT INTO sync_queue (owner_id, collection, operation, local_id, created_at, synced) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(owner.to_string())
            .bind(entry.collection().table_name())
            .bind(operation)
            .bind(entry.local_id().map(|id| id.as_str().to_string()))
            .bind(entry.created_at().to_rfc3339())
            .bind(i64::from(entry.is_synced()))
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from)?;
        }

        tx.commit().await.map_err(StoreError::from)?;
        Ok(())
    }

    async fn pending_counts(&self, owner: &OwnerId) -> PendingCounts {
        let expenses = sqlx::query(
            "SELECT COUNT(*) AS n FROM offline_expenses WHERE owner_id = ? AND synced = 0",
        )
        .bind(owner.to_string())
        .fetch_one(&self.pool)
        .await;

        let operations =
            sqlx::query("SELECT COUNT(*) AS n FROM sync_queue WHERE owner_id = ? AND synced = 0")
                .bind(owner.to_string())
                .fetch_one(&self.pool)
                .await;

        match (expenses, operations) {
            (Ok(e), Ok(o)) => PendingCounts {
                unsynced_expenses: e.get::<i64, _>("n") as u64,
                pending_operations: o.get::<i64, _>("n") as u64,
            },
            (e, o) => {
                if let Err(err) = e {
                    warn!(error = %err, "failed to count unsynced expenses");
                }
                if let Err(err) = o {
                    warn!(error = %err, "failed to count pending operations");
                }
                PendingCounts::default()
            }
        }
    }

    async fn clear_owner(&self, owner: &OwnerId) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;

        sqlx::query("DELETE FROM offline_expenses WHERE owner_id = ?")
            .bind(owner.to_string())
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from)?;
        sqlx::query("DELETE FROM sync_queue WHERE owner_id = ?")
            .bind(owner.to_string())
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from)?;

        tx.commit().await.map_err(StoreError::from)?;
        tracing::info!(owner = %owner, "cleared offline data");
        Ok(())
    }
}
